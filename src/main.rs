//! Budget Guardrails CLI
//!
//! A scheduled batch run that checks a transaction export against budget
//! guardrails and writes a report and an alerts file.
//!
//! # Usage
//!
//! ```bash
//! budget-guardrails transactions.csv rules.yml --out-dir docs
//! ```
//!
//! Exit status: 0 = no breaches, 1 = at least one breach, 2 = load or
//! config failure. The host scheduler fails the job on non-zero.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use budget_guardrails::{
    evaluate, fill_missing_categories, load_transactions, write_outputs, GuardrailError, Result,
    RowPolicy, RuleSet,
};
use chrono::{Local, NaiveDate};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

const EXIT_BREACH: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    env_logger::init();

    match run() {
        Ok(false) => {}
        Ok(true) => process::exit(EXIT_BREACH),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

struct Args {
    transactions: PathBuf,
    rules: PathBuf,
    out_dir: PathBuf,
    as_of: Option<NaiveDate>,
    policy: RowPolicy,
}

fn usage(message: &str) -> GuardrailError {
    GuardrailError::Usage {
        message: message.to_string(),
    }
}

fn parse_args() -> Result<Args> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut out_dir = PathBuf::from(".");
    let mut as_of = None;
    let mut policy = RowPolicy::FailFast;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-dir" => {
                let value = args.next().ok_or_else(|| usage("--out-dir needs a value"))?;
                out_dir = PathBuf::from(value);
            }
            "--as-of" => {
                let value = args.next().ok_or_else(|| usage("--as-of needs a value"))?;
                as_of = Some(
                    value
                        .parse()
                        .map_err(|_| usage("--as-of expects a YYYY-MM-DD date"))?,
                );
            }
            "--skip-malformed" => policy = RowPolicy::SkipAndLog,
            other if other.starts_with("--") => {
                return Err(usage(&format!("Unknown flag '{}'", other)))
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if positional.len() != 2 {
        return Err(usage("Expected a transactions CSV and a rules YAML file"));
    }

    // Safety: length was checked just above
    let rules = positional.pop().expect("two positional args");
    let transactions = positional.pop().expect("two positional args");

    Ok(Args {
        transactions,
        rules,
        out_dir,
        as_of,
        policy,
    })
}

/// Runs one evaluation cycle. Returns `true` if any guardrail breached.
fn run() -> Result<bool> {
    let args = parse_args()?;

    let csv_file = File::open(&args.transactions)?;
    let mut transactions = load_transactions(BufReader::new(csv_file), args.policy)?;

    let rules_file = File::open(&args.rules)?;
    let rules = RuleSet::from_reader(BufReader::new(rules_file))?;

    fill_missing_categories(&mut transactions, &rules);

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let evaluation = evaluate(&transactions, &rules, as_of);

    let alerts = write_outputs(&args.out_dir, &evaluation)?;
    Ok(!alerts.is_empty())
}
