//! Report emission: Markdown summary and JSON alert list.

use crate::error::Result;
use crate::evaluator::{Evaluation, EvaluationResult};
use crate::money::Money;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Markdown report file name inside the output directory.
pub const REPORT_FILENAME: &str = "finance_report.md";

/// Alerts file name inside the output directory.
pub const ALERTS_FILENAME: &str = "alerts.json";

/// A breached guardrail, as written to the alerts file.
///
/// Field values are taken verbatim from the corresponding
/// [`EvaluationResult`].
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Scope of the breached rule
    pub scope: String,

    /// Configured threshold
    pub limit: Money,

    /// Signed net total that breached it
    pub actual: Money,

    /// Negative headroom
    pub margin: Money,
}

impl From<&EvaluationResult> for Alert {
    fn from(result: &EvaluationResult) -> Self {
        Alert {
            scope: result.scope.clone(),
            limit: result.limit,
            actual: result.actual,
            margin: result.margin,
        }
    }
}

/// Extracts the breached subset of an evaluation, in result order.
pub fn collect_alerts(evaluation: &Evaluation) -> Vec<Alert> {
    evaluation
        .results
        .iter()
        .filter(|r| r.breached)
        .map(Alert::from)
        .collect()
}

/// Renders the human-readable Markdown report.
pub fn render_markdown<W: Write>(mut writer: W, evaluation: &Evaluation) -> Result<()> {
    writeln!(writer, "# Budget Guardrail Report - {}", evaluation.as_of)?;
    writeln!(writer)?;
    writeln!(writer, "## Guardrails")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "| Scope | Type | Period | Limit | Actual | Margin | Status |"
    )?;
    writeln!(writer, "|---|---|---|---:|---:|---:|---|")?;

    for r in &evaluation.results {
        let status = if r.breached { "ALERT" } else { "OK" };
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} |",
            r.scope, r.kind, r.period, r.limit, r.actual, r.margin, status
        )?;
    }

    if !evaluation.unbudgeted.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "## Unbudgeted categories with spend")?;
        writeln!(writer)?;
        writeln!(writer, "| Category | Spent |")?;
        writeln!(writer, "|---|---:|")?;
        for u in &evaluation.unbudgeted {
            writeln!(writer, "| {} | {} |", u.category, u.spent)?;
        }
    }

    writeln!(writer)?;
    let breached: Vec<&EvaluationResult> =
        evaluation.results.iter().filter(|r| r.breached).collect();
    if breached.is_empty() {
        writeln!(writer, "## No alerts this cycle")?;
    } else {
        writeln!(writer, "## Alerts")?;
        writeln!(writer)?;
        for r in breached {
            writeln!(
                writer,
                "- **{}**: {} actual {} vs limit {} (margin {})",
                r.scope, r.kind, r.actual, r.limit, r.margin
            )?;
        }
    }

    Ok(())
}

/// Renders the machine-readable alerts array as pretty-printed JSON.
pub fn render_alerts<W: Write>(mut writer: W, alerts: &[Alert]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, alerts)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes both output files under `out_dir`, creating it if needed.
///
/// Returns the alerts that were written so the caller can decide the exit
/// status.
pub fn write_outputs(out_dir: &Path, evaluation: &Evaluation) -> Result<Vec<Alert>> {
    fs::create_dir_all(out_dir)?;

    let report = File::create(out_dir.join(REPORT_FILENAME))?;
    render_markdown(report, evaluation)?;

    let alerts = collect_alerts(evaluation);
    let alerts_file = File::create(out_dir.join(ALERTS_FILENAME))?;
    render_alerts(alerts_file, &alerts)?;

    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::evaluator::evaluate;
    use crate::transaction::Transaction;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn sample_evaluation() -> Evaluation {
        let rules = RuleSet::from_str(
            "rules:\n  - {scope: Food, limit: 70, type: spending-cap}\n  - {scope: Rent, limit: 1000, type: spending-cap}\n",
        )
        .unwrap();
        let txs = vec![
            Transaction {
                date: NaiveDate::from_str("2026-08-03").unwrap(),
                category: "Food".to_string(),
                amount: Money::from_str("-80").unwrap(),
                description: String::new(),
            },
            Transaction {
                date: NaiveDate::from_str("2026-08-04").unwrap(),
                category: "Hobby".to_string(),
                amount: Money::from_str("-15").unwrap(),
                description: String::new(),
            },
        ];
        evaluate(&txs, &rules, NaiveDate::from_str("2026-08-15").unwrap())
    }

    #[test]
    fn test_alerts_are_exactly_the_breached_subset() {
        let eval = sample_evaluation();
        let alerts = collect_alerts(&eval);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].scope, "Food");
        assert_eq!(alerts[0].limit, eval.results[0].limit);
        assert_eq!(alerts[0].actual, eval.results[0].actual);
        assert_eq!(alerts[0].margin, eval.results[0].margin);
    }

    #[test]
    fn test_markdown_contains_table_and_alert() {
        let eval = sample_evaluation();
        let mut out = Vec::new();
        render_markdown(&mut out, &eval).unwrap();
        let md = String::from_utf8(out).unwrap();

        assert!(md.contains("# Budget Guardrail Report - 2026-08-15"));
        assert!(md.contains("| Food | spending-cap | monthly | 70.00 | -80.00 | -10.00 | ALERT |"));
        assert!(md.contains("| Rent | spending-cap | monthly | 1000.00 | 0.00 | 1000.00 | OK |"));
        assert!(md.contains("| Hobby | 15.00 |"));
        assert!(md.contains("## Alerts"));
        assert!(!md.contains("No alerts this cycle"));
    }

    #[test]
    fn test_markdown_no_alerts_line() {
        let rules = RuleSet::from_str(
            "rules:\n  - {scope: Food, limit: 100, type: spending-cap}\n",
        )
        .unwrap();
        let eval = evaluate(&[], &rules, NaiveDate::from_str("2026-08-15").unwrap());

        let mut out = Vec::new();
        render_markdown(&mut out, &eval).unwrap();
        let md = String::from_utf8(out).unwrap();
        assert!(md.contains("## No alerts this cycle"));
    }

    #[test]
    fn test_alerts_json_shape() {
        let eval = sample_evaluation();
        let alerts = collect_alerts(&eval);

        let mut out = Vec::new();
        render_alerts(&mut out, &alerts).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["scope"], "Food");
        assert_eq!(parsed[0]["limit"], "70.00");
        assert_eq!(parsed[0]["actual"], "-80.00");
        assert_eq!(parsed[0]["margin"], "-10.00");
    }

    #[test]
    fn test_empty_alerts_json_is_empty_array() {
        let mut out = Vec::new();
        render_alerts(&mut out, &[]).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }
}
