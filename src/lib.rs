//! # Budget Guardrails
//!
//! A batch checker that reads a personal-finance transaction export,
//! evaluates budget and savings guardrails from a YAML config, and emits a
//! Markdown report plus a JSON alert list.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: signed currency amounts via `rust_decimal`
//! - **Total evaluation**: every rule yields exactly one result, even with
//!   zero matching transactions
//! - **Deterministic output**: results in rule declaration order, anchored
//!   to an explicit as-of date
//! - **Scheduler-friendly**: exit status distinguishes breach from failure
//!
//! ## Example
//!
//! ```
//! use budget_guardrails::{evaluate, load_transactions, RowPolicy, RuleSet};
//! use chrono::NaiveDate;
//! use std::io::Cursor;
//!
//! let csv = "date,category,amount,description\n2026-08-03,Food,-49.90,groceries\n";
//! let transactions = load_transactions(Cursor::new(csv), RowPolicy::FailFast).unwrap();
//!
//! let rules = RuleSet::from_str("rules:\n  - {scope: Food, limit: 450, type: spending-cap}").unwrap();
//!
//! let as_of = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
//! let evaluation = evaluate(&transactions, &rules, as_of);
//! assert!(!evaluation.any_breached());
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod money;
pub mod report;
pub mod transaction;

pub use config::{fill_missing_categories, GuardrailRule, Period, RuleKind, RuleSet};
pub use error::{GuardrailError, Result};
pub use evaluator::{evaluate, Evaluation, EvaluationResult, PeriodWindow, UnbudgetedSpend};
pub use money::Money;
pub use report::{collect_alerts, render_alerts, render_markdown, write_outputs, Alert};
pub use transaction::{load_transactions, RowPolicy, Transaction, TransactionRow};
