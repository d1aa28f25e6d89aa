//! Transaction models for CSV parsing and internal representation.

use crate::error::{GuardrailError, Result};
use crate::money::Money;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::warn;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

/// Date formats accepted across bank exports.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Raw transaction row as read from CSV.
///
/// Uses string-based parsing for flexibility; `category` and `description`
/// are optional columns because many bank exports omit them (a blank
/// category is filled in later from the config's keyword map).
#[derive(Debug, Deserialize)]
pub struct TransactionRow {
    /// Booking date in one of the accepted formats
    pub date: String,

    /// Category label; may be empty
    #[serde(default)]
    pub category: String,

    /// Signed amount (negative = expense, positive = income/refund)
    pub amount: String,

    /// Free-text description or merchant line
    #[serde(default)]
    pub description: String,
}

impl TransactionRow {
    /// Parses the raw CSV row into a typed transaction.
    ///
    /// Returns a message describing the first malformed field on failure.
    pub fn parse(&self) -> std::result::Result<Transaction, String> {
        let date = parse_date(&self.date)
            .ok_or_else(|| format!("unparseable date '{}'", self.date.trim()))?;

        let amount = Money::from_str(&self.amount)
            .map_err(|_| format!("non-numeric amount '{}'", self.amount.trim()))?;

        Ok(Transaction {
            date,
            category: self.category.trim().to_string(),
            amount,
            description: self.description.trim().to_string(),
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// A parsed and validated transaction. Immutable once loaded, except that a
/// blank category may be filled in by the configured keyword map before
/// evaluation.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Booking date
    pub date: NaiveDate,

    /// Category label used for rule scope matching
    pub category: String,

    /// Signed amount
    pub amount: Money,

    /// Free-text description
    pub description: String,
}

/// What to do with a malformed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Abort the whole load on the first malformed row.
    #[default]
    FailFast,

    /// Log the row at warn level and continue.
    SkipAndLog,
}

/// Loads transactions from a CSV reader, preserving file order.
///
/// Header names are trimmed and lowercased before field mapping so exports
/// with `Date`/`AMOUNT` style headers still load. The `date` and `amount`
/// columns are required; `category` and `description` default to empty.
pub fn load_transactions<R: Read>(reader: R, policy: RowPolicy) -> Result<Vec<Transaction>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let normalized: StringRecord = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    for required in ["date", "amount"] {
        if !normalized.iter().any(|h| h == required) {
            return Err(GuardrailError::MissingColumn {
                name: required.to_string(),
            });
        }
    }
    csv_reader.set_headers(normalized);

    let mut transactions = Vec::new();

    for (row_idx, result) in csv_reader.deserialize::<TransactionRow>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row

        let parsed = result
            .map_err(GuardrailError::from)
            .and_then(|row| {
                row.parse().map_err(|message| GuardrailError::InvalidRecord {
                    row: row_num,
                    message,
                })
            });

        match parsed {
            Ok(tx) => transactions.push(tx),
            Err(e) => match policy {
                RowPolicy::FailFast => return Err(e),
                RowPolicy::SkipAndLog => warn!("Row {}: skipped: {}", row_num, e),
            },
        }
    }

    Ok(transactions)
}
