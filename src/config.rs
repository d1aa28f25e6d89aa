//! Guardrail rule configuration: YAML loading, validation, categorization.

use crate::error::{GuardrailError, Result};
use crate::money::Money;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Read;

/// Aggregation window a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Calendar month containing the run date
    Monthly,
    /// ISO week containing the run date
    Weekly,
    /// Calendar year containing the run date
    Yearly,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Monthly => "monthly",
            Period::Weekly => "weekly",
            Period::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

/// Whether a rule caps spending or demands a minimum net amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Breached when the period's expense magnitude exceeds the limit.
    SpendingCap,
    /// Breached when the period's net total falls below the limit.
    SavingsMinimum,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::SpendingCap => "spending-cap",
            RuleKind::SavingsMinimum => "savings-minimum",
        };
        f.write_str(s)
    }
}

/// A single configured guardrail. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardrailRule {
    /// Transaction category this rule watches
    pub scope: String,

    /// Aggregation window
    #[serde(default = "default_period")]
    pub period: Period,

    /// Threshold amount
    pub limit: Money,

    /// Cap or minimum
    #[serde(rename = "type")]
    pub kind: RuleKind,
}

fn default_period() -> Period {
    Period::Monthly
}

fn default_fallback() -> String {
    "Other".to_string()
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    rules: Vec<GuardrailRule>,

    /// Category -> description keywords, for rows with a blank category.
    /// BTreeMap keeps first-match resolution deterministic.
    #[serde(default)]
    categorization: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_fallback")]
    fallback_category: String,
}

/// Validated rule configuration.
///
/// Rules stay in declaration order; scopes are unique.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<GuardrailRule>,
    categorization: BTreeMap<String, Vec<String>>,
    fallback_category: String,
}

impl RuleSet {
    /// Loads and validates rules from a YAML reader.
    ///
    /// Missing required fields and unknown rule keys surface as YAML errors;
    /// a duplicated scope is rejected here.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_reader(reader)?;

        let mut seen = HashSet::new();
        for rule in &raw.rules {
            if !seen.insert(rule.scope.as_str()) {
                return Err(GuardrailError::DuplicateScope {
                    scope: rule.scope.clone(),
                });
            }
        }

        Ok(RuleSet {
            rules: raw.rules,
            categorization: raw.categorization,
            fallback_category: raw.fallback_category,
        })
    }

    /// Parses rules from a YAML string.
    pub fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[GuardrailRule] {
        &self.rules
    }

    /// Returns `true` if some rule watches this category.
    pub fn has_scope(&self, category: &str) -> bool {
        self.rules.iter().any(|r| r.scope == category)
    }

    /// Resolves a category from a description via the keyword map.
    ///
    /// Matching is case-insensitive substring; the first matching category in
    /// name order wins. Falls back to the configured fallback category.
    pub fn categorize(&self, description: &str) -> &str {
        let haystack = description.to_uppercase();
        for (category, keywords) in &self.categorization {
            if keywords
                .iter()
                .any(|kw| !kw.is_empty() && haystack.contains(&kw.to_uppercase()))
            {
                return category;
            }
        }
        &self.fallback_category
    }
}

/// Fills in blank transaction categories from the keyword map.
///
/// Non-empty CSV categories are left untouched.
pub fn fill_missing_categories(transactions: &mut [Transaction], rules: &RuleSet) {
    for tx in transactions {
        if tx.category.is_empty() {
            tx.category = rules.categorize(&tx.description).to_string();
        }
    }
}
