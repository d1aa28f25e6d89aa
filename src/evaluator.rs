//! Core guardrail evaluation.
//!
//! Aggregates transactions per rule scope over the current period and
//! compares totals against configured limits. Evaluation is total: every
//! rule yields exactly one result, in declaration order, even when no
//! transaction matches its scope.

use crate::config::{Period, RuleKind, RuleSet};
use crate::money::Money;
use crate::transaction::Transaction;
use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Inclusive date window covering one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    /// First day of the window
    pub start: NaiveDate,

    /// Last day of the window
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// Computes the window of the given period kind containing `as_of`.
    ///
    /// Monthly = calendar month, weekly = ISO week (Monday through Sunday),
    /// yearly = calendar year.
    pub fn containing(period: Period, as_of: NaiveDate) -> Self {
        match period {
            Period::Monthly => {
                let start = NaiveDate::from_ymd_opt(as_of.year(), as_of.month(), 1)
                    .expect("first of month is valid");
                let next_month = if as_of.month() == 12 {
                    NaiveDate::from_ymd_opt(as_of.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(as_of.year(), as_of.month() + 1, 1)
                }
                .expect("first of month is valid");
                PeriodWindow {
                    start,
                    end: next_month.pred_opt().expect("day before a first-of-month"),
                }
            }
            Period::Weekly => {
                let monday =
                    as_of - Duration::days(as_of.weekday().num_days_from_monday() as i64);
                PeriodWindow {
                    start: monday,
                    end: monday + Duration::days(6),
                }
            }
            Period::Yearly => PeriodWindow {
                start: NaiveDate::from_ymd_opt(as_of.year(), 1, 1).expect("Jan 1 is valid"),
                end: NaiveDate::from_ymd_opt(as_of.year(), 12, 31).expect("Dec 31 is valid"),
            },
        }
    }

    /// Returns `true` if the date falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Verdict for one rule. Created fresh per run; never persisted.
///
/// `actual` is the signed net total for the scope within the period
/// (refunds offset spend). `margin` is the headroom before breach, so
/// `breached` holds exactly when `margin` is negative.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    /// Scope of the rule that produced this result
    pub scope: String,

    /// Rule kind
    pub kind: RuleKind,

    /// Rule period
    pub period: Period,

    /// Configured threshold
    pub limit: Money,

    /// Signed net total of matching transactions
    pub actual: Money,

    /// Headroom before breach; negative when breached
    pub margin: Money,

    /// Whether the rule's condition is violated
    pub breached: bool,
}

/// Expense total in a category no rule watches.
#[derive(Debug, Clone, Serialize)]
pub struct UnbudgetedSpend {
    /// Category label
    pub category: String,

    /// Expense magnitude within the current month
    pub spent: Money,
}

/// Output of one evaluation run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// One result per rule, declaration order
    pub results: Vec<EvaluationResult>,

    /// Current-month expense totals for categories without a rule,
    /// largest first
    pub unbudgeted: Vec<UnbudgetedSpend>,

    /// Date anchoring all period windows
    pub as_of: NaiveDate,
}

impl Evaluation {
    /// Returns `true` if any rule breached.
    pub fn any_breached(&self) -> bool {
        self.results.iter().any(|r| r.breached)
    }
}

/// Evaluates every rule against the transactions, anchored at `as_of`.
pub fn evaluate(transactions: &[Transaction], rules: &RuleSet, as_of: NaiveDate) -> Evaluation {
    let mut results = Vec::with_capacity(rules.rules().len());

    for rule in rules.rules() {
        let window = PeriodWindow::containing(rule.period, as_of);

        let actual = transactions
            .iter()
            .filter(|tx| tx.category == rule.scope && window.contains(tx.date))
            .fold(Money::ZERO, |acc, tx| acc + tx.amount);

        // Strict inequalities: hitting a limit exactly is not a breach.
        let (margin, breached) = match rule.kind {
            RuleKind::SpendingCap => {
                let spent = if actual.is_negative() {
                    actual.abs()
                } else {
                    Money::ZERO
                };
                (rule.limit - spent, spent > rule.limit)
            }
            RuleKind::SavingsMinimum => (actual - rule.limit, actual < rule.limit),
        };

        debug!(
            "Rule '{}' ({}): actual {} vs limit {}, margin {}{}",
            rule.scope,
            rule.kind,
            actual,
            rule.limit,
            margin,
            if breached { " BREACHED" } else { "" }
        );

        results.push(EvaluationResult {
            scope: rule.scope.clone(),
            kind: rule.kind,
            period: rule.period,
            limit: rule.limit,
            actual,
            margin,
            breached,
        });
    }

    Evaluation {
        results,
        unbudgeted: unbudgeted_spend(transactions, rules, as_of),
        as_of,
    }
}

/// Collects current-month expense totals for categories without a rule.
fn unbudgeted_spend(
    transactions: &[Transaction],
    rules: &RuleSet,
    as_of: NaiveDate,
) -> Vec<UnbudgetedSpend> {
    let window = PeriodWindow::containing(Period::Monthly, as_of);

    let mut by_category: BTreeMap<&str, Money> = BTreeMap::new();
    for tx in transactions {
        if !tx.amount.is_negative()
            || !window.contains(tx.date)
            || rules.has_scope(&tx.category)
        {
            continue;
        }
        let entry = by_category.entry(tx.category.as_str()).or_insert(Money::ZERO);
        *entry += tx.amount.abs();
    }

    let mut spend: Vec<UnbudgetedSpend> = by_category
        .into_iter()
        .map(|(category, spent)| UnbudgetedSpend {
            category: category.to_string(),
            spent,
        })
        .collect();
    // stable sort: ties stay in category name order
    spend.sort_by(|a, b| b.spent.cmp(&a.spent));
    spend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn tx(d: &str, category: &str, amount: &str) -> Transaction {
        Transaction {
            date: date(d),
            category: category.to_string(),
            amount: money(amount),
            description: String::new(),
        }
    }

    fn rules(yaml: &str) -> RuleSet {
        RuleSet::from_str(yaml).unwrap()
    }

    const AS_OF: &str = "2026-08-15";

    #[test]
    fn test_spending_cap_under_limit() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 100, type: spending-cap}\n",
        );
        let txs = vec![tx("2026-08-03", "Food", "-50"), tx("2026-08-10", "Food", "-30")];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        let r = &eval.results[0];
        assert_eq!(r.actual, money("-80"));
        assert!(!r.breached);
        assert_eq!(r.margin, money("20"));
    }

    #[test]
    fn test_spending_cap_breached() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 70, type: spending-cap}\n",
        );
        let txs = vec![tx("2026-08-03", "Food", "-50"), tx("2026-08-10", "Food", "-30")];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        let r = &eval.results[0];
        assert_eq!(r.actual, money("-80"));
        assert!(r.breached);
        assert_eq!(r.margin, money("-10"));
    }

    #[test]
    fn test_spending_exactly_at_limit_is_not_breached() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 80, type: spending-cap}\n",
        );
        let txs = vec![tx("2026-08-03", "Food", "-80")];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        assert!(!eval.results[0].breached);
        assert_eq!(eval.results[0].margin, money("0"));
    }

    #[test]
    fn test_refunds_offset_spend() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 60, type: spending-cap}\n",
        );
        let txs = vec![
            tx("2026-08-03", "Food", "-80"),
            tx("2026-08-05", "Food", "25"),
        ];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        let r = &eval.results[0];
        assert_eq!(r.actual, money("-55"));
        assert!(!r.breached);
    }

    #[test]
    fn test_refund_dominated_scope_never_breaches_cap() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 10, type: spending-cap}\n",
        );
        let txs = vec![
            tx("2026-08-03", "Food", "-20"),
            tx("2026-08-05", "Food", "50"),
        ];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        let r = &eval.results[0];
        assert_eq!(r.actual, money("30"));
        assert!(!r.breached);
        // no spend magnitude, so the full limit is headroom
        assert_eq!(r.margin, money("10"));
    }

    #[test]
    fn test_no_matching_transactions_yields_zero_result() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 100, type: spending-cap}\n  - {scope: Savings, limit: 200, type: savings-minimum}\n",
        );

        let eval = evaluate(&[], &rules, date(AS_OF));
        assert_eq!(eval.results.len(), 2);

        let cap = &eval.results[0];
        assert_eq!(cap.actual, Money::ZERO);
        assert!(!cap.breached);

        // a savings minimum with no deposits is breached against zero
        let min = &eval.results[1];
        assert_eq!(min.actual, Money::ZERO);
        assert!(min.breached);
        assert_eq!(min.margin, money("-200"));
    }

    #[test]
    fn test_savings_minimum_met_and_exact() {
        let rules = rules(
            "rules:\n  - {scope: Savings, limit: 500, type: savings-minimum}\n",
        );

        let met = vec![tx("2026-08-01", "Savings", "650")];
        let eval = evaluate(&met, &rules, date(AS_OF));
        assert!(!eval.results[0].breached);
        assert_eq!(eval.results[0].margin, money("150"));

        let exact = vec![tx("2026-08-01", "Savings", "500")];
        let eval = evaluate(&exact, &rules, date(AS_OF));
        assert!(!eval.results[0].breached);
    }

    #[test]
    fn test_sum_is_order_independent() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 100, type: spending-cap}\n",
        );
        let forward = vec![
            tx("2026-08-03", "Food", "-50"),
            tx("2026-08-10", "Food", "-30"),
            tx("2026-08-12", "Food", "15"),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let a = evaluate(&forward, &rules, date(AS_OF));
        let b = evaluate(&backward, &rules, date(AS_OF));
        assert_eq!(a.results[0].actual, b.results[0].actual);
        assert_eq!(a.results[0].actual, money("-65"));
    }

    #[test]
    fn test_transactions_outside_period_ignored() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 40, type: spending-cap}\n",
        );
        let txs = vec![
            tx("2026-07-31", "Food", "-100"),
            tx("2026-08-03", "Food", "-30"),
            tx("2026-09-01", "Food", "-100"),
        ];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        assert_eq!(eval.results[0].actual, money("-30"));
        assert!(!eval.results[0].breached);
    }

    #[test]
    fn test_results_follow_declaration_order() {
        let rules = rules(
            "rules:\n  - {scope: Zoo, limit: 10, type: spending-cap}\n  - {scope: Art, limit: 10, type: spending-cap}\n",
        );

        let eval = evaluate(&[], &rules, date(AS_OF));
        assert_eq!(eval.results[0].scope, "Zoo");
        assert_eq!(eval.results[1].scope, "Art");
    }

    #[test]
    fn test_monthly_window_bounds() {
        let w = PeriodWindow::containing(Period::Monthly, date("2026-02-10"));
        assert_eq!(w.start, date("2026-02-01"));
        assert_eq!(w.end, date("2026-02-28"));

        let dec = PeriodWindow::containing(Period::Monthly, date("2026-12-05"));
        assert_eq!(dec.end, date("2026-12-31"));
    }

    #[test]
    fn test_weekly_window_is_iso_week() {
        // 2026-08-15 is a Saturday
        let w = PeriodWindow::containing(Period::Weekly, date("2026-08-15"));
        assert_eq!(w.start, date("2026-08-10"));
        assert_eq!(w.end, date("2026-08-16"));
    }

    #[test]
    fn test_yearly_window_bounds() {
        let w = PeriodWindow::containing(Period::Yearly, date("2026-08-15"));
        assert_eq!(w.start, date("2026-01-01"));
        assert_eq!(w.end, date("2026-12-31"));
    }

    #[test]
    fn test_unbudgeted_spend_listing() {
        let rules = rules(
            "rules:\n  - {scope: Food, limit: 100, type: spending-cap}\n",
        );
        let txs = vec![
            tx("2026-08-03", "Food", "-50"),
            tx("2026-08-04", "Hobby", "-120"),
            tx("2026-08-05", "Pets", "-40"),
            tx("2026-08-06", "Pets", "-15"),
            tx("2026-08-07", "Gift", "30"), // income, not spend
        ];

        let eval = evaluate(&txs, &rules, date(AS_OF));
        let cats: Vec<(&str, String)> = eval
            .unbudgeted
            .iter()
            .map(|u| (u.category.as_str(), u.spent.to_string()))
            .collect();
        assert_eq!(
            cats,
            vec![("Hobby", "120.00".to_string()), ("Pets", "55.00".to_string())]
        );
    }
}
