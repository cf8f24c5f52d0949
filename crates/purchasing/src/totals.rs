//! Cross-checks declared order totals against their line items.
//!
//! Nothing is corrected here: the caller learns which figures disagree and
//! decides what to do. Equality is exact on kobo.

use serde::{Deserialize, Serialize};

use storeline_core::Money;

/// One line as submitted. `quantity` and `unit_cost` are optional so that a
/// caller holding only line totals can still check the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsLine {
    pub total_cost: Money,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_cost: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsInput {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_amount: Money,
    pub items: Vec<TotalsLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsCheck {
    /// `total_amount == subtotal + tax + shipping`.
    pub total_matches: bool,
    /// `subtotal == sum(items.total_cost)`.
    pub items_match: bool,
    /// `None` when the sum overflowed.
    pub expected_total: Option<Money>,
    pub expected_subtotal: Option<Money>,
    /// 1-based positions of lines where `total_cost != quantity * unit_cost`.
    pub line_mismatches: Vec<usize>,
}

impl TotalsCheck {
    pub fn is_consistent(&self) -> bool {
        self.total_matches && self.items_match && self.line_mismatches.is_empty()
    }

    /// Human-readable form of every disagreement, for rule-violation lists.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.total_matches {
            out.push(match self.expected_total {
                Some(expected) => format!(
                    "Total amount does not equal subtotal + tax + shipping (expected {expected})"
                ),
                None => "Total amount could not be computed".to_string(),
            });
        }
        if !self.items_match {
            out.push(match self.expected_subtotal {
                Some(expected) => format!(
                    "Subtotal does not equal the sum of line totals (expected {expected})"
                ),
                None => "Subtotal could not be computed".to_string(),
            });
        }
        for line in &self.line_mismatches {
            out.push(format!(
                "Item {line}: line total does not equal quantity × unit cost"
            ));
        }
        out
    }
}

pub fn validate_totals(input: &TotalsInput) -> TotalsCheck {
    let expected_total = input
        .subtotal
        .checked_add(input.tax)
        .and_then(|m| m.checked_add(input.shipping));
    let expected_subtotal = Money::checked_sum(input.items.iter().map(|l| l.total_cost));

    let line_mismatches = input
        .items
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match (line.quantity, line.unit_cost) {
            (Some(qty), Some(unit)) if unit.checked_mul(qty) != Some(line.total_cost) => {
                Some(idx + 1)
            }
            _ => None,
        })
        .collect();

    TotalsCheck {
        total_matches: expected_total == Some(input.total_amount),
        items_match: expected_subtotal == Some(input.subtotal),
        expected_total,
        expected_subtotal,
        line_mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(total: i64) -> TotalsLine {
        TotalsLine {
            total_cost: Money::from_minor(total),
            quantity: None,
            unit_cost: None,
        }
    }

    #[test]
    fn consistent_totals_match_on_both_counts() {
        let input = TotalsInput {
            subtotal: Money::from_minor(1000),
            tax: Money::from_minor(50),
            shipping: Money::from_minor(25),
            total_amount: Money::from_minor(1075),
            items: vec![line(600), line(400)],
        };

        let check = validate_totals(&input);
        assert!(check.total_matches);
        assert!(check.items_match);
        assert!(check.is_consistent());
        assert!(check.violations().is_empty());
    }

    #[test]
    fn mismatched_grand_total_is_reported_not_fixed() {
        let input = TotalsInput {
            subtotal: Money::from_minor(1000),
            tax: Money::from_minor(50),
            shipping: Money::from_minor(25),
            total_amount: Money::from_minor(1070),
            items: vec![line(1000)],
        };

        let check = validate_totals(&input);
        assert!(!check.total_matches);
        assert!(check.items_match);
        assert_eq!(check.expected_total, Some(Money::from_minor(1075)));
        assert_eq!(
            check.violations(),
            vec!["Total amount does not equal subtotal + tax + shipping (expected ₦10.75)".to_string()]
        );
    }

    #[test]
    fn one_kobo_difference_in_subtotal_fails() {
        let input = TotalsInput {
            subtotal: Money::from_minor(1001),
            tax: Money::ZERO,
            shipping: Money::ZERO,
            total_amount: Money::from_minor(1001),
            items: vec![line(1000)],
        };
        let check = validate_totals(&input);
        assert!(check.total_matches);
        assert!(!check.items_match);
    }

    #[test]
    fn line_totals_are_checked_when_quantity_and_cost_given() {
        let input = TotalsInput {
            subtotal: Money::from_minor(2500),
            tax: Money::ZERO,
            shipping: Money::ZERO,
            total_amount: Money::from_minor(2500),
            items: vec![
                TotalsLine {
                    total_cost: Money::from_minor(1000),
                    quantity: Some(10),
                    unit_cost: Some(Money::from_minor(100)),
                },
                TotalsLine {
                    total_cost: Money::from_minor(1500),
                    quantity: Some(4),
                    unit_cost: Some(Money::from_minor(400)),
                },
            ],
        };
        let check = validate_totals(&input);
        assert_eq!(check.line_mismatches, vec![2]);
        assert!(!check.is_consistent());
    }

    #[test]
    fn overflow_never_matches() {
        let input = TotalsInput {
            subtotal: Money::from_minor(i64::MAX),
            tax: Money::from_minor(1),
            shipping: Money::ZERO,
            total_amount: Money::from_minor(i64::MIN),
            items: vec![line(i64::MAX)],
        };
        let check = validate_totals(&input);
        assert!(!check.total_matches);
        assert_eq!(check.expected_total, None);
        assert!(check.items_match);
    }

    proptest! {
        /// Property: `items_match` holds exactly when the line totals sum to
        /// the declared subtotal.
        #[test]
        fn items_match_iff_line_sum_equals_subtotal(
            totals in prop::collection::vec(0i64..10_000_000, 0..30),
            subtotal in 0i64..300_000_000,
        ) {
            let sum: i64 = totals.iter().sum();
            let input = TotalsInput {
                subtotal: Money::from_minor(subtotal),
                tax: Money::ZERO,
                shipping: Money::ZERO,
                total_amount: Money::from_minor(subtotal),
                items: totals.iter().map(|t| line(*t)).collect(),
            };
            let check = validate_totals(&input);
            prop_assert_eq!(check.items_match, sum == subtotal);
            prop_assert!(check.total_matches);
        }
    }
}
