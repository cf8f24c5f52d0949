//! Threshold checks applied to a purchase order before it is accepted.
//!
//! Every check runs; the result lists each failure so the caller can show
//! them all at once.

use serde::{Deserialize, Serialize};

use storeline_core::Money;

pub const MAX_ITEMS_PER_ORDER: usize = 100;
pub const MIN_ORDER_AMOUNT: Money = Money::naira(100);
pub const MAX_ORDER_AMOUNT: Money = Money::naira(10_000_000);
pub const MIN_ITEM_QUANTITY: i64 = 1;
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleItem {
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRulesInput {
    pub items: Vec<RuleItem>,
    pub total_amount: Money,
}

/// Returns one message per failed rule; empty means the payload is acceptable.
pub fn validate_business_rules(input: &OrderRulesInput) -> Vec<String> {
    let quantities: Vec<i64> = input.items.iter().map(|i| i.quantity).collect();
    check_business_rules(&quantities, input.total_amount)
}

/// Same checks as [`validate_business_rules`] over bare quantities.
pub fn check_business_rules(quantities: &[i64], total_amount: Money) -> Vec<String> {
    let mut violations = Vec::new();

    if quantities.len() > MAX_ITEMS_PER_ORDER {
        violations.push(format!(
            "Maximum {MAX_ITEMS_PER_ORDER} items allowed per order"
        ));
    }

    if total_amount < MIN_ORDER_AMOUNT {
        violations.push(format!("Minimum order amount is {MIN_ORDER_AMOUNT}"));
    }

    if total_amount > MAX_ORDER_AMOUNT {
        violations.push(format!("Maximum order amount is {MAX_ORDER_AMOUNT}"));
    }

    for (idx, quantity) in quantities.iter().enumerate() {
        if !(MIN_ITEM_QUANTITY..=MAX_ITEM_QUANTITY).contains(quantity) {
            violations.push(format!(
                "Item {}: quantity must be between {} and {}",
                idx + 1,
                grouped(MIN_ITEM_QUANTITY),
                grouped(MAX_ITEM_QUANTITY)
            ));
        }
    }

    violations
}

/// `10000` -> `"10,000"`, matching how amounts are written in messages.
fn grouped(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
