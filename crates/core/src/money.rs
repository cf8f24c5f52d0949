//! Naira amounts in exact integer minor units.

use serde::{Deserialize, Serialize};

/// Kobo per naira.
pub const MINOR_PER_MAJOR: i64 = 100;

/// An amount of money in kobo.
///
/// All totals comparisons are exact equality on this integer; there is no
/// rounding tolerance anywhere in the workspace.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(kobo: i64) -> Self {
        Self(kobo)
    }

    /// Whole naira. Used for thresholds and tests.
    pub const fn naira(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// `self * quantity`, e.g. unit cost times ordered quantity.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Sum a sequence of amounts, `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl core::fmt::Display for Money {
    /// `₦1,250` for whole amounts, `₦1,250.05` otherwise.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let abs = self.0.unsigned_abs();
        let major = abs / MINOR_PER_MAJOR as u64;
        let minor = abs % MINOR_PER_MAJOR as u64;

        if self.0 < 0 {
            f.write_str("-")?;
        }
        f.write_str("₦")?;
        f.write_str(&group_thousands(major))?;
        if minor != 0 {
            write!(f, ".{minor:02}")?;
        }
        Ok(())
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_formats_naira_with_grouping() {
        assert_eq!(Money::naira(100).to_string(), "₦100");
        assert_eq!(Money::naira(10_000_000).to_string(), "₦10,000,000");
        assert_eq!(Money::from_minor(125_005).to_string(), "₦1,250.05");
        assert_eq!(Money::from_minor(-50).to_string(), "-₦0.50");
        assert_eq!(Money::ZERO.to_string(), "₦0");
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor(107_500)).unwrap();
        assert_eq!(json, "107500");
    }

    #[test]
    fn checked_sum_reports_overflow() {
        assert_eq!(
            Money::checked_sum([Money::from_minor(i64::MAX), Money::from_minor(1)]),
            None
        );
        assert_eq!(
            Money::checked_sum([Money::naira(1), Money::naira(2)]),
            Some(Money::naira(3))
        );
    }

    proptest! {
        #[test]
        fn checked_sum_matches_wide_integer_sum(
            amounts in prop::collection::vec(0i64..1_000_000_000i64, 0..50)
        ) {
            let expected: i128 = amounts.iter().map(|a| *a as i128).sum();
            let sum = Money::checked_sum(amounts.into_iter().map(Money::from_minor)).unwrap();
            prop_assert_eq!(sum.minor() as i128, expected);
        }
    }
}
