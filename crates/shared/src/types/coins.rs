//! Wallet currency amounts.
//!
//! Amounts are integers in the smallest currency unit. No fractional values,
//! no floating point.

use serde::{Deserialize, Serialize};

/// An amount of wallet currency in the smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(pub i64);

impl Coins {
    /// Zero coins.
    pub const ZERO: Self = Self(0);

    /// Returns the raw amount.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtracts `other`, `None` if the result would be negative or overflow.
    #[must_use]
    pub const fn checked_debit(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) if v >= 0 => Some(Self(v)),
            _ => None,
        }
    }
}

impl From<i64> for Coins {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl std::iter::Sum for Coins {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|c| c.0).sum())
    }
}

impl std::fmt::Display for Coins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_debit_never_goes_negative() {
        assert_eq!(Coins(500).checked_debit(Coins(200)), Some(Coins(300)));
        assert_eq!(Coins(500).checked_debit(Coins(500)), Some(Coins::ZERO));
        assert_eq!(Coins(500).checked_debit(Coins(600)), None);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(Coins(1).checked_add(Coins(2)), Some(Coins(3)));
        assert_eq!(Coins(i64::MAX).checked_add(Coins(1)), None);
    }

    #[test]
    fn test_sum_and_display() {
        let total: Coins = [Coins(100), Coins(250), Coins(5)].into_iter().sum();
        assert_eq!(total, Coins(355));
        assert_eq!(total.to_string(), "355");
        assert!(total.is_positive());
        assert!(!Coins::ZERO.is_positive());
    }
}
