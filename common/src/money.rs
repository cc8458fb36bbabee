//! [`Money`]-related definitions.

use std::{fmt, iter::Sum, ops, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Amount of money in the smallest currency unit.
///
/// Monetary values are kept as plain integers: no fractional amounts can
/// exist, so no floating point arithmetic is ever involved.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct Money(i64);

impl Money {
    /// [`Money`] amount of zero.
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Money`] amount, if the provided `amount` is
    /// non-negative.
    #[must_use]
    pub fn new(amount: i64) -> Option<Self> {
        (amount >= 0).then_some(Self(amount))
    }

    /// Returns this [`Money`] amount as an [`i64`].
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Money {
    /// Formats this [`Money`] amount as `¥{amount}` with thousands groups
    /// separated by commas.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "{}¥{grouped}", if self.0 < 0 { "-" } else { "" })
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix('¥').unwrap_or(s);
        let amount = s
            .replace(',', "")
            .parse::<i64>()
            .map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

impl From<u32> for Money {
    fn from(amount: u32) -> Self {
        Self(amount.into())
    }
}

impl ops::Add for Money {
    type Output = Self;

    /// Saturates at [`i64::MAX`] instead of overflowing.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl ops::Mul<u32> for Money {
    type Output = Self;

    /// Saturates at [`i64::MAX`] instead of overflowing.
    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(rhs.into()))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Money;

    #[test]
    fn new_rejects_negative() {
        assert_eq!(Money::new(0), Some(Money::ZERO));
        assert_eq!(Money::new(480).map(Money::as_i64), Some(480));
        assert_eq!(Money::new(-1), None);
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("480").unwrap().as_i64(), 480);
        assert_eq!(Money::from_str("¥1,280").unwrap().as_i64(), 1280);
        assert!(Money::from_str("12.5").is_err());
        assert!(Money::from_str("-480").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::new(480).unwrap().to_string(), "¥480");
        assert_eq!(Money::new(1280).unwrap().to_string(), "¥1,280");
        assert_eq!(Money::new(1_234_567).unwrap().to_string(), "¥1,234,567");
        assert_eq!(Money::ZERO.to_string(), "¥0");
    }

    #[test]
    fn arithmetic() {
        let price = Money::new(480).unwrap();
        assert_eq!((price * 3).as_i64(), 1440);
        assert_eq!((price + Money::new(20).unwrap()).as_i64(), 500);
        assert_eq!(
            [price, price * 2].into_iter().sum::<Money>().as_i64(),
            1440,
        );
    }

    #[test]
    fn arithmetic_saturates_instead_of_overflowing() {
        let max = Money::new(i64::MAX).unwrap();
        assert_eq!(max + Money::new(1).unwrap(), max);
        assert_eq!(max * 2, max);
        assert_eq!([max, max].into_iter().sum::<Money>(), max);
    }
}
