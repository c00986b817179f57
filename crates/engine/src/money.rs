use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as **integer cents**.
///
/// Every stored amount and every aggregate is kept in cents so that summing
/// the same rows twice always yields the same figure. Conversion to decimal
/// numbers happens once, at the API edge.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(amount.to_major(), 12.34);
/// ```
///
/// Transaction amounts come in as decimals and must be non-negative:
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!(MoneyCents::from_amount(10.5).unwrap().cents(), 1050);
/// assert_eq!(MoneyCents::from_amount(0.004).unwrap().cents(), 0);
/// assert!(MoneyCents::from_amount(-1.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts a decimal transaction amount into cents, rounding to the
    /// nearest cent.
    ///
    /// Rejects negative, NaN, infinite and out-of-range values.
    pub fn from_amount(amount: f64) -> ResultEngine<Self> {
        if !amount.is_finite() {
            return Err(EngineError::InvalidAmount(
                "amount must be a finite number".to_string(),
            ));
        }
        if amount < 0.0 {
            return Err(EngineError::InvalidAmount(
                "amount must be >= 0".to_string(),
            ));
        }
        let cents = (amount * 100.0).round();
        if cents >= i64::MAX as f64 {
            return Err(EngineError::InvalidAmount("amount too large".to_string()));
        }
        Ok(Self(cents as i64))
    }

    /// Decimal representation (e.g. `1050` cents → `10.5`).
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> MoneyCents {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> MoneyCents {
        MoneyCents(self.0 - rhs.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}
