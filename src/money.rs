use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::{fmt, ops, str::FromStr};

pub const MINOR_PER_MAJOR: i64 = 100;

const MINOR_DIGITS: u32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn from_major(major: Decimal) -> Result<Self> {
        major
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .and_then(|minor| round_half_up(minor).to_i64())
            .map(Money)
            .ok_or_else(|| Error::InvalidBalance(format!("{major} is out of range")))
    }

    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, MINOR_DIGITS)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Result<Money> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .ok_or_else(|| Error::InvalidBalance(format!("{self} + {rhs} overflows")))
    }

    pub fn checked_sub(self, rhs: Money) -> Result<Money> {
        self.0
            .checked_sub(rhs.0)
            .map(Money)
            .ok_or_else(|| Error::InvalidBalance(format!("{self} - {rhs} overflows")))
    }

    pub fn mul_rate(self, rate: Decimal) -> Result<Money> {
        let product = self
            .to_decimal()
            .checked_mul(rate)
            .ok_or_else(|| Error::InvalidRate(format!("{self} * {rate} overflows")))?;
        from_minor_decimal(product)
    }

    // truncates; the caller keeps the remainder
    pub fn split(self, parts: i64) -> Result<Money> {
        if parts <= 0 {
            return Err(Error::InvalidTerm(format!(
                "cannot split {self} into {parts} parts"
            )));
        }
        Ok(Money(self.0 / parts))
    }

    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }
}

pub fn from_minor_decimal(minor: Decimal) -> Result<Money> {
    round_half_up(minor)
        .to_i64()
        .map(Money)
        .ok_or_else(|| Error::InvalidBalance(format!("{minor} minor units is out of range")))
}

// round half up, the only rounding money ever gets
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

impl ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let major = Decimal::from_str(s.trim())
            .map_err(|e| Error::InvalidBalance(format!("{s:?}: {e}")))?;
        Money::from_major(major)
    }
}
