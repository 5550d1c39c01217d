use crate::error::{Error, Result};
use crate::money::Money;
use crate::schedule::payment_date;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

// every schedule is monthly
pub const PERIODS_PER_YEAR: u32 = 12;

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodEntry {
    pub period: u32,
    pub payment_date: NaiveDate,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

impl PeriodEntry {
    pub fn new(
        period: u32,
        payment_date: NaiveDate,
        payment: Money,
        interest: Money,
        principal: Money,
        remaining_balance: Money,
    ) -> Self {
        Self {
            period,
            payment_date,
            payment,
            interest,
            principal,
            remaining_balance,
        }
    }
}

impl fmt::Display for PeriodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, date {}, payment ${}, interest paid ${}, principal paid ${}, ending balance ${}",
            self.period,
            self.payment_date,
            self.payment,
            self.interest,
            self.principal,
            self.remaining_balance
        )
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Loan {
    pub name: String,
    /// Annual percentage rate, `3.75` meaning 3.75%.
    pub apr: Decimal,
    pub balance: Money,
    pub term_years: u32,
    pub start_date: NaiveDate,
}

impl Loan {
    pub fn new(
        name: impl Into<String>,
        apr: Decimal,
        balance: Money,
        term_years: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            apr,
            balance,
            term_years,
            start_date,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.apr.is_sign_negative() && !self.apr.is_zero() {
            return Err(Error::InvalidRate(format!(
                "APR must not be negative, got {}",
                self.apr
            )));
        }
        if !self.balance.is_positive() {
            return Err(Error::InvalidBalance(format!(
                "balance must be positive, got {}",
                self.balance
            )));
        }
        if self.term_years == 0 {
            return Err(Error::InvalidTerm("term must be at least one year".into()));
        }
        payment_date(self.start_date, self.periods()?)?;
        Ok(())
    }

    pub fn periods(&self) -> Result<u32> {
        self.term_years
            .checked_mul(PERIODS_PER_YEAR)
            .ok_or_else(|| Error::InvalidTerm(format!("{} years is too long", self.term_years)))
    }

    pub fn periodic_rate(&self) -> Result<Decimal> {
        self.apr
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|r| r.checked_div(Decimal::from(PERIODS_PER_YEAR)))
            .ok_or_else(|| Error::InvalidRate(format!("APR {} is out of range", self.apr)))
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Balance = ${}, APR = {}%, Term = {} years, Start = {}",
            self.name, self.balance, self.apr, self.term_years, self.start_date
        )
    }
}
