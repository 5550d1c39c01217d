use crate::error::{Error, Result};
use crate::loan::{Loan, PeriodEntry};
use crate::money::{from_minor_decimal, Money};
use chrono::{Months, NaiveDate};
use log::{debug, trace};
use rust_decimal::{Decimal, MathematicalOps};

pub fn generate(loan: &Loan) -> Result<Vec<PeriodEntry>> {
    loan.validate()?;
    let rate = loan.periodic_rate()?;
    let periods = loan.periods()?;
    debug!(
        "generating {} periods for {} at monthly rate {}",
        periods, loan.name, rate
    );
    amortize(loan.balance, rate, periods, loan.start_date)
}

/// Level payment for `principal` over `periods`. At a zero rate the split is
/// truncated and the last period absorbs the remainder.
pub fn level_payment(principal: Money, periodic_rate: Decimal, periods: u32) -> Result<Money> {
    if periods == 0 {
        return Err(Error::InvalidTerm("a schedule needs at least one period".into()));
    }
    if periodic_rate.is_zero() {
        return principal.split(i64::from(periods));
    }
    if periodic_rate.is_sign_negative() {
        return Err(Error::InvalidRate(format!(
            "periodic rate must not be negative, got {periodic_rate}"
        )));
    }

    let growth = (Decimal::ONE + periodic_rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| {
            Error::InvalidRate(format!("(1 + {periodic_rate})^{periods} is out of range"))
        })?;
    let out_of_range =
        || Error::InvalidRate(format!("payment at rate {periodic_rate} is out of range"));
    let payment = principal
        .to_decimal()
        .checked_mul(periodic_rate)
        .and_then(|p| p.checked_mul(growth))
        .and_then(|p| p.checked_div(growth - Decimal::ONE))
        .ok_or_else(out_of_range)?;
    from_minor_decimal(payment)
}

pub fn amortize(
    principal: Money,
    periodic_rate: Decimal,
    periods: u32,
    start: NaiveDate,
) -> Result<Vec<PeriodEntry>> {
    if !principal.is_positive() {
        return Err(Error::InvalidBalance(format!(
            "principal must be positive, got {principal}"
        )));
    }
    let payment = level_payment(principal, periodic_rate, periods)?;
    // every payment date must exist before anything is allocated
    payment_date(start, periods)?;
    debug!("level payment {} over {} periods", payment, periods);

    let mut schedule = Vec::with_capacity(periods as usize);
    let mut remaining = principal;
    for period in 1..=periods {
        let interest = remaining.mul_rate(periodic_rate)?;
        let principal_paid = if period == periods {
            remaining
        } else {
            // rounded-up payment can retire a tiny balance early
            payment.checked_sub(interest)?.min(remaining)
        };
        let paid = principal_paid.checked_add(interest)?;
        remaining = remaining.checked_sub(principal_paid)?;
        let date = payment_date(start, period)?;

        trace!(
            "pmt # {}, date {}, interest {}, principal {}, end bal {}",
            period,
            date,
            interest,
            principal_paid,
            remaining
        );
        schedule.push(PeriodEntry::new(
            period,
            date,
            paid,
            interest,
            principal_paid,
            remaining,
        ));
    }
    Ok(schedule)
}

// measured from start so a clamped short month doesn't stick
pub fn payment_date(start: NaiveDate, period: u32) -> Result<NaiveDate> {
    start
        .checked_add_months(Months::new(period))
        .ok_or_else(|| Error::InvalidTerm(format!("{start} + {period} months is out of range")))
}
