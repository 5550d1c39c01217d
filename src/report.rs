use crate::entries::ScheduleRepository;
use crate::error::Result;
use crate::loan::{Loan, PeriodEntry};
use crate::loans::LoanRepository;
use crate::money::Money;

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    pub loan: Loan,
    pub entries: Vec<PeriodEntry>,
}

impl Report {
    /// The regular monthly payment; the final period may differ.
    pub fn level_payment(&self) -> Money {
        self.entries.first().map_or(Money::ZERO, |e| e.payment)
    }

    pub fn total_interest(&self) -> Money {
        self.entries.iter().map(|e| e.interest).sum()
    }

    pub fn total_principal(&self) -> Money {
        self.entries.iter().map(|e| e.principal).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.entries.iter().map(|e| e.payment).sum()
    }
}

/// Reads loan `name` and its schedule. Either one missing is `NotFound`.
pub fn report(
    loans: &LoanRepository<'_>,
    schedules: &ScheduleRepository<'_>,
    name: &str,
) -> Result<Report> {
    let loan = loans.get(name)?;
    let entries = schedules.list(name)?;
    Ok(Report { loan, entries })
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::loan::Loan;
    use crate::money::Money;
    use crate::store::Store;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use test_log::test;

    #[test]
    fn test_report_totals() {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();
        let loan = Loan::new(
            "house",
            dec!(3.75),
            Money::from_minor(213100),
            30,
            NaiveDate::from_ymd_opt(2016, 4, 1).unwrap(),
        );
        store.originate(&loan).unwrap();

        let report = store.report("house").unwrap();
        assert_eq!(report.loan, loan);
        assert_eq!(report.entries.len(), 360);
        assert_eq!(report.level_payment(), Money::from_minor(987));
        assert_eq!(report.total_principal(), Money::from_minor(213100));
        assert_eq!(report.total_interest(), Money::from_minor(142159));
        assert_eq!(report.total_paid(), Money::from_minor(355259));
    }

    #[test]
    fn test_report_not_found() {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();
        assert!(matches!(store.report("ghost"), Err(Error::NotFound(_))));
    }
}
