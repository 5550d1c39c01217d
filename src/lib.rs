pub mod entries;
pub mod error;
pub mod loan;
pub mod loans;
pub mod money;
pub mod report;
pub mod schedule;
pub mod store;

pub use entries::ScheduleRepository;
pub use error::{Error, Result};
pub use loan::{Loan, PeriodEntry};
pub use loans::LoanRepository;
pub use money::Money;
pub use report::Report;
pub use schedule::generate;
pub use store::Store;
