use crate::entries::ScheduleRepository;
use crate::error::{Error, Result};
use crate::loan::{Loan, PeriodEntry};
use crate::loans::LoanRepository;
use crate::money::Money;
use crate::report::{self, Report};
use crate::schedule;
use log::info;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::path::Path;

const TABLES: [&str; 2] = ["loans", "schedule_entries"];

/// Creates the loan and schedule tables. Safe to run on an initialized file.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS loans (
            name            TEXT PRIMARY KEY NOT NULL,
            apr             TEXT NOT NULL,
            balance         INTEGER NOT NULL CHECK (balance > 0),
            term_years      INTEGER NOT NULL CHECK (term_years > 0),
            start_date      TEXT NOT NULL,
            created_at      DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS schedule_entries (
            loan_name           TEXT NOT NULL REFERENCES loans(name),
            period_index        INTEGER NOT NULL CHECK (period_index > 0),
            payment_date        TEXT NOT NULL,
            payment_amount      INTEGER NOT NULL,
            interest_portion    INTEGER NOT NULL,
            principal_portion   INTEGER NOT NULL,
            remaining_balance   INTEGER NOT NULL,
            PRIMARY KEY (loan_name, period_index)
        );
        COMMIT;",
    )?;
    Ok(())
}

/// Fails with `SchemaNotInitialized` unless both tables exist.
pub fn require_schema(conn: &Connection) -> Result<()> {
    let found: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2)",
        TABLES,
        |row| row.get(0),
    )?;
    if found as usize == TABLES.len() {
        Ok(())
    } else {
        Err(Error::SchemaNotInitialized)
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    // leaves the schema alone; see `init`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Opens `path`, creating the file and schema if needed.
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::open(path)?;
        store.setup()?;
        info!("Database {} initialized", path.display());
        Ok(store)
    }

    pub fn setup(&self) -> Result<()> {
        setup_database(&self.conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn loans(&self) -> LoanRepository<'_> {
        LoanRepository::new(&self.conn)
    }

    pub fn schedules(&self) -> ScheduleRepository<'_> {
        ScheduleRepository::new(&self.conn)
    }

    /// Stores a new loan with its schedule. The schedule is generated first, so
    /// an invalid loan never reaches the database.
    pub fn originate(&self, loan: &Loan) -> Result<Vec<PeriodEntry>> {
        let entries = schedule::generate(loan)?;
        self.loans().create(loan)?;
        self.schedules().replace(&loan.name, &entries)?;
        Ok(entries)
    }

    pub fn regenerate(&self, name: &str) -> Result<Vec<PeriodEntry>> {
        let loan = self.loans().get(name)?;
        let entries = schedule::generate(&loan)?;
        self.schedules().replace(name, &entries)?;
        Ok(entries)
    }

    pub fn report(&self, name: &str) -> Result<Report> {
        report::report(&self.loans(), &self.schedules(), name)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.minor_units()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money::from_minor)
    }
}

#[cfg(test)]
mod tests {
    use super::{require_schema, Store};
    use crate::error::Error;
    use crate::loan::Loan;
    use crate::money::Money;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use test_log::test;

    fn car() -> Loan {
        Loan::new(
            "car",
            dec!(4.5),
            Money::from_minor(500000),
            5,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn test_uninitialized_store() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            require_schema(store.connection()),
            Err(Error::SchemaNotInitialized)
        ));
        assert!(matches!(
            store.loans().exists("car"),
            Err(Error::SchemaNotInitialized)
        ));
        assert!(matches!(
            store.originate(&car()),
            Err(Error::SchemaNotInitialized)
        ));
        assert!(matches!(
            store.report("car"),
            Err(Error::SchemaNotInitialized)
        ));
    }

    #[test]
    fn test_setup_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();
        store.originate(&car()).unwrap();
        store.setup().unwrap();
        assert!(store.loans().exists("car").unwrap());
        assert_eq!(store.schedules().count("car").unwrap(), 60);
    }

    #[test]
    fn test_originate() {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();

        let entries = store.originate(&car()).unwrap();
        assert_eq!(entries.len(), 60);
        assert_eq!(store.loans().get("car").unwrap(), car());
        assert_eq!(store.schedules().list("car").unwrap(), entries);
    }

    #[test]
    fn test_originate_invalid_loan_writes_nothing() {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();

        let mut loan = car();
        loan.term_years = 0;
        let err = store.originate(&loan).unwrap_err();
        assert!(err.is_validation());
        assert!(!store.loans().exists("car").unwrap());
    }

    #[test]
    fn test_regenerate_recovers_missing_schedule() {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();

        // creation interrupted before the schedule was stored
        store.loans().create(&car()).unwrap();
        assert!(matches!(store.report("car"), Err(Error::NotFound(_))));

        let entries = store.regenerate("car").unwrap();
        assert_eq!(store.report("car").unwrap().entries, entries);

        assert!(matches!(
            store.regenerate("boat"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.db");

        let entries = {
            let store = Store::init(&path).unwrap();
            store.originate(&car()).unwrap()
        };

        let store = Store::open(&path).unwrap();
        let report = store.report("car").unwrap();
        assert_eq!(report.loan, car());
        assert_eq!(report.entries, entries);
    }

    #[test]
    fn test_open_does_not_create_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("fresh.db")).unwrap();
        assert!(matches!(
            store.loans().list(),
            Err(Error::SchemaNotInitialized)
        ));
    }
}
