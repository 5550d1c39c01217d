use crate::error::{Error, Result};
use crate::loan::Loan;
use crate::store::require_schema;
use log::info;
use rusqlite::types::Type;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

const SELECT_LOAN: &str = "SELECT name, apr, balance, term_years, start_date FROM loans";

/// Append-only storage of loan definitions.
pub struct LoanRepository<'c> {
    conn: &'c Connection,
}

impl<'c> LoanRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Inserts `loan`; fails with `DuplicateLoan` if the name is taken.
    pub fn create(&self, loan: &Loan) -> Result<()> {
        require_schema(self.conn)?;
        loan.validate()?;

        let res = self.conn.execute(
            "INSERT INTO loans (name, apr, balance, term_years, start_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                loan.name,
                loan.apr.to_string(),
                loan.balance,
                loan.term_years,
                loan.start_date,
            ],
        );

        match res {
            Ok(_) => {
                info!("Added loan: {}", loan.name);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(Error::DuplicateLoan(loan.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, name: &str) -> Result<Loan> {
        require_schema(self.conn)?;
        self.conn
            .query_row(
                &format!("{SELECT_LOAN} WHERE name = ?1"),
                [name],
                loan_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("loan {name:?}")))
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        require_schema(self.conn)?;
        let found: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    pub fn list(&self) -> Result<Vec<Loan>> {
        require_schema(self.conn)?;
        let mut stmt = self.conn.prepare(&format!("{SELECT_LOAN} ORDER BY name"))?;
        let loans = stmt
            .query_map([], loan_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(loans)
    }
}

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    let apr: String = row.get(1)?;
    let apr = Decimal::from_str(&apr)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(Loan {
        name: row.get(0)?,
        apr,
        balance: row.get(2)?,
        term_years: row.get(3)?,
        start_date: row.get(4)?,
    })
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

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.setup().unwrap();
        store
    }

    fn loan(name: &str) -> Loan {
        Loan::new(
            name,
            dec!(3.75),
            Money::from_minor(213100),
            30,
            NaiveDate::from_ymd_opt(2016, 4, 1).unwrap(),
        )
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let loans = store.loans();

        assert!(!loans.exists("house").unwrap());
        loans.create(&loan("house")).unwrap();
        assert!(loans.exists("house").unwrap());
        assert_eq!(loans.get("house").unwrap(), loan("house"));
    }

    #[test]
    fn test_apr_round_trips_exactly() {
        let store = store();
        let mut odd = loan("odd");
        odd.apr = dec!(6.125);
        store.loans().create(&odd).unwrap();
        assert_eq!(store.loans().get("odd").unwrap().apr, dec!(6.125));
    }

    #[test]
    fn test_duplicate_loan() {
        let store = store();
        let loans = store.loans();
        loans.create(&loan("house")).unwrap();

        let mut other = loan("house");
        other.apr = dec!(9.9);
        assert!(matches!(
            loans.create(&other),
            Err(Error::DuplicateLoan(name)) if name == "house"
        ));
        assert_eq!(loans.get("house").unwrap().apr, dec!(3.75));
    }

    #[test]
    fn test_not_found() {
        let store = store();
        assert!(matches!(
            store.loans().get("nothing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_loan_rejected_before_insert() {
        let store = store();
        let mut bad = loan("bad");
        bad.balance = Money::ZERO;
        assert!(matches!(
            store.loans().create(&bad),
            Err(Error::InvalidBalance(_))
        ));
        assert!(!store.loans().exists("bad").unwrap());
    }

    #[test]
    fn test_list_is_ordered_by_name() {
        let store = store();
        for name in ["truck", "house", "boat"] {
            store.loans().create(&loan(name)).unwrap();
        }
        let names: Vec<String> = store
            .loans()
            .list()
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, ["boat", "house", "truck"]);
    }
}
