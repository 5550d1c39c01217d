use crate::error::{Error, Result};
use crate::loan::PeriodEntry;
use crate::store::require_schema;
use log::info;
use rusqlite::{params, Connection, Row};

/// Stored schedules. A schedule is only ever replaced as a whole.
pub struct ScheduleRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ScheduleRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Swaps the stored schedule of loan `name` for `entries` in a single
    /// transaction. On any failure the previous schedule is left in place.
    pub fn replace(&self, name: &str, entries: &[PeriodEntry]) -> Result<()> {
        require_schema(self.conn)?;
        let tx = self.conn.unchecked_transaction()?;

        let known: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        if !known {
            return Err(Error::NotFound(format!("loan {name:?}")));
        }

        let removed = tx.execute("DELETE FROM schedule_entries WHERE loan_name = ?1", [name])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO schedule_entries (
                    loan_name, period_index, payment_date, payment_amount,
                    interest_portion, principal_portion, remaining_balance
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    name,
                    entry.period,
                    entry.payment_date,
                    entry.payment,
                    entry.interest,
                    entry.principal,
                    entry.remaining_balance,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "Stored {} periods for loan {} (replaced {})",
            entries.len(),
            name,
            removed
        );
        Ok(())
    }

    pub fn list(&self, name: &str) -> Result<Vec<PeriodEntry>> {
        require_schema(self.conn)?;
        let mut stmt = self.conn.prepare(
            "SELECT period_index, payment_date, payment_amount, interest_portion,
                    principal_portion, remaining_balance
             FROM schedule_entries
             WHERE loan_name = ?1
             ORDER BY period_index",
        )?;
        let entries = stmt
            .query_map([name], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if entries.is_empty() {
            return Err(Error::NotFound(format!("schedule for loan {name:?}")));
        }
        Ok(entries)
    }

    pub fn count(&self, name: &str) -> Result<usize> {
        require_schema(self.conn)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM schedule_entries WHERE loan_name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<PeriodEntry> {
    Ok(PeriodEntry {
        period: row.get(0)?,
        payment_date: row.get(1)?,
        payment: row.get(2)?,
        interest: row.get(3)?,
        principal: row.get(4)?,
        remaining_balance: row.get(5)?,
    })
}
