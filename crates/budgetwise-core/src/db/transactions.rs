//! Transaction operations

use rusqlite::{params, Row};

use super::{parse_column, parse_datetime, Database};
use crate::error::Result;
use crate::models::Transaction;

const COLUMNS: &str =
    "id, user_id, date, merchant, category, amount, type, created_at, updated_at";

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_column(row, 2)?,
        merchant: row.get(3)?,
        category: parse_column(row, 4)?,
        amount: parse_column(row, 5)?,
        transaction_type: parse_column(row, 6)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

/// SQLite treats a negative LIMIT as "no limit"
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map(|l| l as i64).unwrap_or(-1)
}

impl Database {
    pub fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                COLUMNS
            ),
            params![
                tx.id,
                tx.user_id,
                tx.date.to_string(),
                tx.merchant,
                tx.category.as_str(),
                tx.amount.to_string(),
                tx.transaction_type.as_str(),
                tx.created_at.to_rfc3339(),
                tx.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite every user-editable field of an existing transaction.
    /// `created_at` is preserved. Returns false if there was nothing to replace.
    pub fn replace_transaction(&self, tx: &Transaction) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET date = ?, merchant = ?, category = ?, amount = ?, type = ?, updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
            params![
                tx.date.to_string(),
                tx.merchant,
                tx.category.as_str(),
                tx.amount.to_string(),
                tx.transaction_type.as_str(),
                tx.updated_at.to_rfc3339(),
                tx.user_id,
                tx.id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// One user's transactions, newest first
    pub fn list_transactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? \
             ORDER BY date DESC, created_at DESC LIMIT ?",
            COLUMNS
        ))?;
        let transactions = stmt
            .query_map(params![user_id, sql_limit(limit)], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Every user's transactions, newest first
    pub fn list_all_transactions(&self, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY date DESC, created_at DESC LIMIT ?",
            COLUMNS
        ))?;
        let transactions = stmt
            .query_map(params![sql_limit(limit)], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }
}
