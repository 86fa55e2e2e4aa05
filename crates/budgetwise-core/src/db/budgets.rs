//! Budget operations

use rusqlite::{params, Row};

use super::{parse_column, parse_datetime, Database};
use crate::categories::Category;
use crate::error::Result;
use crate::models::Budget;

fn row_to_budget(row: &Row<'_>) -> rusqlite::Result<Budget> {
    let category: Category = parse_column(row, 1)?;
    let updated_at: String = row.get(3)?;
    Ok(Budget {
        id: category.as_str().to_string(),
        user_id: row.get(0)?,
        category,
        amount: parse_column(row, 2)?,
        updated_at: parse_datetime(&updated_at),
    })
}

impl Database {
    /// Create or replace the budget for `budget.category`
    pub fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, category, amount, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, category) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
            "#,
            params![
                budget.user_id,
                budget.category.as_str(),
                budget.amount.to_string(),
                budget.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// One user's budgets, by category name
    pub fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, category, amount, updated_at FROM budgets \
             WHERE user_id = ? ORDER BY category",
        )?;
        let budgets = stmt
            .query_map(params![user_id], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }
}
