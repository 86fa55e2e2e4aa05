//! User profile operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::UserProfile;

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let created_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;
    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

impl Database {
    /// Create or merge a user profile. A missing email keeps the stored one.
    pub fn upsert_user(&self, id: &str, email: Option<&str>, now: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        let now = now.to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO users (id, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(id) DO UPDATE SET
                email = COALESCE(excluded.email, users.email),
                updated_at = excluded.updated_at
            "#,
            params![id, email, now],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, email, created_at, updated_at FROM users WHERE id = ?",
                params![id],
                row_to_profile,
            )
            .optional()?;
        Ok(user)
    }

    /// All profiles, oldest signup first
    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, created_at, updated_at FROM users ORDER BY created_at, id",
        )?;
        let users = stmt
            .query_map([], row_to_profile)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }
}
