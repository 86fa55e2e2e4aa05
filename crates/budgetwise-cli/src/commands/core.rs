//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `open_store` - Shared utilities to open the database
//! - `wait_for_write` - Await a scheduled store write and surface its failure
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{bail, Context, Result};
use budgetwise_core::store::{StoreEvent, WriteTicket};
use budgetwise_core::{BudgetStore, Database};
use tokio::sync::broadcast::Receiver;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn open_store(db_path: &Path, no_encrypt: bool) -> Result<BudgetStore> {
    Ok(BudgetStore::new(open_db(db_path, no_encrypt)?))
}

/// Wait for a scheduled write; a rejected write becomes an error here
///
/// `events` must be subscribed before the write was scheduled.
pub async fn wait_for_write(ticket: WriteTicket, events: &mut Receiver<StoreEvent>) -> Result<String> {
    let id = ticket.id.clone();
    let path = ticket.path.clone();
    if ticket.persisted().await {
        return Ok(id);
    }

    while let Ok(event) = events.try_recv() {
        if let StoreEvent::Failed(failure) = event {
            if failure.path == path {
                bail!("Write to {} failed: {}", path, failure.message);
            }
        }
    }
    bail!("Write to {} was not persisted", path)
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    db.ping().context("Database is not readable")?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record spending: budgetwise transactions add -a 42.50 -c Groceries -m \"Corner Market\"");
    println!("  2. Set a budget: budgetwise budgets set Groceries 400");
    println!("  3. Start web UI: budgetwise serve");

    Ok(())
}
