//! Status command implementation

use std::path::Path;

use anyhow::Result;
use budgetwise_core::db::DB_KEY_ENV;
use budgetwise_core::{AIClient, ServiceState, StatusReport};

use super::{open_db, JWT_SECRET_ENV};

pub async fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 BudgetWise Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if !db_path.exists() {
        println!();
        println!("   Run 'budgetwise init' to create the database.");
        println!();
        return Ok(());
    }

    let db = match open_db(db_path, no_encrypt) {
        Ok(db) => db,
        Err(e) => {
            println!();
            println!("   ❌ Error opening database: {}", e);
            if !no_encrypt && !has_key {
                println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
            } else if has_key {
                println!("      (Check if {} is correct)", DB_KEY_ENV);
            }
            println!();
            return Ok(());
        }
    };

    let ai = AIClient::from_env();
    let auth_enabled = std::env::var(JWT_SECRET_ENV).is_ok();
    let report = StatusReport::collect(&db, ai.as_ref(), auth_enabled).await;

    println!();
    println!("   Services");
    for service in &report.services {
        let marker = match service.status {
            ServiceState::Operational => "✅",
            ServiceState::Degraded => "⚠️ ",
        };
        match &service.detail {
            Some(detail) => println!("   {} {:<24} {}", marker, service.name, detail),
            None => println!("   {} {}", marker, service.name),
        }
    }

    println!();
    if report.all_operational() {
        println!("   All systems operational");
    } else {
        println!("   Some services are degraded");
    }
    println!();

    Ok(())
}
