//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `admin` - Cross-user overview and user table
//! - `budgets` - Budget commands (list, set)
//! - `core` - Core commands (init) and shared utilities (open_db, open_store)
//! - `forecast` - Spending forecast
//! - `reports` - Categories, summary and trend
//! - `serve` - Web server command
//! - `status` - Database and service status
//! - `transactions` - Transaction commands (list, add, update)

pub mod admin;
pub mod budgets;
pub mod core;
pub mod forecast;
pub mod reports;
pub mod serve;
pub mod status;
pub mod transactions;

// Re-export command functions for main.rs
pub use admin::*;
pub use budgets::*;
pub use core::*;
pub use forecast::*;
pub use reports::*;
pub use serve::*;
pub use status::*;
pub use transactions::*;

use rust_decimal::Decimal;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// `$1,234.50` style amount
pub fn format_money(amount: Decimal) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, grouped, cents)
}
