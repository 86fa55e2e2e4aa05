//! Admin command implementations

use anyhow::Result;
use budgetwise_core::{admin, BudgetStore, Session};

use super::{format_money, truncate};

pub fn cmd_admin_overview(store: &BudgetStore, session: &Session) -> Result<()> {
    let overview = admin::overview(store, session)?;

    println!();
    println!("🛡️  Platform Overview");
    println!("   ─────────────────────────────");
    println!("   Users:        {}", overview.total_users);
    println!("   Transactions: {}", overview.total_transactions);
    println!("   Income:       {}", format_money(overview.total_income));
    println!("   Expenses:     {}", format_money(overview.total_expenses));

    Ok(())
}

pub fn cmd_admin_users(store: &BudgetStore, session: &Session) -> Result<()> {
    let users = admin::user_summaries(store, session)?;

    if users.is_empty() {
        println!("No users yet.");
        return Ok(());
    }

    println!();
    println!("👥 Users");
    println!("   ─────────────────────────────────────────────────────────────");
    for user in users {
        println!(
            "   {:<20} {:<24} {:>4} tx │ {:>12} in │ {:>12} out │ {:>12}",
            truncate(&user.id, 20),
            truncate(user.email.as_deref().unwrap_or("-"), 24),
            user.transaction_count,
            format_money(user.total_income),
            format_money(user.total_expenses),
            format_money(user.balance)
        );
    }

    Ok(())
}
