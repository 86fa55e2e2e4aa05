//! Budget command implementations

use anyhow::Result;
use budgetwise_core::categories::Category;
use budgetwise_core::models::BudgetInput;
use budgetwise_core::{reports, BudgetStore, Session};
use rust_decimal::Decimal;

use super::{format_money, wait_for_write};

pub fn cmd_budgets_list(store: &BudgetStore, session: &Session) -> Result<()> {
    let user_id = session.require_user()?;
    let budgets = reports::budgets(store, session, user_id)?;

    if budgets.is_empty() {
        println!("No budgets set. Add one with:");
        println!("  budgetwise budgets set Groceries 400");
        return Ok(());
    }

    println!();
    println!("🎯 Budgets");
    println!("   ─────────────────────────────────────────────────────────────");

    for b in budgets {
        let utilization = match b.utilization_percent {
            Some(pct) if pct > Decimal::ONE_HUNDRED => format!("\x1b[31m{:.0}%\x1b[0m", pct),
            Some(pct) => format!("{:.0}%", pct),
            None => "n/a".to_string(),
        };
        println!(
            "   {} {:<13} {:>12} of {:>12}  {}",
            b.budget.category.icon(),
            b.budget.category,
            format_money(b.spent),
            format_money(b.budget.amount),
            utilization
        );
    }

    Ok(())
}

pub async fn cmd_budgets_set(
    store: &BudgetStore,
    session: &Session,
    category: Category,
    amount: Decimal,
) -> Result<()> {
    let user_id = session.require_user()?;
    let mut events = store.subscribe();
    let ticket = store.upsert_budget(session, user_id, BudgetInput { category, amount })?;
    wait_for_write(ticket, &mut events).await?;

    println!("✅ {} budget set to {}", category, format_money(amount));
    Ok(())
}
