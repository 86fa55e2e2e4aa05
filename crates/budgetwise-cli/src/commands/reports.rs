//! Report command implementations (categories, summary, trend)

use anyhow::Result;
use budgetwise_core::categories::Category;
use budgetwise_core::{reports, BudgetStore, Session};

use super::{format_money, truncate};

pub fn cmd_categories() -> Result<()> {
    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────");
    for info in Category::registry() {
        let note = if info.budgetable { "" } else { " (income only)" };
        println!("   {:<18} {:<13}{}", info.icon, info.label, note);
    }
    Ok(())
}

pub fn cmd_summary(store: &BudgetStore, session: &Session, recent: usize) -> Result<()> {
    let user_id = session.require_user()?;
    let summary = reports::dashboard(store, session, user_id, recent)?;

    println!();
    println!("📊 Summary");
    println!("   ─────────────────────────────");
    println!("   Income:   {:>14}", format_money(summary.total_income));
    println!("   Expenses: {:>14}", format_money(summary.total_expenses));
    println!("   Balance:  {:>14}", format_money(summary.balance));

    if !summary.category_breakdown.is_empty() {
        println!();
        println!("   Spending by category");
        for row in &summary.category_breakdown {
            println!(
                "   {:<13} {:>14}  {:>5.1}%",
                row.category,
                format_money(row.amount),
                row.share_percent
            );
        }
    }

    if !summary.budgets.is_empty() {
        println!();
        println!("   Budgets");
        for b in &summary.budgets {
            let pct = b
                .utilization_percent
                .map(|p| format!("{:.0}%", p))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "   {:<13} {:>14} / {:<14} {}",
                b.budget.category,
                format_money(b.spent),
                format_money(b.budget.amount),
                pct
            );
        }
    }

    if !summary.recent_transactions.is_empty() {
        println!();
        println!("   Recent");
        for tx in &summary.recent_transactions {
            println!(
                "   {} │ {:>12} │ {}",
                tx.date,
                format_money(tx.amount),
                truncate(&tx.merchant, 30)
            );
        }
    }

    Ok(())
}

pub fn cmd_trend(store: &BudgetStore, session: &Session, months: usize) -> Result<()> {
    let user_id = session.require_user()?;
    let buckets = reports::trend(store, session, user_id, months)?;

    println!();
    println!("📈 Monthly Trend ({} months)", months);
    println!("   ─────────────────────────────────────────────");
    println!("   {:<9} {:>14} {:>14}", "Month", "Income", "Expenses");
    for bucket in buckets {
        println!(
            "   {:<9} {:>14} {:>14}",
            bucket.label,
            format_money(bucket.income),
            format_money(bucket.expenses)
        );
    }

    Ok(())
}
