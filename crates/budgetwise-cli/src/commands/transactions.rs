//! Transaction command implementations

use anyhow::Result;
use budgetwise_core::models::{TransactionInput, TransactionType};
use budgetwise_core::{BudgetStore, Session};
use chrono::Utc;

use super::{format_money, truncate, wait_for_write};
use crate::cli::TransactionArgs;

impl From<TransactionArgs> for TransactionInput {
    fn from(args: TransactionArgs) -> Self {
        TransactionInput {
            date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
            merchant: args.merchant,
            category: args.category,
            amount: args.amount,
            transaction_type: if args.income {
                TransactionType::Income
            } else {
                TransactionType::Expense
            },
        }
    }
}

pub fn cmd_transactions_list(store: &BudgetStore, session: &Session, limit: usize) -> Result<()> {
    let user_id = session.require_user()?;
    let transactions = store.transactions(session, user_id, Some(limit))?;

    if transactions.is_empty() {
        println!("No transactions found. Record one with:");
        println!("  budgetwise transactions add -a 12.50 -c Groceries -m \"Corner Market\"");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let amount_str = match tx.transaction_type {
            TransactionType::Expense => format!("\x1b[31m{}\x1b[0m", format_money(tx.amount)), // Red for expenses
            TransactionType::Income => format!("\x1b[32m+{}\x1b[0m", format_money(tx.amount)), // Green for income
        };

        println!(
            "   {} │ {:>20} │ {:<13} │ {}",
            tx.date,
            amount_str,
            tx.category,
            truncate(&tx.merchant, 30)
        );
        println!("     id: {}", tx.id);
    }

    Ok(())
}

pub async fn cmd_transactions_add(
    store: &BudgetStore,
    session: &Session,
    input: TransactionInput,
) -> Result<String> {
    let user_id = session.require_user()?;
    let mut events = store.subscribe();
    let ticket = store.add_transaction(session, user_id, input)?;
    let id = wait_for_write(ticket, &mut events).await?;

    println!("✅ Recorded transaction {}", id);
    Ok(id)
}

pub async fn cmd_transactions_update(
    store: &BudgetStore,
    session: &Session,
    id: &str,
    input: TransactionInput,
) -> Result<()> {
    let user_id = session.require_user()?;
    let mut events = store.subscribe();
    let ticket = store.update_transaction(session, user_id, id, input)?;
    wait_for_write(ticket, &mut events).await?;

    println!("✅ Updated transaction {}", id);
    Ok(())
}
