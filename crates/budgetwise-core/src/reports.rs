//! Per-user reports
//!
//! Load a user's records through the store and run them through
//! [`crate::aggregation`]. Every report reads the full set; nothing is cached.

use chrono::{NaiveDate, Utc};

use crate::aggregation;
use crate::auth::Session;
use crate::error::Result;
use crate::models::{BudgetWithSpent, CategorySpending, DashboardSummary, MonthlyTrendBucket};
use crate::store::BudgetStore;

/// Totals, category spending, budgets and recent activity for one user
pub fn dashboard(
    store: &BudgetStore,
    session: &Session,
    user_id: &str,
    recent: usize,
) -> Result<DashboardSummary> {
    let transactions = store.transactions(session, user_id, None)?;
    let budgets = store.budgets(session, user_id)?;
    Ok(aggregation::summarize(&transactions, &budgets, recent))
}

/// Income and expenses for the last `months` calendar months, ending today
pub fn trend(
    store: &BudgetStore,
    session: &Session,
    user_id: &str,
    months: usize,
) -> Result<Vec<MonthlyTrendBucket>> {
    trend_as_of(store, session, user_id, months, Utc::now().date_naive())
}

pub fn trend_as_of(
    store: &BudgetStore,
    session: &Session,
    user_id: &str,
    months: usize,
    today: NaiveDate,
) -> Result<Vec<MonthlyTrendBucket>> {
    let transactions = store.transactions(session, user_id, None)?;
    Ok(aggregation::monthly_trend(&transactions, months, today))
}

pub fn spending(
    store: &BudgetStore,
    session: &Session,
    user_id: &str,
) -> Result<Vec<CategorySpending>> {
    let transactions = store.transactions(session, user_id, None)?;
    Ok(aggregation::category_breakdown(&transactions))
}

pub fn budgets(
    store: &BudgetStore,
    session: &Session,
    user_id: &str,
) -> Result<Vec<BudgetWithSpent>> {
    let transactions = store.transactions(session, user_id, None)?;
    let budgets = store.budgets(session, user_id)?;
    Ok(aggregation::budgets_with_spent(&transactions, &budgets))
}
