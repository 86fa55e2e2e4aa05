//! Aggregation engine
//!
//! Pure functions over one user's transactions and budgets (or, for the
//! admin views, over everyone's). Nothing here touches the store: callers
//! load the records and pass them in, so running the same inputs twice
//! always yields the same output.
//!
//! Sums use decimal arithmetic and are never rounded here; formatting is up
//! to the presentation layer. Totals saturate at the `Decimal` bounds rather
//! than overflow, so stored rows can never make a report fail.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::categories::Category;
use crate::models::{
    AdminOverview, Budget, BudgetWithSpent, CategorySpending, DashboardSummary,
    MonthlyTrendBucket, Transaction, TransactionType, UserProfile, UserSummary,
};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn total(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

fn sum_of(transactions: &[Transaction], kind: TransactionType) -> Decimal {
    total(
        transactions
            .iter()
            .filter(|t| t.transaction_type == kind)
            .map(|t| t.amount),
    )
}

pub fn total_income(transactions: &[Transaction]) -> Decimal {
    sum_of(transactions, TransactionType::Income)
}

pub fn total_expenses(transactions: &[Transaction]) -> Decimal {
    sum_of(transactions, TransactionType::Expense)
}

/// Income minus expenses
pub fn balance(transactions: &[Transaction]) -> Decimal {
    total_income(transactions).saturating_sub(total_expenses(transactions))
}

/// Expense total per category. Categories with no spending are absent.
pub fn spending_by_category(transactions: &[Transaction]) -> BTreeMap<Category, Decimal> {
    let mut totals: BTreeMap<Category, Decimal> = BTreeMap::new();
    for tx in transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Expense)
    {
        let spent = totals.entry(tx.category).or_default();
        *spent = spent.saturating_add(tx.amount);
    }
    totals.retain(|_, amount| !amount.is_zero());
    totals
}

/// `spent / amount * 100`, uncapped.
///
/// Returns `None` when `amount <= 0` (stale or zero budgets) or when the
/// result does not fit in a `Decimal`.
pub fn utilization_percent(spent: Decimal, amount: Decimal) -> Option<Decimal> {
    if amount <= Decimal::ZERO {
        return None;
    }
    spent
        .checked_div(amount)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Join each budget with the expenses recorded in its category
pub fn budgets_with_spent(transactions: &[Transaction], budgets: &[Budget]) -> Vec<BudgetWithSpent> {
    let spending = spending_by_category(transactions);
    budgets
        .iter()
        .map(|budget| {
            let spent = spending
                .get(&budget.category)
                .copied()
                .unwrap_or(Decimal::ZERO);
            BudgetWithSpent {
                budget: budget.clone(),
                spent,
                utilization_percent: utilization_percent(spent, budget.amount),
            }
        })
        .collect()
}

/// Spending per category with each category's share of total expenses,
/// largest first
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySpending> {
    let spending = spending_by_category(transactions);
    let total_spent = total(spending.values().copied());

    let mut breakdown: Vec<CategorySpending> = spending
        .into_iter()
        .map(|(category, amount)| CategorySpending {
            category,
            amount,
            share_percent: share_of(amount, total_spent),
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    breakdown
}

fn share_of(amount: Decimal, total: Decimal) -> Decimal {
    if total > Decimal::ZERO {
        amount
            .checked_div(total)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

fn month_index(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month) - 1
}

/// Income and expense totals for the `months` calendar months ending with
/// the month containing `today`, oldest first.
///
/// Always returns exactly `months` buckets; months without activity are
/// zero. Transactions are matched by year and month of their date.
pub fn monthly_trend(
    transactions: &[Transaction],
    months: usize,
    today: NaiveDate,
) -> Vec<MonthlyTrendBucket> {
    let current = month_index(today.year(), today.month());
    let first = current - months as i64 + 1;

    let mut buckets: Vec<MonthlyTrendBucket> = (first..=current)
        .map(|index| {
            let year = index.div_euclid(12) as i32;
            let month0 = index.rem_euclid(12) as usize;
            MonthlyTrendBucket {
                year,
                month: month0 as u32 + 1,
                label: format!("{} {}", MONTH_ABBREVIATIONS[month0], year),
                income: Decimal::ZERO,
                expenses: Decimal::ZERO,
            }
        })
        .collect();

    let positions: HashMap<i64, usize> = (first..=current)
        .enumerate()
        .map(|(pos, index)| (index, pos))
        .collect();

    for tx in transactions {
        let index = month_index(tx.date.year(), tx.date.month());
        if let Some(&pos) = positions.get(&index) {
            let bucket = &mut buckets[pos];
            match tx.transaction_type {
                TransactionType::Income => bucket.income = bucket.income.saturating_add(tx.amount),
                TransactionType::Expense => {
                    bucket.expenses = bucket.expenses.saturating_add(tx.amount)
                }
            }
        }
    }

    buckets
}

/// The `limit` most recent transactions, newest first
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    sorted.truncate(limit);
    sorted
}

/// Build the dashboard for one user
pub fn summarize(
    transactions: &[Transaction],
    budgets: &[Budget],
    recent_limit: usize,
) -> DashboardSummary {
    let total_income = total_income(transactions);
    let total_expenses = total_expenses(transactions);

    DashboardSummary {
        total_income,
        total_expenses,
        balance: total_income.saturating_sub(total_expenses),
        spending_by_category: spending_by_category(transactions),
        category_breakdown: category_breakdown(transactions),
        budgets: budgets_with_spent(transactions, budgets),
        recent_transactions: recent_transactions(transactions, recent_limit),
    }
}

/// Admin table row for one user. `transactions` must belong to that user.
pub fn user_summary(profile: &UserProfile, transactions: &[Transaction]) -> UserSummary {
    let total_income = total_income(transactions);
    let total_expenses = total_expenses(transactions);
    UserSummary {
        id: profile.id.clone(),
        email: profile.email.clone(),
        transaction_count: transactions.len(),
        total_income,
        total_expenses,
        balance: total_income.saturating_sub(total_expenses),
    }
}

/// Platform-wide KPIs over every user's transactions
pub fn admin_overview(total_users: usize, transactions: &[Transaction]) -> AdminOverview {
    AdminOverview {
        total_users,
        total_transactions: transactions.len(),
        total_income: total_income(transactions),
        total_expenses: total_expenses(transactions),
    }
}
