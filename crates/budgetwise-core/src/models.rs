//! Domain models for BudgetWise

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::categories::Category;
use crate::error::{Error, Result};

/// Whether a transaction adds to or draws from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(Error::InvalidData(format!("Unknown transaction type: {}", s))),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded income or expense, owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub merchant: String,
    pub category: Category,
    /// Always positive; `transaction_type` carries the sign
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub created_at: DateTime<Utc>,
    /// Time of the last full replacement; equals `created_at` until then
    pub updated_at: DateTime<Utc>,
}

/// Largest amount accepted for a transaction or budget
/// (one trillion, as lo/mid words)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidData("Amount must be positive".to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::InvalidData(format!(
            "Amount must not exceed {}",
            MAX_AMOUNT
        )));
    }
    Ok(())
}

/// User-supplied fields of a transaction, for create and full replacement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub date: NaiveDate,
    pub merchant: String,
    pub category: Category,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

impl TransactionInput {
    pub fn validate(&self) -> Result<()> {
        if self.merchant.trim().is_empty() {
            return Err(Error::InvalidData("Merchant is required".to_string()));
        }
        validate_amount(self.amount)
    }

    pub(crate) fn into_transaction(
        self,
        id: String,
        user_id: &str,
        written_at: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id,
            user_id: user_id.to_string(),
            date: self.date,
            merchant: self.merchant.trim().to_string(),
            category: self.category,
            amount: self.amount,
            transaction_type: self.transaction_type,
            created_at: written_at,
            updated_at: written_at,
        }
    }
}

/// Monthly spending ceiling for one category. The id is the category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category: Category,
    pub amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInput {
    pub category: Category,
    pub amount: Decimal,
}

impl BudgetInput {
    pub fn validate(&self) -> Result<()> {
        if !self.category.is_budgetable() {
            return Err(Error::InvalidData(format!(
                "Cannot set a budget for {}",
                self.category
            )));
        }
        validate_amount(self.amount)
    }
}

/// A budget joined with what has been spent against it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetWithSpent {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: Decimal,
    /// `spent / amount * 100`, uncapped. `None` when the budget amount is not positive.
    pub utilization_percent: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInput {
    pub email: Option<String>,
}

/// One calendar month of income and expense totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrendBucket {
    pub year: i32,
    pub month: u32,
    /// e.g. "Jan 2024"
    pub label: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub category: Category,
    pub amount: Decimal,
    /// Share of total expenses, 0-100
    pub share_percent: Decimal,
}

/// Everything the dashboard shows for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub spending_by_category: BTreeMap<Category, Decimal>,
    pub category_breakdown: Vec<CategorySpending>,
    pub budgets: Vec<BudgetWithSpent>,
    pub recent_transactions: Vec<Transaction>,
}

/// Model confidence in a forecast. Free text in practice; the usual
/// three levels get their own variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Other(String),
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ConfidenceLevel {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(s),
        }
    }
}

impl From<ConfidenceLevel> for String {
    fn from(c: ConfidenceLevel) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded spending forecast. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub horizon: String,
    /// Predicted amount per category name as returned by the model
    pub predicted_spending: BTreeMap<String, Decimal>,
    pub confidence: ConfidenceLevel,
    pub explanation: String,
    pub generated_at: DateTime<Utc>,
}

/// Per-user row in the admin users table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: Option<String>,
    pub transaction_count: usize,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

/// Platform-wide KPIs for administrators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    pub total_users: usize,
    pub total_transactions: usize,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
}
