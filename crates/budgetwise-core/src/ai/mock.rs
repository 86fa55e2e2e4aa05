//! Mock backend for testing
//!
//! Predicts each category's average monthly expense from the history it is
//! given. Can be configured to fail, to return an undecodable payload, or to
//! stall, and counts how often it was called.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};

use super::types::SpendingPrediction;
use super::AIBackend;

/// What the mock does when asked for a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Return a well-formed prediction
    #[default]
    Predict,
    /// Reject the call
    Fail,
    /// Answer with a payload that cannot be decoded
    Malformed,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
struct HistoryEntry {
    date: String,
    category: String,
    amount: serde_json::Value,
    #[serde(rename = "type")]
    kind: String,
}

impl MockBackend {
    /// Create a new mock backend (healthy, predicting)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Self::new()
        }
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `predict_spending` calls so far, across clones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn average_monthly_expenses(history_json: &str) -> Result<(BTreeMap<String, Decimal>, usize)> {
        let entries: Vec<HistoryEntry> = serde_json::from_str(history_json)?;

        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut months = BTreeSet::new();
        for entry in entries.iter().filter(|e| e.kind == "expense") {
            let amount = Decimal::from_str(&entry.amount.to_string().replace('"', ""))
                .map_err(|e| Error::InvalidData(format!("Bad amount in history: {}", e)))?;
            *totals.entry(entry.category.clone()).or_default() += amount;
            months.insert(entry.date.chars().take(7).collect::<String>());
        }

        let month_count = months.len().max(1);
        let averages = totals
            .into_iter()
            .map(|(category, total)| (category, (total / Decimal::from(month_count)).round_dp(2)))
            .collect();
        Ok((averages, months.len()))
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn predict_spending(
        &self,
        history_json: &str,
        horizon: &str,
    ) -> Result<SpendingPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.behavior {
            MockBehavior::Fail => Err(Error::InvalidData("mock backend refused".to_string())),
            MockBehavior::Malformed => Ok(SpendingPrediction {
                predicted_spending: "Groceries: about 400".to_string(),
                confidence_level: "low".to_string(),
                explanation: "Unstructured answer".to_string(),
            }),
            MockBehavior::Predict => {
                let (averages, months) = Self::average_monthly_expenses(history_json)?;
                let confidence = match months {
                    0 | 1 => "low",
                    2 => "medium",
                    _ => "high",
                };
                Ok(SpendingPrediction {
                    predicted_spending: serde_json::to_string(&averages)?,
                    confidence_level: confidence.to_string(),
                    explanation: format!(
                        "Average monthly spending over {} month(s), projected to {}.",
                        months, horizon
                    ),
                })
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
