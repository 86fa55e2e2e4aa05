//! Spending forecast pipeline
//!
//! Serializes a user's history, asks the prediction backend for the given
//! horizon, and decodes the answer into a [`ForecastResult`].
//!
//! [`ForecastPipeline`] adds a per-user single-flight guard on top of
//! [`forecast`]: while one request is in flight for a user, another is
//! rejected with [`Error::ForecastInProgress`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::parsing::decode_predicted_spending;
use crate::ai::{AIBackend, AIClient};
use crate::error::{Error, Result};
use crate::models::{ConfidenceLevel, ForecastResult, Transaction};

pub const DEFAULT_HORIZON: &str = "next month";

/// One history entry as sent to the backend
#[derive(Serialize)]
struct HistoryEntry<'a> {
    date: String,
    merchant: &'a str,
    category: &'a str,
    amount: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Serialize transactions oldest first, dates as plain `YYYY-MM-DD`
pub fn serialize_history(transactions: &[Transaction]) -> Result<String> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

    let entries: Vec<HistoryEntry<'_>> = sorted
        .into_iter()
        .map(|tx| HistoryEntry {
            date: tx.date.format("%Y-%m-%d").to_string(),
            merchant: &tx.merchant,
            category: tx.category.as_str(),
            amount: tx.amount.to_string(),
            kind: tx.transaction_type.as_str(),
        })
        .collect();

    Ok(serde_json::to_string(&entries)?)
}

/// Run one forecast. No caching and no retry.
pub async fn forecast<B>(backend: &B, transactions: &[Transaction], horizon: &str) -> Result<ForecastResult>
where
    B: AIBackend + ?Sized,
{
    if transactions.is_empty() {
        return Err(Error::InsufficientData(
            "Add some transactions before requesting a forecast".to_string(),
        ));
    }

    let horizon = match horizon.trim() {
        "" => DEFAULT_HORIZON,
        h => h,
    };
    let history = serialize_history(transactions)?;
    debug!(
        transactions = transactions.len(),
        horizon,
        model = backend.model(),
        "Requesting spending forecast"
    );

    let prediction = backend
        .predict_spending(&history, horizon)
        .await
        .map_err(|e| Error::PredictionFailed(e.to_string()))?;

    let predicted_spending = decode_predicted_spending(&prediction.predicted_spending)?;

    Ok(ForecastResult {
        horizon: horizon.to_string(),
        predicted_spending,
        confidence: ConfidenceLevel::from(prediction.confidence_level),
        explanation: prediction.explanation,
        generated_at: Utc::now(),
    })
}

/// Last known state of a user's forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ForecastState {
    Idle,
    Requesting {
        horizon: String,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        result: ForecastResult,
    },
    Failed {
        kind: String,
        message: String,
    },
}

impl ForecastState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, Self::Requesting { .. })
    }
}

type StateMap = Arc<Mutex<HashMap<String, ForecastState>>>;

/// Forecast runner shared by every request
#[derive(Clone)]
pub struct ForecastPipeline {
    backend: AIClient,
    states: StateMap,
}

/// Marks a user's forecast as in flight; resets to Idle if dropped unfinished
struct InFlight {
    states: StateMap,
    key: String,
    finished: bool,
}

impl InFlight {
    fn finish(mut self, state: ForecastState) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(self.key.clone(), state);
        }
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Ok(mut states) = self.states.lock() {
            warn!(user_id = %self.key, "Forecast abandoned before completion");
            states.insert(self.key.clone(), ForecastState::Idle);
        }
    }
}

impl ForecastPipeline {
    pub fn new(backend: AIClient) -> Self {
        Self {
            backend,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn backend(&self) -> &AIClient {
        &self.backend
    }

    /// Current state for `user_id`; Idle if nothing was ever requested
    pub fn state(&self, user_id: &str) -> ForecastState {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(user_id).cloned())
            .unwrap_or(ForecastState::Idle)
    }

    fn begin(&self, user_id: &str, horizon: &str) -> Result<InFlight> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| Error::Config("forecast state lock poisoned".to_string()))?;

        if states.get(user_id).is_some_and(ForecastState::is_requesting) {
            return Err(Error::ForecastInProgress);
        }
        states.insert(
            user_id.to_string(),
            ForecastState::Requesting {
                horizon: horizon.to_string(),
                started_at: Utc::now(),
            },
        );

        Ok(InFlight {
            states: Arc::clone(&self.states),
            key: user_id.to_string(),
            finished: false,
        })
    }

    /// Forecast for one user, rejecting overlapping requests
    pub async fn run(
        &self,
        user_id: &str,
        transactions: &[Transaction],
        horizon: &str,
    ) -> Result<ForecastResult> {
        let in_flight = self.begin(user_id, horizon)?;

        let outcome = forecast(&self.backend, transactions, horizon).await;
        match &outcome {
            Ok(result) => {
                info!(
                    user_id,
                    categories = result.predicted_spending.len(),
                    confidence = %result.confidence,
                    "Forecast ready"
                );
                in_flight.finish(ForecastState::Succeeded {
                    result: result.clone(),
                });
            }
            Err(e) => {
                warn!(user_id, error = %e, "Forecast failed");
                in_flight.finish(ForecastState::Failed {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
        outcome
    }
}
