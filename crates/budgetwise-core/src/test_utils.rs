//! Test utilities for budgetwise-core
//!
//! Record builders for unit tests, and a mock Ollama server for exercising
//! the HTTP backends end to end.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::categories::Category;
use crate::models::{Budget, Transaction, TransactionInput, TransactionType};

/// Parse a decimal literal
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A transaction owned by `test-user`
pub fn sample_transaction(
    amount: &str,
    transaction_type: TransactionType,
    category: Category,
    date: NaiveDate,
) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: "test-user".to_string(),
        date,
        merchant: "Corner Market".to_string(),
        category,
        amount: dec(amount),
        transaction_type,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_budget(category: Category, amount: &str) -> Budget {
    Budget {
        id: category.as_str().to_string(),
        user_id: "test-user".to_string(),
        category,
        amount: dec(amount),
        updated_at: Utc::now(),
    }
}

/// Expense input dated 2024-01-15
pub fn expense_input(amount: &str, category: Category) -> TransactionInput {
    TransactionInput {
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        merchant: "Corner Market".to_string(),
        category,
        amount: dec(amount),
        transaction_type: TransactionType::Expense,
    }
}

/// Canned prediction returned by [`MockOllamaServer`]
pub const MOCK_PREDICTION: &str = r#"{"predictedSpending": "{\"Groceries\": 410.5, \"Transport\": \"95.00\"}", "confidenceLevel": "medium", "explanation": "Groceries trend slightly upward; transport is stable."}"#;

#[derive(Clone, Default)]
struct MockState {
    fail_generate: bool,
    prompts: Arc<Mutex<Vec<GenerateRequest>>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockState::default()).await
    }

    /// Start a server whose generate endpoint answers 500
    pub async fn start_failing() -> Self {
        Self::start_with(MockState {
            fail_generate: true,
            ..MockState::default()
        })
        .await
    }

    async fn start_with(state: MockState) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// User prompts received by the generate endpoint, oldest first
    pub fn received_prompts(&self) -> Vec<String> {
        self.state
            .prompts
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint; wraps the prediction in chatter like a real model
async fn handle_generate(
    State(state): State<MockState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    state.prompts.lock().unwrap().push(request.clone());
    if state.fail_generate {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(GenerateResponse {
        model: request.model,
        response: format!("Here is the forecast:\n{}\n", MOCK_PREDICTION),
        done: true,
    }))
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(default)]
    #[allow(dead_code)]
    system: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIBackend, OllamaBackend};
    use crate::ai::parsing::decode_predicted_spending;

    #[tokio::test]
    async fn test_mock_server_health() {
        let server = MockOllamaServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_prediction() {
        let server = MockOllamaServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let history = r#"[{"date":"2024-01-15","merchant":"Corner Market","category":"Groceries","amount":"40","type":"expense"}]"#;
        let prediction = backend
            .predict_spending(history, "next quarter")
            .await
            .unwrap();
        assert_eq!(prediction.confidence_level, "medium");

        let decoded = decode_predicted_spending(&prediction.predicted_spending).unwrap();
        assert_eq!(decoded["Groceries"], dec("410.5"));
        assert_eq!(decoded["Transport"], dec("95"));

        let prompts = server.received_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("next quarter"));
        assert!(prompts[0].contains("Corner Market"));
    }

    #[tokio::test]
    async fn test_mock_server_failure() {
        let server = MockOllamaServer::start_failing().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(backend.predict_spending("[]", "next month").await.is_err());
    }
}
