//! Pluggable prediction backend abstraction
//!
//! The forecast pipeline treats the model as an opaque function
//! `predict(history, horizon)`. This module supplies that function.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Default model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::{MockBackend, MockBehavior};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Interface for prediction backends
///
/// Backends must be Send + Sync so one client can serve concurrent requests.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Predict per-category spending for `horizon` from a JSON-encoded
    /// transaction history. The returned prediction is not yet decoded.
    async fn predict_spending(&self, history_json: &str, horizon: &str)
        -> Result<SpendingPrediction>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging and status output)
    fn model(&self) -> &str;

    /// Host URL (for logging and status output)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, hosted APIs, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing and offline development
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the selected backend's host variable is not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    pub fn info(&self) -> BackendInfo {
        let backend = match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        };
        BackendInfo {
            backend,
            model: self.model().to_string(),
            host: self.host().to_string(),
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn predict_spending(
        &self,
        history_json: &str,
        horizon: &str,
    ) -> Result<SpendingPrediction> {
        match self {
            AIClient::Ollama(b) => b.predict_spending(history_json, horizon).await,
            AIClient::OpenAICompatible(b) => b.predict_spending(history_json, horizon).await,
            AIClient::Mock(b) => b.predict_spending(history_json, horizon).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.info().backend, "mock");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_predict_spending() {
        let client = AIClient::mock();
        let history = r#"[{"date":"2024-01-10","merchant":"Market","category":"Groceries","amount":40,"type":"expense"}]"#;
        let prediction = client.predict_spending(history, "next month").await.unwrap();
        let decoded = parsing::decode_predicted_spending(&prediction.predicted_spending).unwrap();
        assert!(decoded.contains_key("Groceries"));
    }

    #[test]
    fn test_ollama_host_trailing_slash_trimmed() {
        let client = AIClient::ollama("http://localhost:11434/", "llama3.2");
        assert_eq!(client.model(), "llama3.2");
        assert_eq!(client.host(), "http://localhost:11434");
    }
}
