//! BudgetWise Core Library
//!
//! Shared functionality for the BudgetWise budgeting app:
//! - Category registry and record types
//! - Per-user SQLite store with encryption, access rules and a write event channel
//! - Aggregation engine (balances, category spending, budget utilization, trends)
//! - Spending forecast pipeline over pluggable prediction backends
//! - Prompt library for the forecast prompt
//! - Session resolution from identity claims
//! - Admin cross-user views and service status

pub mod admin;
pub mod aggregation;
pub mod ai;
pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod forecast;
pub mod models;
pub mod prompts;
pub mod reports;
pub mod status;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use auth::{IdentityClaims, Session};
pub use categories::{Category, CategoryInfo};
pub use config::Settings;
pub use db::Database;
pub use error::{Error, Result};
pub use forecast::{ForecastPipeline, ForecastState};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use status::{ServiceState, StatusReport};
pub use store::{BudgetStore, ScheduledWrite, StoreEvent, StoreEvents, WriteTicket};
