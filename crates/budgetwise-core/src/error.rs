//! Error types for BudgetWise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("User is not authenticated.")]
    AuthenticationRequired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Could not decode prediction: {0}")]
    Decode(String),

    #[error("A forecast is already being generated")]
    ForecastInProgress,

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Short machine-readable name, used in store events and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InsufficientData(_) => "insufficient_data",
            Self::PredictionFailed(_) => "prediction_failed",
            Self::Decode(_) => "decode",
            Self::ForecastInProgress => "forecast_in_progress",
            Self::NotImplemented(_) => "not_implemented",
            Self::NotFound(_) => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::Config(_) => "config",
            Self::Database(_) | Self::Pool(_) | Self::Encryption(_) => "storage",
            Self::Io(_) | Self::Http(_) | Self::Json(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
