//! AI backend response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Deserializer, Serialize};

/// Raw answer from a prediction backend
///
/// `predicted_spending` is still encoded: a JSON object in text form,
/// mapping category names to amounts. Decoding is the caller's job, see
/// [`super::parsing::decode_predicted_spending`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPrediction {
    #[serde(deserialize_with = "encoded_payload")]
    pub predicted_spending: String,
    pub confidence_level: String,
    #[serde(default)]
    pub explanation: String,
}

/// Models sometimes inline the object instead of encoding it as a string;
/// both arrive here as text.
fn encoded_payload<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Connection details for display in status output
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub backend: &'static str,
    pub model: String,
    pub host: String,
}
