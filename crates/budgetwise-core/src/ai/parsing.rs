//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap their JSON in prose or code fences. These helpers pull
//! out the outermost object before handing it to serde.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{Error, Result};

use super::types::SpendingPrediction;

const RAW_EXCERPT_LEN: usize = 200;

fn excerpt(raw: &str) -> String {
    if raw.chars().count() > RAW_EXCERPT_LEN {
        let cut: String = raw.chars().take(RAW_EXCERPT_LEN).collect();
        format!("{}...", cut)
    } else {
        raw.to_string()
    }
}

/// Outermost `{...}` span of a model response
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

/// Parse the prediction envelope (`predictedSpending`, `confidenceLevel`,
/// `explanation`) out of a model response
pub fn parse_spending_prediction(response: &str) -> Result<SpendingPrediction> {
    let response = response.trim();
    let json_str = extract_json_object(response).ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON found in AI prediction response | Raw: {}",
            excerpt(response)
        ))
    })?;

    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid prediction JSON from AI: {} | Raw: {}",
            e,
            excerpt(json_str)
        ))
    })
}

/// Decode the encoded per-category prediction into amounts
///
/// Accepts numbers and numeric strings (a leading `$` and thousands
/// separators are tolerated). Anything else, including negative amounts,
/// is a [`Error::Decode`].
pub fn decode_predicted_spending(encoded: &str) -> Result<BTreeMap<String, Decimal>> {
    let value: Value = serde_json::from_str(encoded.trim())
        .map_err(|e| Error::Decode(format!("{} | Raw: {}", e, excerpt(encoded))))?;

    let Value::Object(entries) = value else {
        return Err(Error::Decode(format!(
            "expected an object of category amounts | Raw: {}",
            excerpt(encoded)
        )));
    };

    entries
        .into_iter()
        .map(|(category, amount)| {
            let parsed = decimal_from_value(&amount).ok_or_else(|| {
                Error::Decode(format!("amount for {} is not a number: {}", category, amount))
            })?;
            if parsed < Decimal::ZERO {
                return Err(Error::Decode(format!(
                    "amount for {} is negative: {}",
                    category, parsed
                )));
            }
            Ok((category, parsed))
        })
        .collect()
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dec;

    #[test]
    fn test_parse_prediction_with_surrounding_text() {
        let response = r#"Sure! Here is the forecast:
{"predictedSpending": "{\"Groceries\": 410.5}", "confidenceLevel": "medium", "explanation": "Steady."}
Let me know if you need more."#;
        let prediction = parse_spending_prediction(response).unwrap();
        assert_eq!(prediction.predicted_spending, r#"{"Groceries": 410.5}"#);
        assert_eq!(prediction.confidence_level, "medium");
        assert_eq!(prediction.explanation, "Steady.");
    }

    #[test]
    fn test_parse_prediction_with_inline_object() {
        let response = r#"{"predictedSpending": {"Transport": 80}, "confidenceLevel": "low", "explanation": ""}"#;
        let prediction = parse_spending_prediction(response).unwrap();
        let decoded = decode_predicted_spending(&prediction.predicted_spending).unwrap();
        assert_eq!(decoded["Transport"], dec("80"));
    }

    #[test]
    fn test_parse_prediction_without_json() {
        let err = parse_spending_prediction("I cannot help with that.").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_parse_prediction_missing_fields() {
        let err = parse_spending_prediction(r#"{"explanation": "no numbers"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_decode_numbers_and_strings() {
        let decoded =
            decode_predicted_spending(r#"{"Groceries": 420.25, "Housing": "$1,200.00"}"#).unwrap();
        assert_eq!(decoded["Groceries"], dec("420.25"));
        assert_eq!(decoded["Housing"], dec("1200.00"));
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        for bad in [
            "not json",
            r#"["Groceries", 10]"#,
            r#"{"Groceries": "lots"}"#,
            r#"{"Groceries": -5}"#,
            r#"{"Groceries": null}"#,
        ] {
            let err = decode_predicted_spending(bad).unwrap_err();
            assert!(matches!(err, Error::Decode(_)), "expected decode error for {}", bad);
        }
    }

    #[test]
    fn test_excerpt_truncates_long_output() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.len(), RAW_EXCERPT_LEN + 3);
    }
}
