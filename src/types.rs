//! Common types used throughout pxcube
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method used to fetch a table
///
/// PxWeb serves table metadata on GET and data on POST with a query body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    GET,
    #[default]
    POST,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
        }
    }
}

// ============================================================================
// Response Format
// ============================================================================

/// Response format requested from a PxWeb endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseFormat {
    /// JSON-stat 2.0 (flat dataset object)
    #[default]
    #[serde(rename = "json-stat2")]
    JsonStat2,
    /// JSON-stat 1.0 bundle (`{"dataset": {...}}`)
    #[serde(rename = "json-stat")]
    JsonStat,
    /// PxWeb "px" JSON (same bundle shape as JSON-stat 1.0)
    #[serde(rename = "px")]
    Px,
}

impl ResponseFormat {
    /// Wire name used in the `response.format` field of a query
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonStat2 => "json-stat2",
            Self::JsonStat => "json-stat",
            Self::Px => "px",
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let post: reqwest::Method = Method::POST.into();
        assert_eq!(reqwest::Method::POST, post);
    }

    #[test]
    fn test_method_default() {
        assert_eq!(Method::default(), Method::POST);
    }

    #[test]
    fn test_response_format_serde() {
        let format: ResponseFormat = serde_json::from_str("\"json-stat2\"").unwrap();
        assert_eq!(format, ResponseFormat::JsonStat2);

        let json = serde_json::to_string(&ResponseFormat::Px).unwrap();
        assert_eq!(json, "\"px\"");
        assert_eq!(ResponseFormat::JsonStat.as_str(), "json-stat");
    }

    #[test]
    fn test_backoff_default() {
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }
}
