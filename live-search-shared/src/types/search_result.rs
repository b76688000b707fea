//! Search result types.
//!
//! This module defines the raw backend response and the shaped result returned
//! to callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::document::FieldMap;

/// A backend search response before shaping.
///
/// Backends either hand over the response body as text or as an already
/// parsed JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Text(String),
    Json(Value),
}

impl RawResponse {
    /// Parse the response into a JSON value.
    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Text(text) => serde_json::from_str(&text),
            Self::Json(value) => Ok(value),
        }
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Shaped search response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResult {
    /// Result documents in backend order.
    pub results: Vec<FieldMap>,

    /// Backend metadata (timing, shard info, aggregations, ...) with the raw
    /// hits removed.
    #[serde(rename = "resultDetails")]
    pub result_details: Map<String, Value>,
}

impl SearchResult {
    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }
}
