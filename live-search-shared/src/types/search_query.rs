//! Search request types.
//!
//! This module defines the request structure accepted by the search path and the
//! output format an index is configured with.

use serde::{Deserialize, Serialize};

/// Shape of the documents returned from a search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Hits are passed through exactly as the backend returned them.
    Native,

    /// Each hit is flattened into its stored source fields plus an `_id`.
    /// This is the default.
    #[default]
    #[serde(alias = "mongo")]
    Normalized,
}

impl OutputFormat {
    /// Parse a format name, accepting `mongo` as a legacy alias of `normalized`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "native" => Some(Self::Native),
            "normalized" | "mongo" => Some(Self::Normalized),
            _ => None,
        }
    }
}

/// Search request parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    /// The registered index to search.
    pub index: String,

    /// The free-text search string.
    pub query: String,

    /// Optional projection. When non-empty, every result document is reduced
    /// to these keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl SearchRequest {
    /// Create a request without projection.
    ///
    /// # Example
    ///
    /// ```
    /// use live_search_shared::SearchRequest;
    ///
    /// let request = SearchRequest::new("posts", "rust").with_fields(["title"]);
    /// assert_eq!(request.projection(), ["title".to_string()]);
    /// ```
    pub fn new(index: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            query: query.into(),
            fields: None,
        }
    }

    /// Restrict results to the given fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The projection list, empty when none was requested.
    pub fn projection(&self) -> &[String] {
        self.fields.as_deref().unwrap_or(&[])
    }
}
