//! Utility functions for the live search repository.

use crate::errors::SearchIndexError;

/// Characters OpenSearch rejects anywhere in an index name.
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Validate an index name against the backend's naming rules.
///
/// Index names must be non-empty, lowercase, at most 255 bytes, must not
/// start with `-`, `_` or `+`, must not be `.` or `..`, and must not contain
/// any of `\ / * ? " < > | , # :` or spaces.
///
/// # Example
///
/// ```
/// use live_search_repository::validate_index_name;
///
/// assert!(validate_index_name("posts").is_ok());
/// assert!(validate_index_name("Posts").is_err());
/// ```
pub fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
    if name.is_empty() {
        return Err(SearchIndexError::validation("Index name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' exceeds 255 bytes",
            name
        )));
    }

    if name == "." || name == ".." {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' is reserved",
            name
        )));
    }

    if name.starts_with(['-', '_', '+']) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }

    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lowercase",
            name
        )));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            name, c
        )));
    }

    Ok(())
}

/// Validate a document id. Ids must be non-empty and not only whitespace.
pub fn validate_document_id(id: &str) -> Result<(), SearchIndexError> {
    if id.trim().is_empty() {
        return Err(SearchIndexError::validation("Document id is required"));
    }
    Ok(())
}
