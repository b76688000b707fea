//! Command and reply types of the line protocol.
//!
//! Each input line is one JSON object tagged by `"op"`; each reply is one JSON
//! object on its own line.

use live_search_shared::{FacetSpec, FieldMap, SearchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A command read from the input.
///
/// Commands that target an index default to the served index when `index` is
/// omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Insert {
        id: String,
        #[serde(default)]
        fields: FieldMap,
    },
    Update {
        id: String,
        fields: FieldMap,
    },
    Remove {
        id: String,
    },
    Search {
        #[serde(default)]
        index: Option<String>,
        query: String,
        #[serde(default)]
        fields: Option<Vec<String>>,
    },
    ChangeProperty {
        #[serde(default)]
        index: Option<String>,
        key: String,
        value: Value,
    },
    AddFacet {
        #[serde(default)]
        index: Option<String>,
        name: String,
        title: String,
        terms: Value,
    },
    AddFacets {
        #[serde(default)]
        index: Option<String>,
        facets: Vec<FacetSpec>,
    },
    AddFilter {
        #[serde(default)]
        index: Option<String>,
        field: String,
        term: Value,
    },
}

impl Command {
    /// The `op` tag of this command.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
            Self::Search { .. } => "search",
            Self::ChangeProperty { .. } => "change_property",
            Self::AddFacet { .. } => "add_facet",
            Self::AddFacets { .. } => "add_facets",
            Self::AddFilter { .. } => "add_filter",
        }
    }
}

/// A reply written to the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Outcome of a mutation; `ok` is false when nothing changed.
    Done { ok: bool },
    /// A search result.
    Results(SearchResult),
    /// The command failed or could not be read.
    Error { error: String },
}

impl Reply {
    pub fn done(ok: bool) -> Self {
        Self::Done { ok }
    }

    pub fn error(error: impl ToString) -> Self {
        Self::Error {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_insert() {
        let command: Command =
            serde_json::from_str(r#"{"op":"insert","id":"1","fields":{"title":"Hi"}}"#).unwrap();

        let mut fields = FieldMap::new();
        fields.insert("title".to_string(), json!("Hi"));
        assert_eq!(
            command,
            Command::Insert {
                id: "1".to_string(),
                fields
            }
        );
        assert_eq!(command.op(), "insert");
    }

    #[test]
    fn test_parse_search_defaults() {
        let command: Command = serde_json::from_str(r#"{"op":"search","query":"foo"}"#).unwrap();

        assert_eq!(
            command,
            Command::Search {
                index: None,
                query: "foo".to_string(),
                fields: None
            }
        );
    }

    #[test]
    fn test_parse_add_facets() {
        let command: Command = serde_json::from_str(
            r#"{"op":"add_facets","index":"posts","facets":[{"name":"t","title":"Tags","terms":{"field":"tag"}}]}"#,
        )
        .unwrap();

        let Command::AddFacets { index, facets } = command else {
            panic!("expected add_facets");
        };
        assert_eq!(index.as_deref(), Some("posts"));
        assert_eq!(facets[0].title, "Tags");
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"op":"drop_index"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"id":"1"}"#).is_err());
    }

    #[test]
    fn test_reply_shapes() {
        assert_eq!(serde_json::to_value(Reply::done(true)).unwrap(), json!({"ok": true}));
        assert_eq!(
            serde_json::to_value(Reply::error("boom")).unwrap(),
            json!({"error": "boom"})
        );
        assert_eq!(
            serde_json::to_value(Reply::Results(SearchResult::default())).unwrap(),
            json!({"results": [], "resultDetails": {}})
        );
    }
}
