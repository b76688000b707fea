//! Change events emitted by a source collection.

use serde::{Deserialize, Serialize};

use crate::types::document::FieldMap;

/// A single mutation observed on a source collection.
///
/// Events are transient: a change feed produces them and the sync engine
/// consumes them immediately. For any one document id, events arrive in the
/// order the mutations were applied to the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A document entered the collection (or was present when observation started).
    Added { id: String, fields: FieldMap },
    /// A document was modified. `fields` holds only the changed fields.
    Changed { id: String, fields: FieldMap },
    /// A document left the collection.
    Removed { id: String },
}

impl ChangeEvent {
    /// Create an added event.
    pub fn added(id: impl Into<String>, fields: FieldMap) -> Self {
        Self::Added {
            id: id.into(),
            fields,
        }
    }

    /// Create a changed event.
    pub fn changed(id: impl Into<String>, fields: FieldMap) -> Self {
        Self::Changed {
            id: id.into(),
            fields,
        }
    }

    /// Create a removed event.
    pub fn removed(id: impl Into<String>) -> Self {
        Self::Removed { id: id.into() }
    }

    /// The id of the document this event refers to.
    pub fn id(&self) -> &str {
        match self {
            Self::Added { id, .. } | Self::Changed { id, .. } | Self::Removed { id } => id,
        }
    }
}
