//! OpenSearch index settings and mappings.
//!
//! Indexes are created on demand with these settings. Source documents have an
//! arbitrary shape, so fields are mapped dynamically; only the reserved source
//! id field gets an explicit mapping.

use live_search_shared::SOURCE_ID_FIELD;
use serde_json::{json, Value};

/// Get the settings and mappings used when creating an index.
///
/// - 1 primary shard, 1 replica
/// - dynamic mapping for all source fields
/// - the source id tag as a non-analyzed keyword
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "dynamic": true,
            "properties": {
                (SOURCE_ID_FIELD): {
                    "type": "keyword"
                }
            }
        }
    })
}
