//! Result shaping.
//!
//! Post-processes a raw backend response into a `SearchResult`: the hits become
//! result documents (native or normalized) and everything else becomes the
//! result details.

use live_search_repository::SearchIndexError;
use live_search_shared::{FieldMap, OutputFormat, RawResponse, SearchResult, ID_FIELD};
use serde_json::{Map, Value};

/// Shape a raw response.
///
/// # Arguments
///
/// * `format` - The output format of the searched index
/// * `raw` - The backend response, as text or parsed JSON
/// * `projection` - Keys to keep in each result; empty keeps everything
///
/// # Returns
///
/// * `Ok(SearchResult)` - The shaped result
/// * `Err(SearchIndexError::ParseError)` - If the response is not valid JSON or
///   has no `hits.hits` array
pub fn shape(
    format: OutputFormat,
    raw: RawResponse,
    projection: &[String],
) -> Result<SearchResult, SearchIndexError> {
    let mut details = match raw.into_value()? {
        Value::Object(map) => map,
        other => {
            return Err(SearchIndexError::parse(format!(
                "Expected a JSON object, got {}",
                other
            )))
        }
    };

    let hits = take_hits(&mut details)?;

    let mut results: Vec<FieldMap> = match format {
        OutputFormat::Normalized => hits.into_iter().map(normalize_hit).collect(),
        OutputFormat::Native => hits.into_iter().map(native_hit).collect(),
    };

    if !projection.is_empty() {
        results = results
            .iter()
            .map(|doc| project_fields(doc, projection))
            .collect();
    }

    Ok(SearchResult {
        results,
        result_details: details,
    })
}

/// Remove the top-level `hits` object from `response` and return its hit list.
fn take_hits(response: &mut Map<String, Value>) -> Result<Vec<Value>, SearchIndexError> {
    match response.remove("hits") {
        Some(Value::Object(mut hits)) => match hits.remove("hits") {
            Some(Value::Array(list)) => Ok(list),
            _ => Err(SearchIndexError::parse("Response hits contain no hit list")),
        },
        _ => Err(SearchIndexError::parse("Response contains no hits")),
    }
}

/// A hit's stored source fields plus `_id` from the hit.
fn normalize_hit(hit: Value) -> FieldMap {
    let Value::Object(mut hit) = hit else {
        return FieldMap::new();
    };

    let mut doc = match hit.remove("_source") {
        Some(Value::Object(source)) => source,
        _ => FieldMap::new(),
    };
    if let Some(id) = hit.remove(ID_FIELD) {
        doc.insert(ID_FIELD.to_string(), id);
    }
    doc
}

fn native_hit(hit: Value) -> FieldMap {
    match hit {
        Value::Object(hit) => hit,
        _ => FieldMap::new(),
    }
}

/// Keep only `fields` of `doc`. Fields missing from `doc` are left out.
pub fn project_fields(doc: &FieldMap, fields: &[String]) -> FieldMap {
    fields
        .iter()
        .filter_map(|field| doc.get(field).map(|value| (field.clone(), value.clone())))
        .collect()
}
