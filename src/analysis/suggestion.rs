//! Index suggestion derivation and rendering.
//!
//! A suggestion is rendered as a shell `createIndex` call so operators can
//! copy it as-is; [`super::parser`] reads the same text back.

use std::sync::LazyLock;

use mongodb::bson::{Bson, Document};
use regex::Regex;

use crate::models::{IndexSuggestion, ProfileOp, ProfileRecord};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Derive an ascending index over the fields the operation filters or sorts on.
///
/// Returns `None` when no field can be extracted; issues on such records carry
/// no recommended index.
pub fn suggest_index(record: &ProfileRecord) -> Option<IndexSuggestion> {
    let (collection, fields) = match record.op {
        ProfileOp::Query => {
            let fields = record
                .filter()
                .map(field_names)
                .filter(|fields| !fields.is_empty())
                .or_else(|| record.sort_spec().map(field_names))?;
            (record.collection_name()?, fields)
        }
        ProfileOp::Command if record.is_aggregate() => {
            let fields = pipeline_fields(&record.pipeline())?;
            let collection = record.aggregate_target().or_else(|| record.collection_name())?;
            (collection, fields)
        }
        _ => return None,
    };

    // `$cmd` namespaces belong to database-level commands and cannot carry an index.
    if fields.is_empty() || collection.starts_with("$cmd") {
        return None;
    }

    let mut keys = Document::new();
    for field in fields {
        keys.insert(field, Bson::Int32(1));
    }
    let source = render_create_index(collection, &keys);

    Some(IndexSuggestion { collection: collection.to_string(), keys, source })
}

/// Fields of the first `$match` stage that names any, else of the first such `$sort` stage.
fn pipeline_fields(pipeline: &[Document]) -> Option<Vec<String>> {
    stage_fields(pipeline, "$match").or_else(|| stage_fields(pipeline, "$sort"))
}

fn stage_fields(pipeline: &[Document], stage: &str) -> Option<Vec<String>> {
    pipeline
        .iter()
        .filter_map(|doc| doc.get_document(stage).ok())
        .map(field_names)
        .find(|fields| !fields.is_empty())
}

/// Top-level keys in original order, excluding operators such as `$or`.
fn field_names(doc: &Document) -> Vec<String> {
    doc.keys().filter(|key| !key.starts_with('$')).cloned().collect()
}

/// Render `db.<collection>.createIndex({ field: 1, ... })`.
pub fn render_create_index(collection: &str, keys: &Document) -> String {
    let target = if is_plain_path(collection) {
        format!("db.{collection}")
    } else {
        format!("db.getCollection({})", quote(collection))
    };
    let fields = keys
        .iter()
        .map(|(key, direction)| format!("{}: {}", render_key(key), render_direction(direction)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{target}.createIndex({{ {fields} }})")
}

pub(crate) fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// Dotted identifier path that reads unambiguously after `db.`.
fn is_plain_path(collection: &str) -> bool {
    collection.split('.').all(|segment| is_identifier(segment) && segment != "createIndex")
}

fn render_key(key: &str) -> String {
    if is_identifier(key) { key.to_string() } else { quote(key) }
}

fn render_direction(direction: &Bson) -> String {
    match direction {
        Bson::Int32(v) => v.to_string(),
        Bson::Int64(v) => v.to_string(),
        Bson::Double(v) => v.to_string(),
        Bson::String(s) => quote(s),
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}
