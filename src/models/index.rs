// Index suggestion models

use mongodb::bson::Document;
use serde::Serialize;

/// A parsed, pending index operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSuggestion {
    pub collection: String,
    pub keys: Document,
    /// Suggestion text the keys were parsed from, kept for display and audit.
    pub source: String,
}

/// Outcome of a successful index creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexCreated {
    pub success: bool,
    /// Name the server assigned to the index.
    pub result: String,
}

impl IndexCreated {
    pub fn new(index_name: String) -> Self {
        Self { success: true, result: index_name }
    }
}
