//! Reading profiler records.

use mongodb::bson::{self, Document, doc};

use crate::connection::ConnectionProvider;
use crate::error::Result;
use crate::models::{PROFILE_COLLECTION, ProfileQuery, ProfileRecord};

/// Build the `system.profile` filter for `query` on `database`.
///
/// The profiler's own namespace is always excluded. `collection` is a pattern
/// matched anywhere in the namespace, not an exact collection name.
pub fn build_profile_filter(database: &str, query: &ProfileQuery) -> Document {
    let mut ns = doc! { "$ne": format!("{database}.{PROFILE_COLLECTION}") };
    if let Some(collection) = query.collection.as_deref().filter(|c| !c.is_empty()) {
        ns.insert("$regex", collection);
    }

    let mut filter = doc! {
        "millis": { "$gte": query.min_millis },
        "op": { "$in": ["query", "command"] },
        "ns": ns,
    };

    let mut ts = Document::new();
    if let Some(start) = query.start_date {
        ts.insert("$gte", bson::DateTime::from_millis(start.timestamp_millis()));
    }
    if let Some(end) = query.end_date {
        ts.insert("$lte", bson::DateTime::from_millis(end.timestamp_millis()));
    }
    if !ts.is_empty() {
        filter.insert("ts", ts);
    }

    filter
}

impl ConnectionProvider {
    /// Fetch analyzable profiler records, most recent first.
    ///
    /// Results are fully materialized; bound `min_millis` or the date range to
    /// keep them tractable.
    pub async fn fetch_records(&self, query: &ProfileQuery) -> Result<Vec<ProfileRecord>> {
        let conn = self.current_connection().await;
        let filter = build_profile_filter(conn.name(), query);
        let profile = conn.collection(PROFILE_COLLECTION)?;
        let docs = profile.find(filter, Some(doc! { "ts": -1 })).await?;

        let fetched = docs.len();
        let records: Vec<ProfileRecord> = docs
            .iter()
            .filter_map(|doc| {
                let record = ProfileRecord::from_document(doc);
                if record.is_none() {
                    log::debug!("Skipping undecodable profiler entry: {doc}");
                }
                record
            })
            .filter(ProfileRecord::is_analyzable)
            .collect();

        log::debug!(
            "Fetched {fetched} profiler entries from '{}', {} analyzable",
            conn.name(),
            records.len()
        );
        Ok(records)
    }
}
