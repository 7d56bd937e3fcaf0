// Profiler records, status and the query used to select records

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Name of the collection the profiler writes to.
pub const PROFILE_COLLECTION: &str = "system.profile";

/// Default lower bound on `millis` when fetching records.
pub const DEFAULT_MIN_MILLIS: i64 = 100;

/// Operation kind recorded by the profiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOp {
    Query,
    Command,
    Other(String),
}

impl ProfileOp {
    pub fn parse(op: &str) -> Self {
        match op {
            "query" => ProfileOp::Query,
            "command" => ProfileOp::Command,
            other => ProfileOp::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProfileOp::Query => "query",
            ProfileOp::Command => "command",
            ProfileOp::Other(op) => op,
        }
    }
}

impl Serialize for ProfileOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One entry read from `system.profile`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub op: ProfileOp,
    pub namespace: String,
    pub millis: i64,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_examined: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_returned: Option<i64>,
}

impl ProfileRecord {
    /// Decode a raw profiler document. Returns `None` when `op` or `ns` is missing.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let op = ProfileOp::parse(doc.get_str("op").ok()?);
        let namespace = doc.get_str("ns").ok()?.to_string();
        let timestamp = doc
            .get_datetime("ts")
            .ok()
            .and_then(|ts| DateTime::from_timestamp_millis(ts.timestamp_millis()));

        Some(Self {
            op,
            namespace,
            millis: read_i64(doc, "millis").unwrap_or(0),
            timestamp,
            query: doc.get_document("query").ok().cloned(),
            sort: doc.get_document("sort").ok().cloned(),
            command: doc.get_document("command").ok().cloned(),
            plan_summary: doc.get_str("planSummary").ok().map(str::to_string),
            docs_examined: read_i64(doc, "nscanned").or_else(|| read_i64(doc, "docsExamined")),
            n_returned: read_i64(doc, "nreturned"),
        })
    }

    /// Whether the embedded command is an aggregation.
    pub fn is_aggregate(&self) -> bool {
        self.command.as_ref().and_then(|command| command.get("aggregate")).is_some_and(is_truthy)
    }

    /// Plain queries and aggregations are the only records that yield index advice.
    pub fn is_analyzable(&self) -> bool {
        match self.op {
            ProfileOp::Query => true,
            ProfileOp::Command => self.is_aggregate(),
            ProfileOp::Other(_) => false,
        }
    }

    /// Query filter, whether recorded in the legacy `query` field or as a `find` command.
    pub fn filter(&self) -> Option<&Document> {
        if let Some(query) = &self.query {
            if query.contains_key("find") {
                return query.get_document("filter").ok();
            }
            return Some(query);
        }
        self.find_command()?.get_document("filter").ok()
    }

    /// Sort specification, resolved the same way as [`ProfileRecord::filter`].
    pub fn sort_spec(&self) -> Option<&Document> {
        if let Some(sort) = &self.sort {
            return Some(sort);
        }
        if let Some(query) = &self.query
            && query.contains_key("find")
        {
            return query.get_document("sort").ok();
        }
        self.find_command()?.get_document("sort").ok()
    }

    /// Stages of the aggregation pipeline, skipping entries that are not documents.
    pub fn pipeline(&self) -> Vec<Document> {
        self.command
            .as_ref()
            .and_then(|command| command.get_array("pipeline").ok())
            .map(|stages| stages.iter().filter_map(Bson::as_document).cloned().collect())
            .unwrap_or_default()
    }

    /// Collection targeted by an `aggregate` command, when it names one.
    pub fn aggregate_target(&self) -> Option<&str> {
        self.command.as_ref()?.get_str("aggregate").ok()
    }

    /// Collection part of the namespace (everything after the database name).
    pub fn collection_name(&self) -> Option<&str> {
        self.namespace.split_once('.').map(|(_, coll)| coll).filter(|coll| !coll.is_empty())
    }

    fn find_command(&self) -> Option<&Document> {
        self.command.as_ref().filter(|command| command.contains_key("find"))
    }
}

/// Selection criteria for profiler records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileQuery {
    pub min_millis: i64,
    pub collection: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self { min_millis: DEFAULT_MIN_MILLIS, collection: None, start_date: None, end_date: None }
    }
}

/// Profiling level accepted by the `profile` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "i32")]
pub enum ProfileLevel {
    Off,
    SlowOperations,
    All,
}

impl ProfileLevel {
    pub fn as_i32(self) -> i32 {
        match self {
            ProfileLevel::Off => 0,
            ProfileLevel::SlowOperations => 1,
            ProfileLevel::All => 2,
        }
    }
}

impl From<ProfileLevel> for i32 {
    fn from(level: ProfileLevel) -> Self {
        level.as_i32()
    }
}

impl TryFrom<i64> for ProfileLevel {
    type Error = Error;

    fn try_from(level: i64) -> Result<Self> {
        match level {
            0 => Ok(ProfileLevel::Off),
            1 => Ok(ProfileLevel::SlowOperations),
            2 => Ok(ProfileLevel::All),
            other => Err(Error::InvalidLevel(other)),
        }
    }
}

/// Response of `{ profile: -1 }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatus {
    pub level: i64,
    pub slowms: Option<i64>,
    pub sample_rate: Option<f64>,
    pub raw: Document,
}

impl ProfileStatus {
    pub fn from_document(doc: Document) -> Self {
        Self {
            level: read_i64(&doc, "was").unwrap_or(0),
            slowms: read_i64(&doc, "slowms"),
            sample_rate: doc.get_f64("sampleRate").ok(),
            raw: doc,
        }
    }
}

/// Acknowledgement of a profiling level change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLevelAck {
    pub level: ProfileLevel,
    pub previous_level: Option<i64>,
    pub slowms: Option<i64>,
}

pub(crate) fn read_i64(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.is_finite() => Some(*v as i64),
        _ => None,
    }
}

fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::String(s) => !s.is_empty(),
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0 && !v.is_nan(),
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}
