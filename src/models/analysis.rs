// Analysis output types

use chrono::{DateTime, Utc};
use mongodb::bson::Document;
use serde::Serialize;

use super::profile::ProfileOp;

/// Category of a performance finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    NoIndex,
    HighScanRatio,
    SlowQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A finding attached to one profiler record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
    pub recommended_index: Option<String>,
}

/// Normalized shape of the analyzed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryDetails {
    Find {
        filter: Document,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Document>,
    },
    Aggregate {
        pipeline: Vec<Document>,
    },
}

/// Classifier output for one profiler record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub operation: ProfileOp,
    pub namespace: String,
    pub query: Option<Document>,
    pub query_details: QueryDetails,
    pub execution_time: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub issues: Vec<Issue>,
}

impl AnalysisResult {
    /// Highest severity among the issues, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}
