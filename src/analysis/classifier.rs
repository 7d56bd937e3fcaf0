//! Heuristic classification of profiler records into performance issues.

use crate::models::{
    AnalysisResult, Issue, IssueType, ProfileOp, ProfileRecord, QueryDetails, Severity,
};

use super::suggestion::suggest_index;

/// Plan summary marker for an index scan.
pub const INDEX_SCAN_MARKER: &str = "IXSCAN";
/// Operations slower than this are reported as slow queries.
pub const SLOW_QUERY_MILLIS: i64 = 1000;
/// Unindexed operations slower than this are at least medium severity.
pub const MEDIUM_SEVERITY_MILLIS: i64 = 100;
/// Examined-to-returned ratio above which filtering is considered inefficient.
pub const MAX_SCAN_RATIO: f64 = 100.0;

/// Classify every record, preserving input order.
pub fn analyze(records: &[ProfileRecord]) -> Vec<AnalysisResult> {
    records.iter().map(analyze_record).collect()
}

/// Run every detector against one record.
pub fn analyze_record(record: &ProfileRecord) -> AnalysisResult {
    let recommended_index = suggest_index(record).map(|suggestion| suggestion.source);

    let issues = [no_index_issue(record), scan_ratio_issue(record), slow_query_issue(record)]
        .into_iter()
        .flatten()
        .map(|draft| draft.into_issue(recommended_index.clone()))
        .collect();

    AnalysisResult {
        operation: record.op.clone(),
        namespace: record.namespace.clone(),
        query: record.query.clone(),
        query_details: query_details(record),
        execution_time: record.millis,
        timestamp: record.timestamp,
        issues,
    }
}

/// Severity of an unindexed operation, a pure function of its duration.
pub fn no_index_severity(millis: i64) -> Severity {
    if millis > SLOW_QUERY_MILLIS {
        Severity::High
    } else if millis > MEDIUM_SEVERITY_MILLIS {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Normalized find/aggregate projection of a record.
pub fn query_details(record: &ProfileRecord) -> QueryDetails {
    if record.op == ProfileOp::Command && record.is_aggregate() {
        QueryDetails::Aggregate { pipeline: record.pipeline() }
    } else {
        QueryDetails::Find {
            filter: record.filter().cloned().unwrap_or_default(),
            sort: record.sort_spec().cloned(),
        }
    }
}

struct IssueDraft {
    issue_type: IssueType,
    severity: Severity,
    message: String,
    suggestion: &'static str,
}

impl IssueDraft {
    fn into_issue(self, recommended_index: Option<String>) -> Issue {
        Issue {
            issue_type: self.issue_type,
            severity: self.severity,
            message: self.message,
            suggestion: self.suggestion.to_string(),
            recommended_index,
        }
    }
}

fn no_index_issue(record: &ProfileRecord) -> Option<IssueDraft> {
    let uses_index =
        record.plan_summary.as_deref().is_some_and(|plan| plan.contains(INDEX_SCAN_MARKER));
    if uses_index {
        return None;
    }
    Some(IssueDraft {
        issue_type: IssueType::NoIndex,
        severity: no_index_severity(record.millis),
        message: "Query is not using any index".to_string(),
        suggestion: "Consider creating an index for the queried fields",
    })
}

fn scan_ratio_issue(record: &ProfileRecord) -> Option<IssueDraft> {
    let scanned = record.docs_examined.filter(|n| *n != 0)?;
    let returned = record.n_returned.filter(|n| *n != 0)?;
    let ratio = scanned as f64 / returned as f64;
    if ratio <= MAX_SCAN_RATIO {
        return None;
    }
    Some(IssueDraft {
        issue_type: IssueType::HighScanRatio,
        severity: Severity::Medium,
        message: format!("Scanned {scanned} documents but only returned {returned}"),
        suggestion: "Review query filters and indexes to reduce the number of scanned documents",
    })
}

fn slow_query_issue(record: &ProfileRecord) -> Option<IssueDraft> {
    if record.millis <= SLOW_QUERY_MILLIS {
        return None;
    }
    Some(IssueDraft {
        issue_type: IssueType::SlowQuery,
        severity: Severity::High,
        message: format!("Query took {}ms to execute", record.millis),
        suggestion: "Optimize query performance or consider adding indexes",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Document, doc};

    fn record(raw: Document) -> ProfileRecord {
        ProfileRecord::from_document(&raw).unwrap()
    }

    fn query_record(millis: i64, plan: &str) -> ProfileRecord {
        record(doc! {
            "op": "query",
            "ns": "mydb.orders",
            "millis": millis,
            "query": { "a": 1, "b": 2 },
            "planSummary": plan,
        })
    }

    fn issue_types(result: &AnalysisResult) -> Vec<IssueType> {
        result.issues.iter().map(|issue| issue.issue_type).collect()
    }

    #[test]
    fn no_index_severity_boundaries() {
        assert_eq!(no_index_severity(1001), Severity::High);
        assert_eq!(no_index_severity(1000), Severity::Medium);
        assert_eq!(no_index_severity(101), Severity::Medium);
        assert_eq!(no_index_severity(100), Severity::Low);
        assert_eq!(no_index_severity(0), Severity::Low);
    }

    #[test]
    fn collection_scan_yields_no_index_issue() {
        let result = analyze_record(&query_record(250, "COLLSCAN"));
        assert_eq!(issue_types(&result), vec![IssueType::NoIndex]);
        let issue = &result.issues[0];
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(
            issue.recommended_index.as_deref(),
            Some("db.orders.createIndex({ a: 1, b: 1 })")
        );
    }

    #[test]
    fn index_scan_yields_no_issue() {
        let result = analyze_record(&query_record(250, "IXSCAN { a: 1 }"));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn missing_plan_summary_counts_as_unindexed() {
        let result = analyze_record(&record(doc! { "op": "query", "ns": "db.c", "millis": 150 }));
        assert_eq!(issue_types(&result), vec![IssueType::NoIndex]);
        assert_eq!(result.issues[0].recommended_index, None);
    }

    #[test]
    fn slow_unindexed_query_accumulates_issues() {
        let result = analyze_record(&query_record(1500, "COLLSCAN"));
        assert_eq!(issue_types(&result), vec![IssueType::NoIndex, IssueType::SlowQuery]);
        assert!(result.issues.iter().all(|issue| issue.severity == Severity::High));
        assert_eq!(result.issues[1].message, "Query took 1500ms to execute");
        assert_eq!(result.worst_severity(), Some(Severity::High));
    }

    #[test]
    fn slow_query_is_independent_of_index_usage() {
        let result = analyze_record(&query_record(2000, "IXSCAN { a: 1 }"));
        assert_eq!(issue_types(&result), vec![IssueType::SlowQuery]);
    }

    #[test]
    fn high_scan_ratio() {
        let mut slow = query_record(200, "IXSCAN { a: 1 }");
        slow.docs_examined = Some(1000);
        slow.n_returned = Some(5);
        let result = analyze_record(&slow);
        assert_eq!(issue_types(&result), vec![IssueType::HighScanRatio]);
        assert_eq!(result.issues[0].severity, Severity::Medium);
        assert_eq!(result.issues[0].message, "Scanned 1000 documents but only returned 5");

        let mut fine = query_record(200, "IXSCAN { a: 1 }");
        fine.docs_examined = Some(50);
        fine.n_returned = Some(40);
        assert!(analyze_record(&fine).issues.is_empty());
    }

    #[test]
    fn zero_returned_skips_scan_ratio() {
        let mut record = query_record(200, "IXSCAN { a: 1 }");
        record.docs_examined = Some(1_000_000);
        record.n_returned = Some(0);
        assert!(analyze_record(&record).issues.is_empty());
    }

    #[test]
    fn query_details_shapes() {
        let find = query_details(&record(doc! {
            "op": "query",
            "ns": "db.c",
            "command": { "find": "c", "sort": { "x": 1 } },
        }));
        assert_eq!(find, QueryDetails::Find { filter: Document::new(), sort: Some(doc! { "x": 1 }) });

        let aggregate = query_details(&record(doc! {
            "op": "command",
            "ns": "db.c",
            "command": { "aggregate": "c" },
        }));
        assert_eq!(aggregate, QueryDetails::Aggregate { pipeline: vec![] });
    }

    #[test]
    fn serializes_with_wire_names() {
        let result = analyze_record(&query_record(1500, "COLLSCAN"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operation"], "query");
        assert_eq!(json["executionTime"], 1500);
        assert_eq!(json["queryDetails"]["type"], "find");
        assert_eq!(json["issues"][0]["type"], "NO_INDEX");
        assert_eq!(json["issues"][0]["severity"], "high");
        assert_eq!(json["issues"][1]["type"], "SLOW_QUERY");
        assert!(json["issues"][0]["recommendedIndex"].is_string());
    }

    #[test]
    fn preserves_input_order() {
        let records = vec![query_record(300, "COLLSCAN"), query_record(200, "IXSCAN { a: 1 }")];
        let results = analyze(&records);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].execution_time, 300);
        assert_eq!(results[1].execution_time, 200);
    }
}
