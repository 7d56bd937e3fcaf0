//! Profiler record analysis.
//!
//! This module provides:
//! - `classifier`: issue detection and query-details normalization
//! - `suggestion`: index suggestion derivation and rendering
//! - `parser`: strict parsing of rendered suggestions

pub mod classifier;
pub mod parser;
pub mod suggestion;

pub use classifier::{analyze, analyze_record, no_index_severity, query_details};
pub use parser::parse_suggestion;
pub use suggestion::{render_create_index, suggest_index};
