//! MongoDB connection management and operations.
//!
//! This module provides:
//! - `ConnectionProvider`: primary/analysis handle selection
//! - `handle`: the database and collection handle traits and their driver implementation
//! - `read_only`: write-restricting wrapper for the analysis connection
//! - `ops`: Profiler control, record reading and index creation

pub mod handle;
pub mod ops;
pub mod provider;
pub mod read_only;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items at the crate level
pub use handle::{CollectionHandle, DatabaseHandle, MongoCollection, MongoDatabase};
pub use ops::records::build_profile_filter;
pub use provider::{AnalysisOptions, ConnectionLease, ConnectionProvider, ConnectionSupplier};
pub use read_only::ReadOnlyDatabase;
