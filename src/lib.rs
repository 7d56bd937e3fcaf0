//! Query performance analysis over the MongoDB profiler.
//!
//! Reads `system.profile`, classifies slow operations, suggests indexes and
//! applies a confirmed suggestion. Reads can be routed through a separate
//! analysis connection that refuses writes.

pub mod analysis;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod models;

pub use config::InsightsConfig;
pub use connection::{AnalysisOptions, ConnectionProvider, DatabaseHandle, MongoDatabase};
pub use engine::{AppliedIndex, Authorizer, ConnectionInfo, InsightsEngine};
pub use error::{Error, Result};
