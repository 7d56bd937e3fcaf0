// Data structures and types

pub mod analysis;
pub mod index;
pub mod profile;

pub use analysis::{AnalysisResult, Issue, IssueType, QueryDetails, Severity};
pub use index::{IndexCreated, IndexSuggestion};
pub use profile::{
    DEFAULT_MIN_MILLIS, PROFILE_COLLECTION, ProfileLevel, ProfileLevelAck, ProfileOp,
    ProfileQuery, ProfileRecord, ProfileStatus,
};
