//! Operations exposed to the host application.
//!
//! Every operation checks the injected authorization predicate before touching
//! the database.

use std::sync::Arc;

use mongodb::bson::Document;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analysis;
use crate::connection::{AnalysisOptions, ConnectionProvider};
use crate::error::{Error, Result};
use crate::models::{
    AnalysisResult, IndexCreated, IndexSuggestion, ProfileLevelAck, ProfileQuery, ProfileRecord,
    ProfileStatus,
};

/// Host-supplied authorization predicate.
pub type Authorizer = Arc<dyn Fn() -> bool + Send + Sync>;

/// Outcome of confirming a selected suggestion.
///
/// Once the index exists this is always returned; a failed re-analysis is
/// reported in `refresh_error` so the creation is never mistaken for a failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedIndex {
    pub suggestion: IndexSuggestion,
    pub created: IndexCreated,
    /// Records re-analyzed after the index was created.
    pub results: Vec<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

/// Which connection reads currently run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub database: String,
    /// True when reads go through the write-restricted analysis connection.
    pub restricted: bool,
}

pub struct InsightsEngine {
    provider: ConnectionProvider,
    authorize: Authorizer,
    pending: Mutex<Option<IndexSuggestion>>,
}

impl InsightsEngine {
    /// Engine over `provider` that allows every caller.
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider, authorize: Arc::new(|| true), pending: Mutex::new(None) }
    }

    /// Gate every operation on `authorize`.
    pub fn with_authorizer(mut self, authorize: Authorizer) -> Self {
        self.authorize = authorize;
        self
    }

    fn check_authorized(&self) -> Result<()> {
        if (self.authorize)() { Ok(()) } else { Err(Error::Unauthorized) }
    }

    pub async fn profile_status(&self) -> Result<ProfileStatus> {
        self.check_authorized()?;
        self.provider.profile_status().await
    }

    pub async fn set_profile_level(&self, level: i64) -> Result<ProfileLevelAck> {
        self.check_authorized()?;
        self.provider.set_profile_level(level).await
    }

    pub async fn fetch_records(&self, query: &ProfileQuery) -> Result<Vec<ProfileRecord>> {
        self.check_authorized()?;
        self.provider.fetch_records(query).await
    }

    /// Fetch records matching `query` and classify each of them.
    pub async fn analyze(&self, query: &ProfileQuery) -> Result<Vec<AnalysisResult>> {
        self.check_authorized()?;
        let records = self.provider.fetch_records(query).await?;
        Ok(analysis::analyze(&records))
    }

    pub async fn create_index(&self, collection: &str, keys: Document) -> Result<IndexCreated> {
        self.check_authorized()?;
        self.provider.create_index(collection, keys).await
    }

    pub async fn configure_analysis_connection(
        &self,
        connection_string: &str,
        options: AnalysisOptions,
    ) -> Result<()> {
        self.check_authorized()?;
        self.provider.configure_analysis_connection(connection_string, options).await
    }

    pub async fn connection_info(&self) -> Result<ConnectionInfo> {
        self.check_authorized()?;
        let lease = self.provider.current_connection().await;
        Ok(ConnectionInfo { database: lease.name().to_string(), restricted: lease.is_restricted() })
    }

    pub async fn has_analysis_connection(&self) -> Result<bool> {
        self.check_authorized()?;
        Ok(self.provider.has_analysis_connection().await)
    }

    pub async fn clear_analysis_connection(&self) -> Result<()> {
        self.check_authorized()?;
        self.provider.clear_analysis_connection().await;
        Ok(())
    }

    /// Parse `text` and hold it as the pending suggestion.
    ///
    /// A malformed suggestion leaves any previous selection in place.
    pub fn select_suggestion(&self, text: &str) -> Result<IndexSuggestion> {
        self.check_authorized()?;
        let suggestion = analysis::parse_suggestion(text)?;
        *self.pending.lock() = Some(suggestion.clone());
        Ok(suggestion)
    }

    /// Discard the pending suggestion, returning it if there was one.
    pub fn cancel_suggestion(&self) -> Result<Option<IndexSuggestion>> {
        self.check_authorized()?;
        Ok(self.pending.lock().take())
    }

    pub fn pending_suggestion(&self) -> Option<IndexSuggestion> {
        self.pending.lock().clone()
    }

    /// Create the pending index, then re-analyze with `query`.
    ///
    /// The selection is consumed whether creation succeeds or fails.
    pub async fn confirm_suggestion(&self, query: &ProfileQuery) -> Result<AppliedIndex> {
        self.check_authorized()?;
        let suggestion = self.pending.lock().take().ok_or(Error::NoSelection)?;
        let created =
            self.provider.create_index(&suggestion.collection, suggestion.keys.clone()).await?;

        let (results, refresh_error) = match self.provider.fetch_records(query).await {
            Ok(records) => (analysis::analyze(&records), None),
            Err(err) => {
                log::warn!("Index '{}' created but re-analysis failed: {err}", created.result);
                (Vec::new(), Some(err.to_string()))
            }
        };
        Ok(AppliedIndex { suggestion, created, results, refresh_error })
    }
}
