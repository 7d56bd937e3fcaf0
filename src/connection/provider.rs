//! Selection of the database handle every insights operation runs against.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use mongodb::Client;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

use super::handle::{DatabaseHandle, MongoDatabase};
use super::read_only::ReadOnlyDatabase;
use crate::error::{Error, Result};
use crate::helpers::validate::{redact_uri_password, validate_mongodb_uri};

/// Caller-managed source of database handles, e.g. a host application's pool.
pub type ConnectionSupplier = Arc<dyn Fn() -> Arc<dyn DatabaseHandle> + Send + Sync>;

/// Driver overrides for the analysis connection.
#[derive(Clone, Debug, Default)]
pub struct AnalysisOptions {
    /// Database to analyze. Defaults to the URI's database, then the primary's.
    pub database: Option<String>,
    pub app_name: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
    pub direct_connection: Option<bool>,
}

enum Source {
    Primary(Arc<dyn DatabaseHandle>),
    Supplier(ConnectionSupplier),
}

/// Releases the resources behind an analysis handle. Runs exactly once, after reads drain.
pub(crate) type Closer = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send + Sync>;

struct AnalysisConnection {
    handle: Arc<dyn DatabaseHandle>,
    close: Closer,
}

/// Hands out the primary handle, or the read-only analysis handle once configured.
///
/// Reads hold a [`ConnectionLease`] for their whole duration. Reconfiguring the
/// analysis connection waits for outstanding leases to drain before swapping, so
/// one call never sees two different connections.
pub struct ConnectionProvider {
    source: Source,
    analysis: Arc<RwLock<Option<AnalysisConnection>>>,
}

/// A database handle pinned for the duration of one operation.
pub struct ConnectionLease {
    handle: Arc<dyn DatabaseHandle>,
    restricted: bool,
    _guard: Option<OwnedRwLockReadGuard<Option<AnalysisConnection>>>,
}

impl ConnectionLease {
    /// Whether the handle is the write-restricted analysis connection.
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }
}

impl Deref for ConnectionLease {
    type Target = dyn DatabaseHandle;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl ConnectionProvider {
    /// Provider over the application's primary database handle.
    pub fn new(primary: Arc<dyn DatabaseHandle>) -> Self {
        Self { source: Source::Primary(primary), analysis: Arc::default() }
    }

    /// Provider whose handles always come from `supplier`, overriding the
    /// primary and any analysis connection.
    pub fn with_supplier(supplier: ConnectionSupplier) -> Self {
        Self { source: Source::Supplier(supplier), analysis: Arc::default() }
    }

    /// Handle for reads and index creation.
    pub async fn current_connection(&self) -> ConnectionLease {
        if let Source::Supplier(supplier) = &self.source {
            return ConnectionLease { handle: supplier(), restricted: false, _guard: None };
        }

        let guard = self.analysis.clone().read_owned().await;
        let analysis = (*guard).as_ref().map(|conn| conn.handle.clone());
        match analysis {
            Some(handle) => ConnectionLease { handle, restricted: true, _guard: Some(guard) },
            None => {
                ConnectionLease { handle: self.control_connection(), restricted: false, _guard: None }
            }
        }
    }

    /// Handle for profiler level control. Never the analysis connection.
    pub fn control_connection(&self) -> Arc<dyn DatabaseHandle> {
        match &self.source {
            Source::Primary(primary) => primary.clone(),
            Source::Supplier(supplier) => supplier(),
        }
    }

    /// Open a read-only analysis connection and route subsequent reads through it.
    ///
    /// The new connection is verified before it replaces the current one; on any
    /// failure the previous analysis connection stays in place.
    pub async fn configure_analysis_connection(
        &self,
        connection_string: &str,
        options: AnalysisOptions,
    ) -> Result<()> {
        let uri = connection_string.trim();
        if uri.is_empty() {
            return Err(Error::Configuration("connection string is required".to_string()));
        }
        validate_mongodb_uri(uri).map_err(Error::Configuration)?;

        let mut client_options = ClientOptions::parse(uri).await.map_err(configuration_error)?;
        if options.app_name.is_some() {
            client_options.app_name = options.app_name;
        }
        if options.connect_timeout.is_some() {
            client_options.connect_timeout = options.connect_timeout;
        }
        if options.server_selection_timeout.is_some() {
            client_options.server_selection_timeout = options.server_selection_timeout;
        }
        if options.direct_connection.is_some() {
            client_options.direct_connection = options.direct_connection;
        }
        let database = options
            .database
            .or_else(|| client_options.default_database.clone())
            .unwrap_or_else(|| self.control_connection().name().to_string());

        let client = Client::with_options(client_options).map_err(configuration_error)?;
        let db = client.database(&database);
        // Ping to verify connection
        db.run_command(doc! { "ping": 1 }).await.map_err(configuration_error)?;

        let handle = Arc::new(ReadOnlyDatabase::new(Arc::new(MongoDatabase::new(db))));
        self.install_analysis(handle, shutdown_client(client)).await;
        log::info!(
            "Analysis connection configured: {} (database {database})",
            redact_uri_password(uri)
        );
        Ok(())
    }

    /// Close the analysis connection and route reads back to the primary.
    pub async fn clear_analysis_connection(&self) {
        let previous = self.analysis.write().await.take();
        if let Some(previous) = previous {
            close_connection(previous).await;
            log::info!("Analysis connection closed");
        }
    }

    pub async fn has_analysis_connection(&self) -> bool {
        self.analysis.read().await.is_some()
    }

    /// Swap in a restricted handle, waiting for in-flight reads on the old one.
    pub(crate) async fn install_analysis(&self, handle: Arc<ReadOnlyDatabase>, closer: Closer) {
        let installed = AnalysisConnection { handle, close: closer };
        let previous = self.analysis.write().await.replace(installed);
        if let Some(previous) = previous {
            close_connection(previous).await;
        }
    }
}

/// The driver's shutdown waits for outstanding database handles, so ours goes first.
async fn close_connection(connection: AnalysisConnection) {
    drop(connection.handle);
    (connection.close)().await;
}

fn shutdown_client(client: Client) -> Closer {
    Box::new(move || async move { client.shutdown().await }.boxed())
}

fn configuration_error(err: mongodb::error::Error) -> Error {
    Error::Configuration(err.to_string())
}
