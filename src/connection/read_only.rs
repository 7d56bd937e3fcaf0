//! Write-restricting wrapper for analysis connections.
//!
//! Analysis usually runs against a secondary or a snapshot, so writes through
//! that connection must be impossible. The wrappers below keep the read
//! interface of [`DatabaseHandle`] but reject every mutating verb, and only hand
//! out the profiler collection.

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::handle::{CollectionHandle, DatabaseHandle};
use crate::error::{Error, Result};
use crate::models::PROFILE_COLLECTION;

/// Commands forwarded through the proxy. `profile` is only allowed as a status read.
const ALLOWED_COMMANDS: &[&str] = &[
    "ping",
    "hello",
    "isMaster",
    "buildInfo",
    "serverStatus",
    "dbStats",
    "collStats",
    "listIndexes",
    "listCollections",
    "explain",
    "createIndexes",
];

/// Read-only view over another database handle.
pub struct ReadOnlyDatabase {
    inner: Arc<dyn DatabaseHandle>,
}

impl ReadOnlyDatabase {
    pub fn new(inner: Arc<dyn DatabaseHandle>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DatabaseHandle for ReadOnlyDatabase {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run_command(&self, command: Document) -> Result<Document> {
        check_command(&command)?;
        self.inner.run_command(command).await
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn CollectionHandle>> {
        if name != PROFILE_COLLECTION {
            return Err(Error::AccessDenied(name.to_string()));
        }
        let inner = self.inner.collection(name)?;
        Ok(Arc::new(ReadOnlyCollection { inner }))
    }

    async fn create_index(&self, collection: &str, keys: Document) -> Result<String> {
        self.inner.create_index(collection, keys).await
    }

    async fn drop_database(&self) -> Result<()> {
        Err(forbidden(format!("drop database '{}'", self.inner.name())))
    }
}

/// Read-only view over the profiler collection.
struct ReadOnlyCollection {
    inner: Arc<dyn CollectionHandle>,
}

#[async_trait]
impl CollectionHandle for ReadOnlyCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<Vec<Document>> {
        self.inner.find(filter, sort).await
    }

    async fn insert(&self, _doc: Document) -> Result<()> {
        Err(forbidden(format!("insert into '{}'", self.inner.name())))
    }

    async fn update(&self, _filter: Document, _update: Document) -> Result<u64> {
        Err(forbidden(format!("update '{}'", self.inner.name())))
    }

    async fn delete(&self, _filter: Document) -> Result<u64> {
        Err(forbidden(format!("delete from '{}'", self.inner.name())))
    }

    async fn drop_collection(&self) -> Result<()> {
        Err(forbidden(format!("drop collection '{}'", self.inner.name())))
    }
}

fn forbidden(operation: String) -> Error {
    Error::ForbiddenOperation(operation)
}

fn check_command(command: &Document) -> Result<()> {
    let Some((name, value)) = command.iter().next() else {
        return Err(forbidden("empty command".to_string()));
    };
    let allowed = match name.as_str() {
        // Extra fields such as `slowms` or `filter` change server settings even at level -1.
        "profile" => command.len() == 1 && is_status_read(value),
        other => ALLOWED_COMMANDS.contains(&other),
    };
    if allowed { Ok(()) } else { Err(forbidden(format!("command '{name}'"))) }
}

fn is_status_read(value: &Bson) -> bool {
    match value {
        Bson::Int32(v) => *v == -1,
        Bson::Int64(v) => *v == -1,
        Bson::Double(v) => *v == -1.0,
        _ => false,
    }
}
