//! In-memory database handle for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use mongodb::bson::{Bson, Document, doc};
use parking_lot::Mutex;

use super::handle::{CollectionHandle, DatabaseHandle, default_index_name};
use super::provider::Closer;
use crate::error::{Error, Result};
use crate::models::PROFILE_COLLECTION;

#[derive(Default)]
struct MemoryState {
    profile: Vec<Document>,
    commands: Vec<Document>,
    indexes: Vec<(String, Document)>,
    calls: Vec<String>,
    finds: Vec<(Document, Option<Document>)>,
    level: i64,
    index_failure: Option<String>,
    read_failure: Option<String>,
}

/// Records every call and serves `system.profile` from a vector.
///
/// `find` ignores the filter; callers assert on [`MemoryDatabase::finds`] instead.
#[derive(Clone)]
pub(crate) struct MemoryDatabase {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.to_string(), state: Arc::default() }
    }

    pub(crate) fn push_profile(&self, doc: Document) {
        self.state.lock().profile.push(doc);
    }

    pub(crate) fn fail_index_creation(&self, message: &str) {
        self.state.lock().index_failure = Some(message.to_string());
    }

    /// Make every profiler read fail with a driver error.
    pub(crate) fn fail_reads(&self, message: &str) {
        self.state.lock().read_failure = Some(message.to_string());
    }

    pub(crate) fn commands(&self) -> Vec<Document> {
        self.state.lock().commands.clone()
    }

    pub(crate) fn created_indexes(&self) -> Vec<(String, Document)> {
        self.state.lock().indexes.clone()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn finds(&self) -> Vec<(Document, Option<Document>)> {
        self.state.lock().finds.clone()
    }

    pub(crate) fn level(&self) -> i64 {
        self.state.lock().level
    }

    fn record_call(&self, call: String) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl DatabaseHandle for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_command(&self, command: Document) -> Result<Document> {
        let mut state = self.state.lock();
        state.commands.push(command.clone());
        let reply = match command.get("profile") {
            Some(Bson::Int32(-1)) => {
                doc! { "was": state.level, "slowms": 100, "sampleRate": 1.0, "ok": 1 }
            }
            Some(Bson::Int32(level)) => {
                let was = std::mem::replace(&mut state.level, i64::from(*level));
                doc! { "was": was, "slowms": 100, "sampleRate": 1.0, "ok": 1 }
            }
            _ => doc! { "ok": 1 },
        };
        Ok(reply)
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn CollectionHandle>> {
        Ok(Arc::new(MemoryCollection { name: name.to_string(), db: self.clone() }))
    }

    async fn create_index(&self, collection: &str, keys: Document) -> Result<String> {
        let mut state = self.state.lock();
        if let Some(message) = state.index_failure.clone() {
            return Err(driver_error(message));
        }
        state.indexes.push((collection.to_string(), keys.clone()));
        Ok(default_index_name(&keys))
    }

    async fn drop_database(&self) -> Result<()> {
        self.record_call(format!("drop:{}", self.name));
        Ok(())
    }
}

struct MemoryCollection {
    name: String,
    db: MemoryDatabase,
}

#[async_trait]
impl CollectionHandle for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<Vec<Document>> {
        let mut state = self.db.state.lock();
        state.finds.push((filter, sort));
        if let Some(message) = state.read_failure.clone() {
            return Err(driver_error(message));
        }
        Ok(if self.name == PROFILE_COLLECTION { state.profile.clone() } else { Vec::new() })
    }

    async fn insert(&self, _doc: Document) -> Result<()> {
        self.db.record_call(format!("insert:{}", self.name));
        Ok(())
    }

    async fn update(&self, _filter: Document, _update: Document) -> Result<u64> {
        self.db.record_call(format!("update:{}", self.name));
        Ok(0)
    }

    async fn delete(&self, _filter: Document) -> Result<u64> {
        self.db.record_call(format!("delete:{}", self.name));
        Ok(0)
    }

    async fn drop_collection(&self) -> Result<()> {
        self.db.record_call(format!("drop:{}", self.name));
        Ok(())
    }
}

fn driver_error(message: String) -> Error {
    Error::Mongo(std::io::Error::other(message).into())
}

/// Close step for handles with nothing to release.
pub(crate) fn no_close() -> Closer {
    Box::new(|| async {}.boxed())
}

/// Close step that counts how often it ran.
pub(crate) fn counting_close(closed: &Arc<AtomicUsize>) -> Closer {
    let closed = closed.clone();
    Box::new(move || {
        async move {
            closed.fetch_add(1, Ordering::SeqCst);
        }
        .boxed()
    })
}
