//! Database handle abstraction shared by the live driver and the read-only proxy.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Collection, Database};

use crate::error::Result;

/// Database-level operations used by the insights engine.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Database name, used to build namespaces such as `<db>.system.profile`.
    fn name(&self) -> &str;

    /// Run a database command and return the server reply.
    async fn run_command(&self, command: Document) -> Result<Document>;

    /// Obtain a handle to a collection.
    fn collection(&self, name: &str) -> Result<Arc<dyn CollectionHandle>>;

    /// Create an index on `collection`, returning the index name.
    async fn create_index(&self, collection: &str, keys: Document) -> Result<String>;

    /// Drop the whole database.
    async fn drop_database(&self) -> Result<()>;
}

/// Collection-level operations used by the insights engine.
#[async_trait]
pub trait CollectionHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Materialize every document matching `filter`, optionally sorted.
    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<Vec<Document>>;

    async fn insert(&self, doc: Document) -> Result<()>;

    async fn update(&self, filter: Document, update: Document) -> Result<u64>;

    async fn delete(&self, filter: Document) -> Result<u64>;

    async fn drop_collection(&self) -> Result<()>;
}

/// [`DatabaseHandle`] backed by the MongoDB driver.
#[derive(Clone, Debug)]
pub struct MongoDatabase {
    db: Database,
}

impl MongoDatabase {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DatabaseHandle for MongoDatabase {
    fn name(&self) -> &str {
        self.db.name()
    }

    async fn run_command(&self, command: Document) -> Result<Document> {
        Ok(self.db.run_command(command).await?)
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn CollectionHandle>> {
        Ok(Arc::new(MongoCollection { coll: self.db.collection::<Document>(name) }))
    }

    async fn create_index(&self, collection: &str, keys: Document) -> Result<String> {
        let name = default_index_name(&keys);
        self.db
            .run_command(doc! {
                "createIndexes": collection,
                "indexes": [{ "key": keys, "name": name.clone() }],
            })
            .await?;
        Ok(name)
    }

    async fn drop_database(&self) -> Result<()> {
        Ok(self.db.drop().await?)
    }
}

/// [`CollectionHandle`] backed by the MongoDB driver.
#[derive(Clone, Debug)]
pub struct MongoCollection {
    coll: Collection<Document>,
}

#[async_trait]
impl CollectionHandle for MongoCollection {
    fn name(&self) -> &str {
        self.coll.name()
    }

    async fn find(&self, filter: Document, sort: Option<Document>) -> Result<Vec<Document>> {
        let cursor = match sort {
            Some(sort) => self.coll.find(filter).sort(sort).await?,
            None => self.coll.find(filter).await?,
        };
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs)
    }

    async fn insert(&self, doc: Document) -> Result<()> {
        self.coll.insert_one(doc).await?;
        Ok(())
    }

    async fn update(&self, filter: Document, update: Document) -> Result<u64> {
        Ok(self.coll.update_many(filter, update).await?.modified_count)
    }

    async fn delete(&self, filter: Document) -> Result<u64> {
        Ok(self.coll.delete_many(filter).await?.deleted_count)
    }

    async fn drop_collection(&self) -> Result<()> {
        Ok(self.coll.drop().await?)
    }
}

/// Server-style default index name, e.g. `{ a: 1, b: -1 }` becomes `a_1_b_-1`.
pub fn default_index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, direction)| {
            let direction = match direction {
                mongodb::bson::Bson::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{field}_{direction}")
        })
        .collect::<Vec<_>>()
        .join("_")
}
