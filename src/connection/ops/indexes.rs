//! Index creation on the current connection.

use mongodb::bson::Document;
use mongodb::error::ErrorKind;

use crate::connection::ConnectionProvider;
use crate::error::{Error, Result};
use crate::models::IndexCreated;

impl ConnectionProvider {
    /// Create an index on `collection`. Not retried: a conflicting index may already exist.
    pub async fn create_index(&self, collection: &str, keys: Document) -> Result<IndexCreated> {
        let conn = self.current_connection().await;
        match conn.create_index(collection, keys).await {
            Ok(name) => {
                log::info!("Created index '{name}' on '{}.{collection}'", conn.name());
                Ok(IndexCreated::new(name))
            }
            Err(Error::Mongo(err)) => Err(Error::IndexCreationFailed(driver_message(&err))),
            Err(err) => Err(err),
        }
    }
}

/// Server-reported message for command failures, the full driver error otherwise.
fn driver_message(err: &mongodb::error::Error) -> String {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => command.message.clone(),
        _ => err.to_string(),
    }
}
