//! Collection and database traits
//!
//! This module provides the unified interface the model layer talks to,
//! whatever document store sits underneath it.

use crate::database::{Document, FindQuery, Update};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of an update operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Number of documents the selector matched
    pub matched: u64,
    /// Number of documents whose content actually changed
    pub modified: u64,
}

/// A named collection of JSON documents
///
/// Selectors are MongoDB-style query documents (see `database::selector`).
#[async_trait]
pub trait Collection: Send + Sync {
    /// Get the name of this collection
    fn name(&self) -> &str;

    /// Fetch every document matching the query, in sort order
    ///
    /// # Arguments
    /// * `query` - Selector plus sort, skip (`index`), `limit` and projection
    ///
    /// # Returns
    /// * `Ok(Vec<Document>)` - Matching documents, possibly projected
    /// * `Err(Error)` - If the selector is malformed or the store fails
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>>;

    /// Count the documents matching a selector
    async fn count(&self, selector: &Value) -> Result<u64>;

    /// Insert a document
    ///
    /// An identity is generated when the document has no `_id`.
    ///
    /// # Returns
    /// * `Ok(Uuid)` - Identity of the stored document
    /// * `Err(Error)` - If the identity already exists or the store fails
    async fn insert_one(&self, document: Document) -> Result<Uuid>;

    /// Insert several documents one after another
    async fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(self.insert_one(document).await?);
        }
        Ok(ids)
    }

    /// Apply an update to the first document matching the selector
    async fn update_one(&self, selector: &Value, update: &Update) -> Result<UpdateResult>;

    /// Delete the first document matching the selector, returning how many went
    async fn delete_one(&self, selector: &Value) -> Result<u64>;

    /// Delete every document matching the selector
    async fn delete_many(&self, selector: &Value) -> Result<u64>;

    /// Ask the store to index a field
    ///
    /// Stores without index support may ignore this.
    async fn create_index(&self, _field: &str) -> Result<()> {
        Ok(())
    }
}

/// A database hands out collections by name
#[async_trait]
pub trait Database: Send + Sync {
    /// Get the name of this database
    fn name(&self) -> &str;

    /// Get a collection, creating it if it does not exist yet
    async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>>;

    /// List the collections created so far
    async fn collection_names(&self) -> Vec<String>;
}
