//! Document store collaborator
//!
//! The model layer only needs a MongoDB-shaped collection API: filtered
//! finds with sort/skip/limit/projection, counts, single-document inserts,
//! `$set`-style updates and deletes. `Collection` and `Database` describe
//! that contract; `memory` provides an in-process implementation.

pub mod collection;
pub mod memory;
pub mod query;
pub mod selector;

use serde_json::{Map, Value};

// Re-export main types for convenience
pub use collection::{Collection, Database, UpdateResult};
pub use memory::{MemoryCollection, MemoryDatabase};
pub use query::{FindQuery, OrderDirection, Update};

/// A stored document
pub type Document = Map<String, Value>;

/// Field holding a document's identity
pub const ID_FIELD: &str = "_id";
