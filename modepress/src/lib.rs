//! Modepress - the data layer of the Modepress CMS
//!
//! Modepress maps typed records onto a MongoDB-style document store:
//! - `schema` describes a record as an ordered set of typed items
//! - `models` binds a schema to a collection and runs the record lifecycle
//! - references between models expand into nested objects on request
//! - `collections` ships the stock users, posts, comments, categories,
//!   volumes and files models
//!
//! ```rust
//! use modepress::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let registry = ModelRegistry::new();
//! modepress::collections::register_all(&registry)?;
//! registry.initialize(&MemoryDatabase::new()).await?;
//!
//! let users = registry.get("users")?;
//! let user = users
//!     .create_instance(&json!({"username": "ada", "email": "ada@example.com", "password": "x"}))
//!     .await?;
//! let public = user.get_as_json(&JsonOptions::default(), &registry).await?;
//! assert!(public.get("email").is_none());
//! # Ok::<(), modepress::Error>(())
//! # }).unwrap();
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod collections;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod schema;
pub mod utils;

// Re-export main types for public API
pub use config::OdmConfig;
pub use database::{Collection, Database, Document, FindQuery, MemoryDatabase, Update};
pub use error::{Error, Result};
pub use models::{BatchResult, Model, ModelRegistry, Record};
pub use schema::{JsonOptions, Schema, SchemaItem};

pub mod prelude {
    pub use crate::*;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;

    pub use crate::database::OrderDirection;
    pub use crate::error::ErrorContext;
    pub use crate::models::{Dependency, DependencyKind};
    pub use crate::schema::{
        BoolItem, DateItem, ForeignKeyItem, HtmlItem, IdArrayItem, IdItem, ItemKind, JsonItem,
        NumberArrayItem, NumberItem, TextArrayItem, TextItem,
    };
}
