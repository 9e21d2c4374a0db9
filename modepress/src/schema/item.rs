use crate::error::Result;
use crate::models::{Dependency, ModelRegistry};
use crate::schema::items::ItemKind;
use crate::schema::options::{ExpandContext, JsonOptions};
use futures::future::try_join_all;
use serde_json::Value;
use uuid::Uuid;

/// Names carried by every stored document and never usable by an item
pub const RESERVED_NAMES: &[&str] = &["_id", "_requiredDependencies", "_optionalDependencies"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Behavioural flags shared by every item kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    /// Left out of client projections unless `verbose` is requested
    pub sensitive: bool,
    /// No two records may share this value
    pub unique: bool,
    /// Scopes the uniqueness check to records sharing this value
    pub unique_indexer: bool,
    /// Ask the store for an index on this field
    pub indexable: bool,
    /// Must be set before the first insert
    pub required: bool,
}

/// A named, typed field slot in a schema
///
/// Example usage:
/// ```rust
/// use modepress::schema::{SchemaItem, TextItem};
///
/// let slug = SchemaItem::new("slug", TextItem::default().max_characters(128))
///     .unique()
///     .required();
/// assert!(slug.flags.unique && slug.flags.required);
/// ```
#[derive(Debug, PartialEq)]
pub struct SchemaItem {
    name: String,
    pub flags: ItemFlags,
    modified: bool,
    pub kind: ItemKind,
}

/// Clones start unmodified and without any resolved references
impl Clone for SchemaItem {
    fn clone(&self) -> Self {
        let mut kind = self.kind.clone();
        kind.clear_resolved();
        Self {
            name: self.name.clone(),
            flags: self.flags,
            modified: false,
            kind,
        }
    }
}

impl SchemaItem {
    pub fn new(name: impl Into<String>, kind: impl Into<ItemKind>) -> Self {
        Self {
            name: name.into(),
            flags: ItemFlags::default(),
            modified: false,
            kind: kind.into(),
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.flags.unique = true;
        self
    }

    pub fn unique_indexer(mut self) -> Self {
        self.flags.unique_indexer = true;
        self
    }

    pub fn indexable(mut self) -> Self {
        self.flags.indexable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.flags.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `set_value` has been called since construction or cloning
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Coerce and store a new value, marking the item modified.
    /// The previous value is overwritten even when equal.
    pub fn set_value(&mut self, value: &Value) -> Result<()> {
        self.kind.set(&self.name, value)?;
        self.modified = true;
        Ok(())
    }

    /// Check the current value, applying any coercion in place
    pub async fn validate(&mut self, registry: &ModelRegistry) -> Result<()> {
        self.kind.validate(&self.name, registry).await
    }

    /// Value as stored, never expanded
    pub fn db_value(&self) -> Value {
        self.kind.db_value()
    }

    pub(crate) async fn get_value(
        &self,
        options: &JsonOptions,
        ctx: &ExpandContext,
        registry: &ModelRegistry,
    ) -> Result<Value> {
        self.kind.get_value(&self.name, options, ctx, registry).await
    }

    /// Register this record on every target the last validation resolved
    pub async fn post_upsert(
        &self,
        record_id: Uuid,
        collection: &str,
        registry: &ModelRegistry,
    ) -> Result<()> {
        let Some((target, ids, kind)) = self.kind.resolved_references() else {
            return Ok(());
        };
        if ids.is_empty() {
            return Ok(());
        }

        let model = registry.get(target)?;
        let dependency = Dependency::new(record_id, collection, &self.name);
        try_join_all(
            ids.iter()
                .map(|id| model.add_dependency(*id, kind, &dependency)),
        )
        .await?;
        Ok(())
    }

    /// Remove this record from the dependency lists of every stored target
    pub async fn post_delete(
        &self,
        record_id: Uuid,
        collection: &str,
        registry: &ModelRegistry,
    ) -> Result<()> {
        let Some((target, ids)) = self.kind.references() else {
            return Ok(());
        };
        self.release(target, &ids, record_id, collection, registry)
            .await
    }

    pub(crate) async fn release(
        &self,
        target: &str,
        ids: &[Uuid],
        record_id: Uuid,
        collection: &str,
        registry: &ModelRegistry,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let model = registry.get(target)?;
        let dependency = Dependency::new(record_id, collection, &self.name);
        try_join_all(ids.iter().map(|id| model.remove_dependency(*id, &dependency))).await?;
        Ok(())
    }
}
