//! Record shapes
//!
//! A `Schema` is an ordered set of named items describing one document
//! type. Models keep one as a template and clone it for every record they
//! read or write.

pub mod item;
pub mod items;
pub mod options;

pub use item::{is_reserved, ItemFlags, SchemaItem, RESERVED_NAMES};
pub use items::{
    BoolItem, DateItem, ForeignKeyItem, HtmlItem, IdArrayItem, IdItem, ItemKind, JsonItem,
    NumberArrayItem, NumberItem, NumberType, TextArrayItem, TextItem,
};
pub use options::JsonOptions;

use crate::database::{Document, ID_FIELD};
use crate::error::{Error, Result};
use crate::models::ModelRegistry;
use futures::future::{join_all, try_join_all, BoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;
use options::ExpandContext;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Ids held by one reference item at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReferences {
    pub item: String,
    pub collection: String,
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    items: IndexMap<String, SchemaItem>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, rejecting reserved and duplicate names
    pub fn add(&mut self, item: SchemaItem) -> Result<&mut SchemaItem> {
        let name = item.name().to_string();
        if is_reserved(&name) {
            return Err(Error::schema(format!(
                "'{}' is a reserved name and cannot be used by an item",
                name
            )));
        }
        if self.items.contains_key(&name) {
            return Err(Error::schema(format!(
                "An item with the name '{}' already exists",
                name
            )));
        }

        let entry = self.items.entry(name).or_insert(item);
        Ok(entry)
    }

    /// Builder form of `add`
    pub fn with(mut self, item: SchemaItem) -> Result<Self> {
        self.add(item)?;
        Ok(self)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&SchemaItem> {
        self.items.get(name)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut SchemaItem> {
        self.items.get_mut(name)
    }

    /// Remove an item, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<SchemaItem> {
        self.items.shift_remove(name)
    }

    pub fn items(&self) -> impl Iterator<Item = &SchemaItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Set every item named in `data`; unknown keys are ignored
    pub fn set(&mut self, data: &Value) -> Result<()> {
        let Value::Object(fields) = data else {
            return Err(Error::invalid_input(format!(
                "Record data must be an object, got {}",
                data
            )));
        };

        for (name, value) in fields {
            self.set_val(name, value)?;
        }
        Ok(())
    }

    /// Set a single item by name; returns `false` when no such item exists
    pub fn set_val(&mut self, name: &str, value: &Value) -> Result<bool> {
        match self.items.get_mut(name) {
            Some(item) => {
                item.set_value(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Load a stored document; coercion mirrors `set`
    pub fn deserialize(&mut self, data: &Document) -> Result<()> {
        for (name, value) in data {
            self.set_val(name, value)?;
        }
        Ok(())
    }

    /// Storage form of every item
    pub fn serialize(&self) -> Document {
        self.items
            .iter()
            .map(|(name, item)| (name.clone(), item.db_value()))
            .collect()
    }

    /// Validate the record
    ///
    /// With `check_required`, the first required item that was never set
    /// fails immediately. Otherwise every item is validated concurrently and
    /// all failures are collected: a single failure is returned as-is,
    /// several as `Error::ValidationFailures` in schema order.
    pub async fn validate(&mut self, check_required: bool, registry: &ModelRegistry) -> Result<()> {
        if check_required {
            if let Some(item) = self
                .items
                .values()
                .find(|item| item.flags.required && !item.is_modified())
            {
                return Err(Error::RequiredField(item.name().to_string()));
            }
        }

        let results = join_all(
            self.items
                .values_mut()
                .map(|item| item.validate(registry)),
        )
        .await;

        let mut failures: Vec<Error> = results.into_iter().filter_map(|r| r.err()).collect();
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(Error::ValidationFailures(failures)),
        }
    }

    /// Client projection of this record under the identity `id`
    pub async fn get_as_json(
        &self,
        id: Uuid,
        collection: &str,
        options: &JsonOptions,
        registry: &ModelRegistry,
    ) -> Result<Value> {
        options.validate()?;
        self.project(id, options, ExpandContext::root(collection, id), registry)
            .await
    }

    pub(crate) fn project<'a>(
        &'a self,
        id: Uuid,
        options: &'a JsonOptions,
        ctx: ExpandContext,
        registry: &'a ModelRegistry,
    ) -> BoxFuture<'a, Result<Value>> {
        async move {
            let visible: Vec<&SchemaItem> = self
                .items
                .values()
                .filter(|item| options.verbose || !item.flags.sensitive)
                .collect();

            let values = try_join_all(
                visible
                    .iter()
                    .map(|item| item.get_value(options, &ctx, registry)),
            )
            .await?;

            let mut json = Map::with_capacity(visible.len() + 1);
            json.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            for (item, value) in visible.iter().zip(values) {
                json.insert(item.name().to_string(), value);
            }
            Ok(Value::Object(json))
        }
        .boxed()
    }

    /// Run every item's `post_upsert` hook concurrently
    pub async fn post_upsert(
        &self,
        record_id: Uuid,
        collection: &str,
        registry: &ModelRegistry,
    ) -> Result<()> {
        try_join_all(
            self.items
                .values()
                .map(|item| item.post_upsert(record_id, collection, registry)),
        )
        .await?;
        Ok(())
    }

    /// Run every item's `post_delete` hook concurrently
    pub async fn post_delete(
        &self,
        record_id: Uuid,
        collection: &str,
        registry: &ModelRegistry,
    ) -> Result<()> {
        try_join_all(
            self.items
                .values()
                .map(|item| item.post_delete(record_id, collection, registry)),
        )
        .await?;
        Ok(())
    }

    /// Current ids of every reference item
    pub fn referenced_ids(&self) -> Vec<ItemReferences> {
        self.items
            .values()
            .filter_map(|item| {
                item.kind.references().map(|(collection, ids)| ItemReferences {
                    item: item.name().to_string(),
                    collection: collection.to_string(),
                    ids,
                })
            })
            .collect()
    }

    /// Drop this record's back-references from targets it no longer points at
    ///
    /// `previous` is the result of `referenced_ids` taken before the update.
    pub async fn release_stale_references(
        &self,
        previous: &[ItemReferences],
        record_id: Uuid,
        collection: &str,
        registry: &ModelRegistry,
    ) -> Result<()> {
        let current = self.referenced_ids();
        let mut releases = Vec::new();

        for before in previous {
            let Some(item) = self.items.get(&before.item) else {
                continue;
            };
            let still_held = current
                .iter()
                .find(|c| c.item == before.item)
                .map(|c| c.ids.as_slice())
                .unwrap_or_default();
            let stale: Vec<Uuid> = before
                .ids
                .iter()
                .filter(|id| !still_held.contains(id))
                .copied()
                .collect();

            if !stale.is_empty() {
                releases.push(async move {
                    item.release(&before.collection, &stale, record_id, collection, registry)
                        .await
                });
            }
        }

        try_join_all(releases).await?;
        Ok(())
    }
}
