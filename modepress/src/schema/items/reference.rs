//! Items that point at records of another model

use super::array::{array_elements, check_count};
use super::scalar::{id_value, parse_id, parse_optional_id};
use crate::error::{Error, Result};
use crate::models::{DependencyKind, ModelRegistry};
use crate::schema::options::{ExpandContext, JsonOptions};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A single reference into `target_collection`
#[derive(Debug, Default, PartialEq)]
pub struct ForeignKeyItem {
    pub value: Option<Uuid>,
    pub target_collection: String,
    /// Allow the reference to be empty. Nullable keys are optional
    /// dependencies of their target, the rest are required ones.
    pub key_can_be_null: bool,
    resolved: Option<Uuid>,
}

impl Clone for ForeignKeyItem {
    fn clone(&self) -> Self {
        Self {
            value: self.value,
            target_collection: self.target_collection.clone(),
            key_can_be_null: self.key_can_be_null,
            resolved: None,
        }
    }
}

impl ForeignKeyItem {
    pub fn new(target_collection: impl Into<String>) -> Self {
        Self {
            target_collection: target_collection.into(),
            ..Self::default()
        }
    }

    pub fn nullable(mut self) -> Self {
        self.key_can_be_null = true;
        self
    }

    pub fn dependency_kind(&self) -> DependencyKind {
        if self.key_can_be_null {
            DependencyKind::Optional
        } else {
            DependencyKind::Required
        }
    }

    /// Target confirmed by the last successful validation
    pub fn resolved(&self) -> Option<Uuid> {
        self.resolved
    }

    pub(crate) fn clear_resolved(&mut self) {
        self.resolved = None;
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = parse_optional_id(name, value)?;
        Ok(())
    }

    pub(crate) async fn validate(&mut self, name: &str, registry: &ModelRegistry) -> Result<()> {
        self.resolved = None;
        let Some(id) = self.value else {
            if self.key_can_be_null {
                return Ok(());
            }
            return Err(Error::validation(
                name,
                format!("must reference a record in '{}'", self.target_collection),
            ));
        };

        resolve_ids(registry, name, &self.target_collection, &[id]).await?;
        self.resolved = Some(id);
        Ok(())
    }

    pub fn db_value(&self) -> Value {
        id_value(self.value.as_ref())
    }

    pub(crate) async fn get_value(
        &self,
        name: &str,
        options: &JsonOptions,
        ctx: &ExpandContext,
        registry: &ModelRegistry,
    ) -> Result<Value> {
        let Some(id) = self.value else {
            return Ok(Value::Null);
        };
        if !options.should_expand(name, ctx.depth) {
            return Ok(id_value(Some(&id)));
        }

        let mut expanded =
            expand_ids(registry, &self.target_collection, &[id], options, ctx).await?;
        Ok(expanded.pop().unwrap_or(Value::Null))
    }
}

/// A list of references into `target_collection`
///
/// Id arrays are always optional dependencies of their targets.
#[derive(Debug, PartialEq)]
pub struct IdArrayItem {
    pub value: Vec<Uuid>,
    pub target_collection: String,
    pub min_items: usize,
    pub max_items: usize,
    resolved: Vec<Uuid>,
}

impl Clone for IdArrayItem {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            target_collection: self.target_collection.clone(),
            min_items: self.min_items,
            max_items: self.max_items,
            resolved: Vec::new(),
        }
    }
}

impl IdArrayItem {
    pub fn new(target_collection: impl Into<String>) -> Self {
        Self {
            value: Vec::new(),
            target_collection: target_collection.into(),
            min_items: 0,
            max_items: usize::MAX,
            resolved: Vec::new(),
        }
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    pub fn resolved(&self) -> &[Uuid] {
        &self.resolved
    }

    pub(crate) fn clear_resolved(&mut self) {
        self.resolved.clear();
    }

    /// Accepts identifiers or expanded records; duplicates are dropped
    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        let mut ids = Vec::new();
        for element in array_elements(name, value)? {
            let id = parse_id(name, element)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.value = ids;
        Ok(())
    }

    pub(crate) async fn validate(&mut self, name: &str, registry: &ModelRegistry) -> Result<()> {
        self.resolved.clear();
        check_count(name, self.value.len(), self.min_items, self.max_items)?;
        self.resolved = resolve_ids(registry, name, &self.target_collection, &self.value).await?;
        Ok(())
    }

    pub fn db_value(&self) -> Value {
        Value::Array(self.value.iter().map(|id| id_value(Some(id))).collect())
    }

    pub(crate) async fn get_value(
        &self,
        name: &str,
        options: &JsonOptions,
        ctx: &ExpandContext,
        registry: &ModelRegistry,
    ) -> Result<Value> {
        if !options.should_expand(name, ctx.depth) {
            return Ok(self.db_value());
        }
        let expanded =
            expand_ids(registry, &self.target_collection, &self.value, options, ctx).await?;
        Ok(Value::Array(expanded))
    }
}

/// Confirm every id exists in `collection` with one batched lookup
async fn resolve_ids(
    registry: &ModelRegistry,
    field: &str,
    collection: &str,
    ids: &[Uuid],
) -> Result<Vec<Uuid>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let model = registry.get(collection)?;
    let found = model.existing_ids(ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(Uuid::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(Error::ReferenceIntegrity {
            field: field.to_string(),
            collection: collection.to_string(),
            missing,
        });
    }
    Ok(ids.to_vec())
}

/// Project the records behind `ids`, one level deeper than `ctx`
///
/// Ids that are already on the traversal path, or that no longer resolve,
/// come back as raw identifiers. Output order follows `ids`.
async fn expand_ids(
    registry: &ModelRegistry,
    collection: &str,
    ids: &[Uuid],
    options: &JsonOptions,
    ctx: &ExpandContext,
) -> Result<Vec<Value>> {
    let wanted: Vec<Uuid> = ids
        .iter()
        .filter(|id| !ctx.is_on_path(collection, id))
        .copied()
        .collect();

    let mut expanded = HashMap::new();
    if !wanted.is_empty() {
        let model = registry.get(collection)?;
        let records = model.find_by_ids(&wanted).await?;
        let projections = join_all(records.iter().map(|record| {
            record
                .schema
                .project(record.id, options, ctx.descend(collection, record.id), registry)
        }))
        .await;

        for (record, projection) in records.iter().zip(projections) {
            expanded.insert(record.id, projection?);
        }
    }

    Ok(ids
        .iter()
        .map(|id| {
            expanded
                .get(id)
                .cloned()
                .unwrap_or_else(|| id_value(Some(id)))
        })
        .collect())
}
