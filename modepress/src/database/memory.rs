//! In-memory document store
//!
//! Features:
//! - Thread-safe with RwLock, clone-friendly via Arc
//! - Insertion-ordered documents keyed by `_id`
//! - Full selector, sort, skip, limit and projection support
//! - `$set`, `$addToSet`, `$push` and `$pull` updates

use super::selector::{matches, sort_order, values_equal};
use super::{
    Collection, Database, Document, FindQuery, OrderDirection, Update, UpdateResult, ID_FIELD,
};
use crate::error::{Error, Result};
use crate::utils::object;
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// A collection held entirely in process memory
pub struct MemoryCollection {
    name: String,
    documents: RwLock<IndexMap<Uuid, Document>>,
    indexes: RwLock<Vec<String>>,
}

impl MemoryCollection {
    /// Create a new empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(IndexMap::new()),
            indexes: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexMap<Uuid, Document>>> {
        self.documents
            .read()
            .map_err(|_| Error::internal(format!("Collection '{}' lock poisoned", self.name)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexMap<Uuid, Document>>> {
        self.documents
            .write()
            .map_err(|_| Error::internal(format!("Collection '{}' lock poisoned", self.name)))
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields indexed through `create_index`
    pub fn indexes(&self) -> Vec<String> {
        self.indexes.read().map(|i| i.clone()).unwrap_or_default()
    }

    /// Fetch a stored document by identity, bypassing selectors
    pub fn get(&self, id: &Uuid) -> Option<Document> {
        self.documents.read().ok()?.get(id).cloned()
    }

    fn first_match(
        documents: &IndexMap<Uuid, Document>,
        selector: &Value,
    ) -> Result<Option<Uuid>> {
        for (id, doc) in documents {
            if matches(doc, selector)? {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }
}

fn parse_id(value: &Value) -> Result<Uuid> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| Error::database_query(format!("'{}' is not a valid identity", value)))
}

fn project(doc: &Document, fields: &[String]) -> Result<Document> {
    let mut projected = Document::new();
    if let Some(id) = doc.get(ID_FIELD) {
        projected.insert(ID_FIELD.to_string(), id.clone());
    }
    for field in fields {
        if let Some(value) = object::get(doc, field) {
            object::set(&mut projected, field, value.clone())?;
        }
    }
    Ok(projected)
}

fn array_field<'a>(doc: &'a mut Document, field: &str) -> Result<&'a mut Vec<Value>> {
    if object::get(doc, field).is_none() {
        object::set(doc, field, Value::Array(Vec::new()))?;
    }
    match object::get_mut(doc, field) {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) => Err(Error::database_query(format!(
            "Cannot apply an array operator to null field '{}'",
            field
        ))),
        _ => Err(Error::database_query(format!(
            "Field '{}' is not an array",
            field
        ))),
    }
}

/// Apply an update to a document, returning whether it changed
fn apply_update(doc: &mut Document, update: &Update) -> Result<bool> {
    if update.set.contains_key(ID_FIELD) {
        return Err(Error::database_query("The '_id' field cannot be modified"));
    }

    let before = doc.clone();

    for (field, value) in &update.set {
        object::set(doc, field, value.clone())?;
    }

    for (field, value) in &update.add_to_set {
        let items = array_field(doc, field)?;
        if !items.iter().any(|item| values_equal(item, value)) {
            items.push(value.clone());
        }
    }

    for (field, value) in &update.push {
        array_field(doc, field)?.push(value.clone());
    }

    for (field, value) in &update.pull {
        if object::get(doc, field).is_some() {
            array_field(doc, field)?.retain(|item| !values_equal(item, value));
        }
    }

    Ok(*doc != before)
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>> {
        let mut found = Vec::new();
        {
            let documents = self.read()?;
            for doc in documents.values() {
                if matches(doc, &query.selector)? {
                    found.push(doc.clone());
                }
            }
        }

        if !query.sort.is_empty() {
            found.sort_by(|a, b| {
                for (field, direction) in &query.sort {
                    let ordering = sort_order(object::get(a, field), object::get(b, field));
                    let ordering = match direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    };
                    if ordering.is_ne() {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        let limit = if query.limit < 0 {
            usize::MAX
        } else {
            query.limit as usize
        };

        let page = found.into_iter().skip(query.index).take(limit);
        let result = match &query.projection {
            Some(fields) => page.map(|doc| project(&doc, fields)).collect::<Result<Vec<_>>>()?,
            None => page.collect(),
        };

        trace!("find on '{}' returned {} documents", self.name, result.len());
        Ok(result)
    }

    async fn count(&self, selector: &Value) -> Result<u64> {
        let documents = self.read()?;
        let mut count = 0;
        for doc in documents.values() {
            if matches(doc, selector)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn insert_one(&self, mut document: Document) -> Result<Uuid> {
        let id = match document.get(ID_FIELD) {
            Some(value) => parse_id(value)?,
            None => Uuid::new_v4(),
        };
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let mut documents = self.write()?;
        if documents.contains_key(&id) {
            return Err(Error::database_query(format!(
                "Duplicate identity {} in '{}'",
                id, self.name
            )));
        }
        documents.insert(id, document);
        debug!("Inserted document {} into '{}'", id, self.name);
        Ok(id)
    }

    async fn update_one(&self, selector: &Value, update: &Update) -> Result<UpdateResult> {
        let mut documents = self.write()?;
        let Some(id) = Self::first_match(&documents, selector)? else {
            return Ok(UpdateResult::default());
        };

        let doc = documents
            .get_mut(&id)
            .ok_or_else(|| Error::internal("Matched document vanished during update"))?;

        // Work on a copy so a failing operator leaves the stored document intact
        let mut updated = doc.clone();
        let modified = apply_update(&mut updated, update)?;
        *doc = updated;

        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn delete_one(&self, selector: &Value) -> Result<u64> {
        let mut documents = self.write()?;
        match Self::first_match(&documents, selector)? {
            Some(id) => {
                documents.shift_remove(&id);
                debug!("Deleted document {} from '{}'", id, self.name);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, selector: &Value) -> Result<u64> {
        let mut documents = self.write()?;
        let mut doomed = Vec::new();
        for (id, doc) in documents.iter() {
            if matches(doc, selector)? {
                doomed.push(*id);
            }
        }
        for id in &doomed {
            documents.shift_remove(id);
        }
        debug!("Deleted {} documents from '{}'", doomed.len(), self.name);
        Ok(doomed.len() as u64)
    }

    async fn create_index(&self, field: &str) -> Result<()> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| Error::internal(format!("Collection '{}' lock poisoned", self.name)))?;
        if !indexes.iter().any(|f| f == field) {
            indexes.push(field.to_string());
            debug!("Created index on '{}.{}'", self.name, field);
        }
        Ok(())
    }
}

/// In-memory database: a set of named `MemoryCollection`s
///
/// Clone-friendly via Arc; clones share the same collections.
#[derive(Clone)]
pub struct MemoryDatabase {
    name: String,
    collections: Arc<DashMap<String, Arc<MemoryCollection>>>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Create a new empty database
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: Arc::new(DashMap::new()),
        }
    }

    /// Get the concrete collection, creating it if needed
    pub fn memory_collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .value()
            .clone()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        Ok(self.memory_collection(name))
    }

    async fn collection_names(&self) -> Vec<String> {
        self.collections.iter().map(|e| e.key().clone()).collect()
    }
}
