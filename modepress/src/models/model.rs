//! Collection bindings
//!
//! A `Model` owns the template schema of one document type and the
//! collection its records live in. It is the entry point controllers use
//! to query, create, update and delete records.

use crate::database::{Collection, FindQuery, Update, ID_FIELD};
use crate::error::{Error, ErrorChain, ErrorContext, OptionExt, Result};
use crate::models::{BatchResult, Dependency, DependencyKind, ModelRegistry, Record};
use crate::models::record::{OPTIONAL_DEPENDENCIES, REQUIRED_DEPENDENCIES};
use crate::schema::{ItemKind, JsonOptions, Schema};
use futures::future::{join_all, try_join_all, BoxFuture};
use futures::FutureExt;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Selector matching a single record by identity
pub fn id_selector(id: Uuid) -> Value {
    json!({ ID_FIELD: id.to_string() })
}

/// Selector matching any of the given identities
fn ids_selector(ids: &[Uuid]) -> Value {
    let clauses: Vec<Value> = ids.iter().map(|id| id_selector(*id)).collect();
    json!({ "$or": clauses })
}

fn field_selector(name: &str, value: Value) -> Value {
    let mut clause = Map::new();
    clause.insert(name.to_string(), value);
    Value::Object(clause)
}

pub struct Model {
    name: String,
    schema: Schema,
    collection: OnceCell<Arc<dyn Collection>>,
    registry: OnceCell<Weak<ModelRegistry>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("items", &self.schema.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Model {
    /// Create a model from its name and template schema
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            collection: OnceCell::new(),
            registry: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template every record is cloned from
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_initialized(&self) -> bool {
        self.collection.get().is_some()
    }

    pub(crate) fn attach(&self, registry: &Arc<ModelRegistry>) {
        let _ = self.registry.set(Arc::downgrade(registry));
    }

    fn registry(&self) -> Result<Arc<ModelRegistry>> {
        self.registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::Registry(format!("Model '{}' is not registered", self.name)))
    }

    fn collection(&self) -> Result<&Arc<dyn Collection>> {
        self.collection
            .get()
            .ok_or_else(|| Error::NotInitialized(self.name.clone()))
    }

    /// Names of every item flagged `unique`
    pub fn unique_fields(&self) -> Vec<String> {
        self.schema
            .items()
            .filter(|item| item.flags.unique)
            .map(|item| item.name().to_string())
            .collect()
    }

    /// Bind the model to its collection
    ///
    /// Indexes are requested for every `indexable` item. Calling this on an
    /// initialized model does nothing.
    pub async fn initialize(&self, collection: Arc<dyn Collection>) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        for item in self.schema.items().filter(|item| item.flags.indexable) {
            collection
                .create_index(item.name())
                .await
                .with_context(|| format!("Could not index '{}.{}'", self.name, item.name()))?;
        }

        if self.collection.set(collection).is_ok() {
            info!("Model '{}' initialized", self.name);
        }
        Ok(())
    }

    /// Count the records matching a selector
    pub async fn count(&self, selector: &Value) -> Result<u64> {
        self.collection()?
            .count(selector)
            .await
            .with_context(|| format!("Could not count records in '{}'", self.name))
    }

    /// Fetch every record matching the query
    ///
    /// # Arguments
    /// * `query` - Selector plus sort, `index` (skip), `limit` (`-1` for none) and projection
    ///
    /// # Returns
    /// * `Ok(Vec<Record>)` - Records in query order, each with its own schema clone
    /// * `Err(Error)` - If the model is not initialized or the query fails
    pub async fn find_many(&self, query: &FindQuery) -> Result<Vec<Record>> {
        let documents = self
            .collection()?
            .find(query)
            .await
            .with_context(|| format!("Could not query '{}'", self.name))?;

        documents
            .iter()
            .map(|document| Record::from_document(&self.name, self.schema.clone(), document))
            .collect()
    }

    /// Fetch the first record matching the selector
    pub async fn find_one(&self, selector: &Value) -> Result<Option<Record>> {
        let query = FindQuery::new(selector.clone()).limit(1);
        Ok(self.find_many(&query).await?.into_iter().next())
    }

    pub(crate) async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_many(&FindQuery::new(ids_selector(ids))).await
    }

    /// Which of `ids` exist in the collection, in one query
    pub async fn existing_ids(&self, ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let query = FindQuery::new(ids_selector(ids)).projection([ID_FIELD]);
        let documents = self
            .collection()?
            .find(&query)
            .await
            .with_context(|| format!("Could not look up references in '{}'", self.name))?;

        Ok(documents
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD).and_then(Value::as_str))
            .filter_map(|raw| Uuid::parse_str(raw).ok())
            .collect())
    }

    fn effective_options(
        &self,
        options: &JsonOptions,
        registry: &ModelRegistry,
    ) -> Result<JsonOptions> {
        let options = options.clamped(&registry.config().expansion);
        options.validate()?;
        Ok(options)
    }

    /// Client projection of the first record matching the selector
    pub async fn download_one(
        &self,
        selector: &Value,
        options: &JsonOptions,
    ) -> Result<Option<Value>> {
        let registry = self.registry()?;
        let options = self.effective_options(options, &registry)?;
        match self.find_one(selector).await? {
            Some(record) => Ok(Some(record.get_as_json(&options, &registry).await?)),
            None => Ok(None),
        }
    }

    /// Client projections of every record matching the query
    pub async fn download_many(
        &self,
        query: &FindQuery,
        options: &JsonOptions,
    ) -> Result<Vec<Value>> {
        let registry = self.registry()?;
        let options = self.effective_options(options, &registry)?;
        let records = self.find_many(query).await?;
        try_join_all(
            records
                .iter()
                .map(|record| record.get_as_json(&options, &registry)),
        )
        .await
    }

    /// Check that no other record shares the schema's unique values
    ///
    /// The selector is an `$or` over every `unique` item, narrowed by
    /// equality on each `unique_indexer` item and, when `id` is given,
    /// excluding that record. Schemas without unique items always pass.
    pub async fn is_unique(&self, schema: &Schema, id: Option<Uuid>) -> Result<bool> {
        let unique: Vec<Value> = schema
            .items()
            .filter(|item| item.flags.unique)
            .map(|item| field_selector(item.name(), item.db_value()))
            .collect();
        if unique.is_empty() {
            return Ok(true);
        }

        let mut clauses = vec![json!({ "$or": unique })];
        clauses.extend(
            schema
                .items()
                .filter(|item| item.flags.unique_indexer)
                .map(|item| field_selector(item.name(), item.db_value())),
        );
        if let Some(id) = id {
            clauses.push(json!({ ID_FIELD: { "$ne": id.to_string() } }));
        }

        let conflicts = self.count(&json!({ "$and": clauses })).await?;
        Ok(conflicts == 0)
    }

    fn uniqueness_error(&self) -> Error {
        Error::UniquenessConflict {
            fields: self.unique_fields(),
        }
    }

    /// Create and persist a record from client data
    ///
    /// # Arguments
    /// * `data` - Object keyed by item name; unknown keys are ignored
    ///
    /// # Returns
    /// * `Ok(Record)` - The stored record with its new identity
    /// * `Err(Error)` - Validation, uniqueness, reference or store failures
    pub async fn create_instance(&self, data: &Value) -> Result<Record> {
        let collection = self.collection()?;
        let registry = self.registry()?;

        let mut schema = self.schema.clone();
        schema.set(data)?;

        if !self.is_unique(&schema, None).await? {
            return Err(self.uniqueness_error());
        }
        schema.validate(true, &registry).await?;

        // Validation may coerce unique values
        if !self.is_unique(&schema, None).await? {
            return Err(self.uniqueness_error());
        }

        let id = collection
            .insert_one(schema.serialize())
            .await
            .with_context(|| format!("Could not insert into '{}'", self.name))?;
        schema.post_upsert(id, &self.name, &registry).await?;

        debug!("Created record {} in '{}'", id, self.name);
        Ok(Record {
            id,
            collection: self.name.clone(),
            schema,
            dependencies: Default::default(),
        })
    }

    /// Create several records concurrently
    ///
    /// Each item succeeds or fails on its own; there is no rollback.
    pub async fn create_many(&self, data: &[Value]) -> BatchResult<Record> {
        let outcomes = join_all(data.iter().map(|item| self.create_instance(item))).await;
        let batch = BatchResult::from(outcomes);
        if !batch.is_complete() {
            warn!(
                "Created {} of {} records in '{}'",
                batch.success_count(),
                batch.len(),
                self.name
            );
            for error in batch.failures() {
                warn!("Create in '{}' failed: {}", self.name, ErrorChain::new(error));
            }
        }
        batch
    }

    /// Apply client data to the first record matching the selector
    ///
    /// Required items are not re-checked. Back-references are added for
    /// new targets and dropped for targets the record no longer points at.
    ///
    /// # Returns
    /// * `Ok(Value)` - Client projection of the updated record
    /// * `Err(Error::NotFound)` - If nothing matches the selector
    pub async fn update(
        &self,
        selector: &Value,
        data: &Value,
        options: &JsonOptions,
    ) -> Result<Value> {
        let collection = self.collection()?;
        let registry = self.registry()?;
        let options = self.effective_options(options, &registry)?;

        let mut record = self
            .find_one(selector)
            .await?
            .or_not_found(&self.name)?;
        let previous = record.schema.referenced_ids();

        record.schema.set(data)?;
        record.schema.validate(false, &registry).await?;

        if !self.is_unique(&record.schema, Some(record.id)).await? {
            return Err(self.uniqueness_error());
        }

        let update = Update::new().set(record.schema.serialize());
        collection
            .update_one(&id_selector(record.id), &update)
            .await
            .with_context(|| format!("Could not update {} in '{}'", record.id, self.name))?;

        record
            .schema
            .post_upsert(record.id, &self.name, &registry)
            .await?;
        record
            .schema
            .release_stale_references(&previous, record.id, &self.name, &registry)
            .await?;

        debug!("Updated record {} in '{}'", record.id, self.name);
        record.get_as_json(&options, &registry).await
    }

    /// Delete every record matching the selector
    ///
    /// Records are deleted one by one, concurrently and without rollback.
    /// After each deletion its `post_delete` hooks run, records that
    /// require it are deleted in turn, and records that optionally point at
    /// it are detached.
    ///
    /// # Returns
    /// * `Ok(BatchResult)` - Identity or error per matched record; empty when nothing matched
    /// * `Err(Error)` - If the records could not be looked up
    pub fn delete_instances<'a>(
        &'a self,
        selector: &'a Value,
    ) -> BoxFuture<'a, Result<BatchResult<Uuid>>> {
        async move {
            let registry = self.registry()?;
            let records = self.find_many(&FindQuery::new(selector.clone())).await?;
            if records.is_empty() {
                return Ok(BatchResult::default());
            }

            let outcomes = join_all(
                records
                    .iter()
                    .map(|record| self.delete_record(record, &registry)),
            )
            .await;

            let batch = BatchResult::from(outcomes);
            info!(
                "Deleted {} of {} records from '{}'",
                batch.success_count(),
                batch.len(),
                self.name
            );
            for error in batch.failures() {
                warn!("Delete in '{}' failed: {}", self.name, ErrorChain::new(error));
            }
            Ok(batch)
        }
        .boxed()
    }

    async fn delete_record(&self, record: &Record, registry: &ModelRegistry) -> Result<Uuid> {
        self.collection()?
            .delete_one(&id_selector(record.id))
            .await
            .with_context(|| format!("Could not delete {} from '{}'", record.id, self.name))?;

        record
            .schema
            .post_delete(record.id, &self.name, registry)
            .await?;

        try_join_all(record.dependencies.required.iter().map(|dependency| async move {
            let dependent = registry.get(&dependency.collection)?;
            let selector = id_selector(dependency.id);
            dependent.delete_instances(&selector).await?;
            Ok::<_, Error>(())
        }))
        .await?;

        try_join_all(record.dependencies.optional.iter().map(|dependency| async move {
            let dependent = registry.get(&dependency.collection)?;
            dependent
                .detach(dependency.id, &dependency.property_name, record.id)
                .await?;
            Ok::<_, Error>(())
        }))
        .await?;

        Ok(record.id)
    }

    /// Remove the reference `property` of record `id` holds to `target`
    async fn detach(&self, id: Uuid, property: &str, target: Uuid) -> Result<()> {
        let update = match self.schema.get_by_name(property).map(|item| &item.kind) {
            Some(ItemKind::ForeignKey(_)) => Update::new().set_field(property, Value::Null),
            Some(ItemKind::IdArray(_)) => {
                Update::new().pull(property, Value::String(target.to_string()))
            }
            _ => {
                warn!(
                    "'{}.{}' is not a reference item; nothing to detach",
                    self.name, property
                );
                return Ok(());
            }
        };

        self.collection()?
            .update_one(&id_selector(id), &update)
            .await
            .with_context(|| format!("Could not detach {} in '{}'", id, self.name))?;
        Ok(())
    }

    /// Record `dependency` on the target record `target`
    pub(crate) async fn add_dependency(
        &self,
        target: Uuid,
        kind: DependencyKind,
        dependency: &Dependency,
    ) -> Result<()> {
        let update = Update::new().add_to_set(kind.field(), dependency.to_value());
        self.collection()?
            .update_one(&id_selector(target), &update)
            .await
            .with_context(|| format!("Could not add dependency to {} in '{}'", target, self.name))?;
        Ok(())
    }

    /// Remove `dependency` from both lists of the target record
    pub(crate) async fn remove_dependency(
        &self,
        target: Uuid,
        dependency: &Dependency,
    ) -> Result<()> {
        let value = dependency.to_value();
        let update = Update::new()
            .pull(REQUIRED_DEPENDENCIES, value.clone())
            .pull(OPTIONAL_DEPENDENCIES, value);
        self.collection()?
            .update_one(&id_selector(target), &update)
            .await
            .with_context(|| {
                format!("Could not remove dependency from {} in '{}'", target, self.name)
            })?;
        Ok(())
    }
}
