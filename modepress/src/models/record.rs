//! A schema clone bound to a stored document

use crate::database::{Document, ID_FIELD};
use crate::error::{OptionExt, Result};
use crate::models::ModelRegistry;
use crate::schema::{JsonOptions, Schema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const REQUIRED_DEPENDENCIES: &str = "_requiredDependencies";
pub const OPTIONAL_DEPENDENCIES: &str = "_optionalDependencies";

/// Which bookkeeping list a back-reference lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// The dependent is deleted along with its target
    Required,
    /// The dependent is detached when its target goes away
    Optional,
}

impl DependencyKind {
    pub fn field(&self) -> &'static str {
        match self {
            DependencyKind::Required => REQUIRED_DEPENDENCIES,
            DependencyKind::Optional => OPTIONAL_DEPENDENCIES,
        }
    }
}

/// A back-reference: record `id` of `collection` points here through `property_name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub collection: String,
    #[serde(rename = "propertyName")]
    pub property_name: String,
}

impl Dependency {
    pub fn new(id: Uuid, collection: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            id,
            collection: collection.into(),
            property_name: property_name.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "_id": self.id.to_string(),
            "collection": self.collection,
            "propertyName": self.property_name,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies {
    pub required: Vec<Dependency>,
    pub optional: Vec<Dependency>,
}

impl Dependencies {
    fn read(document: &Document, kind: DependencyKind) -> Result<Vec<Dependency>> {
        match document.get(kind.field()) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }

    pub fn from_document(document: &Document) -> Result<Self> {
        Ok(Self {
            required: Self::read(document, DependencyKind::Required)?,
            optional: Self::read(document, DependencyKind::Optional)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }
}

/// One record read from or written to a model's collection
#[derive(Debug, Clone)]
pub struct Record {
    pub id: Uuid,
    /// Name of the model the record belongs to
    pub collection: String,
    pub schema: Schema,
    pub dependencies: Dependencies,
}

impl Record {
    /// Build a record from a stored document and a fresh template clone
    pub fn from_document(
        collection: &str,
        mut schema: Schema,
        document: &Document,
    ) -> Result<Self> {
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .with_context(|| {
                format!("Document in '{}' has no valid '{}'", collection, ID_FIELD)
            })?;

        schema.deserialize(document)?;
        Ok(Self {
            id,
            collection: collection.to_string(),
            schema,
            dependencies: Dependencies::from_document(document)?,
        })
    }

    /// Client projection of the record
    pub async fn get_as_json(
        &self,
        options: &JsonOptions,
        registry: &ModelRegistry,
    ) -> Result<Value> {
        self.schema
            .get_as_json(self.id, &self.collection, options, registry)
            .await
    }

    /// Client projection deserialized into a typed view
    pub async fn download_as<T: DeserializeOwned>(
        &self,
        options: &JsonOptions,
        registry: &ModelRegistry,
    ) -> Result<T> {
        let json = self.get_as_json(options, registry).await?;
        Ok(serde_json::from_value(json)?)
    }
}
