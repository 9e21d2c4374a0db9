//! Item variants
//!
//! Every field kind a schema can hold is one arm of `ItemKind`. Each arm
//! carries its own configuration and current value.

pub mod array;
pub mod number;
pub mod reference;
pub mod scalar;
pub mod text;

pub use array::{NumberArrayItem, TextArrayItem};
pub use number::{NumberItem, NumberRule, NumberType};
pub use reference::{ForeignKeyItem, IdArrayItem};
pub use scalar::{BoolItem, DateItem, IdItem, JsonItem};
pub use text::{HtmlItem, TextItem};

use crate::error::Result;
use crate::models::{DependencyKind, ModelRegistry};
use crate::schema::options::{ExpandContext, JsonOptions};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Text(TextItem),
    Html(HtmlItem),
    Number(NumberItem),
    Bool(BoolItem),
    Date(DateItem),
    Json(JsonItem),
    TextArray(TextArrayItem),
    NumberArray(NumberArrayItem),
    Id(IdItem),
    IdArray(IdArrayItem),
    ForeignKey(ForeignKeyItem),
}

impl ItemKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemKind::Text(_) => "text",
            ItemKind::Html(_) => "html",
            ItemKind::Number(_) => "number",
            ItemKind::Bool(_) => "bool",
            ItemKind::Date(_) => "date",
            ItemKind::Json(_) => "json",
            ItemKind::TextArray(_) => "text-array",
            ItemKind::NumberArray(_) => "number-array",
            ItemKind::Id(_) => "id",
            ItemKind::IdArray(_) => "id-array",
            ItemKind::ForeignKey(_) => "foreign-key",
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        match self {
            ItemKind::Text(item) => item.set(name, value),
            ItemKind::Html(item) => item.set(name, value),
            ItemKind::Number(item) => item.set(name, value),
            ItemKind::Bool(item) => item.set(name, value),
            ItemKind::Date(item) => item.set(name, value),
            ItemKind::Json(item) => {
                item.value = value.clone();
                Ok(())
            }
            ItemKind::TextArray(item) => item.set(name, value),
            ItemKind::NumberArray(item) => item.set(name, value),
            ItemKind::Id(item) => item.set(name, value),
            ItemKind::IdArray(item) => item.set(name, value),
            ItemKind::ForeignKey(item) => item.set(name, value),
        }
    }

    pub(crate) async fn validate(&mut self, name: &str, registry: &ModelRegistry) -> Result<()> {
        match self {
            ItemKind::Text(item) => item.validate(name),
            ItemKind::Html(item) => item.validate(name),
            ItemKind::Number(item) => item.validate(name),
            ItemKind::Date(item) => {
                item.validate();
                Ok(())
            }
            ItemKind::TextArray(item) => item.validate(name),
            ItemKind::NumberArray(item) => item.validate(name),
            ItemKind::IdArray(item) => item.validate(name, registry).await,
            ItemKind::ForeignKey(item) => item.validate(name, registry).await,
            ItemKind::Bool(_) | ItemKind::Json(_) | ItemKind::Id(_) => Ok(()),
        }
    }

    pub fn db_value(&self) -> Value {
        match self {
            ItemKind::Text(item) => Value::String(item.value.clone()),
            ItemKind::Html(item) => Value::String(item.value.clone()),
            ItemKind::Number(item) => item.db_value(),
            ItemKind::Bool(item) => Value::Bool(item.value),
            ItemKind::Date(item) => item.db_value(),
            ItemKind::Json(item) => item.value.clone(),
            ItemKind::TextArray(item) => {
                Value::Array(item.value.iter().cloned().map(Value::String).collect())
            }
            ItemKind::NumberArray(item) => item.db_value(),
            ItemKind::Id(item) => item.db_value(),
            ItemKind::IdArray(item) => item.db_value(),
            ItemKind::ForeignKey(item) => item.db_value(),
        }
    }

    pub(crate) async fn get_value(
        &self,
        name: &str,
        options: &JsonOptions,
        ctx: &ExpandContext,
        registry: &ModelRegistry,
    ) -> Result<Value> {
        match self {
            ItemKind::ForeignKey(item) => item.get_value(name, options, ctx, registry).await,
            ItemKind::IdArray(item) => item.get_value(name, options, ctx, registry).await,
            other => Ok(other.db_value()),
        }
    }

    pub(crate) fn clear_resolved(&mut self) {
        match self {
            ItemKind::ForeignKey(item) => item.clear_resolved(),
            ItemKind::IdArray(item) => item.clear_resolved(),
            _ => {}
        }
    }

    /// Target collection and currently stored ids of a reference item
    pub fn references(&self) -> Option<(&str, Vec<Uuid>)> {
        match self {
            ItemKind::ForeignKey(item) => Some((
                item.target_collection.as_str(),
                item.value.into_iter().collect(),
            )),
            ItemKind::IdArray(item) => Some((item.target_collection.as_str(), item.value.clone())),
            _ => None,
        }
    }

    /// Ids confirmed by the last validation, with the dependency kind they
    /// register on their targets
    pub(crate) fn resolved_references(&self) -> Option<(&str, Vec<Uuid>, DependencyKind)> {
        match self {
            ItemKind::ForeignKey(item) => Some((
                item.target_collection.as_str(),
                item.resolved().into_iter().collect(),
                item.dependency_kind(),
            )),
            ItemKind::IdArray(item) => Some((
                item.target_collection.as_str(),
                item.resolved().to_vec(),
                DependencyKind::Optional,
            )),
            _ => None,
        }
    }
}

macro_rules! impl_from_item {
    ($($item:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$item> for ItemKind {
                fn from(item: $item) -> Self {
                    ItemKind::$variant(item)
                }
            }
        )*
    };
}

impl_from_item! {
    TextItem => Text,
    HtmlItem => Html,
    NumberItem => Number,
    BoolItem => Bool,
    DateItem => Date,
    JsonItem => Json,
    TextArrayItem => TextArray,
    NumberArrayItem => NumberArray,
    IdItem => Id,
    IdArrayItem => IdArray,
    ForeignKeyItem => ForeignKey,
}
