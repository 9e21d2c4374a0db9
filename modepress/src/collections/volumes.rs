use crate::error::Result;
use crate::models::Model;
use crate::schema::{DateItem, ForeignKeyItem, JsonItem, NumberItem, Schema, SchemaItem, TextItem};

pub const NAME: &str = "volumes";

/// Default allocation for a new volume, in bytes
pub const DEFAULT_ALLOCATION: f64 = 500.0 * 1024.0 * 1024.0;

pub fn model() -> Result<Model> {
    let schema = Schema::new()
        .with(SchemaItem::new("name", TextItem::default().min_characters(1)).required())?
        .with(SchemaItem::new("identifier", TextItem::default()).sensitive())?
        .with(SchemaItem::new("type", TextItem::new("local")))?
        .with(SchemaItem::new("user", ForeignKeyItem::new("users")).required())?
        .with(SchemaItem::new("memoryUsed", NumberItem::default().min(0.0)))?
        .with(SchemaItem::new(
            "memoryAllocated",
            NumberItem::new(DEFAULT_ALLOCATION).min(0.0),
        ))?
        .with(SchemaItem::new("meta", JsonItem::default()))?
        .with(SchemaItem::new("createdOn", DateItem::new().default_now()).indexable())?;

    Ok(Model::new(NAME, schema))
}
