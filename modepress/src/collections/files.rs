use crate::error::Result;
use crate::models::Model;
use crate::schema::{
    BoolItem, DateItem, ForeignKeyItem, JsonItem, NumberItem, Schema, SchemaItem, TextItem,
};

pub const NAME: &str = "files";

pub fn model() -> Result<Model> {
    let schema = Schema::new()
        .with(SchemaItem::new("name", TextItem::default().min_characters(1)).required())?
        .with(SchemaItem::new("identifier", TextItem::default()).sensitive())?
        .with(SchemaItem::new("publicURL", TextItem::default().max_characters(2048)))?
        .with(SchemaItem::new("mimeType", TextItem::default().max_characters(255)))?
        .with(SchemaItem::new("size", NumberItem::default().min(0.0)))?
        .with(SchemaItem::new("numDownloads", NumberItem::default().min(0.0)))?
        .with(SchemaItem::new("isPublic", BoolItem::new(true)))?
        .with(SchemaItem::new("volume", ForeignKeyItem::new("volumes")).required())?
        .with(SchemaItem::new("user", ForeignKeyItem::new("users")).required())?
        .with(SchemaItem::new("parentFile", ForeignKeyItem::new(NAME).nullable()))?
        .with(SchemaItem::new("meta", JsonItem::default()))?
        .with(SchemaItem::new("createdOn", DateItem::new().default_now()).indexable())?;

    Ok(Model::new(NAME, schema))
}
