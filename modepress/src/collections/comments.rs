use crate::error::Result;
use crate::models::Model;
use crate::schema::{
    BoolItem, DateItem, ForeignKeyItem, HtmlItem, IdArrayItem, Schema, SchemaItem, TextItem,
};

pub const NAME: &str = "comments";

pub fn model() -> Result<Model> {
    let schema = Schema::new()
        .with(SchemaItem::new("author", TextItem::default().min_characters(1)).required())?
        .with(SchemaItem::new("user", ForeignKeyItem::new("users").nullable()))?
        .with(SchemaItem::new("post", ForeignKeyItem::new("posts")).required())?
        .with(SchemaItem::new("parent", ForeignKeyItem::new(NAME).nullable()))?
        .with(SchemaItem::new("public", BoolItem::new(true)))?
        .with(SchemaItem::new("content", HtmlItem::default().min_characters(1)).required())?
        .with(SchemaItem::new("children", IdArrayItem::new(NAME)))?
        .with(SchemaItem::new("createdOn", DateItem::new().default_now()).indexable())?
        .with(SchemaItem::new("lastUpdated", DateItem::new().use_now()).indexable())?;

    Ok(Model::new(NAME, schema))
}
