use crate::error::Result;
use crate::models::Model;
use crate::schema::{
    BoolItem, DateItem, ForeignKeyItem, HtmlItem, Schema, SchemaItem, TextArrayItem, TextItem,
};

pub const NAME: &str = "posts";

pub fn model() -> Result<Model> {
    let schema = Schema::new()
        .with(SchemaItem::new("author", ForeignKeyItem::new("users").nullable()))?
        .with(SchemaItem::new("title", TextItem::default().min_characters(1)).required())?
        .with(
            SchemaItem::new("slug", TextItem::default().min_characters(1).max_characters(512))
                .unique()
                .required()
                .indexable(),
        )?
        .with(SchemaItem::new("brief", TextItem::default().strip_html()))?
        .with(SchemaItem::new("public", BoolItem::new(true)))?
        .with(SchemaItem::new("content", HtmlItem::default()))?
        .with(SchemaItem::new("featuredImage", ForeignKeyItem::new("files").nullable()))?
        .with(SchemaItem::new("categories", TextArrayItem::default()))?
        .with(SchemaItem::new("tags", TextArrayItem::default().max_characters(64)))?
        .with(SchemaItem::new("createdOn", DateItem::new().default_now()).indexable())?
        .with(SchemaItem::new("lastUpdated", DateItem::new().use_now()).indexable())?;

    Ok(Model::new(NAME, schema))
}
