use crate::error::Result;
use crate::models::Model;
use crate::schema::{ForeignKeyItem, IdArrayItem, Schema, SchemaItem, TextItem};

pub const NAME: &str = "categories";

pub fn model() -> Result<Model> {
    let schema = Schema::new()
        .with(SchemaItem::new("title", TextItem::default().min_characters(1)).required())?
        .with(
            SchemaItem::new("slug", TextItem::default().min_characters(1).max_characters(128))
                .unique()
                .required()
                .indexable(),
        )?
        .with(SchemaItem::new("description", TextItem::default().strip_html()))?
        .with(SchemaItem::new("parent", ForeignKeyItem::new(NAME).nullable()))?
        .with(SchemaItem::new("children", IdArrayItem::new(NAME)))?;

    Ok(Model::new(NAME, schema))
}
