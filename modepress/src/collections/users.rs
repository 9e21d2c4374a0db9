use crate::error::Result;
use crate::models::Model;
use crate::schema::{DateItem, JsonItem, NumberItem, Schema, SchemaItem, TextItem};

pub const NAME: &str = "users";

/// Privilege levels, lower is more powerful
pub mod privileges {
    pub const SUPER: f64 = 1.0;
    pub const ADMIN: f64 = 2.0;
    pub const REGULAR: f64 = 3.0;
}

pub fn model() -> Result<Model> {
    let schema = Schema::new()
        .with(
            SchemaItem::new("username", TextItem::default().min_characters(1).max_characters(100))
                .unique()
                .required()
                .indexable(),
        )?
        .with(
            SchemaItem::new("email", TextItem::default().min_characters(3).max_characters(300))
                .unique()
                .required()
                .sensitive(),
        )?
        .with(
            SchemaItem::new("password", TextItem::default().min_characters(1))
                .required()
                .sensitive(),
        )?
        .with(SchemaItem::new("registerKey", TextItem::default()).sensitive())?
        .with(SchemaItem::new("sessionId", TextItem::default()).sensitive())?
        .with(SchemaItem::new("passwordTag", TextItem::default()).sensitive())?
        .with(SchemaItem::new("avatar", TextItem::default().max_characters(1024)))?
        .with(SchemaItem::new(
            "privileges",
            NumberItem::new(privileges::REGULAR)
                .min(privileges::SUPER)
                .max(privileges::REGULAR),
        ))?
        .with(SchemaItem::new("meta", JsonItem::default()).sensitive())?
        .with(SchemaItem::new("createdOn", DateItem::new().default_now()).indexable())?
        .with(SchemaItem::new("lastLoggedIn", DateItem::new().default_now()))?;

    Ok(Model::new(NAME, schema))
}
