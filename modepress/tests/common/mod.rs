#![allow(dead_code)]

use modepress::prelude::*;
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Register `models` on a fresh registry bound to a fresh in-memory database
pub async fn setup(models: Vec<Model>) -> (Arc<ModelRegistry>, MemoryDatabase) {
    setup_with_config(OdmConfig::default(), models).await
}

pub async fn setup_with_config(
    config: OdmConfig,
    models: Vec<Model>,
) -> (Arc<ModelRegistry>, MemoryDatabase) {
    init_logging();
    let registry = ModelRegistry::with_config(config);
    for model in models {
        registry.register(model).unwrap();
    }
    let database = MemoryDatabase::new();
    registry.initialize(&database).await.unwrap();
    (registry, database)
}

pub fn schema(items: Vec<SchemaItem>) -> Schema {
    let mut schema = Schema::new();
    for item in items {
        schema.add(item).unwrap();
    }
    schema
}

pub fn post_model() -> Model {
    Model::new(
        "posts",
        schema(vec![
            SchemaItem::new("slug", TextItem::default()).unique().required(),
            SchemaItem::new("title", TextItem::default()),
            SchemaItem::new("public", BoolItem::new(true)),
        ]),
    )
}

pub fn comment_model() -> Model {
    Model::new(
        "comments",
        schema(vec![SchemaItem::new(
            "content",
            TextItem::default().max_characters(10),
        )]),
    )
}

/// users <- posts.author (nullable) <- comments.post (required),
/// comments.parent (nullable) and comments.replies (id array)
pub fn linked_models() -> Vec<Model> {
    vec![
        Model::new(
            "users",
            schema(vec![
                SchemaItem::new("username", TextItem::default()).unique(),
                SchemaItem::new("email", TextItem::default()).sensitive(),
            ]),
        ),
        Model::new(
            "posts",
            schema(vec![
                SchemaItem::new("title", TextItem::default()),
                SchemaItem::new("author", ForeignKeyItem::new("users").nullable()),
            ]),
        ),
        Model::new(
            "comments",
            schema(vec![
                SchemaItem::new("content", TextItem::default()),
                SchemaItem::new("post", ForeignKeyItem::new("posts")),
                SchemaItem::new("parent", ForeignKeyItem::new("comments").nullable()),
                SchemaItem::new("replies", IdArrayItem::new("comments")),
            ]),
        ),
    ]
}

pub fn id_string(record: &Record) -> String {
    record.id.to_string()
}
