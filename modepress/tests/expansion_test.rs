mod common;

#[cfg(test)]
mod tests {
    use super::common::{id_string, linked_models, setup, setup_with_config};
    use modepress::config::ExpansionConfig;
    use modepress::models::id_selector;
    use modepress::prelude::*;
    use serde_json::Value;
    use std::sync::Arc;
    use uuid::Uuid;

    struct Fixture {
        registry: Arc<ModelRegistry>,
        db: MemoryDatabase,
        user: Record,
        post: Record,
        comment: Record,
    }

    async fn fixture_with(config: OdmConfig) -> Fixture {
        let (registry, db) = setup_with_config(config, linked_models()).await;
        let user = registry
            .get("users")
            .unwrap()
            .create_instance(&json!({"username": "ada", "email": "ada@example.com"}))
            .await
            .unwrap();
        let post = registry
            .get("posts")
            .unwrap()
            .create_instance(&json!({"title": "Hello", "author": id_string(&user)}))
            .await
            .unwrap();
        let comment = registry
            .get("comments")
            .unwrap()
            .create_instance(&json!({"content": "First", "post": id_string(&post)}))
            .await
            .unwrap();

        Fixture {
            registry,
            db,
            user,
            post,
            comment,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(OdmConfig::default()).await
    }

    async fn download(fx: &Fixture, id: Uuid, options: &JsonOptions) -> Result<Value> {
        let comments = fx.registry.get("comments")?;
        Ok(comments
            .download_one(&id_selector(id), options)
            .await?
            .unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_no_expansion_by_default() {
        let fx = fixture().await;
        let json = download(&fx, fx.comment.id, &JsonOptions::default())
            .await
            .unwrap();
        assert_eq!(json["post"], json!(id_string(&fx.post)));
        assert_eq!(json["parent"], Value::Null);
        assert_eq!(json["replies"], json!([]));
    }

    #[tokio::test]
    async fn test_depth_one_expands_first_level_only() {
        let fx = fixture().await;
        let json = download(&fx, fx.comment.id, &JsonOptions::expanded(1))
            .await
            .unwrap();

        assert_eq!(json["post"]["_id"], json!(id_string(&fx.post)));
        assert_eq!(json["post"]["title"], json!("Hello"));
        assert_eq!(json["post"]["author"], json!(id_string(&fx.user)));
    }

    #[tokio::test]
    async fn test_depth_two_and_unlimited() {
        let fx = fixture().await;

        let two = download(&fx, fx.comment.id, &JsonOptions::expanded(2))
            .await
            .unwrap();
        assert_eq!(two["post"]["author"]["username"], json!("ada"));
        assert!(two["post"]["author"].get("email").is_none());

        let unlimited = download(&fx, fx.comment.id, &JsonOptions::expanded(-1).with_verbose(true))
            .await
            .unwrap();
        assert_eq!(
            unlimited["post"]["author"]["email"],
            json!("ada@example.com")
        );
    }

    #[tokio::test]
    async fn test_blacklist_is_never_expanded() {
        let fx = fixture().await;
        let json = download(&fx, fx.comment.id, &JsonOptions::expanded(-1).blacklist("post"))
            .await
            .unwrap();
        assert_eq!(json["post"], json!(id_string(&fx.post)));

        let nested = download(&fx, fx.comment.id, &JsonOptions::expanded(-1).blacklist("author"))
            .await
            .unwrap();
        assert_eq!(nested["post"]["title"], json!("Hello"));
        assert_eq!(nested["post"]["author"], json!(id_string(&fx.user)));
    }

    #[tokio::test]
    async fn test_expansion_requires_depth() {
        let fx = fixture().await;
        let options = JsonOptions {
            expand_foreign_keys: true,
            ..JsonOptions::default()
        };
        let err = download(&fx, fx.comment.id, &options).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn test_cycles_terminate_with_unlimited_depth() {
        let fx = fixture().await;
        let comments = fx.registry.get("comments").unwrap();
        let reply = comments
            .create_instance(&json!({
                "content": "Reply",
                "post": id_string(&fx.post),
                "parent": id_string(&fx.comment),
            }))
            .await
            .unwrap();
        comments
            .update(
                &id_selector(fx.comment.id),
                &json!({"parent": id_string(&reply)}),
                &JsonOptions::default(),
            )
            .await
            .unwrap();

        let json = download(&fx, fx.comment.id, &JsonOptions::expanded(-1))
            .await
            .unwrap();
        assert_eq!(json["parent"]["_id"], json!(id_string(&reply)));
        assert_eq!(json["parent"]["parent"], json!(id_string(&fx.comment)));
    }

    #[tokio::test]
    async fn test_self_reference_is_left_raw() {
        let fx = fixture().await;
        let comments = fx.registry.get("comments").unwrap();
        comments
            .update(
                &id_selector(fx.comment.id),
                &json!({"parent": id_string(&fx.comment)}),
                &JsonOptions::default(),
            )
            .await
            .unwrap();

        let json = download(&fx, fx.comment.id, &JsonOptions::expanded(-1))
            .await
            .unwrap();
        assert_eq!(json["parent"], json!(id_string(&fx.comment)));
    }

    #[tokio::test]
    async fn test_id_array_expansion_keeps_order_and_missing_ids() {
        let fx = fixture().await;
        let comments = fx.registry.get("comments").unwrap();
        let mut replies = Vec::new();
        for content in ["one", "two", "three"] {
            replies.push(
                comments
                    .create_instance(&json!({"content": content, "post": id_string(&fx.post)}))
                    .await
                    .unwrap(),
            );
        }
        let ids: Vec<String> = replies.iter().map(id_string).collect();
        comments
            .update(
                &id_selector(fx.comment.id),
                &json!({"replies": [ids[2], ids[0], ids[1]]}),
                &JsonOptions::default(),
            )
            .await
            .unwrap();

        // remove one reply behind the model's back
        fx.db
            .memory_collection("comments")
            .delete_one(&id_selector(replies[0].id))
            .await
            .unwrap();

        let json = download(&fx, fx.comment.id, &JsonOptions::expanded(1))
            .await
            .unwrap();
        let expanded = json["replies"].as_array().unwrap();
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[0]["content"], json!("three"));
        assert_eq!(expanded[1], json!(ids[0]));
        assert_eq!(expanded[2]["content"], json!("two"));
    }

    #[tokio::test]
    async fn test_depth_ceiling_from_config() {
        let mut config = OdmConfig::default();
        config.expansion = ExpansionConfig {
            default_max_depth: 1,
            max_depth_ceiling: Some(1),
        };
        let fx = fixture_with(config).await;

        let json = download(&fx, fx.comment.id, &JsonOptions::expanded(-1))
            .await
            .unwrap();
        assert_eq!(json["post"]["title"], json!("Hello"));
        assert_eq!(json["post"]["author"], json!(id_string(&fx.user)));
    }

    #[tokio::test]
    async fn test_unresolved_reference_is_rejected() {
        let (registry, _db) = setup(linked_models()).await;
        let missing = Uuid::new_v4();

        let err = registry
            .get("comments")
            .unwrap()
            .create_instance(&json!({"content": "x", "post": missing.to_string()}))
            .await
            .unwrap_err();
        match err {
            Error::ReferenceIntegrity {
                field,
                collection,
                missing: ids,
            } => {
                assert_eq!(field, "post");
                assert_eq!(collection, "posts");
                assert_eq!(ids, vec![missing.to_string()]);
            }
            other => panic!("expected a reference error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_null_references() {
        let fx = fixture().await;
        let posts = fx.registry.get("posts").unwrap();
        let comments = fx.registry.get("comments").unwrap();

        assert!(posts
            .create_instance(&json!({"title": "Anonymous", "author": null}))
            .await
            .is_ok());

        let err = comments
            .create_instance(&json!({"content": "orphan"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "post"));
    }

    #[tokio::test]
    async fn test_expanded_objects_are_accepted_as_references() {
        let fx = fixture().await;
        let comments = fx.registry.get("comments").unwrap();
        let post_json = fx
            .post
            .get_as_json(&JsonOptions::default(), &fx.registry)
            .await
            .unwrap();

        let comment = comments
            .create_instance(&json!({"content": "via object", "post": post_json}))
            .await
            .unwrap();
        assert_eq!(
            comment.schema.serialize()["post"],
            json!(id_string(&fx.post))
        );
    }
}
