mod common;

#[cfg(test)]
mod tests {
    use super::common::{id_string, linked_models, setup};
    use modepress::models::id_selector;
    use modepress::prelude::*;
    use serde_json::Value;
    use uuid::Uuid;

    fn dependencies(
        db: &MemoryDatabase,
        collection: &str,
        id: Uuid,
        kind: DependencyKind,
    ) -> Value {
        db.memory_collection(collection)
            .get(&id)
            .and_then(|doc| doc.get(kind.field()).cloned())
            .unwrap_or_else(|| json!([]))
    }

    fn descriptor(id: Uuid, collection: &str, property: &str) -> Value {
        Dependency::new(id, collection, property).to_value()
    }

    #[tokio::test]
    async fn test_back_references_are_recorded_and_released() {
        let (registry, db) = setup(linked_models()).await;
        let user = registry
            .get("users")
            .unwrap()
            .create_instance(&json!({"username": "ada"}))
            .await
            .unwrap();
        let post = registry
            .get("posts")
            .unwrap()
            .create_instance(&json!({"title": "Hello", "author": id_string(&user)}))
            .await
            .unwrap();
        let comments = registry.get("comments").unwrap();
        let comment = comments
            .create_instance(&json!({"content": "Hi", "post": id_string(&post)}))
            .await
            .unwrap();

        assert_eq!(
            dependencies(&db, "posts", post.id, DependencyKind::Required),
            json!([descriptor(comment.id, "comments", "post")])
        );
        assert_eq!(
            dependencies(&db, "users", user.id, DependencyKind::Optional),
            json!([descriptor(post.id, "posts", "author")])
        );

        let deleted = comments
            .delete_instances(&id_selector(comment.id))
            .await
            .unwrap();
        assert_eq!(deleted.success_count(), 1);
        assert_eq!(
            dependencies(&db, "posts", post.id, DependencyKind::Required),
            json!([])
        );
    }

    #[tokio::test]
    async fn test_repeated_upserts_do_not_duplicate_descriptors() {
        let (registry, db) = setup(linked_models()).await;
        let posts = registry.get("posts").unwrap();
        let post = posts.create_instance(&json!({"title": "P"})).await.unwrap();
        let comments = registry.get("comments").unwrap();
        let comment = comments
            .create_instance(&json!({"content": "c", "post": id_string(&post)}))
            .await
            .unwrap();

        comments
            .update(
                &id_selector(comment.id),
                &json!({"content": "edited"}),
                &JsonOptions::default(),
            )
            .await
            .unwrap();

        let required = dependencies(&db, "posts", post.id, DependencyKind::Required);
        assert_eq!(required.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_repointing_a_reference_moves_the_descriptor() {
        let (registry, db) = setup(linked_models()).await;
        let posts = registry.get("posts").unwrap();
        let first = posts.create_instance(&json!({"title": "1"})).await.unwrap();
        let second = posts.create_instance(&json!({"title": "2"})).await.unwrap();
        let comments = registry.get("comments").unwrap();
        let comment = comments
            .create_instance(&json!({"content": "c", "post": id_string(&first)}))
            .await
            .unwrap();

        comments
            .update(
                &id_selector(comment.id),
                &json!({"post": id_string(&second)}),
                &JsonOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            dependencies(&db, "posts", first.id, DependencyKind::Required),
            json!([])
        );
        assert_eq!(
            dependencies(&db, "posts", second.id, DependencyKind::Required),
            json!([descriptor(comment.id, "comments", "post")])
        );
    }

    #[tokio::test]
    async fn test_deleting_a_target_deletes_required_dependents() {
        let (registry, db) = setup(linked_models()).await;
        let posts = registry.get("posts").unwrap();
        let post = posts.create_instance(&json!({"title": "P"})).await.unwrap();
        let comments = registry.get("comments").unwrap();
        for content in ["a", "b"] {
            comments
                .create_instance(&json!({"content": content, "post": id_string(&post)}))
                .await
                .unwrap();
        }
        assert_eq!(comments.count(&json!({})).await.unwrap(), 2);

        let deleted = posts.delete_instances(&id_selector(post.id)).await.unwrap();
        assert_eq!(deleted.success_count(), 1);
        assert_eq!(comments.count(&json!({})).await.unwrap(), 0);
        assert!(db.memory_collection("comments").is_empty());
    }

    #[tokio::test]
    async fn test_deleting_a_target_detaches_optional_dependents() {
        let (registry, _db) = setup(linked_models()).await;
        let users = registry.get("users").unwrap();
        let user = users
            .create_instance(&json!({"username": "ada"}))
            .await
            .unwrap();
        let posts = registry.get("posts").unwrap();
        let post = posts
            .create_instance(&json!({"title": "P", "author": id_string(&user)}))
            .await
            .unwrap();

        users.delete_instances(&id_selector(user.id)).await.unwrap();

        let remaining = posts.find_one(&id_selector(post.id)).await.unwrap().unwrap();
        assert_eq!(remaining.schema.serialize()["author"], Value::Null);
    }

    #[tokio::test]
    async fn test_deleting_an_array_member_pulls_it() {
        let (registry, _db) = setup(linked_models()).await;
        let post = registry
            .get("posts")
            .unwrap()
            .create_instance(&json!({"title": "P"}))
            .await
            .unwrap();
        let comments = registry.get("comments").unwrap();
        let reply = comments
            .create_instance(&json!({"content": "reply", "post": id_string(&post)}))
            .await
            .unwrap();
        let thread = comments
            .create_instance(&json!({
                "content": "thread",
                "post": id_string(&post),
                "replies": [id_string(&reply)],
            }))
            .await
            .unwrap();

        comments.delete_instances(&id_selector(reply.id)).await.unwrap();

        let thread = comments.find_one(&id_selector(thread.id)).await.unwrap().unwrap();
        assert_eq!(thread.schema.serialize()["replies"], json!([]));
    }

    #[tokio::test]
    async fn test_loaded_records_carry_their_dependencies() {
        let (registry, _db) = setup(linked_models()).await;
        let posts = registry.get("posts").unwrap();
        let post = posts.create_instance(&json!({"title": "P"})).await.unwrap();
        let comment = registry
            .get("comments")
            .unwrap()
            .create_instance(&json!({"content": "c", "post": id_string(&post)}))
            .await
            .unwrap();

        let loaded = posts.find_one(&id_selector(post.id)).await.unwrap().unwrap();
        assert_eq!(
            loaded.dependencies.required,
            vec![Dependency::new(comment.id, "comments", "post")]
        );
        assert!(loaded.dependencies.optional.is_empty());
    }
}
