#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::database::entity::{post, user};
    use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};
    use quill_core::domain::Post;
    use quill_core::error::RepoError;
    use quill_core::ports::{BaseRepository, PostRepository, PostScope, UserRepository};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn post_model(title: &str, author_id: uuid::Uuid) -> post::Model {
        post::Model {
            id: uuid::Uuid::new_v4(),
            title: title.to_owned(),
            content: "Content".to_owned(),
            date_posted: chrono::Utc::now().into(),
            author_id,
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let author_id = uuid::Uuid::new_v4();
        let model = post_model("Test Post", author_id);
        let post_id = model.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        let post = result.unwrap();
        assert_eq!(post.title, "Test Post");
        assert_eq!(post.id, post_id);
        assert_eq!(post.author_id, author_id);
    }

    #[tokio::test]
    async fn test_list_recent_maps_rows() {
        let author_id = uuid::Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![
                post_model("Newer", author_id),
                post_model("Older", author_id),
            ]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let posts = repo
            .list_recent(PostScope::Author(author_id), 0, 4)
            .await
            .unwrap();

        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_count_posts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![BTreeMap::from([(
                "num_items",
                Into::<Value>::into(9i64),
            )])]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        assert_eq!(repo.count(PostScope::All).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_find_user_by_username() {
        let user_id = uuid::Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user::Model {
                id: user_id,
                username: "alice".to_owned(),
                email: "alice@example.com".to_owned(),
                password_hash: "hash".to_owned(),
                date_joined: chrono::Utc::now().into(),
            }]])
            .into_connection();

        let repo = PostgresUserRepository::new(db);
        let user = repo.find_by_username("alice").await.unwrap().unwrap();

        assert_eq!(user.id, user_id);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        let result = BaseRepository::<Post, uuid::Uuid>::delete(&repo, uuid::Uuid::new_v4()).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }
}
