#[cfg(test)]
mod entity_tests {
    use crate::entity::prelude::*;
    use crate::ids::*;
    use crate::test_utils::{at_second, seed_comment_at, seed_post, seed_user, setup_test_db};

    fn comment(post_id: PostId, author_id: UserId) -> CommentActiveModel {
        CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(post_id),
            author_id: Set(author_id),
            text: Set("Hello".to_string()),
            parent_id: Set(None),
            root_id: Set(None),
            depth: Set(0),
            created_at: Set("2025-01-01T12:00:00.000000Z".to_string()),
            is_edited: Set(false),
            edited_at: Set(None),
            deleted: Set(false),
            deleted_at: Set(None),
            deleted_by: Set(None),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = setup_test_db().await;

        let user_id = UserId::new();
        let user = UserActiveModel {
            id: Set(user_id),
            name: Set("Test User".to_string()),
            avatar_url: Set(Some("https://example.invalid/a.png".to_string())),
        };

        User::insert(user)
            .exec(&db)
            .await
            .expect("Failed to insert user");

        let found = User::find_by_id(user_id)
            .one(&db)
            .await
            .expect("Failed to query user");

        assert!(found.is_some());
        let found_user = found.unwrap();
        assert_eq!(found_user.id, user_id);
        assert_eq!(found_user.name, "Test User");
        assert_eq!(
            found_user.avatar_url.as_deref(),
            Some("https://example.invalid/a.png")
        );
    }

    #[tokio::test]
    async fn test_create_and_find_comment() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Author").await;
        let post_id = seed_post(&db, author).await;

        let model = comment(post_id, author);
        let comment_id = model.id.clone().unwrap();
        Comment::insert(model).exec(&db).await.unwrap();

        let found = Comment::find_by_id(comment_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.post_id, post_id);
        assert_eq!(found.author_id, author);
        assert_eq!(found.parent_id, None);
        assert_eq!(found.deleted_by, None);
        assert!(!found.deleted);
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Author").await;

        let result = Comment::insert(comment(PostId::new(), author))
            .exec(&db)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_comment_with_author() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Grace").await;
        let post_id = seed_post(&db, author).await;
        let stored = seed_comment_at(&db, post_id, author, None, at_second(1)).await;

        let (found, user) = Comment::find_by_id(stored.id)
            .find_also_related(User)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found, stored);
        assert_eq!(user.map(|u| u.name).as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn test_comment_author_need_not_exist() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Author").await;
        let post_id = seed_post(&db, author).await;
        let ghost = UserId::new();
        let stored = seed_comment_at(&db, post_id, ghost, None, at_second(1)).await;

        let (_, user) = Comment::find_by_id(stored.id)
            .find_also_related(User)
            .one(&db)
            .await
            .unwrap()
            .unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_post_comment_composite_key() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Author").await;
        let post_id = seed_post(&db, author).await;
        let stored = seed_comment_at(&db, post_id, author, None, at_second(1)).await;

        let link = PostCommentActiveModel {
            post_id: Set(post_id),
            comment_id: Set(stored.id),
        };
        PostComment::insert(link.clone()).exec(&db).await.unwrap();

        // Same pair twice violates the primary key
        assert!(PostComment::insert(link).exec(&db).await.is_err());

        let found = PostComment::find_by_id((post_id, stored.id))
            .one(&db)
            .await
            .unwrap();
        assert!(found.is_some());

        let count = PostComment::find()
            .filter(PostCommentColumn::PostId.eq(post_id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_deleting_parent_cascades_to_replies() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Author").await;
        let post_id = seed_post(&db, author).await;
        let root = seed_comment_at(&db, post_id, author, None, at_second(1)).await;
        let reply = seed_comment_at(&db, post_id, author, Some(&root), at_second(2)).await;

        Comment::delete_by_id(root.id).exec(&db).await.unwrap();

        let orphan = Comment::find_by_id(reply.id).one(&db).await.unwrap();
        assert!(orphan.is_none());
    }

    #[tokio::test]
    async fn test_find_post_comments_via_relation() {
        let db = setup_test_db().await;
        let author = seed_user(&db, "Author").await;
        let post_id = seed_post(&db, author).await;
        let other_post = seed_post(&db, author).await;
        seed_comment_at(&db, post_id, author, None, at_second(1)).await;
        seed_comment_at(&db, post_id, author, None, at_second(2)).await;
        seed_comment_at(&db, other_post, author, None, at_second(3)).await;

        let post = Post::find_by_id(post_id).one(&db).await.unwrap().unwrap();
        let comments = post.find_related(Comment).all(&db).await.unwrap();

        assert_eq!(comments.len(), 2);
        assert!(comments.iter().all(|c| c.post_id == post_id));
    }
}
