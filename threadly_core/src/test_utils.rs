use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;

use crate::{
    entity::prelude::*,
    ids::{CommentId, PostId, UserId},
    models::{comments::timestamp, migrator::Migrator},
};

/// Fresh, isolated in-memory SQLite database with migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory
/// database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// A fixed instant `seconds` after a reference point, for deterministic
/// ordering in tests.
pub fn at_second(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
}

pub async fn seed_user(db: &DatabaseConnection, name: &str) -> UserId {
    let user_id = UserId::new();
    let user = UserActiveModel {
        id: Set(user_id),
        name: Set(name.to_string()),
        avatar_url: Set(None),
    };
    User::insert(user).exec_without_returning(db).await.unwrap();
    user_id
}

pub async fn seed_post(db: &DatabaseConnection, author: UserId) -> PostId {
    let post_id = PostId::new();
    let post = PostActiveModel {
        id: Set(post_id),
        author_id: Set(author),
        title: Set("A post".to_string()),
        created_at: Set(timestamp(at_second(0))),
    };
    Post::insert(post).exec_without_returning(db).await.unwrap();
    post_id
}

/// Inserts a comment row directly with an explicit creation time, deriving
/// thread metadata from `parent`.
pub async fn seed_comment_at(
    db: &DatabaseConnection,
    post_id: PostId,
    author: UserId,
    parent: Option<&CommentModel>,
    created_at: DateTime<Utc>,
) -> CommentModel {
    let (parent_id, root_id, depth) = match parent {
        Some(parent) => (
            Some(parent.id),
            Some(parent.root_id.unwrap_or(parent.id)),
            parent.depth + 1,
        ),
        None => (None, None, 0),
    };

    let comment = CommentActiveModel {
        id: Set(CommentId::new()),
        post_id: Set(post_id),
        author_id: Set(author),
        text: Set(format!("comment at {created_at}")),
        parent_id: Set(parent_id),
        root_id: Set(root_id),
        depth: Set(depth),
        created_at: Set(timestamp(created_at)),
        is_edited: Set(false),
        edited_at: Set(None),
        deleted: Set(false),
        deleted_at: Set(None),
        deleted_by: Set(None),
    };

    Comment::insert(comment).exec_with_returning(db).await.unwrap()
}
