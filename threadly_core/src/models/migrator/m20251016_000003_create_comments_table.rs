use sea_orm_migration::{prelude::*, schema::*};

use super::m20251016_000002_create_posts_table::Post;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .col(pk_uuid(Comment::Id))
                    .col(uuid(Comment::PostId))
                    .col(uuid(Comment::AuthorId))
                    .col(string(Comment::Text))
                    .col(uuid_null(Comment::ParentId))
                    .col(uuid_null(Comment::RootId))
                    .col(integer(Comment::Depth).default(0))
                    .col(string(Comment::CreatedAt))
                    .col(boolean(Comment::IsEdited).default(false))
                    .col(string_null(Comment::EditedAt))
                    .col(boolean(Comment::Deleted).default(false))
                    .col(string_null(Comment::DeletedAt))
                    .col(uuid_null(Comment::DeletedBy))
                    // Comments must be removed before their post goes away.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-comment-post_id")
                            .from(Comment::Table, Comment::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-comment-parent_id")
                            .from(Comment::Table, Comment::ParentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Root pages: post_id + parent_id IS NULL, ordered by created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_parent_created")
                    .table(Comment::Table)
                    .col(Comment::PostId)
                    .col(Comment::ParentId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Reply pages
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_parent_created")
                    .table(Comment::Table)
                    .col(Comment::ParentId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Thread views
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_root_id")
                    .table(Comment::Table)
                    .col(Comment::RootId)
                    .to_owned(),
            )
            .await?;

        // Full-tree views
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_created")
                    .table(Comment::Table)
                    .col(Comment::PostId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_author_created")
                    .table(Comment::Table)
                    .col(Comment::AuthorId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Comment {
    Table,
    Id,
    PostId,
    AuthorId,
    Text,
    ParentId,
    RootId,
    Depth,
    CreatedAt,
    IsEdited,
    EditedAt,
    Deleted,
    DeletedAt,
    DeletedBy,
}
