use sea_orm_migration::{prelude::*, schema::*};

use super::m20251016_000002_create_posts_table::Post;
use super::m20251016_000003_create_comments_table::Comment;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostComment::Table)
                    .col(uuid(PostComment::PostId))
                    .col(uuid(PostComment::CommentId))
                    .primary_key(
                        Index::create()
                            .col(PostComment::PostId)
                            .col(PostComment::CommentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-comment-post_id")
                            .from(PostComment::Table, PostComment::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-comment-comment_id")
                            .from(PostComment::Table, PostComment::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostComment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PostComment {
    Table,
    PostId,
    CommentId,
}
