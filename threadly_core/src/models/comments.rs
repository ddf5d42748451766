use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, ConnectionTrait, DbErr, DerivePartialModel,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entity::{comment, prelude::*},
    ids::{CommentId, PostId, UserId},
};

/// Text every soft-deleted comment carries, in storage and on the wire.
pub const DELETED_TEXT: &str = "This comment has been deleted";

/// Formats a timestamp the way every comment column stores it.
///
/// Fixed width (microseconds, `Z` suffix), so comparing two stored strings
/// compares the instants they encode.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now() -> String {
    timestamp(Utc::now())
}

/// A comment row plus its author's user row, when one exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRow {
    pub comment: CommentModel,
    pub author: Option<UserModel>,
}

impl From<(CommentModel, Option<UserModel>)> for CommentRow {
    fn from((comment, author): (CommentModel, Option<UserModel>)) -> Self {
        Self { comment, author }
    }
}

/// The columns thread resolution needs from a would-be parent.
#[derive(Clone, Debug, PartialEq, Eq, DerivePartialModel, FromQueryResult)]
#[sea_orm(entity = "comment::Entity")]
pub struct ParentMeta {
    pub id: CommentId,
    pub post_id: PostId,
    pub root_id: Option<CommentId>,
    pub depth: i32,
    pub deleted: bool,
}

#[derive(Clone, Debug)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub parent_id: Option<CommentId>,
    pub root_id: Option<CommentId>,
    pub depth: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextUpdate {
    Updated(CommentModel),
    NotFound,
    Deleted,
}

/// Data access for comments. Works on a plain connection or inside a
/// transaction.
pub struct CommentStore<'c, C> {
    conn: &'c C,
}

impl<'c, C> CommentStore<'c, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Assigns id and `created_at` and inserts. A colliding id fails instead
    /// of overwriting.
    pub async fn insert(&self, new: NewComment) -> Result<CommentModel, DbErr> {
        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(new.post_id),
            author_id: Set(new.author_id),
            text: Set(new.text),
            parent_id: Set(new.parent_id),
            root_id: Set(new.root_id),
            depth: Set(new.depth),
            created_at: Set(now()),
            is_edited: Set(false),
            edited_at: Set(None),
            deleted: Set(false),
            deleted_at: Set(None),
            deleted_by: Set(None),
        };

        Comment::insert(comment).exec_with_returning(self.conn).await
    }

    /// Appends a comment id to its post's comment list.
    pub async fn link_to_post(&self, post_id: PostId, comment_id: CommentId) -> Result<(), DbErr> {
        let link = PostCommentActiveModel {
            post_id: Set(post_id),
            comment_id: Set(comment_id),
        };

        PostComment::insert(link)
            .exec_without_returning(self.conn)
            .await?;

        Ok(())
    }

    pub async fn post_exists(&self, post_id: PostId) -> Result<bool, DbErr> {
        let count = Post::find_by_id(post_id).count(self.conn).await?;
        Ok(count > 0)
    }

    pub async fn find_by_id(&self, id: CommentId) -> Result<Option<CommentModel>, DbErr> {
        Comment::find_by_id(id).one(self.conn).await
    }

    pub async fn find_row(&self, id: CommentId) -> Result<Option<CommentRow>, DbErr> {
        let row = Comment::find_by_id(id)
            .find_also_related(User)
            .one(self.conn)
            .await?;

        Ok(row.map(CommentRow::from))
    }

    pub async fn find_parent_meta(&self, id: CommentId) -> Result<Option<ParentMeta>, DbErr> {
        Comment::find_by_id(id)
            .into_partial_model::<ParentMeta>()
            .one(self.conn)
            .await
    }

    /// Root comments of a post, oldest first, strictly after `after`.
    pub async fn find_roots_page(
        &self,
        post_id: PostId,
        after: Option<&str>,
        limit: u64,
    ) -> Result<Vec<CommentRow>, DbErr> {
        let mut query = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .filter(CommentColumn::ParentId.is_null());

        if let Some(after) = after {
            query = query.filter(CommentColumn::CreatedAt.gt(after));
        }

        let rows = query
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .limit(limit)
            .find_also_related(User)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    /// Direct replies of a comment, newest first, strictly before `before`.
    ///
    /// Walking backwards from the oldest reply already shown is what lets a
    /// newest-first view offer "load older replies".
    pub async fn find_replies_page(
        &self,
        parent_id: CommentId,
        before: Option<&str>,
        limit: u64,
    ) -> Result<Vec<CommentRow>, DbErr> {
        let mut query = Comment::find().filter(CommentColumn::ParentId.eq(parent_id));

        if let Some(before) = before {
            query = query.filter(CommentColumn::CreatedAt.lt(before));
        }

        let rows = query
            .order_by_desc(CommentColumn::CreatedAt)
            .order_by_desc(CommentColumn::Id)
            .limit(limit)
            .find_also_related(User)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    /// Every comment of a post, oldest first. Unbounded.
    pub async fn find_all_for_post(&self, post_id: PostId) -> Result<Vec<CommentRow>, DbErr> {
        self.find_all_for_posts(&[post_id]).await
    }

    pub async fn find_all_for_posts(&self, post_ids: &[PostId]) -> Result<Vec<CommentRow>, DbErr> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Comment::find()
            .filter(CommentColumn::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .find_also_related(User)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    /// A root comment and every comment filed under it, oldest first.
    pub async fn find_thread(
        &self,
        post_id: PostId,
        root_id: CommentId,
    ) -> Result<Vec<CommentRow>, DbErr> {
        let rows = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .filter(
                Condition::any()
                    .add(CommentColumn::Id.eq(root_id))
                    .add(CommentColumn::RootId.eq(root_id)),
            )
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .find_also_related(User)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    /// Flips `deleted` from false to true in a single conditional update.
    ///
    /// Returns `None` when the row was already deleted (or is gone): exactly
    /// one caller ever gets `Some`.
    pub async fn compare_and_soft_delete(
        &self,
        id: CommentId,
        deleted_by: UserId,
    ) -> Result<Option<CommentModel>, DbErr> {
        let result = Comment::update_many()
            .col_expr(CommentColumn::Deleted, Expr::value(true))
            .col_expr(CommentColumn::DeletedAt, Expr::value(now()))
            .col_expr(CommentColumn::DeletedBy, Expr::value(deleted_by))
            .col_expr(CommentColumn::Text, Expr::value(DELETED_TEXT))
            .filter(CommentColumn::Id.eq(id))
            .filter(CommentColumn::Deleted.eq(false))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    /// Replaces the text of a live comment and stamps the edit.
    ///
    /// Guarded by `deleted = false`, so an edit can never resurrect text on a
    /// comment deleted after the caller looked at it.
    pub async fn update_text(&self, id: CommentId, text: &str) -> Result<TextUpdate, DbErr> {
        let result = Comment::update_many()
            .col_expr(CommentColumn::Text, Expr::value(text))
            .col_expr(CommentColumn::IsEdited, Expr::value(true))
            .col_expr(CommentColumn::EditedAt, Expr::value(now()))
            .filter(CommentColumn::Id.eq(id))
            .filter(CommentColumn::Deleted.eq(false))
            .exec(self.conn)
            .await?;

        let current = self.find_by_id(id).await?;

        Ok(match current {
            None => TextUpdate::NotFound,
            Some(_) if result.rows_affected == 0 => TextUpdate::Deleted,
            Some(comment) => TextUpdate::Updated(comment),
        })
    }

    /// Removes every comment of a post together with the post's comment list.
    pub async fn delete_all_for_post(&self, post_id: PostId) -> Result<u64, DbErr> {
        PostComment::delete_many()
            .filter(PostCommentColumn::PostId.eq(post_id))
            .exec(self.conn)
            .await?;

        let result = Comment::delete_many()
            .filter(CommentColumn::PostId.eq(post_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// The post's comment-id list, in comment creation order.
    pub async fn linked_comment_ids(&self, post_id: PostId) -> Result<Vec<CommentId>, DbErr> {
        let links = PostComment::find()
            .filter(PostCommentColumn::PostId.eq(post_id))
            .inner_join(Comment)
            .order_by_asc(CommentColumn::CreatedAt)
            .all(self.conn)
            .await?;

        Ok(links.into_iter().map(|link| link.comment_id).collect())
    }
}
