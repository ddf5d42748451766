use std::collections::BTreeMap;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use tracing::{debug, info, warn};
use zel_core::prelude::*;

use crate::{
    config::CommentsConfig,
    entity::prelude::CommentModel,
    error::CommentsError,
    ids::{CommentId, PostId},
    models::comments::{CommentStore, NewComment, TextUpdate},
    service::authz::{require_actor, Actor},
    threads::{
        pagination::{self, Page, PageRequest},
        resolver,
        tree::{build_tree, ThreadNode, TreeOrder},
    },
    view::{CommentView, DeleteOutcome},
};

/// Longest comment accepted, in characters, after trimming.
pub const MAX_TEXT_CHARS: usize = 2000;

pub type CommentForest = Vec<ThreadNode<CommentView>>;

impl From<CommentsError> for ResourceError {
    fn from(error: CommentsError) -> Self {
        match error {
            CommentsError::Database(_) => ResourceError::infra(error),
            _ => ResourceError::app(error),
        }
    }
}

fn normalize_text(text: &str) -> Result<String, CommentsError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CommentsError::invalid("comment is required"));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(CommentsError::invalid(format!(
            "comment must be at most {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

#[derive(Clone)]
pub struct CommentsService {
    db: DatabaseConnection,
    config: CommentsConfig,
}

impl CommentsService {
    pub fn new(db: DatabaseConnection, config: CommentsConfig) -> Self {
        Self { db, config }
    }

    fn store(&self) -> CommentStore<'_, DatabaseConnection> {
        CommentStore::new(&self.db)
    }

    async fn load_view(&self, comment_id: CommentId) -> Result<CommentView, CommentsError> {
        self.store()
            .find_row(comment_id)
            .await?
            .map(CommentView::from)
            .ok_or(CommentsError::NotFound("comment"))
    }

    async fn load_for_modify(
        &self,
        actor: &Actor,
        comment_id: CommentId,
    ) -> Result<CommentModel, CommentsError> {
        let existing = self
            .store()
            .find_by_id(comment_id)
            .await?
            .ok_or(CommentsError::NotFound("comment"))?;

        if !actor.can_modify(existing.author_id) {
            return Err(CommentsError::Forbidden);
        }

        Ok(existing)
    }

    /// Inserts the comment and appends it to its post's list. Both or neither.
    async fn insert_linked<C>(conn: &C, new: NewComment) -> Result<CommentModel, DbErr>
    where
        C: ConnectionTrait,
    {
        let store = CommentStore::new(conn);
        let created = store.insert(new).await?;
        store.link_to_post(created.post_id, created.id).await?;
        Ok(created)
    }

    /// Create a root comment, or a reply when `parent_id` is given
    pub async fn _create_comment(
        &self,
        actor: Option<Actor>,
        post_id: PostId,
        text: String,
        parent_id: Option<CommentId>,
    ) -> Result<CommentView, CommentsError> {
        let actor = require_actor(actor)?;
        let text = normalize_text(&text)?;

        if !self.store().post_exists(post_id).await? {
            return Err(CommentsError::NotFound("post"));
        }

        let thread = resolver::resolve(&self.db, post_id, parent_id).await?;
        if let Some(max) = self.config.max_reply_depth {
            if thread.depth > max {
                return Err(CommentsError::invalid(format!("max reply depth is {max}")));
            }
        }

        let new = NewComment {
            post_id,
            author_id: actor.id,
            text,
            parent_id: thread.parent_id,
            root_id: thread.root_id,
            depth: i32::try_from(thread.depth)
                .map_err(|_| CommentsError::invalid("reply is nested too deeply"))?,
        };

        let txn = self.db.begin().await?;
        let created = match Self::insert_linked(&txn, new).await {
            Ok(created) => created,
            Err(err) => {
                txn.rollback().await?;
                warn!(%post_id, error = %err, "comment create rolled back");
                return Err(CommentsError::Conflict(err));
            }
        };
        txn.commit().await.map_err(CommentsError::Conflict)?;

        info!(
            comment_id = %created.id,
            %post_id,
            depth = thread.depth,
            "comment created"
        );

        self.load_view(created.id).await
    }

    /// Replace the text of a comment (author or admin)
    pub async fn _edit_comment(
        &self,
        actor: Option<Actor>,
        comment_id: CommentId,
        text: String,
    ) -> Result<CommentView, CommentsError> {
        let actor = require_actor(actor)?;
        let existing = self.load_for_modify(&actor, comment_id).await?;

        // Deleted comments are frozen, admins included.
        if existing.deleted {
            return Err(CommentsError::DeletedTarget);
        }

        let text = normalize_text(&text)?;

        match self.store().update_text(comment_id, &text).await? {
            TextUpdate::Updated(updated) => {
                info!(comment_id = %updated.id, "comment edited");
            }
            TextUpdate::Deleted => return Err(CommentsError::DeletedTarget),
            TextUpdate::NotFound => return Err(CommentsError::NotFound("comment")),
        }

        self.load_view(comment_id).await
    }

    /// Soft delete a comment (author or admin). Deleting twice is not an error.
    pub async fn _soft_delete_comment(
        &self,
        actor: Option<Actor>,
        comment_id: CommentId,
    ) -> Result<DeleteOutcome, CommentsError> {
        let actor = require_actor(actor)?;
        self.load_for_modify(&actor, comment_id).await?;

        let won = self
            .store()
            .compare_and_soft_delete(comment_id, actor.id)
            .await?
            .is_some();

        if won {
            info!(%comment_id, "comment soft-deleted");
        } else {
            warn!(%comment_id, "comment already deleted");
        }

        Ok(DeleteOutcome {
            comment: self.load_view(comment_id).await?,
            already_deleted: !won,
        })
    }

    /// Get a single comment
    pub async fn _get_comment(&self, comment_id: CommentId) -> Result<CommentView, CommentsError> {
        self.load_view(comment_id).await
    }

    /// Page through a post's root comments, oldest first
    pub async fn _list_roots(
        &self,
        post_id: PostId,
        request: PageRequest,
    ) -> Result<Page<CommentView>, CommentsError> {
        let limit = pagination::normalize_limit(request.limit.as_deref(), &self.config);
        let cursor = pagination::parse_cursor(request.cursor.as_deref())?;

        let rows = self
            .store()
            .find_roots_page(post_id, cursor.as_deref(), limit + 1)
            .await?;

        let page = Page::from_overfetch(rows.into_iter().map(CommentView::from).collect(), limit);
        debug!(%post_id, limit, returned = page.items.len(), "listed root comments");
        Ok(page)
    }

    /// Page through a comment's direct replies, newest first
    pub async fn _list_replies(
        &self,
        parent_id: CommentId,
        request: PageRequest,
    ) -> Result<Page<CommentView>, CommentsError> {
        let limit = pagination::normalize_limit(request.limit.as_deref(), &self.config);
        let cursor = pagination::parse_cursor(request.cursor.as_deref())?;

        let rows = self
            .store()
            .find_replies_page(parent_id, cursor.as_deref(), limit + 1)
            .await?;

        let page = Page::from_overfetch(rows.into_iter().map(CommentView::from).collect(), limit);
        debug!(%parent_id, limit, returned = page.items.len(), "listed replies");
        Ok(page)
    }

    /// Every comment of a post as a newest-first forest
    pub async fn _get_tree(&self, post_id: PostId) -> Result<CommentForest, CommentsError> {
        let rows = self.store().find_all_for_post(post_id).await?;
        debug!(%post_id, rows = rows.len(), "building comment tree");

        let views: Vec<CommentView> = rows.into_iter().map(CommentView::from).collect();
        Ok(build_tree(&views, TreeOrder::NewestFirst))
    }

    /// One thread of a post, in creation order
    pub async fn _get_thread(
        &self,
        post_id: PostId,
        root_id: CommentId,
    ) -> Result<CommentForest, CommentsError> {
        let rows = self.store().find_thread(post_id, root_id).await?;
        debug!(%post_id, %root_id, rows = rows.len(), "building thread");

        let views: Vec<CommentView> = rows.into_iter().map(CommentView::from).collect();
        Ok(build_tree(&views, TreeOrder::AsLoaded))
    }

    /// Comment forests for several posts at once, in creation order
    pub async fn _get_trees_for_posts(
        &self,
        post_ids: Vec<PostId>,
    ) -> Result<BTreeMap<PostId, CommentForest>, CommentsError> {
        let rows = self.store().find_all_for_posts(&post_ids).await?;

        let mut by_post: BTreeMap<PostId, Vec<CommentView>> =
            post_ids.iter().map(|id| (*id, Vec::new())).collect();
        for row in rows {
            let view = CommentView::from(row);
            by_post.entry(view.post_id).or_default().push(view);
        }

        Ok(by_post
            .into_iter()
            .map(|(post_id, views)| (post_id, build_tree(&views, TreeOrder::AsLoaded)))
            .collect())
    }

    /// Remove every comment of a post. Called by post deletion before the
    /// post row goes away.
    pub async fn _delete_comments_for_post(&self, post_id: PostId) -> Result<u64, CommentsError> {
        let txn = self.db.begin().await?;
        let removed = CommentStore::new(&txn).delete_all_for_post(post_id).await?;
        txn.commit().await?;

        info!(%post_id, removed, "deleted comments for post");
        Ok(removed)
    }
}

#[zel_service(name = "comments")]
trait Comments {
    #[doc = "Create a root comment or a reply"]
    #[method(name = "create_comment")]
    async fn create_comment(
        &self,
        actor: Option<Actor>,
        post_id: PostId,
        text: String,
        parent_id: Option<CommentId>,
    ) -> Result<CommentView, ResourceError>;

    #[doc = "Edit a comment (author or admin)"]
    #[method(name = "edit_comment")]
    async fn edit_comment(
        &self,
        actor: Option<Actor>,
        comment_id: CommentId,
        text: String,
    ) -> Result<CommentView, ResourceError>;

    #[doc = "Soft delete a comment (author or admin)"]
    #[method(name = "soft_delete_comment")]
    async fn soft_delete_comment(
        &self,
        actor: Option<Actor>,
        comment_id: CommentId,
    ) -> Result<DeleteOutcome, ResourceError>;

    #[doc = "Get a single comment"]
    #[method(name = "get_comment")]
    async fn get_comment(&self, comment_id: CommentId) -> Result<CommentView, ResourceError>;

    #[doc = "Page through root comments of a post"]
    #[method(name = "list_roots")]
    async fn list_roots(
        &self,
        post_id: PostId,
        request: PageRequest,
    ) -> Result<Page<CommentView>, ResourceError>;

    #[doc = "Page through direct replies of a comment"]
    #[method(name = "list_replies")]
    async fn list_replies(
        &self,
        parent_id: CommentId,
        request: PageRequest,
    ) -> Result<Page<CommentView>, ResourceError>;

    #[doc = "Full comment tree of a post, newest first"]
    #[method(name = "get_tree")]
    async fn get_tree(&self, post_id: PostId) -> Result<CommentForest, ResourceError>;

    #[doc = "One thread of a post, in creation order"]
    #[method(name = "get_thread")]
    async fn get_thread(
        &self,
        post_id: PostId,
        root_id: CommentId,
    ) -> Result<CommentForest, ResourceError>;

    #[doc = "Comment trees for several posts"]
    #[method(name = "get_trees_for_posts")]
    async fn get_trees_for_posts(
        &self,
        post_ids: Vec<PostId>,
    ) -> Result<BTreeMap<PostId, CommentForest>, ResourceError>;

    #[doc = "Remove all comments of a post"]
    #[method(name = "delete_comments_for_post")]
    async fn delete_comments_for_post(&self, post_id: PostId) -> Result<u64, ResourceError>;
}

#[async_trait]
impl CommentsServer for CommentsService {
    async fn create_comment(
        &self,
        _ctx: RequestContext,
        actor: Option<Actor>,
        post_id: PostId,
        text: String,
        parent_id: Option<CommentId>,
    ) -> Result<CommentView, ResourceError> {
        Ok(self._create_comment(actor, post_id, text, parent_id).await?)
    }

    async fn edit_comment(
        &self,
        _ctx: RequestContext,
        actor: Option<Actor>,
        comment_id: CommentId,
        text: String,
    ) -> Result<CommentView, ResourceError> {
        Ok(self._edit_comment(actor, comment_id, text).await?)
    }

    async fn soft_delete_comment(
        &self,
        _ctx: RequestContext,
        actor: Option<Actor>,
        comment_id: CommentId,
    ) -> Result<DeleteOutcome, ResourceError> {
        Ok(self._soft_delete_comment(actor, comment_id).await?)
    }

    async fn get_comment(
        &self,
        _ctx: RequestContext,
        comment_id: CommentId,
    ) -> Result<CommentView, ResourceError> {
        Ok(self._get_comment(comment_id).await?)
    }

    async fn list_roots(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
        request: PageRequest,
    ) -> Result<Page<CommentView>, ResourceError> {
        Ok(self._list_roots(post_id, request).await?)
    }

    async fn list_replies(
        &self,
        _ctx: RequestContext,
        parent_id: CommentId,
        request: PageRequest,
    ) -> Result<Page<CommentView>, ResourceError> {
        Ok(self._list_replies(parent_id, request).await?)
    }

    async fn get_tree(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
    ) -> Result<CommentForest, ResourceError> {
        Ok(self._get_tree(post_id).await?)
    }

    async fn get_thread(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
        root_id: CommentId,
    ) -> Result<CommentForest, ResourceError> {
        Ok(self._get_thread(post_id, root_id).await?)
    }

    async fn get_trees_for_posts(
        &self,
        _ctx: RequestContext,
        post_ids: Vec<PostId>,
    ) -> Result<BTreeMap<PostId, CommentForest>, ResourceError> {
        Ok(self._get_trees_for_posts(post_ids).await?)
    }

    async fn delete_comments_for_post(
        &self,
        _ctx: RequestContext,
        post_id: PostId,
    ) -> Result<u64, ResourceError> {
        Ok(self._delete_comments_for_post(post_id).await?)
    }
}
