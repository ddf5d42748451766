use sea_orm::ConnectionTrait;

use crate::{
    error::CommentsError,
    ids::{CommentId, PostId},
    models::comments::{CommentStore, ParentMeta},
};

/// Where a new comment sits in its thread. Fixed at creation, never
/// recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadMeta {
    pub parent_id: Option<CommentId>,
    pub root_id: Option<CommentId>,
    pub depth: u32,
}

impl ThreadMeta {
    pub const ROOT: ThreadMeta = ThreadMeta {
        parent_id: None,
        root_id: None,
        depth: 0,
    };

    /// Metadata for a reply to `parent` on `post_id`.
    pub fn reply_to(post_id: PostId, parent: &ParentMeta) -> Result<Self, CommentsError> {
        if parent.post_id != post_id {
            return Err(CommentsError::CrossPost);
        }
        if parent.deleted {
            return Err(CommentsError::DeletedTarget);
        }

        let parent_depth = u32::try_from(parent.depth).unwrap_or_default();

        Ok(ThreadMeta {
            parent_id: Some(parent.id),
            root_id: Some(parent.root_id.unwrap_or(parent.id)),
            depth: parent_depth.saturating_add(1),
        })
    }
}

/// Resolves thread metadata for a comment about to be created. Read-only.
pub async fn resolve<C>(
    conn: &C,
    post_id: PostId,
    parent_id: Option<CommentId>,
) -> Result<ThreadMeta, CommentsError>
where
    C: ConnectionTrait,
{
    let Some(parent_id) = parent_id else {
        return Ok(ThreadMeta::ROOT);
    };

    let parent = CommentStore::new(conn)
        .find_parent_meta(parent_id)
        .await?
        .ok_or(CommentsError::NotFound("parent comment"))?;

    ThreadMeta::reply_to(post_id, &parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at_second, seed_comment_at, seed_post, seed_user, setup_test_db};

    fn parent(post_id: PostId, root_id: Option<CommentId>, depth: i32) -> ParentMeta {
        ParentMeta {
            id: CommentId::new(),
            post_id,
            root_id,
            depth,
            deleted: false,
        }
    }

    #[test]
    fn test_reply_to_root_uses_parent_as_root() {
        let post = PostId::new();
        let root = parent(post, None, 0);

        let meta = ThreadMeta::reply_to(post, &root).unwrap();
        assert_eq!(meta.parent_id, Some(root.id));
        assert_eq!(meta.root_id, Some(root.id));
        assert_eq!(meta.depth, 1);
    }

    #[test]
    fn test_reply_to_reply_inherits_root() {
        let post = PostId::new();
        let root_id = CommentId::new();
        let reply = parent(post, Some(root_id), 3);

        let meta = ThreadMeta::reply_to(post, &reply).unwrap();
        assert_eq!(meta.parent_id, Some(reply.id));
        assert_eq!(meta.root_id, Some(root_id));
        assert_eq!(meta.depth, 4);
    }

    #[test]
    fn test_reply_to_other_post_is_cross_post() {
        let meta = ThreadMeta::reply_to(PostId::new(), &parent(PostId::new(), None, 0));
        assert!(matches!(meta, Err(CommentsError::CrossPost)));
    }

    #[test]
    fn test_reply_to_deleted_is_rejected() {
        let post = PostId::new();
        let mut target = parent(post, None, 0);
        target.deleted = true;

        let meta = ThreadMeta::reply_to(post, &target);
        assert!(matches!(meta, Err(CommentsError::DeletedTarget)));
    }

    #[tokio::test]
    async fn test_resolve_against_store() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "Ada").await;
        let post = seed_post(&db, user).await;
        let root = seed_comment_at(&db, post, user, None, at_second(1)).await;
        let reply = seed_comment_at(&db, post, user, Some(&root), at_second(2)).await;

        assert_eq!(resolve(&db, post, None).await.unwrap(), ThreadMeta::ROOT);

        let nested = resolve(&db, post, Some(reply.id)).await.unwrap();
        assert_eq!(nested.root_id, Some(root.id));
        assert_eq!(nested.depth, 2);

        let missing = resolve(&db, post, Some(CommentId::new())).await;
        assert!(matches!(missing, Err(CommentsError::NotFound("parent comment"))));
    }
}
