//! The one place stored comments become their public shape.
//!
//! Soft-delete metadata (`deleted`, `deleted_at`, `deleted_by`) stops here:
//! the view only carries `is_deleted`.

use serde::{Deserialize, Serialize};

use crate::{
    entity::prelude::{CommentModel, UserModel},
    ids::{CommentId, PostId, UserId},
    models::comments::{CommentRow, DELETED_TEXT},
    threads::ThreadItem,
};

/// Name shown when an author cannot be resolved.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A comment's author, either just the id or joined with their user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorRef {
    Id(UserId),
    Resolved {
        id: UserId,
        name: String,
        avatar_url: Option<String>,
    },
}

impl AuthorRef {
    pub fn from_row(author_id: UserId, user: Option<UserModel>) -> Self {
        match user {
            Some(user) => AuthorRef::Resolved {
                id: user.id,
                name: user.name,
                avatar_url: user.avatar_url,
            },
            None => AuthorRef::Id(author_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar_url: Option<String>,
}

impl From<AuthorRef> for AuthorView {
    fn from(author: AuthorRef) -> Self {
        match author {
            AuthorRef::Resolved {
                id,
                name,
                avatar_url,
            } => {
                let name = name.trim();
                AuthorView {
                    id,
                    name: if name.is_empty() {
                        UNKNOWN_AUTHOR.to_string()
                    } else {
                        name.to_string()
                    },
                    avatar_url: avatar_url.filter(|url| !url.trim().is_empty()),
                }
            }
            AuthorRef::Id(id) => AuthorView {
                id,
                name: UNKNOWN_AUTHOR.to_string(),
                avatar_url: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: AuthorView,
    pub text: String,
    pub parent_id: Option<CommentId>,
    pub root_id: Option<CommentId>,
    pub depth: u32,
    pub created_at: String,
    pub is_edited: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub edited_at: Option<String>,
    pub is_deleted: bool,
}

/// Converts a stored comment into its public view.
pub fn to_view(comment: CommentModel, author: AuthorRef) -> CommentView {
    // Writes already store the placeholder; this covers any path that didn't.
    let text = if comment.deleted {
        DELETED_TEXT.to_string()
    } else {
        comment.text
    };

    CommentView {
        id: comment.id,
        post_id: comment.post_id,
        author: author.into(),
        text,
        parent_id: comment.parent_id,
        root_id: comment.root_id,
        depth: u32::try_from(comment.depth).unwrap_or_default(),
        created_at: comment.created_at,
        is_edited: comment.is_edited,
        edited_at: comment.edited_at,
        is_deleted: comment.deleted,
    }
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        let author = AuthorRef::from_row(row.comment.author_id, row.author);
        to_view(row.comment, author)
    }
}

impl ThreadItem for CommentView {
    type Id = CommentId;

    fn id(&self) -> CommentId {
        self.id
    }

    fn parent_id(&self) -> Option<CommentId> {
        self.parent_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }
}

/// Result of a soft delete. `already_deleted` is set when another caller got
/// there first; the comment is then returned as they left it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub comment: CommentView,
    pub already_deleted: bool,
}
