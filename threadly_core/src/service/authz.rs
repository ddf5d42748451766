use serde::{Deserialize, Serialize};

use crate::{error::CommentsError, ids::UserId};

/// The authenticated caller of an operation, as vouched for by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Self { id, is_admin: true }
    }

    /// Admins may modify anything, everyone else only what they own.
    pub fn can_modify(&self, owner_id: UserId) -> bool {
        self.is_admin || self.id == owner_id
    }
}

/// Turns an optional caller into an authenticated one.
pub fn require_actor(actor: Option<Actor>) -> Result<Actor, CommentsError> {
    actor.ok_or(CommentsError::Unauthorized)
}
