use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure a comment operation can surface to its caller.
///
/// Messages are safe to show to end users: none of them carry soft-delete
/// metadata such as who deleted a comment.
#[derive(Debug, Error)]
pub enum CommentsError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: not the comment author or an admin")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("parent comment belongs to a different post")]
    CrossPost,

    #[error("comment has been deleted")]
    DeletedTarget,

    /// The create transaction failed and was rolled back.
    #[error("comment could not be saved, please retry")]
    Conflict(#[source] DbErr),

    #[error("fatal database error")]
    Database(#[from] DbErr),
}

/// Stable status classes the transport layer maps failures onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusClass {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest,
    Conflict,
    Internal,
}

impl StatusClass {
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::Unauthorized => 401,
            StatusClass::Forbidden => 403,
            StatusClass::NotFound => 404,
            StatusClass::BadRequest => 400,
            StatusClass::Conflict => 409,
            StatusClass::Internal => 500,
        }
    }
}

impl CommentsError {
    pub fn status(&self) -> StatusClass {
        match self {
            CommentsError::Unauthorized => StatusClass::Unauthorized,
            CommentsError::Forbidden => StatusClass::Forbidden,
            CommentsError::NotFound(_) => StatusClass::NotFound,
            CommentsError::InvalidArgument(_)
            | CommentsError::CrossPost
            | CommentsError::DeletedTarget => StatusClass::BadRequest,
            CommentsError::Conflict(_) => StatusClass::Conflict,
            CommentsError::Database(_) => StatusClass::Internal,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CommentsError::InvalidArgument(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to find a data directory on this platform")]
    NoDataDir,

    #[error("config io error")]
    Io(#[from] std::io::Error),

    #[error("malformed config file")]
    Json(#[from] serde_json::Error),
}
