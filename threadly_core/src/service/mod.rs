pub mod authz;
pub mod comments;
