//! Thread shape: who a reply hangs under, how flat rows become trees, and
//! how pages of roots and replies are cut.

pub mod pagination;
pub mod resolver;
pub mod tree;

use std::hash::Hash;

/// Anything that can be placed in a comment thread.
pub trait ThreadItem {
    type Id: Copy + Eq + Hash;

    fn id(&self) -> Self::Id;

    fn parent_id(&self) -> Option<Self::Id>;

    /// Creation time in the fixed-width stored format, so that string order
    /// is time order.
    fn created_at(&self) -> &str;
}
