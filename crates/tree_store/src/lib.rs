//! Mutable labeled tree owned by one rendering session.
//!
//! The store is an arena of nodes keyed by opaque string id, with an explicit
//! ordered child list per node. Parents are referenced by id and resolved
//! through the arena; no node holds a direct reference to another node.
//!
//! Invariants:
//! - A node's parent is either the implicit root or a currently-live node.
//! - A node appears in its parent's child list iff its parent id names that
//!   parent; child lists never contain duplicates.
//! - Ids are unique among live nodes; installing a node under a live id first
//!   retires the old occupant's entire subtree.
//! - The tree is acyclic: creation only appends under an existing (or root)
//!   parent.

mod error;
mod node;
mod snapshot;
mod store;

pub use crate::error::StoreError;
pub use crate::node::{Attributes, Node, DEFAULT_LABEL};
pub use crate::snapshot::{SnapshotNode, TreeSnapshot};
pub use crate::store::NodeStore;
