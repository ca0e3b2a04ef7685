//! # cow-btree
//!
//! An in-memory ordered set built on a balanced, copy-on-write B-tree.
//!
//! ## Overview
//!
//! [`OrderedTree`] is a sorted, duplicate-free collection supporting:
//!
//! - **O(log n) membership and insertion**: binary search inside each node
//! - **O(1) copies**: cloning a tree only bumps the root's reference count
//! - **Copy-on-write mutation**: only nodes on the insertion path are duplicated
//! - **Stable cursors**: [`TreeIndex`] positions that can be compared and stepped
//!   forward, and that detect use after the tree has been mutated
//!
//! ## Feature Flags
//!
//! - `arc`: Share nodes through `std::sync::Arc` instead of `std::rc::Rc`,
//!   making trees `Send + Sync`
//! - `tracing`: Emit split and root-growth events through the `tracing` crate
//!
//! ## Example
//!
//! ```rust
//! use cow_btree::prelude::*;
//!
//! let mut tree = OrderedTree::with_order(3);
//! for element in [5, 1, 4, 2, 3] {
//!     tree.insert(element);
//! }
//!
//! let snapshot = tree.clone();
//! tree.insert(6);
//!
//! assert_eq!(snapshot.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
//! assert_eq!(tree.len(), 6);
//! tree.validate();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod tracing_helpers;

pub mod tree;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use cow_btree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::tree::*;
}

pub use tree::{InvariantViolation, OrderedTree, TreeIndex};
