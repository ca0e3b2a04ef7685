//! Copy-on-write B-tree ordered set.
//!
//! This module provides [`OrderedTree`], a sorted, duplicate-free collection
//! backed by a balanced B-tree whose nodes are shared between tree values
//! until one of them mutates:
//!
//! - [`OrderedTree`]: the value-semantic set handle
//! - [`TreeIndex`]: a generation-checked cursor into a tree
//! - [`InvariantViolation`]: the structural defects reported by
//!   [`OrderedTree::check`]
//!
//! # Structural Sharing
//!
//! Cloning a tree copies one reference-counted root pointer. Mutating a tree
//! first forks (shallow-clones) every node on the path to the mutation point
//! that is still shared with another tree value, so siblings and unrelated
//! subtrees stay shared between the original and the copy.
//!
//! ```rust
//! use cow_btree::OrderedTree;
//!
//! let original: OrderedTree<i32> = (0..100).collect();
//! let mut copy = original.clone();
//! assert!(copy.ptr_eq(&original)); // No per-element work
//!
//! copy.insert(1000);
//! assert!(!copy.ptr_eq(&original));
//! assert_eq!(original.len(), 100); // Original unchanged
//! assert_eq!(copy.len(), 101);
//! ```
//!
//! # Cursors
//!
//! ```rust
//! use cow_btree::OrderedTree;
//!
//! let tree: OrderedTree<char> = "btree".chars().collect();
//! let mut index = tree.start_index();
//! let mut visited = String::new();
//! while index != tree.end_index() {
//!     visited.push(tree[&index]);
//!     tree.form_index_after(&mut index);
//! }
//! assert_eq!(visited, "bert");
//! ```

// =============================================================================
// Reference Counter Type Aliases
// =============================================================================

/// Reference-counted smart pointer type used for every node.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, whose
/// exclusivity test in `make_mut` is atomic, so trees may be shared across
/// threads.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

/// Non-owning counterpart of [`ReferenceCounter`], held by cursors.
#[cfg(feature = "arc")]
pub(crate) type WeakReference<T> = std::sync::Weak<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type WeakReference<T> = std::rc::Weak<T>;

// =============================================================================
// Constants
// =============================================================================

/// Order (maximum number of children per node) used by [`OrderedTree::new`].
pub const DEFAULT_ORDER: usize = 1023;

/// Smallest order accepted by [`OrderedTree::with_order`].
///
/// With order 2 a split would leave the new sibling without any element.
pub const MIN_ORDER: usize = 3;

/// Tree depth that cursor paths and iterator stacks hold without spilling
/// to the heap. Order-3 trees reach it only past 255 elements.
pub(crate) const INLINE_DEPTH: usize = 8;

mod index;
mod iter;
mod node;
mod ordered_tree;
mod validation;

pub use index::TreeIndex;
pub use iter::{Indices, Iter};
pub use ordered_tree::OrderedTree;
pub use validation::InvariantViolation;

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(OrderedTree<i32>: Send, Sync, Clone);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(OrderedTree<i32>: Send, Sync);

static_assertions::const_assert!(DEFAULT_ORDER >= MIN_ORDER);

// =============================================================================
// Tests
// =============================================================================
