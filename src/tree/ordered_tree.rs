//! The value-semantic ordered set handle.
//!
//! # Overview
//!
//! [`OrderedTree`] owns one reference-counted root node. Copies share the
//! root; the first mutation of a copy forks the nodes it touches:
//!
//! - O(1) clone
//! - O(log N) insert, amortized copy cost bounded by the path length
//! - O(log N) contains / find / `index_of`
//! - O(1) len and `is_empty`
//!
//! Every insertion that changes the tree bumps its generation, invalidating
//! all [`TreeIndex`] values issued before.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{ControlFlow, Index};

use smallvec::SmallVec;

use super::index::END_INDEX_ACCESS_PANIC_MESSAGE;
use super::node::{InsertResult, Node, Splinter};
use super::{DEFAULT_ORDER, Indices, Iter, MIN_ORDER, ReferenceCounter, TreeIndex};
use crate::tracing_helpers::{debug_log, trace_log};

/// A sorted, duplicate-free set backed by a copy-on-write B-tree.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `clone`        | O(1)              |
/// | `insert`       | O(log N)          |
/// | `contains`     | O(log N)          |
/// | `index_of`     | O(log N)          |
/// | `index_after`  | O(log N)          |
/// | `len`          | O(1)              |
/// | `iter`         | O(1) to create, O(N) to iterate |
///
/// # Examples
///
/// ```rust
/// use cow_btree::OrderedTree;
///
/// let mut tree = OrderedTree::new();
/// assert_eq!(tree.insert(2), (true, 2));
/// assert_eq!(tree.insert(1), (true, 1));
/// assert_eq!(tree.insert(2), (false, 2)); // Already present
///
/// assert!(tree.contains(&1));
/// assert_eq!(tree.iter().collect::<Vec<_>>(), vec![&1, &2]);
/// ```
#[derive(Clone)]
pub struct OrderedTree<T> {
    /// Root node, possibly shared with other trees.
    root: ReferenceCounter<Node<T>>,
    /// Number of elements.
    length: usize,
    /// Incremented on every structural change.
    generation: u64,
}

impl<T> OrderedTree<T> {
    /// Creates an empty tree with [`DEFAULT_ORDER`](super::DEFAULT_ORDER).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<String> = OrderedTree::new();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.order(), 1023);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_order(DEFAULT_ORDER)
    }

    /// Creates an empty tree whose nodes have at most `order` children.
    ///
    /// The order is fixed for the lifetime of the tree.
    ///
    /// # Panics
    ///
    /// Panics if `order` is smaller than [`MIN_ORDER`](super::MIN_ORDER).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<i32> = OrderedTree::with_order(3);
    /// assert_eq!(tree.order(), 3);
    /// ```
    #[must_use]
    pub fn with_order(order: usize) -> Self {
        assert!(
            order >= MIN_ORDER,
            "OrderedTree order must be at least {MIN_ORDER}, got {order}"
        );
        Self {
            root: ReferenceCounter::new(Node::new(order)),
            length: 0,
            generation: 0,
        }
    }

    /// Returns the maximum number of children per node.
    #[inline]
    #[must_use]
    pub fn order(&self) -> usize {
        self.root.order()
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the tree holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of node levels; a tree with a single leaf root has
    /// height 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let mut tree = OrderedTree::with_order(3);
    /// tree.extend([1, 2]);
    /// assert_eq!(tree.height(), 1);
    /// tree.insert(3);
    /// assert_eq!(tree.height(), 2);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node: &Node<T> = &self.root;
        while !node.is_leaf() {
            node = node.child(0);
            height += 1;
        }
        height
    }

    /// Returns the mutation generation. It increases with every insertion
    /// that changes the tree.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if both trees share the same root node, i.e. one is an
    /// unmodified copy of the other.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<i32> = (0..10).collect();
    /// let copy = tree.clone();
    /// assert!(tree.ptr_eq(&copy));
    ///
    /// let rebuilt: OrderedTree<i32> = (0..10).collect();
    /// assert!(!tree.ptr_eq(&rebuilt));
    /// assert_eq!(tree, rebuilt);
    /// ```
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.root, &other.root)
    }

    /// Returns the smallest element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.root.first()
    }

    /// Returns the largest element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.root.last()
    }

    /// Returns an iterator over the elements in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<i32> = [3, 1, 2].into_iter().collect();
    /// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.root, self.length)
    }

    /// Visits every element in ascending order.
    ///
    /// Returning `ControlFlow::Break` from `visit` stops the traversal; the
    /// break value is returned to the caller.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    /// use std::ops::ControlFlow;
    ///
    /// let tree: OrderedTree<i32> = (1..=100).collect();
    /// let mut sum = 0;
    /// let flow = tree.for_each(|element| {
    ///     if sum > 20 {
    ///         return ControlFlow::Break(*element);
    ///     }
    ///     sum += element;
    ///     ControlFlow::Continue(())
    /// });
    /// assert_eq!(flow, ControlFlow::Break(7));
    /// assert_eq!(sum, 21);
    /// ```
    pub fn for_each<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.root.for_each(&mut visit)
    }

    // =========================================================================
    // Cursors
    // =========================================================================

    /// Returns the index of the smallest element, or `end_index` when empty.
    #[must_use]
    pub fn start_index(&self) -> TreeIndex<T> {
        TreeIndex::start(&self.root, self.generation)
    }

    /// Returns the past-the-end index.
    #[must_use]
    pub fn end_index(&self) -> TreeIndex<T> {
        TreeIndex::end(&self.root, self.generation)
    }

    /// Returns the index following `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `end_index`, is stale, or was issued by another tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<i32> = [1, 2].into_iter().collect();
    /// let second = tree.index_after(&tree.start_index());
    /// assert_eq!(tree.index_after(&second), tree.end_index());
    /// ```
    #[must_use]
    pub fn index_after(&self, index: &TreeIndex<T>) -> TreeIndex<T> {
        let mut next = index.clone();
        self.form_index_after(&mut next);
        next
    }

    /// Advances `index` in place to the following position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `end_index`, is stale, or was issued by another tree.
    pub fn form_index_after(&self, index: &mut TreeIndex<T>) {
        index.assert_issued_by(&self.root, self.generation);
        index.advance(&self.root);
    }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `end_index`, is stale, or was issued by another tree.
    #[must_use]
    pub fn get(&self, index: &TreeIndex<T>) -> &T {
        index.assert_issued_by(&self.root, self.generation);
        match index.element(&self.root) {
            Some(element) => element,
            None => panic!("{END_INDEX_ACCESS_PANIC_MESSAGE}"),
        }
    }

    /// Returns an iterator over every valid index in ascending order.
    #[must_use]
    pub fn indices(&self) -> Indices<'_, T> {
        Indices::new(self, self.start_index(), self.length)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn root(&self) -> &Node<T> {
        &self.root
    }
}

impl<T: Ord> OrderedTree<T> {
    /// Returns `true` if the tree contains an element equal to `element`.
    ///
    /// The element may be any borrowed form of the stored type, but the
    /// ordering on the borrowed form must match the ordering on the stored type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<String> = ["apple".to_string()].into_iter().collect();
    /// assert!(tree.contains("apple"));
    /// assert!(!tree.contains("pear"));
    /// ```
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.contains(element)
    }

    /// Returns the stored element equal to `element`.
    #[must_use]
    pub fn find<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.find(element)
    }

    /// Returns the index of the stored element equal to `element`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<i32> = (0..50).collect();
    /// let index = tree.index_of(&42).unwrap();
    /// assert_eq!(tree[&index], 42);
    /// assert_eq!(tree.index_of(&99), None);
    /// ```
    #[must_use]
    pub fn index_of<Q>(&self, element: &Q) -> Option<TreeIndex<T>>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut path = SmallVec::new();
        let mut node: &Node<T> = &self.root;
        loop {
            match node.slot_of(element) {
                Ok(slot) => {
                    return Some(TreeIndex::from_parts(
                        &self.root,
                        self.generation,
                        path,
                        slot,
                    ));
                }
                Err(_) if node.is_leaf() => return None,
                Err(slot) => {
                    path.push(slot);
                    node = node.child(slot);
                }
            }
        }
    }
}

impl<T: Clone + Ord> OrderedTree<T> {
    /// Inserts `element` unless an equal element is already stored.
    ///
    /// Returns `(true, element)` when the element was added, or
    /// `(false, existing)` with a copy of the equal element already in the
    /// tree, which is then left untouched.
    ///
    /// Nodes shared with other trees are forked along the insertion path
    /// before they are modified; those other trees are unaffected.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let mut tree = OrderedTree::new();
    /// tree.insert(1);
    /// let snapshot = tree.clone();
    ///
    /// assert_eq!(tree.insert(2), (true, 2));
    /// assert_eq!(tree.insert(1), (false, 1));
    /// assert_eq!(tree.len(), 2);
    /// assert_eq!(snapshot.len(), 1); // Copy unchanged
    /// ```
    pub fn insert(&mut self, element: T) -> (bool, T) {
        // Forking a root that is shared or observed by cursors would give it
        // a new identity, which a no-op insertion must not do.
        if !self.root_is_exclusive()
            && let Some(existing) = self.root.find(&element)
        {
            return (false, existing.clone());
        }

        let member = element.clone();
        match self.make_unique().insert(element) {
            InsertResult::Present(existing) => (false, existing),
            InsertResult::Inserted(splinter) => {
                if let Some(splinter) = splinter {
                    self.grow(splinter);
                }
                self.length += 1;
                self.generation += 1;
                (true, member)
            }
        }
    }

    fn root_is_exclusive(&self) -> bool {
        ReferenceCounter::strong_count(&self.root) == 1
            && ReferenceCounter::weak_count(&self.root) == 0
    }

    /// Gives exclusive access to the root, forking it first if it is shared.
    fn make_unique(&mut self) -> &mut Node<T> {
        if ReferenceCounter::strong_count(&self.root) > 1 {
            trace_log!(generation = self.generation, "forking shared root");
        }
        ReferenceCounter::make_mut(&mut self.root)
    }

    /// Installs a new root above the old one after the old root split.
    fn grow(&mut self, splinter: Splinter<T>) {
        let Splinter { separator, sibling } = splinter;
        let left = ReferenceCounter::clone(&self.root);
        self.root = ReferenceCounter::new(Node::new_root(
            self.order(),
            left,
            separator,
            ReferenceCounter::new(sibling),
        ));
        debug_log!(height = self.height(), "tree grew a new root");
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for OrderedTree<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<&TreeIndex<T>> for OrderedTree<T> {
    type Output = T;

    fn index(&self, index: &TreeIndex<T>) -> &T {
        self.get(index)
    }
}

impl<T: Clone + Ord> FromIterator<T> for OrderedTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Clone + Ord> Extend<T> for OrderedTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl<'a, T> IntoIterator for &'a OrderedTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for OrderedTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<T: Eq> Eq for OrderedTree<T> {}

/// Hashes the length followed by every element in ascending order, so equal
/// sets hash equally regardless of order or insertion history.
impl<T: Hash> Hash for OrderedTree<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedTree<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for OrderedTree<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Tests
// =============================================================================
