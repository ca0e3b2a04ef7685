//! B-tree node: sorted element buffer plus shared child references.
//!
//! A node holds at most `order - 1` elements at rest. Insertion may push a
//! node to `order` elements for the instant before it is split, so element
//! buffers are reserved one slot larger than the resting maximum.

use std::borrow::Borrow;
use std::ops::ControlFlow;

use super::ReferenceCounter;
use crate::tracing_helpers::trace_log;

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the B-tree.
///
/// `children` is empty for a leaf and holds exactly `elements.len() + 1`
/// references for an internal node.
pub(crate) struct Node<T> {
    /// Maximum number of children; fixed for the lifetime of the tree.
    order: usize,
    /// Sorted, duplicate-free elements.
    elements: Vec<T>,
    /// Child subtrees, possibly shared with other trees.
    children: Vec<ReferenceCounter<Self>>,
}

/// The separator and new right sibling produced when a node splits.
pub(crate) struct Splinter<T> {
    pub(crate) separator: T,
    pub(crate) sibling: Node<T>,
}

/// Outcome of [`Node::insert`].
pub(crate) enum InsertResult<T> {
    /// An equal element was already stored; carries a copy of it.
    Present(T),
    /// The element was added. A splinter is returned when this node overflowed.
    Inserted(Option<Splinter<T>>),
}

impl<T> Node<T> {
    /// Creates an empty leaf. No buffer is allocated until the first insert.
    pub(crate) const fn new(order: usize) -> Self {
        Self {
            order,
            elements: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an empty node with buffers reserved to the node capacity.
    fn with_capacity(order: usize, internal: bool) -> Self {
        Self {
            order,
            elements: Vec::with_capacity(order),
            children: if internal {
                Vec::with_capacity(order + 1)
            } else {
                Vec::new()
            },
        }
    }

    /// Creates the new root installed when the old root splits.
    pub(crate) fn new_root(
        order: usize,
        left: ReferenceCounter<Self>,
        separator: T,
        right: ReferenceCounter<Self>,
    ) -> Self {
        let mut root = Self::with_capacity(order, true);
        root.elements.push(separator);
        root.children.push(left);
        root.children.push(right);
        root
    }

    #[inline]
    pub(crate) const fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub(crate) const fn max_elements(&self) -> usize {
        self.order - 1
    }

    /// Fewest elements a non-root node may hold.
    ///
    /// Equals `ceil((order + 1) / 2) - 1` for odd orders. For even orders the
    /// median split leaves the right sibling with `(order - 1) / 2` elements,
    /// which is the bound that can actually be maintained.
    #[inline]
    pub(crate) const fn min_elements(&self) -> usize {
        (self.order - 1) / 2
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub(crate) fn elements(&self) -> &[T] {
        &self.elements
    }

    #[inline]
    pub(crate) fn children(&self) -> &[ReferenceCounter<Self>] {
        &self.children
    }

    #[inline]
    pub(crate) fn child(&self, slot: usize) -> &Self {
        &self.children[slot]
    }

    #[inline]
    fn is_overflowing(&self) -> bool {
        self.len() > self.max_elements()
    }

    /// Returns the smallest element of this subtree.
    pub(crate) fn first(&self) -> Option<&T> {
        let mut node = self;
        while let Some(child) = node.children.first() {
            node = child;
        }
        node.elements.first()
    }

    /// Returns the largest element of this subtree.
    pub(crate) fn last(&self) -> Option<&T> {
        let mut node = self;
        while let Some(child) = node.children.last() {
            node = child;
        }
        node.elements.last()
    }

    /// Visits every element of this subtree in order.
    ///
    /// For an internal node the visiting order is `children[0]`, `elements[0]`,
    /// `children[1]`, ..., `children[len]`. The first `Break` returned by
    /// `visit` stops the traversal and is handed back to the caller.
    pub(crate) fn for_each<B, F>(&self, visit: &mut F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        if self.is_leaf() {
            return self.elements.iter().try_for_each(visit);
        }

        for (child, element) in self.children.iter().zip(&self.elements) {
            child.for_each(visit)?;
            visit(element)?;
        }
        match self.children.last() {
            Some(child) => child.for_each(visit),
            None => ControlFlow::Continue(()),
        }
    }
}

// =============================================================================
// Search
// =============================================================================

impl<T: Ord> Node<T> {
    /// Binary-searches the element buffer.
    ///
    /// Returns `Ok(slot)` on an exact match, or `Err(slot)` with the index of
    /// the first greater element. For internal nodes `Err(slot)` is also the
    /// child to descend into.
    #[inline]
    pub(crate) fn slot_of<Q>(&self, element: &Q) -> Result<usize, usize>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.elements
            .binary_search_by(|stored| stored.borrow().cmp(element))
    }

    /// Returns the stored element equal to `element`, searching this subtree.
    pub(crate) fn find<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self;
        loop {
            match node.slot_of(element) {
                Ok(slot) => return Some(&node.elements[slot]),
                Err(_) if node.is_leaf() => return None,
                Err(slot) => node = &node.children[slot],
            }
        }
    }

    #[inline]
    pub(crate) fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(element).is_some()
    }
}

// =============================================================================
// Copy-on-Write and Insertion
// =============================================================================

impl<T: Clone> Clone for Node<T> {
    /// Shallow copy: elements are cloned, children are shared one level down.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.order, !self.is_leaf());
        copy.elements.extend_from_slice(&self.elements);
        copy.children.extend(self.children.iter().cloned());
        copy
    }
}

impl<T: Clone + Ord> Node<T> {
    /// Gives exclusive access to one child, forking it first if it is shared.
    #[inline]
    fn make_child_unique(&mut self, slot: usize) -> &mut Self {
        ReferenceCounter::make_mut(&mut self.children[slot])
    }

    /// Inserts `element` into this subtree.
    ///
    /// `self` must already be exclusively owned by the caller. Children on
    /// the descent path are forked as needed.
    pub(crate) fn insert(&mut self, element: T) -> InsertResult<T> {
        let slot = match self.slot_of(&element) {
            Ok(slot) => return InsertResult::Present(self.elements[slot].clone()),
            Err(slot) => slot,
        };

        if self.is_leaf() {
            self.elements.insert(slot, element);
        } else {
            match self.make_child_unique(slot).insert(element) {
                InsertResult::Inserted(Some(Splinter { separator, sibling })) => {
                    self.elements.insert(slot, separator);
                    self.children
                        .insert(slot + 1, ReferenceCounter::new(sibling));
                }
                absorbed => return absorbed,
            }
        }

        InsertResult::Inserted(self.is_overflowing().then(|| self.split()))
    }

    /// Splits an overflowing node around its median element.
    ///
    /// `self` keeps the elements before the median (and, for internal nodes,
    /// the children up to and including the median slot). The elements
    /// after the median and the remaining children move to the new sibling.
    fn split(&mut self) -> Splinter<T> {
        let median = self.len() / 2;
        let mut sibling = Self::with_capacity(self.order, !self.is_leaf());

        sibling.elements.extend(self.elements.drain(median + 1..));
        if !self.is_leaf() {
            sibling.children.extend(self.children.drain(median + 1..));
        }
        let separator = self.elements.remove(median);

        trace_log!(
            left = self.len(),
            right = sibling.len(),
            leaf = sibling.is_leaf(),
            "node split"
        );

        Splinter { separator, sibling }
    }
}

// =============================================================================
// Tests
// =============================================================================
