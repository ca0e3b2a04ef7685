//! Iterators over an [`OrderedTree`].

use std::iter::FusedIterator;

use smallvec::SmallVec;

use super::node::Node;
use super::{INLINE_DEPTH, OrderedTree, TreeIndex};

// =============================================================================
// Element Iterator
// =============================================================================

/// A stack entry for in-order traversal.
struct TraversalStackEntry<'a, T> {
    node: &'a Node<T>,
    /// Next element slot to yield from `node`.
    slot: usize,
}

/// An iterator over the elements of an [`OrderedTree`] in ascending order.
///
/// Created by [`OrderedTree::iter`].
pub struct Iter<'a, T> {
    /// Path from the root to the node currently being yielded from.
    stack: SmallVec<[TraversalStackEntry<'a, T>; INLINE_DEPTH]>,
    /// Number of elements not yet returned (for `ExactSizeIterator`).
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(root: &'a Node<T>, length: usize) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            remaining: length,
        };
        iterator.descend_to_first_leaf(root);
        iterator
    }

    /// Pushes `node` and its leftmost descendants onto the stack.
    fn descend_to_first_leaf(&mut self, mut node: &'a Node<T>) {
        loop {
            self.stack.push(TraversalStackEntry { node, slot: 0 });
            if node.is_leaf() {
                return;
            }
            node = node.child(0);
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.stack.last_mut()?;
            let node = entry.node;
            let slot = entry.slot;

            if slot < node.len() {
                entry.slot += 1;
                if !node.is_leaf() {
                    // Everything in the right-hand child comes next.
                    self.descend_to_first_leaf(node.child(slot + 1));
                }
                self.remaining -= 1;
                return Some(&node.elements()[slot]);
            }

            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

// =============================================================================
// Index Iterator
// =============================================================================

/// An iterator over every valid [`TreeIndex`] of an [`OrderedTree`], from
/// `start_index` up to but excluding `end_index`.
///
/// Created by [`OrderedTree::indices`].
pub struct Indices<'a, T> {
    tree: &'a OrderedTree<T>,
    next: TreeIndex<T>,
    remaining: usize,
}

impl<'a, T> Indices<'a, T> {
    pub(crate) fn new(tree: &'a OrderedTree<T>, start: TreeIndex<T>, length: usize) -> Self {
        Self {
            tree,
            next: start,
            remaining: length,
        }
    }
}

impl<T> Iterator for Indices<'_, T> {
    type Item = TreeIndex<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next.clone();
        self.tree.form_index_after(&mut self.next);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Indices<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Indices<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_iter_empty_tree() {
        let tree: OrderedTree<i32> = OrderedTree::with_order(3);
        let mut iterator = tree.iter();
        assert_eq!(iterator.len(), 0);
        assert_eq!(iterator.next(), None);
        assert_eq!(iterator.next(), None);
    }

    #[rstest]
    #[case(3)]
    #[case(4)]
    #[case(5)]
    #[case(64)]
    fn test_iter_yields_sorted_elements(#[case] order: usize) {
        let mut tree = OrderedTree::with_order(order);
        for element in (0..200).rev().step_by(3) {
            tree.insert(element);
        }
        let expected: Vec<i32> = (0..200).rev().step_by(3).rev().collect();
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), expected);
    }

    #[rstest]
    fn test_iter_exact_size_counts_down() {
        let tree: OrderedTree<i32> = {
            let mut tree = OrderedTree::with_order(3);
            tree.extend(0..10);
            tree
        };
        let mut iterator = tree.iter();
        assert_eq!(iterator.len(), 10);
        iterator.next();
        iterator.next();
        assert_eq!(iterator.size_hint(), (8, Some(8)));
    }

    #[rstest]
    fn test_indices_match_iter() {
        let mut tree = OrderedTree::with_order(4);
        tree.extend([9, 3, 7, 1, 5, 11, 13, 2]);
        let via_indices: Vec<i32> = tree.indices().map(|index| tree[&index]).collect();
        let via_iter: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(via_indices, via_iter);
        assert_eq!(tree.indices().len(), tree.len());
    }
}
