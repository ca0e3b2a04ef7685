//! Generation-checked cursors into an [`OrderedTree`](super::OrderedTree).
//!
//! A [`TreeIndex`] records the child slots chosen on the way down from the
//! root plus a slot inside the node it stopped at. It holds no strong node
//! reference: the root is remembered through a weak pointer used only for
//! identity, and the generation stamp detects any later mutation.

use std::cmp::Ordering;
use std::fmt;
use std::iter;

use smallvec::SmallVec;

use super::node::Node;
use super::{INLINE_DEPTH, ReferenceCounter, WeakReference};

pub(crate) const STALE_INDEX_PANIC_MESSAGE: &str =
    "TreeIndex is stale: the tree was mutated after the index was created";

pub(crate) const FOREIGN_INDEX_PANIC_MESSAGE: &str =
    "TreeIndex belongs to a different tree";

pub(crate) const ADVANCE_PAST_END_PANIC_MESSAGE: &str = "Cannot advance TreeIndex beyond end_index";

pub(crate) const END_INDEX_ACCESS_PANIC_MESSAGE: &str = "Cannot access the element at end_index";

/// A position in the sorted sequence of an [`OrderedTree`](super::OrderedTree).
///
/// Indices are obtained from [`start_index`](super::OrderedTree::start_index),
/// [`end_index`](super::OrderedTree::end_index),
/// [`index_of`](super::OrderedTree::index_of), or by stepping an existing
/// index with [`index_after`](super::OrderedTree::index_after).
///
/// An index stays valid until the tree it came from is mutated. Using it
/// afterwards, or with another tree, panics. Comparing two indices panics
/// unless both come from the same tree at the same generation.
///
/// Indices are ordered by the position of the element they designate, with
/// `end_index` greater than every element position.
///
/// # Examples
///
/// ```rust
/// use cow_btree::OrderedTree;
///
/// let tree: OrderedTree<i32> = [30, 10, 20].into_iter().collect();
/// let first = tree.start_index();
/// let second = tree.index_after(&first);
///
/// assert!(first < second);
/// assert_eq!(tree[&first], 10);
/// assert_eq!(tree[&second], 20);
/// assert_eq!(tree.index_of(&20), Some(second));
/// ```
pub struct TreeIndex<T> {
    /// Identity of the root the index was issued against.
    root: WeakReference<Node<T>>,
    /// Tree generation observed at creation.
    generation: u64,
    /// Child slot taken at each ancestor, from the root down.
    path: SmallVec<[usize; INLINE_DEPTH]>,
    /// Element slot within the current node.
    slot: usize,
}

impl<T> TreeIndex<T> {
    /// Index of the smallest element: the first slot of the leftmost leaf.
    pub(crate) fn start(root: &ReferenceCounter<Node<T>>, generation: u64) -> Self {
        let mut path = SmallVec::new();
        let mut node: &Node<T> = root;
        while !node.is_leaf() {
            path.push(0);
            node = node.child(0);
        }
        Self {
            root: ReferenceCounter::downgrade(root),
            generation,
            path,
            slot: 0,
        }
    }

    /// Index one past the largest element: the root with slot `len`.
    pub(crate) fn end(root: &ReferenceCounter<Node<T>>, generation: u64) -> Self {
        Self {
            root: ReferenceCounter::downgrade(root),
            generation,
            path: SmallVec::new(),
            slot: root.len(),
        }
    }

    pub(crate) fn from_parts(
        root: &ReferenceCounter<Node<T>>,
        generation: u64,
        path: SmallVec<[usize; INLINE_DEPTH]>,
        slot: usize,
    ) -> Self {
        Self {
            root: ReferenceCounter::downgrade(root),
            generation,
            path,
            slot,
        }
    }

    /// Panics unless this index was issued by a tree with this root and generation.
    pub(crate) fn assert_issued_by(&self, root: &ReferenceCounter<Node<T>>, generation: u64) {
        assert!(self.generation == generation, "{STALE_INDEX_PANIC_MESSAGE}");
        assert!(
            std::ptr::eq(self.root.as_ptr(), ReferenceCounter::as_ptr(root)),
            "{FOREIGN_INDEX_PANIC_MESSAGE}"
        );
    }

    /// Panics unless both indices come from the same tree generation.
    fn assert_comparable(&self, other: &Self) {
        assert!(
            WeakReference::ptr_eq(&self.root, &other.root),
            "{FOREIGN_INDEX_PANIC_MESSAGE}"
        );
        assert!(self.generation == other.generation, "{STALE_INDEX_PANIC_MESSAGE}");
    }

    /// Follows the recorded path from `root` to the node the index points into.
    pub(crate) fn resolve<'a>(&self, root: &'a Node<T>) -> &'a Node<T> {
        self.path.iter().fold(root, |node, &slot| node.child(slot))
    }

    /// Returns the element at this index, or `None` at `end_index`.
    pub(crate) fn element<'a>(&self, root: &'a Node<T>) -> Option<&'a T> {
        self.resolve(root).elements().get(self.slot)
    }

    /// Moves to the in-order successor.
    ///
    /// `root` must be the root this index was issued against.
    pub(crate) fn advance(&mut self, root: &Node<T>) {
        let mut ancestors: SmallVec<[&Node<T>; INLINE_DEPTH]> = SmallVec::new();
        let mut node = root;
        for &child_slot in &self.path {
            ancestors.push(node);
            node = node.child(child_slot);
        }
        assert!(self.slot < node.len(), "{ADVANCE_PAST_END_PANIC_MESSAGE}");

        if node.is_leaf() {
            self.slot += 1;
            // A child at slot `c` is followed by the parent's element `c`.
            while self.slot == node.len() {
                let (Some(parent), Some(child_slot)) = (ancestors.pop(), self.path.pop()) else {
                    break;
                };
                node = parent;
                self.slot = child_slot;
            }
        } else {
            let mut child_slot = self.slot + 1;
            loop {
                self.path.push(child_slot);
                node = node.child(child_slot);
                if node.is_leaf() {
                    break;
                }
                child_slot = 0;
            }
            self.slot = 0;
        }
    }

    /// Descent choices as in-order ranks: child `c` ranks `2c`, element slot
    /// `s` ranks `2s + 1`, since child `c` precedes element `c` precedes
    /// child `c + 1`.
    fn ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.path
            .iter()
            .map(|&child_slot| 2 * child_slot)
            .chain(iter::once(2 * self.slot + 1))
    }
}

impl<T> Clone for TreeIndex<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            generation: self.generation,
            path: self.path.clone(),
            slot: self.slot,
        }
    }
}

impl<T> PartialEq for TreeIndex<T> {
    /// # Panics
    ///
    /// Panics if the indices come from different trees or generations.
    fn eq(&self, other: &Self) -> bool {
        self.assert_comparable(other);
        self.slot == other.slot && self.path == other.path
    }
}

impl<T> Eq for TreeIndex<T> {}

impl<T> PartialOrd for TreeIndex<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TreeIndex<T> {
    /// # Panics
    ///
    /// Panics if the indices come from different trees or generations.
    fn cmp(&self, other: &Self) -> Ordering {
        self.assert_comparable(other);
        self.ranks().cmp(other.ranks())
    }
}

impl<T> fmt::Debug for TreeIndex<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TreeIndex")
            .field("generation", &self.generation)
            .field("path", &self.path.as_slice())
            .field("slot", &self.slot)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::tests::{branch, leaf};
    use rstest::rstest;

    /// Root `[20, 40]` over leaves `[10]`, `[30]`, `[50, 60]`.
    fn two_level() -> ReferenceCounter<Node<i32>> {
        ReferenceCounter::new(branch(
            3,
            vec![20, 40],
            vec![leaf(3, vec![10]), leaf(3, vec![30]), leaf(3, vec![50, 60])],
        ))
    }

    fn walk(root: &ReferenceCounter<Node<i32>>) -> Vec<TreeIndex<i32>> {
        let end = TreeIndex::end(root, 0);
        let mut index = TreeIndex::start(root, 0);
        let mut indices = Vec::new();
        while index != end {
            indices.push(index.clone());
            index.advance(root);
        }
        indices
    }

    #[rstest]
    fn test_start_descends_leftmost() {
        let root = two_level();
        let start = TreeIndex::start(&root, 0);
        assert_eq!(start.path.as_slice(), &[0]);
        assert_eq!(start.slot, 0);
        assert_eq!(start.element(&root), Some(&10));
    }

    #[rstest]
    fn test_end_has_empty_path() {
        let root = two_level();
        let end = TreeIndex::end(&root, 0);
        assert!(end.path.is_empty());
        assert_eq!(end.slot, 2);
        assert_eq!(end.element(&root), None);
    }

    #[rstest]
    fn test_start_equals_end_for_empty_root() {
        let root = ReferenceCounter::new(Node::<i32>::new(3));
        assert_eq!(TreeIndex::start(&root, 0), TreeIndex::end(&root, 0));
    }

    #[rstest]
    fn test_advance_visits_every_element_in_order() {
        let root = two_level();
        let elements: Vec<i32> = walk(&root)
            .iter()
            .filter_map(|index| index.element(&root).copied())
            .collect();
        assert_eq!(elements, vec![10, 20, 30, 40, 50, 60]);
    }

    #[rstest]
    fn test_advance_from_internal_descends_into_next_child() {
        let root = two_level();
        let mut index = TreeIndex::from_parts(&root, 0, SmallVec::new(), 0);
        index.advance(&root);
        assert_eq!(index.path.as_slice(), &[1]);
        assert_eq!(index.slot, 0);
        assert_eq!(index.element(&root), Some(&30));
    }

    #[rstest]
    fn test_advance_from_last_leaf_reaches_end() {
        let root = two_level();
        let mut index = TreeIndex::from_parts(&root, 0, SmallVec::from_slice(&[2]), 1);
        index.advance(&root);
        assert_eq!(index, TreeIndex::end(&root, 0));
    }

    #[rstest]
    #[should_panic(expected = "Cannot advance TreeIndex beyond end_index")]
    fn test_advance_end_panics() {
        let root = two_level();
        let mut end = TreeIndex::end(&root, 0);
        end.advance(&root);
    }

    #[rstest]
    fn test_ordering_matches_walk_order() {
        let root = two_level();
        let mut indices = walk(&root);
        indices.push(TreeIndex::end(&root, 0));
        for (position, earlier) in indices.iter().enumerate() {
            for later in &indices[position + 1..] {
                assert!(earlier < later, "{earlier:?} should precede {later:?}");
                assert!(later > earlier);
            }
            assert_eq!(earlier.cmp(earlier), Ordering::Equal);
        }
    }

    #[rstest]
    fn test_child_precedes_parent_element_at_same_slot() {
        let root = two_level();
        let in_child = TreeIndex::from_parts(&root, 0, SmallVec::from_slice(&[1]), 0);
        let parent_element = TreeIndex::from_parts(&root, 0, SmallVec::new(), 1);
        assert!(in_child < parent_element);
    }

    #[rstest]
    #[should_panic(expected = "TreeIndex belongs to a different tree")]
    fn test_comparing_foreign_indices_panics() {
        let first = two_level();
        let second = two_level();
        let _ = TreeIndex::start(&first, 0) == TreeIndex::start(&second, 0);
    }

    #[rstest]
    #[should_panic(expected = "TreeIndex is stale")]
    fn test_comparing_across_generations_panics() {
        let root = two_level();
        let _ = TreeIndex::start(&root, 0) < TreeIndex::start(&root, 1);
    }

    #[rstest]
    #[should_panic(expected = "TreeIndex is stale")]
    fn test_assert_issued_by_rejects_old_generation() {
        let root = two_level();
        TreeIndex::start(&root, 3).assert_issued_by(&root, 4);
    }

    #[rstest]
    #[should_panic(expected = "TreeIndex belongs to a different tree")]
    fn test_assert_issued_by_rejects_other_root() {
        let root = two_level();
        let other = two_level();
        TreeIndex::start(&root, 0).assert_issued_by(&other, 0);
    }
}
