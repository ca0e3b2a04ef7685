//! Property-based tests for OrderedTree.
//!
//! These tests verify that OrderedTree keeps its structural invariants and
//! set semantics for arbitrary insertion sequences, using proptest.

use cow_btree::OrderedTree;
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

/// Small orders exercise splits and root growth heavily; larger ones keep
/// most elements in a single level.
fn arbitrary_order() -> impl Strategy<Value = usize> {
    prop_oneof![3usize..=8, Just(16usize), Just(1023usize)]
}

fn arbitrary_elements(max_size: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-500i32..500, 0..max_size)
}

fn build(order: usize, elements: &[i32]) -> OrderedTree<i32> {
    let mut tree = OrderedTree::with_order(order);
    tree.extend(elements.iter().copied());
    tree
}

// =============================================================================
// Structural Invariant Laws
// =============================================================================

proptest! {
    /// Law: every insertion preserves balance, ordering and leaf depth.
    #[test]
    fn prop_validate_after_every_insert(
        order in arbitrary_order(),
        elements in arbitrary_elements(300)
    ) {
        let mut tree = OrderedTree::with_order(order);
        for element in elements {
            tree.insert(element);
            prop_assert_eq!(tree.check(), Ok(()));
        }
    }

    /// Law: inserting into a copy keeps both trees valid.
    #[test]
    fn prop_validate_after_copy_and_insert(
        order in 3usize..=6,
        elements in arbitrary_elements(150),
        extra in arbitrary_elements(50)
    ) {
        let original = build(order, &elements);
        let mut copy = original.clone();
        copy.extend(extra);
        prop_assert_eq!(original.check(), Ok(()));
        prop_assert_eq!(copy.check(), Ok(()));
    }
}

// =============================================================================
// Set Semantics Laws
// =============================================================================

proptest! {
    /// Law: in-order traversal yields the sorted set of distinct inserted elements.
    #[test]
    fn prop_iteration_is_sorted_distinct(
        order in arbitrary_order(),
        elements in arbitrary_elements(300)
    ) {
        let tree = build(order, &elements);
        let expected: Vec<i32> = elements.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        prop_assert_eq!(tree.iter().copied().collect::<Vec<_>>(), expected.clone());
        prop_assert_eq!(tree.len(), expected.len());

        let mut visited = Vec::new();
        let _ = tree.for_each(|element| {
            visited.push(*element);
            std::ops::ControlFlow::<()>::Continue(())
        });
        prop_assert_eq!(visited, expected);
    }

    /// Law: contains(x) holds exactly for inserted elements.
    #[test]
    fn prop_contains_iff_inserted(
        order in arbitrary_order(),
        elements in arbitrary_elements(200),
        probe in -600i32..600
    ) {
        let tree = build(order, &elements);
        prop_assert_eq!(tree.contains(&probe), elements.contains(&probe));
    }

    /// Law: re-inserting an element is a no-op reporting the stored element.
    #[test]
    fn prop_reinsert_is_noop(
        order in arbitrary_order(),
        elements in arbitrary_elements(200).prop_filter("non-empty", |elements| !elements.is_empty()),
        pick in any::<prop::sample::Index>()
    ) {
        let mut tree = build(order, &elements);
        let element = elements[pick.index(elements.len())];
        let before: Vec<i32> = tree.iter().copied().collect();
        let generation = tree.generation();

        prop_assert_eq!(tree.insert(element), (false, element));
        prop_assert_eq!(tree.iter().copied().collect::<Vec<_>>(), before);
        prop_assert_eq!(tree.generation(), generation);
    }

    /// Law: inserting into a copy does not affect the original.
    #[test]
    fn prop_copy_isolation(
        order in arbitrary_order(),
        elements in arbitrary_elements(200),
        extra in arbitrary_elements(50)
    ) {
        let original = build(order, &elements);
        let before: Vec<i32> = original.iter().copied().collect();
        let length = original.len();

        let mut copy = original.clone();
        prop_assert!(copy.ptr_eq(&original));
        copy.extend(extra.iter().copied());

        prop_assert_eq!(original.iter().copied().collect::<Vec<_>>(), before);
        prop_assert_eq!(original.len(), length);
        for element in extra {
            prop_assert!(copy.contains(&element));
        }
    }
}

// =============================================================================
// Cursor Laws
// =============================================================================

proptest! {
    /// Law: a cursor walk from start to end visits the same sequence as iter().
    #[test]
    fn prop_cursor_walk_matches_iter(
        order in arbitrary_order(),
        elements in arbitrary_elements(200)
    ) {
        let tree = build(order, &elements);
        let end = tree.end_index();
        let mut index = tree.start_index();
        let mut walked = Vec::new();
        while index != end {
            walked.push(tree[&index]);
            tree.form_index_after(&mut index);
        }
        prop_assert_eq!(walked, tree.iter().copied().collect::<Vec<_>>());
    }

    /// Law: cursor order agrees with element order, and end is the greatest.
    #[test]
    fn prop_cursor_order_matches_element_order(
        order in 3usize..=6,
        elements in arbitrary_elements(120)
    ) {
        let tree = build(order, &elements);
        let indices: Vec<_> = tree.indices().collect();
        let end = tree.end_index();
        for first in &indices {
            prop_assert!(*first < end);
            for second in &indices {
                prop_assert_eq!(first.cmp(second), tree[first].cmp(&tree[second]));
                prop_assert_eq!(first == second, tree[first] == tree[second]);
            }
        }
    }

    /// Law: index_of locates exactly the stored elements.
    #[test]
    fn prop_index_of_round_trips(
        order in arbitrary_order(),
        elements in arbitrary_elements(200),
        probe in -600i32..600
    ) {
        let tree = build(order, &elements);
        match tree.index_of(&probe) {
            Some(index) => prop_assert_eq!(tree[&index], probe),
            None => prop_assert!(!tree.contains(&probe)),
        }
    }

    /// Law: cursors issued against an original stay valid after its copy mutates.
    #[test]
    fn prop_original_cursors_survive_copy_mutation(
        order in 3usize..=6,
        elements in arbitrary_elements(100).prop_filter("non-empty", |elements| !elements.is_empty()),
        extra in arbitrary_elements(30)
    ) {
        let original = build(order, &elements);
        let indices: Vec<_> = original.indices().collect();
        let mut copy = original.clone();
        copy.extend(extra);

        let through_cursors: Vec<i32> = indices.iter().map(|index| original[index]).collect();
        prop_assert_eq!(through_cursors, original.iter().copied().collect::<Vec<_>>());
    }
}
