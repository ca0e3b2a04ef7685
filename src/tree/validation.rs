//! Structural invariant checks for [`OrderedTree`].
//!
//! [`OrderedTree::check`] walks the whole tree and reports the first broken
//! invariant; [`OrderedTree::validate`] turns any report into a panic. Both
//! are diagnostics for tests and debugging, not part of normal operation.

use std::fmt;

use super::OrderedTree;
use super::node::Node;

/// A broken structural invariant found by [`OrderedTree::check`].
///
/// `depth` counts levels from the root, which is at depth 0.
///
/// # Examples
///
/// ```rust
/// use cow_btree::InvariantViolation;
///
/// let violation = InvariantViolation::UnevenLeafDepth { expected: 2, found: 3 };
/// assert_eq!(
///     violation.to_string(),
///     "leaves at different depths: expected 2, found 3"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A node holds more than `order - 1` elements.
    Overflow {
        /// Depth of the offending node.
        depth: usize,
        /// Number of elements in the node.
        length: usize,
        /// Maximum allowed.
        max_elements: usize,
    },
    /// A non-root node holds fewer than the minimum number of elements.
    Underflow {
        /// Depth of the offending node.
        depth: usize,
        /// Number of elements in the node.
        length: usize,
        /// Minimum required.
        min_elements: usize,
    },
    /// Two adjacent elements of a node are not strictly increasing.
    Unsorted {
        /// Depth of the offending node.
        depth: usize,
        /// Slot of the first element that is not greater than its predecessor.
        slot: usize,
    },
    /// An element lies outside the range bounded by the enclosing separators.
    OutOfBounds {
        /// Depth of the offending node.
        depth: usize,
        /// Slot of the offending element.
        slot: usize,
    },
    /// An internal node does not have exactly one more child than elements.
    ChildCount {
        /// Depth of the offending node.
        depth: usize,
        /// `elements + 1`.
        expected: usize,
        /// Actual number of children.
        found: usize,
    },
    /// Leaves were found at different depths.
    UnevenLeafDepth {
        /// Depth of the first leaf found.
        expected: usize,
        /// Depth of the offending leaf.
        found: usize,
    },
    /// A node was built with a different order than the root.
    OrderMismatch {
        /// Depth of the offending node.
        depth: usize,
        /// Order of the tree.
        expected: usize,
        /// Order stored in the node.
        found: usize,
    },
    /// The cached element count disagrees with the number of stored elements.
    LengthMismatch {
        /// Cached count.
        expected: usize,
        /// Counted elements.
        found: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow {
                depth,
                length,
                max_elements,
            } => write!(
                formatter,
                "node at depth {depth} overflows: {length} elements, at most {max_elements} allowed"
            ),
            Self::Underflow {
                depth,
                length,
                min_elements,
            } => write!(
                formatter,
                "node at depth {depth} underflows: {length} elements, at least {min_elements} required"
            ),
            Self::Unsorted { depth, slot } => write!(
                formatter,
                "node at depth {depth} is not strictly increasing at slot {slot}"
            ),
            Self::OutOfBounds { depth, slot } => write!(
                formatter,
                "element at depth {depth}, slot {slot} lies outside its separator bounds"
            ),
            Self::ChildCount {
                depth,
                expected,
                found,
            } => write!(
                formatter,
                "internal node at depth {depth} has {found} children, expected {expected}"
            ),
            Self::UnevenLeafDepth { expected, found } => write!(
                formatter,
                "leaves at different depths: expected {expected}, found {found}"
            ),
            Self::OrderMismatch {
                depth,
                expected,
                found,
            } => write!(
                formatter,
                "node at depth {depth} has order {found}, tree order is {expected}"
            ),
            Self::LengthMismatch { expected, found } => write!(
                formatter,
                "tree reports {expected} elements but stores {found}"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

// =============================================================================
// Checker
// =============================================================================

/// Recursive invariant walk sharing the tree order and the first leaf depth.
struct Checker {
    order: usize,
    leaf_depth: Option<usize>,
    elements: usize,
}

impl Checker {
    /// Checks `node` and its subtree. Every element must lie strictly between
    /// `lower` and `upper` when those are present.
    fn check_node<T: Ord>(
        &mut self,
        node: &Node<T>,
        lower: Option<&T>,
        upper: Option<&T>,
        depth: usize,
    ) -> Result<(), InvariantViolation> {
        let length = node.len();
        if node.order() != self.order {
            return Err(InvariantViolation::OrderMismatch {
                depth,
                expected: self.order,
                found: node.order(),
            });
        }
        if length > node.max_elements() {
            return Err(InvariantViolation::Overflow {
                depth,
                length,
                max_elements: node.max_elements(),
            });
        }
        if depth > 0 && length < node.min_elements() {
            return Err(InvariantViolation::Underflow {
                depth,
                length,
                min_elements: node.min_elements(),
            });
        }

        let elements = node.elements();
        if let Some(slot) = (1..length).find(|&slot| elements[slot - 1] >= elements[slot]) {
            return Err(InvariantViolation::Unsorted { depth, slot });
        }
        let below_lower = |element: &T| lower.is_some_and(|bound| element <= bound);
        let above_upper = |element: &T| upper.is_some_and(|bound| element >= bound);
        if let Some(slot) = elements
            .iter()
            .position(|element| below_lower(element) || above_upper(element))
        {
            return Err(InvariantViolation::OutOfBounds { depth, slot });
        }
        self.elements += length;

        if node.is_leaf() {
            return match self.leaf_depth {
                None => {
                    self.leaf_depth = Some(depth);
                    Ok(())
                }
                Some(expected) if expected == depth => Ok(()),
                Some(expected) => Err(InvariantViolation::UnevenLeafDepth {
                    expected,
                    found: depth,
                }),
            };
        }

        let children = node.children();
        if children.len() != length + 1 {
            return Err(InvariantViolation::ChildCount {
                depth,
                expected: length + 1,
                found: children.len(),
            });
        }
        for (slot, child) in children.iter().enumerate() {
            let child_lower = if slot == 0 { lower } else { elements.get(slot - 1) };
            let child_upper = if slot == length { upper } else { elements.get(slot) };
            self.check_node(child, child_lower, child_upper, depth + 1)?;
        }
        Ok(())
    }
}

impl<T: Ord> OrderedTree<T> {
    /// Checks every structural invariant and reports the first violation.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cow_btree::OrderedTree;
    ///
    /// let tree: OrderedTree<i32> = (0..1000).collect();
    /// assert_eq!(tree.check(), Ok(()));
    /// ```
    pub fn check(&self) -> Result<(), InvariantViolation> {
        let root = self.root();
        let mut checker = Checker {
            order: root.order(),
            leaf_depth: None,
            elements: 0,
        };
        checker.check_node(root, None, None, 0)?;
        if checker.elements != self.len() {
            return Err(InvariantViolation::LengthMismatch {
                expected: self.len(),
                found: checker.elements,
            });
        }
        Ok(())
    }

    /// Asserts every structural invariant.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found by
    /// [`check`](Self::check).
    pub fn validate(&self) {
        if let Err(violation) = self.check() {
            panic!("OrderedTree invariant violated: {violation}");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
