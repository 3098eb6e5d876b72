//! Closed tour type.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// An ordered visiting sequence, implicitly closed (last returns to first).
///
/// # Examples
///
/// ```
/// use u_tsp_exact::models::Tour;
///
/// let tour = Tour::new(vec![3, 1, 2]);
/// assert_eq!(tour.len(), 3);
/// assert_eq!(tour.edges().collect::<Vec<_>>(), vec![(3, 1), (1, 2), (2, 3)]);
/// assert_eq!(tour.canonical().nodes(), &[1, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    nodes: Vec<NodeId>,
}

impl Tour {
    /// Creates a tour from a visiting order.
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    /// Node identifiers in visiting order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of visited nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tour visits no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Directed edges of the closed tour, including the closing edge.
    ///
    /// A single-node tour yields the self-loop `(a, a)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let n = self.nodes.len();
        (0..n).map(move |k| (self.nodes[k], self.nodes[(k + 1) % n]))
    }

    /// Returns `true` if the tour visits exactly the given ids, each once.
    pub fn is_permutation_of(&self, ids: impl IntoIterator<Item = NodeId>) -> bool {
        let mut expected: Vec<NodeId> = ids.into_iter().collect();
        let mut actual = self.nodes.clone();
        expected.sort_unstable();
        actual.sort_unstable();
        expected == actual
    }

    /// Rotates the tour so that it starts at `start`.
    ///
    /// Returns `None` if `start` is not on the tour.
    pub fn rotated_to(&self, start: NodeId) -> Option<Tour> {
        let pos = self.nodes.iter().position(|&id| id == start)?;
        let mut nodes = self.nodes.clone();
        nodes.rotate_left(pos);
        Some(Tour { nodes })
    }

    /// Canonical representative of the tour's rotation/reflection class.
    ///
    /// Starts at the smallest id and walks towards the smaller of its two
    /// neighbours, so tours that differ only by rotation or direction compare
    /// equal.
    pub fn canonical(&self) -> Tour {
        let Some(&min) = self.nodes.iter().min() else {
            return self.clone();
        };
        let Some(mut rotated) = self.rotated_to(min) else {
            return self.clone();
        };
        let n = rotated.nodes.len();
        if n > 2 && rotated.nodes[n - 1] < rotated.nodes[1] {
            rotated.nodes[1..].reverse();
        }
        rotated
    }
}
