//! Point and point set types.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a node supplied by the caller.
pub type NodeId = usize;

/// An immutable 2-D coordinate.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::models::Point;
///
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(3.0, 4.0);
/// assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// X-coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y-coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A set of nodes keyed by caller-supplied identifier.
///
/// Identifiers are unique because they are map keys. They need not be
/// contiguous or start at zero; internally every node is addressed by its
/// rank in ascending identifier order, so the smallest identifier is dense
/// index 0.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::models::PointSet;
///
/// let points: PointSet = [(1, (2.0, 3.0)), (2, (8.0, 4.0)), (3, (5.0, 8.0))]
///     .into_iter()
///     .collect();
/// assert_eq!(points.len(), 3);
/// assert_eq!(points.index_of(2), Some(1));
/// assert_eq!(points.id_at(0), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointSet {
    nodes: BTreeMap<NodeId, Point>,
}

impl PointSet {
    /// Creates an empty point set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, returning the previous coordinate stored under `id`.
    pub fn insert(&mut self, id: NodeId, point: impl Into<Point>) -> Option<Point> {
        self.nodes.insert(id, point.into())
    }

    /// Generates `n` points uniformly in `[0, width) × [0, height)` with ids `0..n`.
    pub fn random_uniform<R: Rng>(n: usize, width: f64, height: f64, rng: &mut R) -> Self {
        (0..n)
            .map(|id| {
                let x = rng.random::<f64>() * width;
                let y = rng.random::<f64>() * height;
                (id, Point::new(x, y))
            })
            .collect()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the set holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Coordinate of the node with the given identifier.
    pub fn get(&self, id: NodeId) -> Option<&Point> {
        self.nodes.get(&id)
    }

    /// Identifiers in dense-index order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Coordinates in dense-index order.
    pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
        self.nodes.values()
    }

    /// `(id, point)` pairs in dense-index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Point)> + '_ {
        self.nodes.iter().map(|(&id, p)| (id, p))
    }

    /// Dense index of the node with the given identifier.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        if self.nodes.contains_key(&id) {
            Some(self.nodes.range(..id).count())
        } else {
            None
        }
    }

    /// Identifier of the node at the given dense index.
    pub fn id_at(&self, index: usize) -> Option<NodeId> {
        self.nodes.keys().nth(index).copied()
    }

    /// Rejects non-finite coordinates.
    pub fn validate(&self) -> Result<()> {
        for (id, p) in self.iter() {
            if !p.is_finite() {
                return Err(Error::invalid_input(format!(
                    "node {id} has non-finite coordinate ({}, {})",
                    p.x(),
                    p.y()
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(NodeId, Point)> for PointSet {
    fn from_iter<I: IntoIterator<Item = (NodeId, Point)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(NodeId, (f64, f64))> for PointSet {
    fn from_iter<I: IntoIterator<Item = (NodeId, (f64, f64))>>(iter: I) -> Self {
        iter.into_iter().map(|(id, xy)| (id, Point::from(xy))).collect()
    }
}
