//! Domain model types for the travelling salesman problem.
//!
//! Provides the caller-facing input (a point set keyed by node identifier)
//! and output (a closed tour) types.

mod point;
mod tour;

pub use point::{NodeId, Point, PointSet};
pub use tour::Tour;
