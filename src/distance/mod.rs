//! Distance matrices.
//!
//! Provides a dense Euclidean distance matrix over a point set.

mod matrix;

pub use matrix::DistanceMatrix;
