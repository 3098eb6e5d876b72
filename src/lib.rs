//! # u-tsp-exact
//!
//! Exact travelling salesman solver for small planar point sets. Builds a
//! Miller–Tucker–Zemlin integer program, proves optimality with a
//! branch-and-bound engine over LP relaxations, and reads the tour back out.
//!
//! ## Modules
//!
//! - [`models`] — Points, point sets, and tours
//! - [`distance`] — Euclidean distance matrix
//! - [`milp`] — Solver-neutral MILP model and the branch-and-bound engine
//! - [`formulation`] — TSP model construction (degree + MTZ constraints)
//! - [`extraction`] — Edge assignment → ordered tour
//! - [`solver`] — End-to-end pipeline and configuration
//!
//! ## Example
//!
//! ```
//! use u_tsp_exact::models::PointSet;
//! use u_tsp_exact::solver::solve_tsp;
//!
//! let points: PointSet = [
//!     (1, (2.0, 3.0)),
//!     (2, (8.0, 4.0)),
//!     (3, (5.0, 8.0)),
//!     (4, (1.0, 1.0)),
//!     (5, (6.0, 1.0)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let solution = solve_tsp(&points).unwrap();
//! assert_eq!(solution.tour.len(), 5);
//! assert!(solution.tour.is_permutation_of(points.ids()));
//! ```

pub mod distance;
mod error;
pub mod extraction;
pub mod formulation;
pub mod milp;
pub mod models;
pub mod solver;

pub use error::{Error, Result, StatusTag};
