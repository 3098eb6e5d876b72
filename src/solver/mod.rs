//! Exact TSP solving.
//!
//! - [`TspSolver`] — Builds the MTZ model, calls the engine, extracts the tour
//! - [`TspConfig`] — Time/node budgets and result checking tolerance

mod config;
mod pipeline;

pub use config::TspConfig;
pub use pipeline::{solve_tsp, Provenance, TspSolution, TspSolver};
