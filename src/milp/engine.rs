//! Solver engine interface.

use std::time::{Duration, Instant};

use super::model::{MilpModel, VarId};
use crate::error::Result;

/// Status of the engine after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal solution found.
    Optimal,
    /// No integer-feasible point exists.
    Infeasible,
    /// The objective is unbounded over the feasible region.
    Unbounded,
    /// The time or node budget ran out before the search concluded.
    TimedOut,
}

/// Budget for a single solve call. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveLimits {
    pub time_limit: Option<Duration>,
    pub node_limit: Option<usize>,
}

impl SolveLimits {
    /// No time or node limit.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Returns `true` once either budget is spent.
    pub fn exhausted(&self, started: Instant, nodes_explored: usize) -> bool {
        self.time_limit.is_some_and(|t| started.elapsed() >= t)
            || self.node_limit.is_some_and(|n| nodes_explored >= n)
    }
}

/// Search statistics reported with every solution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveStats {
    /// Branch-and-bound nodes whose relaxation was solved.
    pub nodes_explored: usize,
    pub elapsed: Duration,
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct MilpSolution {
    pub status: SolveStatus,
    /// Objective value of `values`, if a point is known.
    pub objective: Option<f64>,
    /// One value per model variable, indexed by [`VarId::index`].
    ///
    /// Always present for `Optimal`. For `TimedOut` this is the best
    /// incumbent, if any.
    pub values: Option<Vec<f64>>,
    pub stats: SolveStats,
}

impl MilpSolution {
    /// Creates a solution with no known point.
    pub fn empty(status: SolveStatus, stats: SolveStats) -> Self {
        Self {
            status,
            objective: None,
            values: None,
            stats,
        }
    }

    /// Value assigned to `var`, if a point is known.
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.as_ref().and_then(|v| v.get(var.index()).copied())
    }
}

/// Trait for MILP engine implementations.
///
/// A conforming engine returns `Optimal` only with a proof of optimality,
/// proves infeasibility or unboundedness, or reports `TimedOut` when
/// `limits` are exhausted. `Err` is reserved for malformed models.
pub trait SolverEngine {
    /// Solves the model within the given limits.
    fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<MilpSolution>;
}

impl<E: SolverEngine + ?Sized> SolverEngine for &E {
    fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<MilpSolution> {
        (**self).solve(model, limits)
    }
}
