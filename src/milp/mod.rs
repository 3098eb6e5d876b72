//! Mixed-integer linear programming layer.
//!
//! # Key Components
//!
//! - **Model**: [`MilpModel`] — variables, linear constraints, objective
//! - **Engine**: [`SolverEngine`] trait — `solve(model, limits) -> MilpSolution`
//! - **Branch-and-bound**: [`BranchAndBound`] — a conforming engine built on
//!   `minilp` LP relaxations
//!
//! # Design
//!
//! The model layer knows nothing about tours. Formulations are built on top
//! of it by consumer modules, and any engine honouring the [`SolverEngine`]
//! contract can be substituted for [`BranchAndBound`].

mod branch_bound;
mod engine;
mod model;

pub use branch_bound::{BranchAndBound, BranchAndBoundConfig, BranchingRule, NodeOrder};
pub use engine::{MilpSolution, SolveLimits, SolveStats, SolveStatus, SolverEngine};
pub use model::{
    Comparison, Constraint, Direction, LinearExpr, MilpModel, VarId, VarKind, Variable,
};
