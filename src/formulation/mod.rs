//! TSP integer-program formulation.
//!
//! Translates a distance matrix into a [`MilpModel`](crate::milp::MilpModel)
//! with degree constraints and Miller–Tucker–Zemlin subtour elimination.
//!
//! # Reference
//!
//! Miller, Tucker & Zemlin (1960), "Integer programming formulation of
//! traveling salesman problems"

mod builder;

pub use builder::{
    EdgeVars, ModelBuilder, OrderVars, SubtourElimination, TspModel, MIN_MODEL_NODES,
};
