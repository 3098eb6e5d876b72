//! Tour reconstruction from an edge assignment.

use crate::error::{Error, Result};
use crate::formulation::TspModel;
use crate::milp::{MilpSolution, SolveStatus};

const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Reads the tour out of an optimal solution and checks that it is a single
/// Hamiltonian cycle.
///
/// Any failure is reported as `InconsistentSolution`: with a correctly built
/// model and a conforming engine it cannot happen.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::distance::DistanceMatrix;
/// use u_tsp_exact::extraction::TourExtractor;
/// use u_tsp_exact::formulation::ModelBuilder;
/// use u_tsp_exact::milp::{MilpSolution, SolveStats, SolveStatus};
/// use u_tsp_exact::models::PointSet;
///
/// let points: PointSet = [(0, (0.0, 0.0)), (1, (4.0, 0.0)), (2, (0.0, 3.0))]
///     .into_iter()
///     .collect();
/// let dm = DistanceMatrix::from_points(&points).unwrap();
/// let model = ModelBuilder::new(&dm).build().unwrap();
/// let solution = MilpSolution {
///     status: SolveStatus::Optimal,
///     objective: Some(12.0),
///     values: Some(model.tour_assignment(&[0, 2, 1])),
///     stats: SolveStats::default(),
/// };
/// let order = TourExtractor::new().extract(&model, &solution).unwrap();
/// assert_eq!(order, vec![0, 2, 1]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TourExtractor {
    tolerance: f64,
}

impl Default for TourExtractor {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl TourExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how far an edge value may sit from 0 or 1.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the tour as dense node indices, starting at node 0.
    pub fn extract(&self, model: &TspModel, solution: &MilpSolution) -> Result<Vec<usize>> {
        if solution.status != SolveStatus::Optimal {
            return Err(Error::inconsistent(format!(
                "expected an optimal solution, got {:?}",
                solution.status
            )));
        }
        let values = solution
            .values
            .as_deref()
            .ok_or_else(|| Error::inconsistent("optimal solution carries no assignment"))?;
        if values.len() != model.milp().num_variables() {
            return Err(Error::inconsistent(format!(
                "assignment has {} values for {} variables",
                values.len(),
                model.milp().num_variables()
            )));
        }

        let n = model.size();
        let mut successor: Vec<Option<usize>> = vec![None; n];
        let mut selected = 0usize;
        for ((from, to), var) in model.edges().iter() {
            let value = values[var.index()];
            if (value - 1.0).abs() <= self.tolerance {
                if let Some(prev) = successor[from] {
                    return Err(Error::inconsistent(format!(
                        "node {from} has two outgoing edges (to {prev} and {to})"
                    )));
                }
                successor[from] = Some(to);
                selected += 1;
            } else if value.abs() > self.tolerance {
                return Err(Error::inconsistent(format!(
                    "edge {from}->{to} has non-binary value {value}"
                )));
            }
        }
        if selected != n {
            return Err(Error::inconsistent(format!(
                "{selected} edges selected for {n} nodes"
            )));
        }

        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut current = 0usize;
        loop {
            visited[current] = true;
            order.push(current);
            let next = successor[current].ok_or_else(|| {
                Error::inconsistent(format!("node {current} has no outgoing edge"))
            })?;
            if next == 0 {
                break;
            }
            if visited[next] {
                return Err(Error::inconsistent(format!(
                    "walk from node 0 re-enters node {next} before closing"
                )));
            }
            current = next;
        }
        if order.len() != n {
            return Err(Error::inconsistent(format!(
                "cycle through node 0 covers {} of {n} nodes (subtour)",
                order.len()
            )));
        }
        Ok(order)
    }
}
