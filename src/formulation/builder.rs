//! Integer-program builder for the symmetric TSP.

use std::collections::BTreeMap;

use log::debug;

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::milp::{Comparison, Direction, LinearExpr, MilpModel, VarId};

/// Smallest instance for which a tour model is built.
pub const MIN_MODEL_NODES: usize = 3;

/// Subtour-elimination family added on top of the degree constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtourElimination {
    /// Miller–Tucker–Zemlin ordering constraints.
    #[default]
    Mtz,
    /// Degree constraints only. The feasible region then contains disjoint
    /// sub-cycles, so this is only useful to study the relaxation.
    Disabled,
}

/// Edge variables `x[i][j]`, one per ordered pair `i != j`.
#[derive(Debug, Clone)]
pub struct EdgeVars {
    size: usize,
    vars: Vec<Option<VarId>>,
}

impl EdgeVars {
    /// Variable for the directed edge `from → to`, `None` on the diagonal or
    /// out of range.
    pub fn get(&self, from: usize, to: usize) -> Option<VarId> {
        if from >= self.size || to >= self.size {
            return None;
        }
        self.vars[from * self.size + to]
    }

    /// `((from, to), var)` for every edge, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), VarId)> + '_ {
        self.vars.iter().enumerate().filter_map(move |(k, v)| {
            v.map(|var| ((k / self.size, k % self.size), var))
        })
    }

    /// Number of edge variables, `n * (n - 1)`.
    pub fn len(&self) -> usize {
        self.size * self.size.saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Order variables `u[i]` for nodes `1..n`; node 0 anchors the ordering and
/// has none.
#[derive(Debug, Clone, Default)]
pub struct OrderVars {
    vars: BTreeMap<usize, VarId>,
}

impl OrderVars {
    pub fn get(&self, node: usize) -> Option<VarId> {
        self.vars.get(&node).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, VarId)> + '_ {
        self.vars.iter().map(|(&node, &var)| (node, var))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A built tour model: the generic MILP plus the named variable collections
/// needed to read a tour back out of a solution.
#[derive(Debug, Clone)]
pub struct TspModel {
    milp: MilpModel,
    edges: EdgeVars,
    order: OrderVars,
    subtour: SubtourElimination,
}

impl TspModel {
    /// The underlying integer program.
    pub fn milp(&self) -> &MilpModel {
        &self.milp
    }

    pub fn edges(&self) -> &EdgeVars {
        &self.edges
    }

    pub fn order(&self) -> &OrderVars {
        &self.order
    }

    pub fn subtour_elimination(&self) -> SubtourElimination {
        self.subtour
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.edges.size
    }

    /// Full assignment with `x = 1` on the given directed edges and every
    /// other variable at zero.
    ///
    /// Unknown or diagonal edges are ignored.
    pub fn edge_assignment(&self, edges: &[(usize, usize)]) -> Vec<f64> {
        let mut values = vec![0.0; self.milp.num_variables()];
        for &(from, to) in edges {
            if let Some(var) = self.edges.get(from, to) {
                values[var.index()] = 1.0;
            }
        }
        values
    }

    /// Full assignment describing the closed tour `order` (dense indices),
    /// with `u[i]` set to the position of `i` counted from node 0.
    pub fn tour_assignment(&self, order: &[usize]) -> Vec<f64> {
        let n = order.len();
        let edges: Vec<(usize, usize)> = (0..n).map(|k| (order[k], order[(k + 1) % n])).collect();
        let mut values = self.edge_assignment(&edges);
        if let Some(start) = order.iter().position(|&node| node == 0) {
            for step in 1..n {
                let node = order[(start + step) % n];
                if let Some(var) = self.order.get(node) {
                    values[var.index()] = step as f64;
                }
            }
        }
        values
    }
}

/// Builds the TSP integer program from a distance matrix.
///
/// - objective: minimise `Σ d[i][j] · x[i][j]` over ordered pairs `i != j`
/// - degree: one outgoing and one incoming edge per node
/// - MTZ: `u[i] - u[j] + (n-1) · x[i][j] <= n-2` for `i, j >= 1`, `i != j`,
///   with `0 <= u[i] <= n-1`
///
/// # Examples
///
/// ```
/// use u_tsp_exact::distance::DistanceMatrix;
/// use u_tsp_exact::formulation::ModelBuilder;
/// use u_tsp_exact::models::PointSet;
///
/// let points: PointSet = [(0, (0.0, 0.0)), (1, (0.0, 1.0)), (2, (1.0, 1.0)), (3, (1.0, 0.0))]
///     .into_iter()
///     .collect();
/// let dm = DistanceMatrix::from_points(&points).unwrap();
/// let model = ModelBuilder::new(&dm).build().unwrap();
/// assert_eq!(model.edges().len(), 12);
/// assert_eq!(model.order().len(), 3);
/// // 8 degree rows + 6 MTZ rows
/// assert_eq!(model.milp().num_constraints(), 14);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    distances: &'a DistanceMatrix,
    subtour: SubtourElimination,
    name: String,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(distances: &'a DistanceMatrix) -> Self {
        Self {
            distances,
            subtour: SubtourElimination::default(),
            name: "tsp".to_string(),
        }
    }

    pub fn with_subtour_elimination(mut self, subtour: SubtourElimination) -> Self {
        self.subtour = subtour;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the model.
    ///
    /// Fails with `DegenerateInput` for fewer than three nodes.
    pub fn build(&self) -> Result<TspModel> {
        let n = self.distances.size();
        if n < MIN_MODEL_NODES {
            return Err(Error::DegenerateInput { nodes: n });
        }

        let mut milp = MilpModel::new(self.name.clone(), Direction::Minimize);

        let mut edge_vars = vec![None; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let var = milp.add_binary(format!("x_{i}_{j}"), self.distances.get(i, j));
                    edge_vars[i * n + j] = Some(var);
                }
            }
        }
        let edges = EdgeVars {
            size: n,
            vars: edge_vars,
        };

        for i in 0..n {
            let outgoing: LinearExpr = (0..n)
                .filter_map(|j| edges.get(i, j))
                .map(|var| (var, 1.0))
                .collect();
            milp.add_constraint(format!("out_{i}"), outgoing, Comparison::Eq, 1.0);

            let incoming: LinearExpr = (0..n)
                .filter_map(|j| edges.get(j, i))
                .map(|var| (var, 1.0))
                .collect();
            milp.add_constraint(format!("in_{i}"), incoming, Comparison::Eq, 1.0);
        }

        let mut order = OrderVars::default();
        if self.subtour == SubtourElimination::Mtz {
            let span = (n - 1) as f64;
            for i in 1..n {
                let u = milp.add_continuous(format!("u_{i}"), 0.0, span, 0.0);
                order.vars.insert(i, u);
            }
            for (i, ui) in order.iter() {
                for (j, uj) in order.iter() {
                    if i == j {
                        continue;
                    }
                    let Some(x) = edges.get(i, j) else {
                        continue;
                    };
                    let expr = LinearExpr::new().with(ui, 1.0).with(uj, -1.0).with(x, span);
                    milp.add_constraint(format!("mtz_{i}_{j}"), expr, Comparison::Le, span - 1.0);
                }
            }
        }

        debug!(
            "built {} model for {n} nodes: {} vars, {} rows ({:?})",
            self.name,
            milp.num_variables(),
            milp.num_constraints(),
            self.subtour
        );

        Ok(TspModel {
            milp,
            edges,
            order,
            subtour: self.subtour,
        })
    }
}
