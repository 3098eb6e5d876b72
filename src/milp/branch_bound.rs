//! LP-relaxation branch-and-bound engine.
//!
//! Relaxations are solved with `minilp`'s dual simplex. Children are derived
//! from their parent's solved tableau (`fix_var` for binaries, an extra bound
//! row for general integers), so each node is a warm-started re-solve rather
//! than a solve from scratch.
//!
//! # Reference
//!
//! Land & Doig (1960), "An automatic method of solving discrete programming
//! problems"

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::time::Instant;

use log::{debug, trace, warn};
use minilp::{ComparisonOp, OptimizationDirection, Problem};

use super::engine::{MilpSolution, SolveLimits, SolveStats, SolveStatus, SolverEngine};
use super::model::{Comparison, Direction, MilpModel, VarId, VarKind};
use crate::error::{Error, Result};

/// Rule for choosing the fractional variable to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Variable whose fractional part is closest to 0.5.
    #[default]
    MostFractional,
    /// Lowest-indexed fractional variable.
    FirstFractional,
}

/// Order in which open nodes are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeOrder {
    /// Lowest relaxation bound first.
    #[default]
    BestFirst,
    /// Deepest node first.
    DepthFirst,
}

/// Configuration for the [`BranchAndBound`] engine.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::milp::{BranchAndBoundConfig, BranchingRule, NodeOrder};
///
/// let config = BranchAndBoundConfig::default()
///     .with_branching(BranchingRule::FirstFractional)
///     .with_node_order(NodeOrder::DepthFirst)
///     .with_integrality_tolerance(1e-7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BranchAndBoundConfig {
    pub branching: BranchingRule,
    pub node_order: NodeOrder,
    /// A value within this distance of an integer counts as integral.
    pub integrality_tolerance: f64,
    /// Nodes that cannot improve the incumbent by more than this are pruned.
    pub absolute_gap: f64,
}

impl Default for BranchAndBoundConfig {
    fn default() -> Self {
        Self {
            branching: BranchingRule::default(),
            node_order: NodeOrder::default(),
            integrality_tolerance: 1e-6,
            absolute_gap: 1e-9,
        }
    }
}

impl BranchAndBoundConfig {
    pub fn with_branching(mut self, rule: BranchingRule) -> Self {
        self.branching = rule;
        self
    }

    pub fn with_node_order(mut self, order: NodeOrder) -> Self {
        self.node_order = order;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn with_absolute_gap(mut self, gap: f64) -> Self {
        self.absolute_gap = gap;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.integrality_tolerance > 0.0 && self.integrality_tolerance < 0.5) {
            return Err(format!(
                "integrality_tolerance must be in (0, 0.5), got {}",
                self.integrality_tolerance
            ));
        }
        if !(self.absolute_gap >= 0.0 && self.absolute_gap.is_finite()) {
            return Err(format!(
                "absolute_gap must be finite and non-negative, got {}",
                self.absolute_gap
            ));
        }
        Ok(())
    }
}

/// A solved relaxation waiting to be branched on.
struct OpenNode {
    /// Relaxation objective in minimisation sense.
    bound: f64,
    depth: usize,
    seq: usize,
    order: NodeOrder,
    lp: minilp::Solution,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // BinaryHeap pops the greatest element.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.order {
            NodeOrder::BestFirst => other
                .bound
                .total_cmp(&self.bound)
                .then_with(|| other.seq.cmp(&self.seq)),
            NodeOrder::DepthFirst => self
                .depth
                .cmp(&other.depth)
                .then_with(|| self.seq.cmp(&other.seq)),
        }
    }
}

/// Best integer-feasible point found so far.
struct Incumbent {
    /// Objective in minimisation sense.
    bound: f64,
    values: Vec<f64>,
}

/// Exact MILP engine: LP relaxation plus branch-and-bound.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::milp::{
///     BranchAndBound, Comparison, Direction, LinearExpr, MilpModel, SolveLimits, SolveStatus,
///     SolverEngine,
/// };
///
/// // maximize 5a + 4b + 3c  s.t.  2a + 3b + c <= 5, 4a + b + 2c <= 11, 3a + 4b + 2c <= 8
/// let mut model = MilpModel::new("knapsack", Direction::Maximize);
/// let a = model.add_binary("a", 5.0);
/// let b = model.add_binary("b", 4.0);
/// let c = model.add_binary("c", 3.0);
/// let row = |x: f64, y: f64, z: f64| LinearExpr::new().with(a, x).with(b, y).with(c, z);
/// model.add_constraint("r1", row(2.0, 3.0, 1.0), Comparison::Le, 5.0);
/// model.add_constraint("r2", row(4.0, 1.0, 2.0), Comparison::Le, 11.0);
/// model.add_constraint("r3", row(3.0, 4.0, 2.0), Comparison::Le, 8.0);
///
/// let solution = BranchAndBound::new().solve(&model, &SolveLimits::unlimited()).unwrap();
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert!((solution.objective.unwrap() - 9.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    config: BranchAndBoundConfig,
}

impl BranchAndBound {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: BranchAndBoundConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BranchAndBoundConfig {
        &self.config
    }

    /// Picks the integral variable to branch on, or `None` if the relaxation
    /// is integral.
    fn select_branch(
        &self,
        lp: &minilp::Solution,
        integral: &[(VarId, minilp::Variable)],
    ) -> Option<(VarId, minilp::Variable, f64)> {
        let tol = self.config.integrality_tolerance;
        let mut best: Option<(VarId, minilp::Variable, f64, f64)> = None;
        for &(id, var) in integral {
            let value = lp[var];
            let frac = value - value.floor();
            let distance = frac.min(1.0 - frac);
            if distance <= tol {
                continue;
            }
            match self.config.branching {
                BranchingRule::FirstFractional => return Some((id, var, value)),
                BranchingRule::MostFractional => {
                    if best.map_or(true, |(_, _, _, d)| distance > d) {
                        best = Some((id, var, value, distance));
                    }
                }
            }
        }
        best.map(|(id, var, value, _)| (id, var, value))
    }
}

fn sense(direction: Direction) -> f64 {
    match direction {
        Direction::Minimize => 1.0,
        Direction::Maximize => -1.0,
    }
}

fn comparison_op(cmp: Comparison) -> ComparisonOp {
    match cmp {
        Comparison::Le => ComparisonOp::Le,
        Comparison::Ge => ComparisonOp::Ge,
        Comparison::Eq => ComparisonOp::Eq,
    }
}

/// Translates the model into its continuous relaxation.
fn relaxation(model: &MilpModel) -> (Problem, Vec<minilp::Variable>) {
    let direction = match model.direction {
        Direction::Minimize => OptimizationDirection::Minimize,
        Direction::Maximize => OptimizationDirection::Maximize,
    };
    let mut problem = Problem::new(direction);
    let vars: Vec<minilp::Variable> = model
        .variables()
        .iter()
        .map(|v| problem.add_var(v.objective, (v.lower, v.upper)))
        .collect();

    for c in model.constraints() {
        // minilp rejects repeated indices within a row
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for &(var, coeff) in c.expr.terms() {
            *merged.entry(var.index()).or_insert(0.0) += coeff;
        }
        let mut expr = minilp::LinearExpr::empty();
        for (idx, coeff) in merged {
            expr.add(vars[idx], coeff);
        }
        problem.add_constraint(expr, comparison_op(c.cmp), c.rhs);
    }
    (problem, vars)
}

/// Whether the relaxation has a finite objective and finite values.
fn is_finite_point(lp: &minilp::Solution, vars: &[minilp::Variable]) -> bool {
    lp.objective().is_finite() && vars.iter().all(|&var| lp[var].is_finite())
}

/// Reads a full assignment off a relaxation, snapping integral variables.
fn assignment(model: &MilpModel, lp: &minilp::Solution, vars: &[minilp::Variable]) -> Vec<f64> {
    model
        .variables()
        .iter()
        .zip(vars)
        .map(|(v, &var)| {
            let value = lp[var];
            if v.kind.is_integral() {
                value.round()
            } else {
                value
            }
        })
        .collect()
}

/// Applies one side of a branching decision to a copy of `lp`.
fn branch(
    lp: minilp::Solution,
    kind: VarKind,
    var: minilp::Variable,
    value: f64,
    up: bool,
) -> std::result::Result<minilp::Solution, minilp::Error> {
    match (kind, up) {
        (VarKind::Binary, false) => lp.fix_var(var, 0.0),
        (VarKind::Binary, true) => lp.fix_var(var, 1.0),
        (_, false) => {
            let mut expr = minilp::LinearExpr::empty();
            expr.add(var, 1.0);
            lp.add_constraint(expr, ComparisonOp::Le, value.floor())
        }
        (_, true) => {
            let mut expr = minilp::LinearExpr::empty();
            expr.add(var, 1.0);
            lp.add_constraint(expr, ComparisonOp::Ge, value.ceil())
        }
    }
}

impl SolverEngine for BranchAndBound {
    fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<MilpSolution> {
        self.config
            .validate()
            .map_err(|e| Error::invalid_input(format!("branch-and-bound config: {e}")))?;
        model.validate()?;

        let started = Instant::now();
        let sense = sense(model.direction);
        let mut nodes_explored = 0usize;
        let stats = |nodes: usize| SolveStats {
            nodes_explored: nodes,
            elapsed: started.elapsed(),
        };

        if limits.exhausted(started, nodes_explored) {
            return Ok(MilpSolution::empty(SolveStatus::TimedOut, stats(0)));
        }

        let (problem, vars) = relaxation(model);
        let integral: Vec<(VarId, minilp::Variable)> = model
            .integral_variables()
            .map(|id| (id, vars[id.index()]))
            .collect();

        let root = match problem.solve() {
            Ok(lp) => lp,
            Err(minilp::Error::Infeasible) => {
                debug!("{}: root relaxation infeasible", model.name);
                return Ok(MilpSolution::empty(SolveStatus::Infeasible, stats(1)));
            }
            Err(minilp::Error::Unbounded) => {
                debug!("{}: root relaxation unbounded", model.name);
                return Ok(MilpSolution::empty(SolveStatus::Unbounded, stats(1)));
            }
        };
        nodes_explored += 1;
        // minilp may return Ok for an unbounded ray, with a non-finite point
        if !is_finite_point(&root, &vars) {
            debug!("{}: root relaxation unbounded", model.name);
            return Ok(MilpSolution::empty(SolveStatus::Unbounded, stats(1)));
        }
        debug!(
            "{}: root relaxation bound {:.6} ({} vars, {} integral, {} rows)",
            model.name,
            root.objective(),
            model.num_variables(),
            integral.len(),
            model.num_constraints()
        );

        let order = self.config.node_order;
        let gap = self.config.absolute_gap;
        let mut incumbent: Option<Incumbent> = None;
        let mut open = BinaryHeap::new();
        let mut seq = 0usize;

        // Solved relaxations enter here: integral ones update the incumbent,
        // fractional ones are queued. Returns false for a non-finite point.
        let mut admit = |lp: minilp::Solution,
                         depth: usize,
                         incumbent: &mut Option<Incumbent>,
                         open: &mut BinaryHeap<OpenNode>| {
            if !is_finite_point(&lp, &vars) {
                return false;
            }
            let bound = sense * lp.objective();
            if incumbent.as_ref().is_some_and(|inc| bound >= inc.bound - gap) {
                return true;
            }
            if self.select_branch(&lp, &integral).is_none() {
                let values = assignment(model, &lp, &vars);
                let bound = sense * model.objective_value(&values);
                debug!(
                    "{}: incumbent {:.6} at depth {depth}",
                    model.name,
                    sense * bound
                );
                *incumbent = Some(Incumbent { bound, values });
                return true;
            }
            seq += 1;
            open.push(OpenNode {
                bound,
                depth,
                seq,
                order,
                lp,
            });
            true
        };

        admit(root, 0, &mut incumbent, &mut open);

        while let Some(node) = open.pop() {
            if incumbent
                .as_ref()
                .is_some_and(|inc| node.bound >= inc.bound - gap)
            {
                continue;
            }
            let Some((id, var, value)) = self.select_branch(&node.lp, &integral) else {
                continue;
            };
            trace!(
                "{}: node #{} depth {} bound {:.6}, branching on {} = {:.4}",
                model.name,
                node.seq,
                node.depth,
                sense * node.bound,
                model.variable(id).name,
                value
            );

            let kind = model.variable(id).kind;
            for up in [false, true] {
                if limits.exhausted(started, nodes_explored) {
                    let elapsed = stats(nodes_explored);
                    debug!(
                        "{}: limit reached after {} nodes in {:?}",
                        model.name, elapsed.nodes_explored, elapsed.elapsed
                    );
                    return Ok(timed_out(sense, incumbent, elapsed));
                }
                nodes_explored += 1;
                let bounded = match branch(node.lp.clone(), kind, var, value, up) {
                    Ok(child) => admit(child, node.depth + 1, &mut incumbent, &mut open),
                    Err(minilp::Error::Infeasible) => true,
                    Err(minilp::Error::Unbounded) => false,
                };
                if !bounded {
                    warn!(
                        "{}: child relaxation unbounded under a bounded parent",
                        model.name
                    );
                    return Ok(MilpSolution::empty(
                        SolveStatus::Unbounded,
                        stats(nodes_explored),
                    ));
                }
            }
        }

        let stats = stats(nodes_explored);
        match incumbent {
            Some(inc) => {
                debug!(
                    "{}: optimal {:.6} after {} nodes in {:?}",
                    model.name,
                    sense * inc.bound,
                    stats.nodes_explored,
                    stats.elapsed
                );
                Ok(MilpSolution {
                    status: SolveStatus::Optimal,
                    objective: Some(sense * inc.bound),
                    values: Some(inc.values),
                    stats,
                })
            }
            None => {
                debug!(
                    "{}: no integer point after {} nodes",
                    model.name, stats.nodes_explored
                );
                Ok(MilpSolution::empty(SolveStatus::Infeasible, stats))
            }
        }
    }
}

fn timed_out(sense: f64, incumbent: Option<Incumbent>, stats: SolveStats) -> MilpSolution {
    match incumbent {
        Some(inc) => MilpSolution {
            status: SolveStatus::TimedOut,
            objective: Some(sense * inc.bound),
            values: Some(inc.values),
            stats,
        },
        None => MilpSolution::empty(SolveStatus::TimedOut, stats),
    }
}
