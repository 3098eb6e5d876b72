//! End-to-end exact TSP pipeline.

use log::{debug, info, warn};

use super::config::TspConfig;
use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::extraction::TourExtractor;
use crate::formulation::{ModelBuilder, MIN_MODEL_NODES};
use crate::milp::{BranchAndBound, SolveStats, SolveStatus, SolverEngine};
use crate::models::{NodeId, PointSet, Tour};

/// How a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Fewer than three nodes: the only tour, built without the engine.
    ClosedForm,
    /// Proven optimal by the engine.
    Solver,
}

/// An optimal tour and its length.
#[derive(Debug, Clone)]
pub struct TspSolution {
    pub tour: Tour,
    /// Sum of consecutive edge distances, closing edge included.
    pub length: f64,
    /// Objective reported by the engine, `None` for closed-form results.
    pub objective: Option<f64>,
    pub stats: SolveStats,
    pub provenance: Provenance,
}

/// Exact TSP solver: distance matrix → MTZ model → engine → tour.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::models::PointSet;
/// use u_tsp_exact::solver::TspSolver;
///
/// let points: PointSet = [(0, (0.0, 0.0)), (1, (0.0, 1.0)), (2, (1.0, 1.0)), (3, (1.0, 0.0))]
///     .into_iter()
///     .collect();
/// let solution = TspSolver::default().solve(&points).unwrap();
/// assert!((solution.length - 4.0).abs() < 1e-6);
/// assert!(solution.tour.is_permutation_of(points.ids()));
/// ```
#[derive(Debug, Clone)]
pub struct TspSolver<E = BranchAndBound> {
    engine: E,
    config: TspConfig,
}

impl Default for TspSolver<BranchAndBound> {
    fn default() -> Self {
        Self::new(BranchAndBound::new())
    }
}

impl<E: SolverEngine> TspSolver<E> {
    /// Creates a solver around the given engine with the default config.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: TspConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TspConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TspConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Computes a minimum-length closed tour over `points`.
    pub fn solve(&self, points: &PointSet) -> Result<TspSolution> {
        self.config
            .validate()
            .map_err(|e| Error::invalid_input(format!("solver config: {e}")))?;
        if points.is_empty() {
            return Err(Error::invalid_input("point set is empty"));
        }
        let distances = DistanceMatrix::from_points(points)?;
        let ids: Vec<NodeId> = points.ids().collect();
        let n = ids.len();

        if n < MIN_MODEL_NODES {
            let length = distances.tour_length(&(0..n).collect::<Vec<_>>());
            debug!("{n} node(s): closed-form tour of length {length:.6}");
            return Ok(TspSolution {
                tour: Tour::new(ids),
                length,
                objective: None,
                stats: SolveStats::default(),
                provenance: Provenance::ClosedForm,
            });
        }

        info!("solving {n}-node instance");
        let model = ModelBuilder::new(&distances).build()?;
        let solution = self.engine.solve(model.milp(), &self.config.limits())?;

        match solution.status {
            SolveStatus::Optimal => {}
            SolveStatus::Infeasible => {
                return Err(Error::Infeasible(format!(
                    "engine found no tour over {n} nodes after {} node(s)",
                    solution.stats.nodes_explored
                )));
            }
            SolveStatus::Unbounded => {
                warn!("engine reported an unbounded tour model");
                return Err(Error::Unbounded(
                    "engine reported an unbounded relaxation for a model with bounded \
                     non-negative costs"
                        .to_string(),
                ));
            }
            SolveStatus::TimedOut => {
                info!(
                    "solve timed out after {} node(s) in {:?}",
                    solution.stats.nodes_explored, solution.stats.elapsed
                );
                return Err(Error::TimedOut {
                    nodes_explored: solution.stats.nodes_explored,
                    elapsed: solution.stats.elapsed,
                    best_objective: solution.objective,
                });
            }
        }

        let order = TourExtractor::new()
            .with_tolerance(self.config.integrality_tolerance)
            .extract(&model, &solution)?;
        let objective = solution
            .objective
            .ok_or_else(|| Error::inconsistent("optimal solution carries no objective"))?;
        let length = distances.tour_length(&order);
        let tolerance = self.config.objective_tolerance * objective.abs().max(1.0);
        if !(objective.is_finite() && (length - objective).abs() <= tolerance) {
            warn!("tour length {length} disagrees with objective {objective}");
            return Err(Error::inconsistent(format!(
                "tour length {length} differs from reported objective {objective}"
            )));
        }

        info!(
            "optimal tour of length {length:.6} ({} node(s) in {:?})",
            solution.stats.nodes_explored, solution.stats.elapsed
        );
        Ok(TspSolution {
            tour: Tour::new(order.iter().map(|&i| ids[i]).collect()),
            length,
            objective: Some(objective),
            stats: solution.stats,
            provenance: Provenance::Solver,
        })
    }
}

/// Solves `points` with the default engine and configuration.
pub fn solve_tsp(points: &PointSet) -> Result<TspSolution> {
    TspSolver::default().solve(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::SubtourElimination;
    use crate::milp::{MilpModel, MilpSolution, SolveLimits};
    use crate::StatusTag;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    /// Delegates to branch-and-bound and counts calls.
    #[derive(Default)]
    struct CountingEngine {
        calls: Cell<usize>,
        inner: BranchAndBound,
    }

    impl SolverEngine for CountingEngine {
        fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<MilpSolution> {
            self.calls.set(self.calls.get() + 1);
            self.inner.solve(model, limits)
        }
    }

    /// Returns a fixed status with the given point.
    struct StubEngine {
        status: SolveStatus,
        objective: Option<f64>,
    }

    impl SolverEngine for StubEngine {
        fn solve(&self, model: &MilpModel, _limits: &SolveLimits) -> Result<MilpSolution> {
            Ok(MilpSolution {
                status: self.status,
                objective: self.objective,
                values: self.objective.map(|_| vec![0.0; model.num_variables()]),
                stats: SolveStats {
                    nodes_explored: 3,
                    ..SolveStats::default()
                },
            })
        }
    }

    /// Solves correctly, then replaces the objective with `reported(objective)`.
    struct SkewedObjectiveEngine {
        reported: fn(f64) -> f64,
    }

    impl SolverEngine for SkewedObjectiveEngine {
        fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<MilpSolution> {
            let mut solution = BranchAndBound::new().solve(model, limits)?;
            solution.objective = solution.objective.map(self.reported);
            Ok(solution)
        }
    }

    /// Solves correctly, then nudges every edge value by `offset`.
    struct NoisyValuesEngine {
        offset: f64,
    }

    impl SolverEngine for NoisyValuesEngine {
        fn solve(&self, model: &MilpModel, limits: &SolveLimits) -> Result<MilpSolution> {
            let mut solution = BranchAndBound::new().solve(model, limits)?;
            if let Some(values) = solution.values.as_mut() {
                for (value, var) in values.iter_mut().zip(model.variables()) {
                    if var.kind.is_integral() {
                        *value += if *value > 0.5 { -self.offset } else { self.offset };
                    }
                }
            }
            Ok(solution)
        }
    }

    fn square() -> PointSet {
        [
            (0, (0.0, 0.0)),
            (1, (0.0, 1.0)),
            (2, (1.0, 1.0)),
            (3, (1.0, 0.0)),
        ]
        .into_iter()
        .collect()
    }

    fn coating_features() -> PointSet {
        [
            (1, (2.0, 3.0)),
            (2, (8.0, 4.0)),
            (3, (5.0, 8.0)),
            (4, (1.0, 1.0)),
            (5, (6.0, 1.0)),
        ]
        .into_iter()
        .collect()
    }

    /// Shortest closed tour by enumerating every order that starts at index 0.
    fn brute_force_length(points: &PointSet) -> f64 {
        fn extend(
            dm: &DistanceMatrix,
            order: &mut Vec<usize>,
            used: &mut [bool],
            best: &mut f64,
        ) {
            if order.len() == used.len() {
                *best = best.min(dm.tour_length(order));
                return;
            }
            for next in 1..used.len() {
                if !used[next] {
                    used[next] = true;
                    order.push(next);
                    extend(dm, order, used, best);
                    order.pop();
                    used[next] = false;
                }
            }
        }
        let dm = DistanceMatrix::from_points(points).expect("finite");
        let mut used = vec![false; dm.size()];
        used[0] = true;
        let mut best = f64::INFINITY;
        extend(&dm, &mut vec![0], &mut used, &mut best);
        best
    }

    #[test]
    fn test_square_perimeter_order() {
        let solution = TspSolver::default().solve(&square()).expect("solvable");
        assert_eq!(solution.provenance, Provenance::Solver);
        assert!((solution.length - 4.0).abs() < 1e-6);
        assert_eq!(solution.tour.canonical().nodes(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_coating_features_optimal() {
        let points = coating_features();
        let solution = solve_tsp(&points).expect("solvable");
        assert!(solution.tour.is_permutation_of(points.ids()));
        assert_eq!(solution.tour.nodes()[0], 1, "walk starts at the smallest id");
        assert!((solution.length - brute_force_length(&points)).abs() < 1e-6);
        let objective = solution.objective.expect("engine objective");
        assert!((solution.length - objective).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_solves_agree() {
        let points = coating_features();
        let solver = TspSolver::default();
        let first = solver.solve(&points).expect("solvable");
        for _ in 0..3 {
            let again = solver.solve(&points).expect("solvable");
            assert!((again.length - first.length).abs() < 1e-9);
            assert_eq!(again.tour.canonical(), first.tour.canonical());
        }
    }

    #[test]
    fn test_closed_form_skips_engine() {
        let engine = CountingEngine::default();
        let solver = TspSolver::new(&engine);

        let one: PointSet = [(7, (1.0, 1.0))].into_iter().collect();
        let solution = solver.solve(&one).expect("trivial");
        assert_eq!(solution.provenance, Provenance::ClosedForm);
        assert_eq!(solution.tour.nodes(), &[7]);
        assert_eq!(solution.length, 0.0);

        let two: PointSet = [(3, (0.0, 0.0)), (9, (3.0, 4.0))].into_iter().collect();
        let solution = solver.solve(&two).expect("trivial");
        assert_eq!(solution.tour.nodes(), &[3, 9]);
        assert!((solution.length - 10.0).abs() < 1e-10);
        assert!(solution.objective.is_none());

        assert_eq!(engine.calls.get(), 0);

        solver.solve(&square()).expect("solvable");
        assert_eq!(engine.calls.get(), 1);
    }

    #[test]
    fn test_invalid_input_rejected_before_engine() {
        let engine = CountingEngine::default();
        let solver = TspSolver::new(&engine);

        let err = solver.solve(&PointSet::new()).expect_err("empty");
        assert_eq!(err.kind(), StatusTag::InvalidInput);

        let mut points = square();
        points.insert(4, (f64::NAN, 0.0));
        let err = solver.solve(&points).expect_err("nan");
        assert_eq!(err.kind(), StatusTag::InvalidInput);

        let err = TspSolver::new(&engine)
            .with_config(TspConfig::default().with_objective_tolerance(-1.0))
            .solve(&square())
            .expect_err("bad config");
        assert_eq!(err.kind(), StatusTag::InvalidInput);

        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn test_tiny_budget_times_out_not_infeasible() {
        let points = PointSet::random_uniform(12, 100.0, 100.0, &mut StdRng::seed_from_u64(7));
        for config in [
            TspConfig::default().with_time_limit_ms(0),
            TspConfig::default().with_node_limit(0),
        ] {
            let err = TspSolver::default()
                .with_config(config)
                .solve(&points)
                .expect_err("budget too small");
            assert_eq!(err.kind(), StatusTag::TimedOut);
        }
    }

    #[test]
    fn test_engine_statuses_surface_distinctly() {
        let cases = [
            (SolveStatus::Infeasible, None, StatusTag::Infeasible),
            (SolveStatus::Unbounded, None, StatusTag::Unbounded),
            (SolveStatus::TimedOut, None, StatusTag::TimedOut),
            (SolveStatus::TimedOut, Some(4.5), StatusTag::TimedOut),
        ];
        for (status, objective, tag) in cases {
            let err = TspSolver::new(StubEngine { status, objective })
                .solve(&square())
                .expect_err("non-optimal");
            assert_eq!(err.kind(), tag);
            if let Error::TimedOut { best_objective, nodes_explored, .. } = err {
                assert_eq!(best_objective, objective);
                assert_eq!(nodes_explored, 3);
            }
        }
    }

    #[test]
    fn test_all_zero_assignment_is_inconsistent() {
        let err = TspSolver::new(StubEngine {
            status: SolveStatus::Optimal,
            objective: Some(0.0),
        })
        .solve(&square())
        .expect_err("no edges selected");
        assert_eq!(err.kind(), StatusTag::InconsistentSolution);
    }

    #[test]
    fn test_objective_mismatch_is_inconsistent() {
        let err = TspSolver::new(SkewedObjectiveEngine {
            reported: |v| v + 1.0,
        })
        .solve(&square())
        .expect_err("objective off by one");
        assert_eq!(err.kind(), StatusTag::InconsistentSolution);
    }

    #[test]
    fn test_non_finite_objective_is_inconsistent() {
        let reports: [fn(f64) -> f64; 3] =
            [|_| f64::NAN, |_| f64::INFINITY, |_| f64::NEG_INFINITY];
        for reported in reports {
            let err = TspSolver::new(SkewedObjectiveEngine { reported })
                .solve(&square())
                .expect_err("objective is not a number");
            assert_eq!(err.kind(), StatusTag::InconsistentSolution);
        }
    }

    #[test]
    fn test_extraction_uses_configured_tolerance() {
        let engine = NoisyValuesEngine { offset: 1e-4 };

        let err = TspSolver::new(&engine)
            .solve(&square())
            .expect_err("default tolerance rejects 1e-4 noise");
        assert_eq!(err.kind(), StatusTag::InconsistentSolution);

        let solution = TspSolver::new(&engine)
            .with_config(TspConfig::default().with_integrality_tolerance(1e-3))
            .solve(&square())
            .expect("loose tolerance accepts the same answer");
        assert!((solution.length - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_degree_only_relaxation_yields_subtours() {
        // two tight pairs far apart: the relaxation prefers 0 ⇄ 1 and 2 ⇄ 3
        let points: PointSet = [
            (0, (0.0, 0.0)),
            (1, (1.0, 0.0)),
            (2, (100.0, 0.0)),
            (3, (101.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let dm = DistanceMatrix::from_points(&points).expect("finite");

        let relaxed = ModelBuilder::new(&dm)
            .with_subtour_elimination(SubtourElimination::Disabled)
            .build()
            .expect("valid");
        let solution = BranchAndBound::new()
            .solve(relaxed.milp(), &SolveLimits::unlimited())
            .expect("valid model");
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!((solution.objective.expect("objective") - 4.0).abs() < 1e-6);
        let err = TourExtractor::new()
            .extract(&relaxed, &solution)
            .expect_err("two sub-cycles");
        assert_eq!(err.kind(), StatusTag::InconsistentSolution);

        let tour = TspSolver::default().solve(&points).expect("solvable");
        assert!((tour.length - 202.0).abs() < 1e-6);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_matches_brute_force(
            coords in prop::collection::vec((0u8..50, 0u8..50), 3..=6)
        ) {
            let points: PointSet = coords
                .iter()
                .enumerate()
                .map(|(id, &(x, y))| (id, (f64::from(x), f64::from(y))))
                .collect();
            let solution = TspSolver::default().solve(&points).expect("solvable");
            prop_assert!(solution.tour.is_permutation_of(points.ids()));
            prop_assert_eq!(solution.tour.len(), points.len());
            let expected = brute_force_length(&points);
            prop_assert!((solution.length - expected).abs() < 1e-6);
        }
    }
}
