//! Generic mixed-integer linear model.

use crate::error::{Error, Result};

/// Handle to a variable inside a [`MilpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in [`MilpModel::variables`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// Integrality class of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Integer in `{0, 1}`.
    Binary,
    /// Integer within the variable's bounds.
    Integer,
    /// Real within the variable's bounds.
    Continuous,
}

impl VarKind {
    pub fn is_integral(self) -> bool {
        !matches!(self, VarKind::Continuous)
    }
}

/// A decision variable.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Variable name (unique identifier within a model).
    pub name: String,
    pub kind: VarKind,
    /// Lower bound; may be `-inf` for continuous and integer variables.
    pub lower: f64,
    /// Upper bound; may be `+inf` for continuous and integer variables.
    pub upper: f64,
    /// Coefficient in the objective function.
    pub objective: f64,
}

/// A sparse linear combination of variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `coeff * var`.
    pub fn add(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, var: VarId, coeff: f64) -> Self {
        self.add(var, coeff);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Evaluates the expression against a full assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.0]).sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

/// A named linear constraint `expr <cmp> rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl Constraint {
    /// Returns `true` if the assignment satisfies this constraint within `tol`.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::Le => lhs <= self.rhs + tol,
            Comparison::Ge => lhs >= self.rhs - tol,
            Comparison::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// Optimisation direction of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// A mixed-integer linear program.
///
/// The objective is the linear form given by each variable's `objective`
/// coefficient.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::milp::{Comparison, Direction, LinearExpr, MilpModel};
///
/// let mut model = MilpModel::new("example", Direction::Maximize);
/// let a = model.add_binary("a", 3.0);
/// let b = model.add_binary("b", 2.0);
/// let row = LinearExpr::new().with(a, 1.0).with(b, 1.0);
/// model.add_constraint("pick_one", row, Comparison::Le, 1.0);
/// assert!(model.validate().is_ok());
/// assert_eq!(model.num_variables(), 2);
/// assert!(model.is_feasible(&[1.0, 0.0], 1e-9));
/// assert!(!model.is_feasible(&[1.0, 1.0], 1e-9));
/// ```
#[derive(Debug, Clone)]
pub struct MilpModel {
    /// Model name.
    pub name: String,
    pub direction: Direction,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
}

impl MilpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Adds a variable and returns its handle.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        (lower, upper): (f64, f64),
        objective: f64,
    ) -> VarId {
        let (lower, upper) = match kind {
            VarKind::Binary => (0.0, 1.0),
            _ => (lower, upper),
        };
        self.variables.push(Variable {
            name: name.into(),
            kind,
            lower,
            upper,
            objective,
        });
        VarId(self.variables.len() - 1)
    }

    /// Adds a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>, objective: f64) -> VarId {
        self.add_variable(name, VarKind::Binary, (0.0, 1.0), objective)
    }

    /// Adds a continuous variable with bounds `[lower, upper]`.
    pub fn add_continuous(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        objective: f64,
    ) -> VarId {
        self.add_variable(name, VarKind::Continuous, (lower, upper), objective)
    }

    /// Adds a constraint.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Handles of all variables with an integrality requirement.
    pub fn integral_variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.kind.is_integral())
            .map(|(i, _)| VarId(i))
    }

    /// Objective value of a full assignment.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(v, x)| v.objective * x)
            .sum()
    }

    /// Checks bounds, integrality and every constraint against `values`.
    pub fn is_feasible(&self, values: &[f64], tol: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let within_domain = self.variables.iter().zip(values).all(|(v, &x)| {
            x >= v.lower - tol
                && x <= v.upper + tol
                && (!v.kind.is_integral() || (x - x.round()).abs() <= tol)
        });
        within_domain && self.constraints.iter().all(|c| c.is_satisfied(values, tol))
    }

    /// Validates the model for consistency.
    ///
    /// Checks finite coefficients, ordered bounds and that every constraint
    /// references existing variables.
    pub fn validate(&self) -> Result<()> {
        for v in &self.variables {
            if v.lower.is_nan() || v.upper.is_nan() || v.lower > v.upper {
                return Err(Error::invalid_model(format!(
                    "variable {} has invalid bounds [{}, {}]",
                    v.name, v.lower, v.upper
                )));
            }
            if !v.objective.is_finite() {
                return Err(Error::invalid_model(format!(
                    "variable {} has non-finite objective coefficient",
                    v.name
                )));
            }
        }
        for c in &self.constraints {
            if !c.rhs.is_finite() {
                return Err(Error::invalid_model(format!(
                    "constraint {} has non-finite right-hand side",
                    c.name
                )));
            }
            for &(var, coeff) in c.expr.terms() {
                if var.0 >= self.variables.len() {
                    return Err(Error::invalid_model(format!(
                        "constraint {} references undefined variable #{}",
                        c.name, var.0
                    )));
                }
                if !coeff.is_finite() {
                    return Err(Error::invalid_model(format!(
                        "constraint {} has non-finite coefficient",
                        c.name
                    )));
                }
            }
        }
        Ok(())
    }
}
