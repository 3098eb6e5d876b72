//! Solver configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::milp::SolveLimits;

/// Configuration for [`TspSolver`](super::TspSolver).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_tsp_exact::solver::TspConfig;
///
/// let config = TspConfig::default()
///     .with_time_limit(Duration::from_secs(30))
///     .with_node_limit(100_000);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.limits().node_limit, Some(100_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TspConfig {
    /// Wall-clock budget for the engine in milliseconds. `None` = unlimited.
    pub time_limit_ms: Option<u64>,

    /// Branch-and-bound node budget. `None` = unlimited.
    pub node_limit: Option<usize>,

    /// How far an edge value in the engine's answer may sit from 0 or 1.
    pub integrality_tolerance: f64,

    /// Relative tolerance when comparing the recomputed tour length with the
    /// engine's objective (scaled by `max(1, |objective|)`).
    pub objective_tolerance: f64,
}

impl Default for TspConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            node_limit: None,
            integrality_tolerance: 1e-6,
            objective_tolerance: 1e-6,
        }
    }
}

impl TspConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_node_limit(mut self, n: usize) -> Self {
        self.node_limit = Some(n);
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn with_objective_tolerance(mut self, tol: f64) -> Self {
        self.objective_tolerance = tol;
        self
    }

    /// Engine limits derived from this configuration.
    pub fn limits(&self) -> SolveLimits {
        SolveLimits {
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            node_limit: self.node_limit,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.integrality_tolerance > 0.0 && self.integrality_tolerance < 0.5) {
            return Err(format!(
                "integrality_tolerance must be in (0, 0.5), got {}",
                self.integrality_tolerance
            ));
        }
        if !(self.objective_tolerance > 0.0 && self.objective_tolerance.is_finite()) {
            return Err(format!(
                "objective_tolerance must be finite and positive, got {}",
                self.objective_tolerance
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TspConfig::default();
        assert!(config.time_limit_ms.is_none());
        assert!(config.node_limit.is_none());
        assert_eq!(config.limits(), SolveLimits::unlimited());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_limits_conversion() {
        let limits = TspConfig::default()
            .with_time_limit_ms(250)
            .with_node_limit(10)
            .limits();
        assert_eq!(limits.time_limit, Some(Duration::from_millis(250)));
        assert_eq!(limits.node_limit, Some(10));
    }

    #[test]
    fn test_validate_bad_tolerance() {
        assert!(TspConfig::default()
            .with_objective_tolerance(0.0)
            .validate()
            .is_err());
        assert!(TspConfig::default()
            .with_objective_tolerance(f64::NAN)
            .validate()
            .is_err());
        assert!(TspConfig::default()
            .with_integrality_tolerance(0.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: TspConfig =
            serde_json::from_str(r#"{ "time_limit_ms": 5000 }"#).expect("valid json");
        assert_eq!(config.time_limit_ms, Some(5000));
        assert!(config.node_limit.is_none());
        assert!((config.objective_tolerance - 1e-6).abs() < 1e-15);
        assert!((config.integrality_tolerance - 1e-6).abs() < 1e-15);
    }
}
