//! Crate-level error type.

use std::time::Duration;

use thiserror::Error as ThisError;

/// Coarse classification of a failed solve, suitable for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTag {
    Infeasible,
    Unbounded,
    TimedOut,
    DegenerateInput,
    InvalidInput,
    InconsistentSolution,
    InvalidModel,
}

#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed input, rejected before any model is built.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Too few nodes for an integer program to be meaningful.
    #[error("degenerate input: {nodes} node(s), at least 3 are required to build a tour model")]
    DegenerateInput { nodes: usize },

    #[error("model is infeasible: {0}")]
    Infeasible(String),

    #[error("model is unbounded: {0}")]
    Unbounded(String),

    /// The engine exhausted its time or node budget before proving optimality.
    #[error(
        "solve timed out after {nodes_explored} node(s) in {elapsed:?}{}",
        best_known_suffix(.best_objective)
    )]
    TimedOut {
        nodes_explored: usize,
        elapsed: Duration,
        best_objective: Option<f64>,
    },

    /// The engine's answer does not describe a single Hamiltonian cycle.
    #[error("inconsistent solution: {0}")]
    InconsistentSolution(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

fn best_known_suffix(best: &Option<f64>) -> String {
    match best {
        Some(v) => format!(", best known objective {v}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentSolution(message.into())
    }

    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel(message.into())
    }

    /// Status tag for this error.
    pub fn kind(&self) -> StatusTag {
        match self {
            Self::InvalidInput(_) => StatusTag::InvalidInput,
            Self::DegenerateInput { .. } => StatusTag::DegenerateInput,
            Self::Infeasible(_) => StatusTag::Infeasible,
            Self::Unbounded(_) => StatusTag::Unbounded,
            Self::TimedOut { .. } => StatusTag::TimedOut,
            Self::InconsistentSolution(_) => StatusTag::InconsistentSolution,
            Self::InvalidModel(_) => StatusTag::InvalidModel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::invalid_input("x").kind(), StatusTag::InvalidInput);
        assert_eq!(
            Error::DegenerateInput { nodes: 2 }.kind(),
            StatusTag::DegenerateInput
        );
        assert_eq!(Error::inconsistent("x").kind(), StatusTag::InconsistentSolution);
        assert_eq!(Error::invalid_model("x").kind(), StatusTag::InvalidModel);
    }

    #[test]
    fn test_timed_out_message() {
        let e = Error::TimedOut {
            nodes_explored: 7,
            elapsed: Duration::from_millis(5),
            best_objective: Some(12.5),
        };
        let msg = e.to_string();
        assert!(msg.contains("7 node(s)"));
        assert!(msg.contains("12.5"));

        let e = Error::TimedOut {
            nodes_explored: 0,
            elapsed: Duration::ZERO,
            best_objective: None,
        };
        assert!(!e.to_string().contains("best known"));
    }
}
