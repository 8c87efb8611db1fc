//! Error Submodule (of Reconciliation)
//!
//! Structural problems with the input (malformed trees, an incomplete leaf
//! mapping, bad cost ranges, unreadable input text) stop a run. An
//! infeasible assignment is not an error: it is a [`CostVector`] value.
//!
//! [`CostVector`]: crate::reconciliation::CostVector
use thiserror::Error;

/// Errors surfaced by tree construction, input loading and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The tree is not a strict binary tree (asymmetric children, unknown
    /// or duplicated edges, cycles, unreachable edges), or an edge id does
    /// not belong to the tree.
    #[error("invalid tree at edge `{edge}`: {reason}")]
    InvalidTree { edge: String, reason: String },

    /// A parasite tip has no host tip in the leaf mapping.
    #[error("parasite tip `{tip}` is missing from the leaf mapping")]
    IncompleteMapping { tip: String },

    #[error("invalid cost range: {0}")]
    InvalidCostRange(String),

    /// The input text could not be read as trees plus mapping.
    #[error("parse error: {0}")]
    Parse(String),

    /// The engine evaluated more table entries than it was allowed to.
    #[error("step budget of {limit} table evaluations exhausted")]
    BudgetExhausted { limit: u64 },
}

impl ReconcileError {
    pub(crate) fn invalid_tree(edge: &str, reason: impl Into<String>) -> Self {
        ReconcileError::InvalidTree {
            edge: edge.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the reconciliation module.
pub type Result<T> = std::result::Result<T, ReconcileError>;
