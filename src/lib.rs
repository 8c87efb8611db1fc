//! Costscape
//!
//! Computes the Pareto-optimal event-count vectors of untimed host-parasite
//! tree reconciliations, over whole ranges of switch and loss costs.
//!
//! See [`reconciliation`] for the tree types and the entry points.
pub mod reconciliation;
