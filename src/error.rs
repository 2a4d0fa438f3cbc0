//! Error taxonomy for the AIG manager (spec §7).
//!
//! SAT-undecided and resource-exhausted outcomes are *not* represented here:
//! per §7 they are absorbed inside a pass and surface as statistics. Only the
//! two fatal categories and the caller-contract category become `Err`.

use thiserror::Error;

use crate::arena::NodeId;

/// Failure categories a caller of the manager can observe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AigError {
    /// A `check()` pass found a §3 invariant violated.
    #[error("structural invariant violated: {0}")]
    StructuralInvariant(String),

    /// Acyclicity check found a cycle; the path is reported node-id-major.
    #[error("cycle detected through node {culprit}: {path:?}")]
    CycleDetected {
        /// The node at which the in-progress marker was re-encountered.
        culprit: NodeId,
        /// The DFS stack at the point of detection, root-first.
        path: Vec<NodeId>,
    },

    /// A caller asked for something the data model forbids outright, e.g.
    /// constructing a `Latch` with a complemented fanin or passing a null
    /// edge where one is required.
    #[error("caller contract violation: {0}")]
    ContractViolation(String),
}

/// Convenience alias used throughout the crate.
pub type AigResult<T> = Result<T, AigError>;
