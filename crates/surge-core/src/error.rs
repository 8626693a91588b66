//! Topology error types for surge-core.

use thiserror::Error;

/// Violations of the branch layout rules detected while a circuit is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("branch call has no preceding block to anchor to")]
    AnchorMissing,

    #[error("topbranch needs two physical nodes in the preceding block")]
    PairMissing,

    #[error("endbranch may not anchor on the final block of the main branch")]
    EndbranchOnFinalBlock,

    #[error("{count} branch call(s) left unbound at end of deck")]
    UnboundBranch { count: usize },

    #[error("branch definition has no pending branch call to bind")]
    UnanchoredBranch,

    #[error("branch closed without emitting any nodes")]
    EmptyBranch,
}
