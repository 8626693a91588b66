//! Error types for surge-solver.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The system stayed singular after diagonal flooring. Indices are the
    /// branch id and the node's local index within that branch.
    #[error("singular system at branch {branch}, node {node}")]
    Singular { branch: usize, node: usize },

    /// A solve produced NaN or infinity.
    #[error("non-finite solution at branch {branch}, node {node}")]
    NonFinite { branch: usize, node: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
