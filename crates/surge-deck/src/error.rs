//! Error types for surge-deck.

use surge_core::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: bad number `{token}`")]
    BadNumber { line: usize, token: String },

    #[error("line {line}: {command} is missing an argument")]
    MissingArgument { line: usize, command: String },

    #[error("line {line}: unknown switch kind `{token}`")]
    UnknownSwitchKind { line: usize, token: String },

    #[error("line {line}: unknown transmission line kind `{token}`")]
    UnknownLineKind { line: usize, token: String },

    #[error(
        "line {line}: transmission line needs a resolution; \
         set RESOLUTION-TIME or TRLINE-RESOLUTION"
    )]
    ResolutionUnset { line: usize },

    #[error("line {line}: {command} needs a preceding element block")]
    StatementBeforeBlock { line: usize, command: String },

    #[error("deck never sets TIME-STEP and END-TIME")]
    TimingUnset,

    #[error("line {line}: {source}")]
    Topology {
        line: usize,
        #[source]
        source: TopologyError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
