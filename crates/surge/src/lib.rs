//! # Surge
//!
//! A pulsed-power transient circuit simulator written in Rust.
//!
//! Surge compiles a small input deck of lumped R/L/C elements, time-switched
//! resistors, and discretized lossless transmission lines into a chain of
//! voltage/current nodes, then steps a theta-weighted implicit scheme over a
//! fixed timestep grid. Series circuits solve through a pentadiagonal
//! elimination; branched circuits fall back to a dense LU.
//!
//! ## Quick start
//!
//! ```rust
//! use surge::prelude::*;
//!
//! let deck = "TIME-STEP 1e-8\nEND-TIME 1e-6\nBRANCH\n\
//!             RCG 1 100e-9\nINITIAL VC1 100\nTXT VC1\n";
//!
//! let circuit = surge::compile(deck).unwrap();
//! let mut solver = Solver::new(circuit);
//! let table = solver.run().unwrap();
//!
//! // 100 steps plus the explicit t = 0 record.
//! assert_eq!(table.len(), 101);
//! let trace = table.column("VC1").unwrap();
//! assert_eq!(trace[0], 100.0);
//! assert!(trace[100] < 1.0);
//! ```

// Re-export the layer crates.
pub use surge_core as core;
pub use surge_deck as deck;
pub use surge_solver as solver;

// Convenient re-exports from surge_core.
pub use surge_core::{
    AttachKind, Attachment, BandSystem, Block, BlockKind, Branch, Circuit, Node, NodeKind, Probe,
    ProbeKind, StateVectors, Switch, TopologyError,
};

// Convenient re-exports from surge_deck.
pub use surge_deck::{compile, parse_value, Error as CompileError};

// Convenient re-exports from surge_solver.
pub use surge_solver::{Error as SolveError, Solver, TraceTable, PIVOT_FLOOR, THETA};

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Prelude module containing commonly used types.
///
/// ```rust
/// use surge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{compile, Circuit, Node, NodeKind, Probe, ProbeKind, Solver, TraceTable};
}
