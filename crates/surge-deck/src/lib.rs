//! Input deck compiler for Surge.
//!
//! A deck is plain text, one statement per line, whitespace-delimited,
//! case-insensitive, with `!` comment lines:
//!
//! ```text
//! ! RC discharge
//! TIME-STEP 1e-8
//! END-TIME 5e-6
//! BRANCH
//! RCG 1 100n
//! INITIAL VC1 100
//! TXT VC1
//! ```
//!
//! [`compile`] expands each element statement into its node chain, resolves
//! branch calls to anchors, records initial conditions and probe requests,
//! and returns a [`Circuit`](surge_core::Circuit) ready for the solver.
//! Errors carry the offending line number and token.
//!
//! ```rust
//! let circuit = surge_deck::compile(
//!     "TIME-STEP 1e-8\nEND-TIME 5e-6\nBRANCH\nRCG 1 100n\nINITIAL VC1 100\n",
//! )
//! .unwrap();
//! assert_eq!(circuit.node_count(), 2);
//! assert_eq!(circuit.nodes[0].initial_v, Some(100.0));
//! ```

pub mod blocks;
pub mod compiler;
pub mod error;
pub mod value;

pub use compiler::compile;
pub use error::{Error, Result};
pub use value::parse_value;
