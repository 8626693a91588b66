//! Core circuit representation and matrix storage for Surge.
//!
//! This crate provides the data structures shared by the deck compiler and
//! the transient solver:
//!
//! - [`Node`] - one voltage/current unknown pair in the discretized chain
//! - [`Circuit`] - the compiled node list with blocks, branches, attachments
//!   and probe registrations
//! - [`BandSystem`](system::BandSystem) - pentadiagonal coefficient storage
//!   plus a sparse edit log for branch couplings
//! - [`StateVectors`](state::StateVectors) - the double-buffered V/I state
//!
//! # The node chain
//!
//! A deck statement expands into two or more nodes that alternate between
//! shunt (conductance and capacitance to ground) and series (resistance and
//! inductance to the next node) roles. Each node carries two unknowns, its
//! voltage `V_i` and the current `I_i` it passes to node `i + 1`. Phantom
//! nodes keep the alternation intact where a statement only contributes one
//! real element; they carry near-zero values and are floored during
//! elimination rather than optimized away.
//!
//! # Example: inspecting a circuit
//!
//! ```rust
//! use surge_core::{Circuit, Node, NodeKind};
//!
//! let mut circuit = Circuit::new(1e-9, 1e-6);
//! circuit.nodes.push(Node::shunt(1.0, 1e-9));
//! circuit.nodes.push(Node::series(1e-7, 1e-11).phantom());
//!
//! assert_eq!(circuit.node_count(), 2);
//! assert_eq!(circuit.system_size(), 4);
//! assert_eq!(circuit.nodes[0].kind, NodeKind::ShuntRc);
//! ```

pub mod circuit;
pub mod error;
pub mod node;
pub mod state;
pub mod system;

pub use circuit::{AttachKind, Attachment, Block, BlockKind, Branch, Circuit, Probe, ProbeKind};
pub use error::TopologyError;
pub use node::{Node, NodeKind, Switch};
pub use state::StateVectors;
pub use system::{BandSystem, SparseEdit};
