//! Transient solver for Surge.
//!
//! Each fixed timestep: rewrite switch resistances, stamp the theta-method
//! stencil into the banded storage, apply branch-coupling edits, solve, and
//! rotate the state buffers. Series circuits go through a pentadiagonal
//! elimination in O(N); circuits with branch attachments expand the band
//! plus edit list into a dense matrix and use LU with partial pivoting.
//!
//! # Example
//!
//! ```rust
//! use surge_core::{Branch, Circuit, Node, Probe, ProbeKind};
//! use surge_solver::Solver;
//!
//! // A 1 ohm / 100 nF shunt discharging from 100 V.
//! let mut circuit = Circuit::new(1e-8, 1e-6);
//! let mut cap = Node::shunt(1.0, 100e-9);
//! cap.initial_v = Some(100.0);
//! circuit.nodes.push(cap);
//! let mut spacer = Node::series(1e-7, 1e-11).phantom();
//! spacer.initial_v = Some(100.0);
//! circuit.nodes.push(spacer);
//! circuit.branches.push(Branch { first: 0, last: 1 });
//! circuit.probes.push(Probe {
//!     kind: ProbeKind::Voltage,
//!     node: 0,
//!     label: "VC1".into(),
//! });
//!
//! let mut solver = Solver::new(circuit);
//! let table = solver.run().unwrap();
//! let trace = table.column("VC1").unwrap();
//! assert!(trace[trace.len() - 1] < trace[0]);
//! ```

pub mod banded;
pub mod error;
pub mod linear;
pub mod stamp;
pub mod transient;

pub use error::{Error, Result};
pub use stamp::{PIVOT_FLOOR, THETA};
pub use transient::{Solver, TraceTable};
