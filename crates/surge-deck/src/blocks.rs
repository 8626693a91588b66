//! Element statement expansion into node chains.
//!
//! Every statement emits nodes in shunt/series alternation. Where a statement
//! only contributes one real element, a phantom partner with documented
//! parasitic values keeps the alternation intact. The parasitics are design
//! constants, not tunables; the solver's pivot floor depends on them staying
//! small but finite.

use surge_core::{Node, Switch};

/// Series resistance of a phantom spacer after a shunt element.
pub const PHANTOM_SERIES_R: f64 = 1e-7;
/// Series inductance of a phantom spacer after a shunt element.
pub const PHANTOM_SERIES_L: f64 = 1e-11;
/// Parasitic inductance carried by every switch element.
pub const SWITCH_SERIES_L: f64 = 1e-9;
/// Conductance standing in for a user-specified 0-ohm shunt.
pub const SHORT_CIRCUIT_G: f64 = 1e9;
/// Leak conductance on a transmission line segment's phantom shunt.
pub const LINE_SHUNT_G: f64 = 1e-9;

/// `RCG <R> [C]`: a real shunt followed by a phantom series spacer.
pub fn expand_rcg(r: f64, c: f64) -> Vec<Node> {
    let g = if r == 0.0 { SHORT_CIRCUIT_G } else { 1.0 / r };
    vec![
        Node::shunt(g, c),
        Node::series(PHANTOM_SERIES_R, PHANTOM_SERIES_L).phantom(),
    ]
}

/// `RLS <R> [L]`: a phantom shunt spacer followed by a real series element.
pub fn expand_rls(r: f64, l: f64) -> Vec<Node> {
    vec![Node::shunt(0.0, 0.0).phantom(), Node::series(r, l)]
}

/// `SWITCH ...`: like `RLS`, with the series element on a schedule.
pub fn expand_switch(switch: Switch) -> Vec<Node> {
    vec![
        Node::shunt(0.0, 0.0).phantom(),
        Node::series(0.0, SWITCH_SERIES_L).with_switch(switch),
    ]
}

/// Segment count for a transmission line of the given delay and resolution.
pub fn line_segments(delay: f64, resolution: f64) -> usize {
    ((delay / resolution).round() as usize).max(1)
}

/// `TRL LINEAR <delay> <Z>`: `segments` lossless LC sections.
///
/// Each section contributes four nodes: the shunt capacitance, a phantom
/// series spacer, a phantom leak shunt, and the series inductance.
pub fn expand_line(delay: f64, z: f64, segments: usize) -> Vec<Node> {
    let c = (delay / z) / segments as f64;
    let l = (z * delay) / segments as f64;
    let mut nodes = Vec::with_capacity(4 * segments);
    for _ in 0..segments {
        nodes.push(Node::shunt(0.0, c));
        nodes.push(Node::series(PHANTOM_SERIES_R, 0.0).phantom());
        nodes.push(Node::shunt(LINE_SHUNT_G, 0.0).phantom());
        nodes.push(Node::series(0.0, l));
    }
    nodes
}
