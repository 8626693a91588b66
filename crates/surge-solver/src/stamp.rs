//! Per-step stamping of the theta-method stencil.
//!
//! Each node contributes one current-balance row and one voltage row. With
//! the implicit weight `θ` and coefficients `AV = θG + C/dt`,
//! `AI = θR + L/dt`, node `i` stamps:
//!
//! - KCL row: `AV` at column `2i`, `+θ` at `2i+1`, `-θ` at `2i-1`;
//!   RHS `(1-θ)(I_{i-1} - I_i) + (C/dt - (1-θ)G) V_i`, old values.
//! - Voltage row: `+θ` at `2i`, `-AI` at `2i+1`, `-θ` at `2i+2`;
//!   RHS `(1-θ)(V_{i+1} - V_i) - (L/dt - (1-θ)R) I_i`, old values.
//!
//! The last node of every branch gets the terminal row `I_i = 0` instead of
//! a voltage drop, so a branch never pushes current past its end. Attachment
//! edits go through the sparse log after the base pass.

use surge_core::{AttachKind, BandSystem, Circuit, StateVectors};

/// Implicit weight of the integrator. 0.5 is trapezoidal; the default leans
/// slightly past it for mild numerical damping.
pub const THETA: f64 = 0.55;

/// Magnitude below which a pivot is replaced by `sign * PIVOT_FLOOR`.
pub const PIVOT_FLOOR: f64 = 1e-25;

/// Stamp every node's two rows into the cleared band storage.
pub fn stamp_nodes(sys: &mut BandSystem, circuit: &Circuit, state: &StateVectors, theta: f64) {
    let dt = circuit.dt;
    for (i, node) in circuit.nodes.iter().enumerate() {
        let av = theta * node.g + node.c / dt;
        let ai = theta * node.r + node.l / dt;
        let r_kcl = circuit.kcl_row(i);
        let r_volt = circuit.voltage_row(i);

        sys.add(r_kcl, 2 * i, av);
        sys.add(r_kcl, 2 * i + 1, theta);
        let i_prev_old = if i > 0 {
            sys.add(r_kcl, 2 * i - 1, -theta);
            state.i_old[i - 1]
        } else {
            0.0
        };
        sys.b[r_kcl] += (1.0 - theta) * (i_prev_old - state.i_old[i])
            + (node.c / dt - (1.0 - theta) * node.g) * state.v_old[i];

        if i + 1 == circuit.nodes.len() || circuit.is_branch_last(i) {
            sys.add(r_volt, 2 * i + 1, 1.0);
        } else {
            sys.add(r_volt, 2 * i, theta);
            sys.add(r_volt, 2 * i + 1, -ai);
            sys.add(r_volt, 2 * i + 2, -theta);
            sys.b[r_volt] += (1.0 - theta) * (state.v_old[i + 1] - state.v_old[i])
                - (node.l / dt - (1.0 - theta) * node.r) * state.i_old[i];
        }
    }
}

/// Apply branch couplings and constraint-row overwrites.
///
/// The child's first current enters the anchor KCL rows with the same `θ`
/// weight the base stencil uses for current differences, matched by a
/// history term on the RHS. The child's first KCL row becomes a voltage
/// constraint tying it to the anchor: continuity for an end attachment, the
/// anchor-pair difference for a top attachment.
pub fn stamp_attachments(
    sys: &mut BandSystem,
    circuit: &Circuit,
    state: &StateVectors,
    theta: f64,
) {
    for att in &circuit.attachments {
        let child_first = circuit.branches[att.child_branch].first;
        let child_kcl = circuit.kcl_row(child_first);
        let current_col = 2 * child_first + 1;
        let i_child_old = state.i_old[child_first];

        sys.zero_row(child_kcl);
        sys.push_edit(child_kcl, 2 * child_first, 1.0);

        match att.kind {
            AttachKind::End { parent_node } => {
                let row = circuit.kcl_row(parent_node);
                sys.push_edit(row, current_col, theta);
                sys.b[row] -= (1.0 - theta) * i_child_old;

                sys.push_edit(child_kcl, 2 * parent_node, -1.0);
            }
            AttachKind::Top {
                parent_left,
                parent_right,
            } => {
                let row_l = circuit.kcl_row(parent_left);
                let row_r = circuit.kcl_row(parent_right);
                sys.push_edit(row_l, current_col, theta);
                sys.b[row_l] -= (1.0 - theta) * i_child_old;
                sys.push_edit(row_r, current_col, -theta);
                sys.b[row_r] += (1.0 - theta) * i_child_old;

                sys.push_edit(child_kcl, 2 * parent_left, -1.0);
                sys.push_edit(child_kcl, 2 * parent_right, 1.0);
            }
        }
    }
}
