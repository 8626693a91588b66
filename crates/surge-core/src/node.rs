//! Node records produced by deck expansion.

/// Role of a node's primary equation in the chain.
///
/// Shunt nodes balance currents against a conductance and capacitance to
/// ground; series nodes relate their voltage to the next node's through a
/// resistance and inductance. Block expansion alternates the two so the
/// assembled system stays pentadiagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// KCL carries shunt G and C to ground.
    ShuntRc,
    /// Voltage drop carries series R and L to the next node.
    SeriesRl,
}

/// Time-scheduled resistance of a switch element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Switch {
    /// Steps from `r_open` to `r_close` at `t_switch`.
    Instant {
        r_open: f64,
        r_close: f64,
        t_switch: f64,
    },
    /// Decays from `r_open + r_close` toward `r_close` with rate `k` once
    /// `t_switch` has passed.
    Exponential {
        r_open: f64,
        r_close: f64,
        k: f64,
        t_switch: f64,
    },
}

impl Switch {
    /// Resistance of the switch at time `t`.
    pub fn resistance(&self, t: f64) -> f64 {
        match *self {
            Switch::Instant {
                r_open,
                r_close,
                t_switch,
            } => {
                if t < t_switch {
                    r_open
                } else {
                    r_close
                }
            }
            Switch::Exponential {
                r_open,
                r_close,
                k,
                t_switch,
            } => r_close + r_open * (-k * (t - t_switch).max(0.0)).exp(),
        }
    }

    /// Resistance before the schedule starts, used to seed the node.
    pub fn initial_resistance(&self) -> f64 {
        match *self {
            Switch::Instant { r_open, .. } => r_open,
            Switch::Exponential { r_open, r_close, .. } => r_open + r_close,
        }
    }
}

/// One unknown pair `(V_i, I_i)` in the discretized chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Series resistance (ohms); meaningful on the voltage-drop row.
    pub r: f64,
    /// Series inductance (henries).
    pub l: f64,
    /// Shunt conductance (siemens); meaningful on the KCL row.
    pub g: f64,
    /// Shunt capacitance (farads).
    pub c: f64,
    /// Spacer emitted only to keep the shunt/series alternation.
    pub phantom: bool,
    /// Seed voltage applied to `V_i` before the first step.
    pub initial_v: Option<f64>,
    /// Present on switch elements; rewrites `r` ahead of each step.
    pub switch: Option<Switch>,
}

impl Node {
    /// A shunt node with conductance `g` and capacitance `c`.
    pub fn shunt(g: f64, c: f64) -> Self {
        Self {
            kind: NodeKind::ShuntRc,
            r: 0.0,
            l: 0.0,
            g,
            c,
            phantom: false,
            initial_v: None,
            switch: None,
        }
    }

    /// A series node with resistance `r` and inductance `l`.
    pub fn series(r: f64, l: f64) -> Self {
        Self {
            kind: NodeKind::SeriesRl,
            r,
            l,
            g: 0.0,
            c: 0.0,
            phantom: false,
            initial_v: None,
            switch: None,
        }
    }

    /// Mark the node as an alternation spacer.
    pub fn phantom(mut self) -> Self {
        self.phantom = true;
        self
    }

    /// Attach a switch schedule; seeds `r` with the pre-switch resistance.
    pub fn with_switch(mut self, switch: Switch) -> Self {
        self.r = switch.initial_resistance();
        self.switch = Some(switch);
        self
    }
}
