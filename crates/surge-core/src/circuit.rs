//! Compiled circuit: node list, blocks, branches, attachments, probes.

use crate::node::{Node, NodeKind};

/// Deck statement kind that emitted a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Rcg,
    Rls,
    Switch,
    TransmissionLine,
}

/// Contiguous node range emitted by one deck statement.
///
/// Blocks only exist to resolve later `INITIAL` and `TXT` statements and to
/// supply anchors for branch attachments.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub kind: BlockKind,
    /// First global node index of the block.
    pub first: usize,
    /// Last global node index of the block (inclusive).
    pub last: usize,
}

/// Contiguous span of global node indices forming one series chain.
///
/// Branch 0 is the main branch; later branches bind to earlier
/// `TOPBRANCH`/`ENDBRANCH` calls in call order and are laid out after their
/// parents in the global vector.
#[derive(Debug, Clone, Copy)]
pub struct Branch {
    pub first: usize,
    /// Inclusive.
    pub last: usize,
}

/// How a child branch hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachKind {
    /// Shunt the child at a single parent node.
    End { parent_node: usize },
    /// Hang the child across an adjacent pair of parent nodes.
    Top {
        parent_left: usize,
        parent_right: usize,
    },
}

/// Linkage between a parent branch anchor and a child branch's first node.
#[derive(Debug, Clone, Copy)]
pub struct Attachment {
    pub kind: AttachKind,
    pub parent_branch: usize,
    pub child_branch: usize,
}

/// What a probe samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Voltage,
    Current,
}

/// A registered output request.
#[derive(Debug, Clone)]
pub struct Probe {
    pub kind: ProbeKind,
    pub node: usize,
    pub label: String,
}

/// A compiled circuit ready for simulation.
///
/// Constructed by the deck compiler, consumed by the solver for the duration
/// of one run.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub nodes: Vec<Node>,
    pub blocks: Vec<Block>,
    pub branches: Vec<Branch>,
    pub attachments: Vec<Attachment>,
    pub probes: Vec<Probe>,
    /// Fixed timestep (s).
    pub dt: f64,
    /// Simulation end time (s).
    pub t_end: f64,
}

impl Circuit {
    /// Create an empty circuit with timing parameters.
    pub fn new(dt: f64, t_end: f64) -> Self {
        Self {
            dt,
            t_end,
            ..Default::default()
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Size of the assembled linear system (two unknowns per node).
    pub fn system_size(&self) -> usize {
        2 * self.nodes.len()
    }

    /// Number of fixed timesteps in a full run.
    pub fn steps(&self) -> usize {
        (self.t_end / self.dt).round() as usize
    }

    /// Row index of node `i`'s current-balance equation.
    ///
    /// Shunt nodes put the KCL at the even row and the voltage equation at
    /// the odd row; series nodes the reverse. The alternation keeps the
    /// non-zero pattern pentadiagonal.
    pub fn kcl_row(&self, i: usize) -> usize {
        match self.nodes[i].kind {
            NodeKind::ShuntRc => 2 * i,
            NodeKind::SeriesRl => 2 * i + 1,
        }
    }

    /// Row index of node `i`'s voltage equation.
    pub fn voltage_row(&self, i: usize) -> usize {
        match self.nodes[i].kind {
            NodeKind::ShuntRc => 2 * i + 1,
            NodeKind::SeriesRl => 2 * i,
        }
    }

    /// Index of the branch containing global node `i`.
    pub fn branch_of(&self, i: usize) -> usize {
        self.branches
            .iter()
            .position(|b| b.first <= i && i <= b.last)
            .unwrap_or(0)
    }

    /// Local index of global node `i` within its branch.
    pub fn local_index(&self, i: usize) -> usize {
        i - self.branches[self.branch_of(i)].first
    }

    /// Whether node `i` terminates a branch.
    pub fn is_branch_last(&self, i: usize) -> bool {
        self.branches.iter().any(|b| b.last == i)
    }

    /// Look up a probe by its deduplicated label.
    pub fn probe(&self, label: &str) -> Option<&Probe> {
        self.probes.iter().find(|p| p.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn two_branch_circuit() -> Circuit {
        let mut c = Circuit::new(1e-9, 1e-6);
        for _ in 0..2 {
            c.nodes.push(Node::shunt(1.0, 1e-9));
            c.nodes.push(Node::series(1e-7, 1e-11).phantom());
        }
        c.branches.push(Branch { first: 0, last: 1 });
        c.branches.push(Branch { first: 2, last: 3 });
        c
    }

    #[test]
    fn test_row_placement() {
        let c = two_branch_circuit();
        // Shunt node: KCL on the even row.
        assert_eq!(c.kcl_row(0), 0);
        assert_eq!(c.voltage_row(0), 1);
        // Series node: KCL on the odd row.
        assert_eq!(c.kcl_row(1), 3);
        assert_eq!(c.voltage_row(1), 2);
    }

    #[test]
    fn test_branch_lookup() {
        let c = two_branch_circuit();
        assert_eq!(c.branch_of(0), 0);
        assert_eq!(c.branch_of(3), 1);
        assert_eq!(c.local_index(3), 1);
        assert!(c.is_branch_last(1));
        assert!(c.is_branch_last(3));
        assert!(!c.is_branch_last(2));
    }

    #[test]
    fn test_steps_rounding() {
        let c = Circuit::new(1e-8, 5e-6);
        assert_eq!(c.steps(), 500);
    }
}
