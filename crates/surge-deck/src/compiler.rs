//! Line-by-line deck compilation.

use std::collections::{HashMap, VecDeque};

use surge_core::{
    AttachKind, Attachment, Block, BlockKind, Branch, Circuit, Node, NodeKind, Probe, ProbeKind,
    Switch, TopologyError,
};

use crate::blocks;
use crate::error::{Error, Result};
use crate::value::parse_value;

/// Compile a deck into a [`Circuit`].
///
/// Statements are processed strictly in order; unknown commands are skipped
/// for forward compatibility. Branch calls (`TOPBRANCH`/`ENDBRANCH`) queue up
/// and bind, first-in first-out, to subsequent `BRANCH` definitions, so child
/// branches always land after their parents in the global node vector.
pub fn compile(text: &str) -> Result<Circuit> {
    let mut compiler = Compiler::default();
    let mut last_line = 0;
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        last_line = line;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('!') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        compiler.statement(line, &tokens)?;
    }
    compiler.finish(last_line)
}

/// A `TOPBRANCH`/`ENDBRANCH` call waiting for its `BRANCH` definition.
struct PendingCall {
    kind: AttachKind,
    parent_branch: usize,
}

#[derive(Default)]
struct Compiler {
    dt: f64,
    t_end: f64,
    resolution: Option<f64>,
    line_resolution: Option<f64>,
    nodes: Vec<Node>,
    blocks: Vec<Block>,
    branches: Vec<Branch>,
    /// Final block index of each closed branch.
    branch_last_block: Vec<usize>,
    branch_open: bool,
    branch_first_node: usize,
    branch_first_block: usize,
    pending: VecDeque<PendingCall>,
    attachments: Vec<Attachment>,
    probes: Vec<Probe>,
    label_counts: HashMap<String, usize>,
}

impl Compiler {
    fn statement(&mut self, line: usize, tokens: &[&str]) -> Result<()> {
        let command = tokens[0].to_uppercase();
        match command.as_str() {
            "TIME-STEP" => self.dt = self.num(line, &command, tokens, 1)?,
            "END-TIME" => self.t_end = self.num(line, &command, tokens, 1)?,
            "RESOLUTION-TIME" => self.resolution = Some(self.num(line, &command, tokens, 1)?),
            "TRLINE-RESOLUTION" => {
                self.line_resolution = Some(self.num(line, &command, tokens, 1)?)
            }
            "BRANCH" => self.begin_branch(line)?,
            "RCG" => {
                let r = self.num(line, &command, tokens, 1)?;
                let c = self.opt_num(line, tokens, 2)?.unwrap_or(0.0);
                self.emit(BlockKind::Rcg, blocks::expand_rcg(r, c));
            }
            "RLS" => {
                let r = self.num(line, &command, tokens, 1)?;
                let l = self.opt_num(line, tokens, 2)?.unwrap_or(0.0);
                self.emit(BlockKind::Rls, blocks::expand_rls(r, l));
            }
            "SWITCH" => {
                let switch = self.parse_switch(line, &command, tokens)?;
                self.emit(BlockKind::Switch, blocks::expand_switch(switch));
            }
            "TRL" => {
                let kind = tokens.get(1).copied().unwrap_or("");
                if !kind.eq_ignore_ascii_case("LINEAR") {
                    return Err(Error::UnknownLineKind {
                        line,
                        token: kind.to_string(),
                    });
                }
                let delay = self.num(line, &command, tokens, 2)?;
                let z = self.num(line, &command, tokens, 3)?;
                let res = self
                    .opt_num(line, tokens, 4)?
                    .or(self.line_resolution)
                    .or(self.resolution.map(|r| r / 2.0))
                    .ok_or(Error::ResolutionUnset { line })?;
                let segments = blocks::line_segments(delay, res);
                self.emit(
                    BlockKind::TransmissionLine,
                    blocks::expand_line(delay, z, segments),
                );
            }
            "TOPBRANCH" => self.branch_call(line, true)?,
            "ENDBRANCH" => self.branch_call(line, false)?,
            "INITIAL" => {
                let v = self.num(line, &command, tokens, 2)?;
                self.apply_initial(line, v)?;
            }
            "TXT" => {
                let label = *tokens.get(1).ok_or_else(|| Error::MissingArgument {
                    line,
                    command: command.clone(),
                })?;
                self.register_probe(line, label)?;
            }
            // Unknown commands are ignored so older decks keep compiling
            // against newer engines and vice versa.
            _ => {}
        }
        Ok(())
    }

    fn num(&self, line: usize, command: &str, tokens: &[&str], idx: usize) -> Result<f64> {
        let token = tokens.get(idx).ok_or_else(|| Error::MissingArgument {
            line,
            command: command.to_string(),
        })?;
        parse_value(token).ok_or_else(|| Error::BadNumber {
            line,
            token: token.to_string(),
        })
    }

    fn opt_num(&self, line: usize, tokens: &[&str], idx: usize) -> Result<Option<f64>> {
        match tokens.get(idx) {
            None => Ok(None),
            Some(token) => parse_value(token)
                .map(Some)
                .ok_or_else(|| Error::BadNumber {
                    line,
                    token: token.to_string(),
                }),
        }
    }

    fn parse_switch(&self, line: usize, command: &str, tokens: &[&str]) -> Result<Switch> {
        let kind = tokens.get(1).copied().unwrap_or("");
        if kind.eq_ignore_ascii_case("INSTANT") {
            Ok(Switch::Instant {
                r_open: self.num(line, command, tokens, 2)?,
                r_close: self.num(line, command, tokens, 3)?,
                t_switch: self.num(line, command, tokens, 4)?,
            })
        } else if kind.eq_ignore_ascii_case("EXPONENTIAL") {
            Ok(Switch::Exponential {
                r_open: self.num(line, command, tokens, 2)?,
                r_close: self.num(line, command, tokens, 3)?,
                k: self.num(line, command, tokens, 4)?,
                t_switch: self.num(line, command, tokens, 5)?,
            })
        } else {
            Err(Error::UnknownSwitchKind {
                line,
                token: kind.to_string(),
            })
        }
    }

    /// Index of the branch currently being laid out.
    fn current_branch(&self) -> usize {
        self.branches.len()
    }

    fn open_branch(&mut self) {
        self.branch_open = true;
        self.branch_first_node = self.nodes.len();
        self.branch_first_block = self.blocks.len();
    }

    fn close_branch(&mut self, line: usize) -> Result<()> {
        if self.nodes.len() == self.branch_first_node {
            return Err(Error::Topology {
                line,
                source: TopologyError::EmptyBranch,
            });
        }
        self.branches.push(Branch {
            first: self.branch_first_node,
            last: self.nodes.len() - 1,
        });
        self.branch_last_block.push(self.blocks.len() - 1);
        self.branch_open = false;
        Ok(())
    }

    fn begin_branch(&mut self, line: usize) -> Result<()> {
        if !self.branch_open && self.branches.is_empty() {
            self.open_branch();
            return Ok(());
        }
        self.close_branch(line)?;
        let call = self.pending.pop_front().ok_or(Error::Topology {
            line,
            source: TopologyError::UnanchoredBranch,
        })?;
        self.attachments.push(Attachment {
            kind: call.kind,
            parent_branch: call.parent_branch,
            child_branch: self.current_branch(),
        });
        self.open_branch();
        Ok(())
    }

    /// Append an element block, implicitly opening the main branch if the
    /// deck never issued a leading `BRANCH`.
    fn emit(&mut self, kind: BlockKind, nodes: Vec<Node>) {
        if !self.branch_open && self.branches.is_empty() {
            self.open_branch();
        }
        let first = self.nodes.len();
        self.nodes.extend(nodes);
        self.blocks.push(Block {
            kind,
            first,
            last: self.nodes.len() - 1,
        });
    }

    /// Queue a `TOPBRANCH` (`top = true`) or `ENDBRANCH` call anchored on the
    /// previous block of the current branch.
    fn branch_call(&mut self, line: usize, top: bool) -> Result<()> {
        if !self.branch_open || self.blocks.len() == self.branch_first_block {
            return Err(Error::Topology {
                line,
                source: TopologyError::AnchorMissing,
            });
        }
        let block = self.blocks[self.blocks.len() - 1];
        let physical: Vec<usize> = (block.first..=block.last)
            .filter(|&i| !self.nodes[i].phantom)
            .collect();
        let kind = if top {
            if physical.len() < 2 {
                return Err(Error::Topology {
                    line,
                    source: TopologyError::PairMissing,
                });
            }
            AttachKind::Top {
                parent_left: physical[physical.len() - 2],
                parent_right: physical[physical.len() - 1],
            }
        } else {
            let &anchor = physical.last().ok_or(Error::Topology {
                line,
                source: TopologyError::AnchorMissing,
            })?;
            AttachKind::End {
                parent_node: anchor,
            }
        };
        self.pending.push_back(PendingCall {
            kind,
            parent_branch: self.current_branch(),
        });
        Ok(())
    }

    /// Apply `INITIAL <label> <V>` to the most recent block.
    ///
    /// Transmission lines seed every node not yet assigned. Lumped blocks
    /// walk from the block's tail, seed the first real shunt found, and
    /// extend the same voltage over the contiguous phantoms above it so the
    /// starting charge is consistent across phantom-separated pairs.
    fn apply_initial(&mut self, line: usize, v: f64) -> Result<()> {
        let block = *self.blocks.last().ok_or_else(|| Error::StatementBeforeBlock {
            line,
            command: "INITIAL".to_string(),
        })?;
        if block.kind == BlockKind::TransmissionLine {
            for i in block.first..=block.last {
                if self.nodes[i].initial_v.is_none() {
                    self.nodes[i].initial_v = Some(v);
                }
            }
            return Ok(());
        }
        let target = (block.first..=block.last)
            .rev()
            .find(|&i| !self.nodes[i].phantom && self.nodes[i].kind == NodeKind::ShuntRc);
        if let Some(s) = target {
            self.nodes[s].initial_v = Some(v);
            for i in s + 1..=block.last {
                if !self.nodes[i].phantom {
                    break;
                }
                self.nodes[i].initial_v = Some(v);
            }
        }
        Ok(())
    }

    /// Register a `TXT <label>` probe against the most recent block.
    ///
    /// Labels starting with `I` sample the current feeding the block; any
    /// other label samples the voltage at the block's last real node.
    /// Colliding labels get `_1`, `_2`, ... suffixes in order of appearance.
    fn register_probe(&mut self, line: usize, label: &str) -> Result<()> {
        let block = *self.blocks.last().ok_or_else(|| Error::StatementBeforeBlock {
            line,
            command: "TXT".to_string(),
        })?;
        let (kind, node) = if label.starts_with(['I', 'i']) {
            (ProbeKind::Current, block.first.saturating_sub(1))
        } else {
            let node = (block.first..=block.last)
                .rev()
                .find(|&i| !self.nodes[i].phantom)
                .unwrap_or(block.last);
            (ProbeKind::Voltage, node)
        };
        let count = self.label_counts.entry(label.to_string()).or_insert(0);
        let unique = if *count == 0 {
            label.to_string()
        } else {
            format!("{label}_{count}")
        };
        *count += 1;
        self.probes.push(Probe {
            kind,
            node,
            label: unique,
        });
        Ok(())
    }

    fn finish(mut self, line: usize) -> Result<Circuit> {
        if self.branch_open {
            self.close_branch(line)?;
        }
        if !self.pending.is_empty() {
            return Err(Error::Topology {
                line,
                source: TopologyError::UnboundBranch {
                    count: self.pending.len(),
                },
            });
        }
        for att in &self.attachments {
            if let AttachKind::End { .. } = att.kind {
                if att.parent_branch == 0
                    && self.attachment_block(att) == self.branch_last_block.first().copied()
                {
                    return Err(Error::Topology {
                        line,
                        source: TopologyError::EndbranchOnFinalBlock,
                    });
                }
            }
        }
        if self.dt <= 0.0 || self.t_end <= 0.0 {
            return Err(Error::TimingUnset);
        }
        Ok(Circuit {
            nodes: self.nodes,
            blocks: self.blocks,
            branches: self.branches,
            attachments: self.attachments,
            probes: self.probes,
            dt: self.dt,
            t_end: self.t_end,
        })
    }

    /// Block index an attachment was anchored on, recovered from its anchor
    /// node.
    fn attachment_block(&self, att: &Attachment) -> Option<usize> {
        let anchor = match att.kind {
            AttachKind::End { parent_node } => parent_node,
            AttachKind::Top { parent_right, .. } => parent_right,
        };
        self.blocks
            .iter()
            .position(|b| b.first <= anchor && anchor <= b.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(body: &str) -> String {
        format!("TIME-STEP 1e-9\nEND-TIME 1e-6\n{body}")
    }

    #[test]
    fn test_timing_scalars() {
        let c = compile("TIME-STEP 2e-9\nEND-TIME 4e-6\nBRANCH\nRCG 1\n").unwrap();
        assert_eq!(c.dt, 2e-9);
        assert_eq!(c.t_end, 4e-6);
    }

    #[test]
    fn test_missing_timing_rejected() {
        let err = compile("BRANCH\nRCG 1\n").unwrap_err();
        assert!(matches!(err, Error::TimingUnset));
    }

    #[test]
    fn test_comments_and_unknown_commands_skipped() {
        let c = compile(&deck("! a comment\nBRANCH\nPLOT something\nRCG 1 1n\n")).unwrap();
        assert_eq!(c.node_count(), 2);
    }

    #[test]
    fn test_commands_case_insensitive() {
        let c = compile(&deck("branch\nrcg 1 1n\ntxt vc1\n")).unwrap();
        assert_eq!(c.node_count(), 2);
        assert_eq!(c.probes.len(), 1);
    }

    #[test]
    fn test_bad_number_carries_line_and_token() {
        let err = compile(&deck("BRANCH\nRCG bogus\n")).unwrap_err();
        match err {
            Error::BadNumber { line, token } => {
                assert_eq!(line, 4);
                assert_eq!(token, "bogus");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_node_ids_dense_and_blocks_in_bounds() {
        let c = compile(&deck(
            "BRANCH\nRCG 1 1n\nRLS 2 1u\nSWITCH INSTANT 1e6 1 1e-7\nTRL LINEAR 1e-9 50 0.5e-9\n",
        ))
        .unwrap();
        assert_eq!(c.node_count(), 14);
        for block in &c.blocks {
            assert!(block.first <= block.last);
            assert!(block.last < c.node_count());
        }
        assert_eq!(c.blocks.len(), 4);
        assert_eq!(c.branches.len(), 1);
        assert_eq!(c.branches[0].last, 13);
    }

    #[test]
    fn test_implicit_main_branch() {
        let c = compile(&deck("RCG 1 1n\n")).unwrap();
        assert_eq!(c.branches.len(), 1);
    }

    #[test]
    fn test_trl_resolution_fallbacks() {
        // Per-line override wins.
        let c = compile(&deck(
            "RESOLUTION-TIME 4e-9\nTRLINE-RESOLUTION 2e-9\nBRANCH\nTRL LINEAR 8e-9 50 1e-9\n",
        ))
        .unwrap();
        assert_eq!(c.node_count(), 32);

        // Then the TRL-specific global.
        let c = compile(&deck(
            "RESOLUTION-TIME 4e-9\nTRLINE-RESOLUTION 2e-9\nBRANCH\nTRL LINEAR 8e-9 50\n",
        ))
        .unwrap();
        assert_eq!(c.node_count(), 16);

        // Then half the general resolution.
        let c = compile(&deck("RESOLUTION-TIME 4e-9\nBRANCH\nTRL LINEAR 8e-9 50\n")).unwrap();
        assert_eq!(c.node_count(), 16);

        let err = compile(&deck("BRANCH\nTRL LINEAR 8e-9 50\n")).unwrap_err();
        assert!(matches!(err, Error::ResolutionUnset { line: 4 }));
    }

    #[test]
    fn test_initial_on_lumped_block() {
        let c = compile(&deck("BRANCH\nRCG 1 1n\nINITIAL VC1 100\nRLS 0 1u\n")).unwrap();
        // The real shunt and its trailing phantom share the seed voltage.
        assert_eq!(c.nodes[0].initial_v, Some(100.0));
        assert_eq!(c.nodes[1].initial_v, Some(100.0));
        assert_eq!(c.nodes[2].initial_v, None);
        assert_eq!(c.nodes[3].initial_v, None);
    }

    #[test]
    fn test_initial_on_line_block() {
        let c = compile(&deck("BRANCH\nTRL LINEAR 2e-9 50 1e-9\nINITIAL VL 25\n")).unwrap();
        for node in &c.nodes {
            assert_eq!(node.initial_v, Some(25.0));
        }
    }

    #[test]
    fn test_initial_without_block_rejected() {
        let err = compile(&deck("BRANCH\nINITIAL VC1 100\n")).unwrap_err();
        assert!(matches!(err, Error::StatementBeforeBlock { line: 4, .. }));
    }

    #[test]
    fn test_probe_nodes() {
        let c = compile(&deck(
            "BRANCH\nRCG 1 1n\nTXT VC1\nRLS 0 1u\nTXT IL1\nRCG 2 1n\nTXT VC2\n",
        ))
        .unwrap();
        assert_eq!(c.probes.len(), 3);
        // Voltage probe lands on the block's last real node.
        assert_eq!(c.probes[0].kind, ProbeKind::Voltage);
        assert_eq!(c.probes[0].node, 0);
        // Current probe lands just before the block start.
        assert_eq!(c.probes[1].kind, ProbeKind::Current);
        assert_eq!(c.probes[1].node, 1);
        assert_eq!(c.probes[2].node, 4);
    }

    #[test]
    fn test_current_probe_at_vector_start() {
        let c = compile(&deck("BRANCH\nRCG 1 1n\nTXT I0\n")).unwrap();
        assert_eq!(c.probes[0].node, 0);
        assert_eq!(c.probes[0].kind, ProbeKind::Current);
    }

    #[test]
    fn test_label_deduplication() {
        let c = compile(&deck(
            "BRANCH\nRCG 1 1n\nTXT VC\nRCG 1 1n\nTXT VC\nRCG 1 1n\nTXT VC\n",
        ))
        .unwrap();
        let labels: Vec<&str> = c.probes.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["VC", "VC_1", "VC_2"]);
    }

    #[test]
    fn test_endbranch_binding_fifo() {
        let c = compile(&deck(
            "BRANCH\nRCG 1 1n\nENDBRANCH\nRCG 1 1n\nENDBRANCH\nRCG 1 1n\n\
             BRANCH\nRLS 1 1u\nBRANCH\nRLS 2 1u\n",
        ))
        .unwrap();
        assert_eq!(c.branches.len(), 3);
        assert_eq!(c.attachments.len(), 2);
        // First call binds the first child definition.
        assert_eq!(c.attachments[0].child_branch, 1);
        assert_eq!(
            c.attachments[0].kind,
            AttachKind::End { parent_node: 0 }
        );
        assert_eq!(c.attachments[1].child_branch, 2);
        assert_eq!(
            c.attachments[1].kind,
            AttachKind::End { parent_node: 2 }
        );
    }

    #[test]
    fn test_topbranch_anchor_pair() {
        let c = compile(&deck(
            "BRANCH\nRCG 1 1n\nTRL LINEAR 1e-9 50 1e-9\nTOPBRANCH\nRCG 1 1n\nBRANCH\nRLS 1 1u\n",
        ))
        .unwrap();
        assert_eq!(
            c.attachments[0].kind,
            AttachKind::Top {
                parent_left: 2,
                parent_right: 5,
            }
        );
    }

    #[test]
    fn test_topbranch_without_pair_rejected() {
        let err = compile(&deck(
            "BRANCH\nRCG 1 1n\nTOPBRANCH\nRCG 1 1n\nBRANCH\nRLS 1 1u\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Topology {
                source: TopologyError::PairMissing,
                ..
            }
        ));
    }

    #[test]
    fn test_branch_call_without_block_rejected() {
        let err = compile(&deck("BRANCH\nENDBRANCH\n")).unwrap_err();
        assert!(matches!(
            err,
            Error::Topology {
                source: TopologyError::AnchorMissing,
                ..
            }
        ));
    }

    #[test]
    fn test_unbound_calls_rejected() {
        let err = compile(&deck("BRANCH\nRCG 1 1n\nENDBRANCH\nRCG 1 1n\n")).unwrap_err();
        assert!(matches!(
            err,
            Error::Topology {
                source: TopologyError::UnboundBranch { count: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_endbranch_on_final_block_rejected() {
        let err = compile(&deck(
            "BRANCH\nRCG 1 1n\nENDBRANCH\nBRANCH\nRLS 1 1u\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Topology {
                source: TopologyError::EndbranchOnFinalBlock,
                ..
            }
        ));
    }

    #[test]
    fn test_branch_without_call_rejected() {
        let err = compile(&deck("BRANCH\nRCG 1 1n\nBRANCH\nRLS 1 1u\n")).unwrap_err();
        assert!(matches!(
            err,
            Error::Topology {
                source: TopologyError::UnanchoredBranch,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_branch_rejected() {
        let err = compile(&deck(
            "BRANCH\nRCG 1 1n\nENDBRANCH\nRCG 1 1n\nBRANCH\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Topology {
                source: TopologyError::EmptyBranch,
                ..
            }
        ));
    }

    #[test]
    fn test_probe_and_branch_indices_in_range() {
        let c = compile(&deck(
            "BRANCH\nRCG 1 1n\nENDBRANCH\nTRL LINEAR 2e-9 50 1e-9\nTXT IL\nTXT VOUT\n\
             BRANCH\nRLS 1 1u\nRCG 5 1n\n",
        ))
        .unwrap();
        let n = c.node_count();
        for p in &c.probes {
            assert!(p.node < n);
        }
        for b in &c.branches {
            assert!(b.first <= b.last && b.last < n);
        }
        // Node ids are dense by construction; every index maps to a branch.
        for i in 0..n {
            assert!(c.branch_of(i) < c.branches.len());
        }
    }
}
