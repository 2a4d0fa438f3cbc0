//! Required-level propagation (spec §4.5/§4.10: "required-level constraints
//! are pushed backward"). Its own module, following `cranelift-codegen`'s
//! habit of giving each CFG-adjacent concern a file of its own
//! (`flowgraph.rs`, `dominator_tree.rs`) rather than folding it into
//! `replace`.

use cranelift_entity::SecondaryMap;

use crate::arena::NodeId;
use crate::manager::Manager;
use crate::node::NodeType;

/// Required level of every live node: the latest level at which it may sit
/// without lengthening the critical path to any PO. `None` marks a node
/// with no required-level constraint yet (e.g. before the first
/// computation); it reads as `u32::MAX` so an unconstrained node never
/// blocks a replacement.
#[derive(Default)]
pub struct RequiredLevels(SecondaryMap<NodeId, Option<u32>>);

impl RequiredLevels {
    pub fn get(&self, id: NodeId) -> u32 {
        self.0[id].unwrap_or(u32::MAX)
    }
}

impl Manager {
    /// Computes required levels for every live node given the current
    /// levels, by walking backward from the POs/latch inputs.
    pub fn compute_required_levels(&mut self) -> RequiredLevels {
        let max_level = self
            .nodes
            .iter_ids()
            .filter(|&id| self.nodes[id].is_live())
            .map(|id| self.nodes[id].level)
            .max()
            .unwrap_or(0);

        let mut required: SecondaryMap<NodeId, Option<u32>> = SecondaryMap::new();
        let roots: Vec<NodeId> = self
            .pos
            .iter()
            .copied()
            .chain(self.latches.iter().copied())
            .collect();
        for &root in &roots {
            set_required(&mut required, root, max_level);
        }

        // Process in decreasing level order so a node's required level is
        // finalised (its minimum seen) before it propagates to fanins.
        let mut order: Vec<NodeId> = self
            .nodes
            .iter_ids()
            .filter(|&id| self.nodes[id].is_live())
            .collect();
        order.sort_by(|a, b| self.nodes[*b].level.cmp(&self.nodes[*a].level));

        for id in order {
            let req = required_or(&required, id, max_level);
            let n = &self.nodes[id];
            if n.ty == NodeType::Latch {
                continue; // sequential boundary: required resets per-register
            }
            let fanins = [n.fanin0, n.fanin1];
            let slack = match n.ty {
                NodeType::And => 1,
                NodeType::Exor => 2,
                _ => 0,
            };
            for f in fanins.into_iter().flatten() {
                set_required(&mut required, f.node(), req.saturating_sub(slack));
            }
        }

        RequiredLevels(required)
    }
}

fn required_or(map: &SecondaryMap<NodeId, Option<u32>>, id: NodeId, default: u32) -> u32 {
    map[id].unwrap_or(default)
}

fn set_required(map: &mut SecondaryMap<NodeId, Option<u32>>, id: NodeId, value: u32) {
    match map[id] {
        None => map[id] = Some(value),
        Some(cur) if value < cur => map[id] = Some(value),
        Some(_) => {}
    }
}
