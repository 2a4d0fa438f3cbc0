//! MFFC sizing and cut truth tables (C8), grounded on `ivyResyn.c`'s
//! ref/deref dance (`Ivy_NodeRefDeref`) used ahead of a tentative rewrite.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::NodeId;
use crate::cut::Cut;
use crate::edge::Edge;
use crate::manager::Manager;
use crate::node::NodeType;
use crate::npn::ELEM_MASKS;

/// Counts how many nodes would be freed by rerouting `root`'s output away,
/// given that every node in `leaves` is pinned (spec §4.8: "temporarily
/// increment ref counts for every leaf in F, then recursively decrement ref
/// counts along R's transitive fanins").
///
/// Implemented as a read-only simulation of that ref-bump/deref dance
/// against a local override map rather than mutating the manager's real ref
/// counts, so nothing needs restoring afterward.
pub fn mffc_size(mgr: &Manager, root: NodeId, leaves: &[NodeId]) -> u32 {
    let pinned: FxHashSet<NodeId> = leaves.iter().copied().collect();
    let mut refs: FxHashMap<NodeId, u32> = FxHashMap::default();
    let mut inside: FxHashSet<NodeId> = FxHashSet::default();
    deref_rec(mgr, root, &pinned, &mut refs, &mut inside);
    inside.len() as u32
}

fn live_refs(mgr: &Manager, id: NodeId, overrides: &FxHashMap<NodeId, u32>) -> u32 {
    overrides.get(&id).copied().unwrap_or_else(|| mgr.refs(id))
}

fn deref_rec(
    mgr: &Manager,
    id: NodeId,
    pinned: &FxHashSet<NodeId>,
    refs: &mut FxHashMap<NodeId, u32>,
    inside: &mut FxHashSet<NodeId>,
) {
    if pinned.contains(&id) {
        return;
    }
    let ty = mgr.node_type(id);
    if matches!(ty, NodeType::Pi | NodeType::Const1 | NodeType::Latch) {
        return;
    }
    let cur = live_refs(mgr, id, refs);
    if cur == 0 {
        return; // already counted via another path
    }
    let next = cur - 1;
    refs.insert(id, next);
    if next > 0 {
        return;
    }
    inside.insert(id);
    if let Some(f0) = mgr.fanin0(id) {
        deref_rec(mgr, f0.node(), pinned, refs, inside);
    }
    if let Some(f1) = mgr.fanin1(id) {
        deref_rec(mgr, f1.node(), pinned, refs, inside);
    }
}

/// Computes the 16-bit truth table of `root` over the (≤4) leaves of `cut`,
/// in the cut's own leaf order (spec §4.8). Leaves beyond the fourth are
/// not supported (standard rewriting only ever asks for 4-leaf cuts).
pub fn cut_truth_table(mgr: &Manager, root: Edge, cut: &Cut) -> u16 {
    assert!(cut.leaves.len() <= 4, "truth tables are 4-input only");
    let mut table: FxHashMap<NodeId, u16> = FxHashMap::default();
    for (i, leaf) in cut.leaves.iter().enumerate() {
        table.insert(leaf.node, ELEM_MASKS[i]);
    }
    let t = truth_rec(mgr, root.node(), &mut table);
    if root.is_complement() {
        !t
    } else {
        t
    }
}

fn truth_rec(mgr: &Manager, id: NodeId, table: &mut FxHashMap<NodeId, u16>) -> u16 {
    if let Some(&t) = table.get(&id) {
        return t;
    }
    let t = match mgr.node_type(id) {
        NodeType::Const1 => 0xFFFF,
        NodeType::Buf => {
            let f0 = mgr.fanin0(id).unwrap();
            apply(mgr, f0, table)
        }
        NodeType::And => {
            let f0 = mgr.fanin0(id).unwrap();
            let f1 = mgr.fanin1(id).unwrap();
            apply(mgr, f0, table) & apply(mgr, f1, table)
        }
        NodeType::Exor => {
            let f0 = mgr.fanin0(id).unwrap();
            let f1 = mgr.fanin1(id).unwrap();
            apply(mgr, f0, table) ^ apply(mgr, f1, table)
        }
        // Latches and PIs outside the leaf set only occur when the cut was
        // mis-sized for truth extraction; model as a fresh don't-care
        // variable (all-ones) rather than panicking.
        _ => 0xFFFF,
    };
    table.insert(id, t);
    t
}

fn apply(mgr: &Manager, edge: Edge, table: &mut FxHashMap<NodeId, u16>) -> u16 {
    let t = truth_rec(mgr, edge.node(), table);
    if edge.is_complement() {
        !t
    } else {
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::enumerate_cuts;

    #[test]
    fn const1_truth_is_all_ones() {
        let mgr = Manager::new();
        let cut = enumerate_cuts(&mgr, NodeId::CONST1, 4, 256).0;
        let t = cut_truth_table(&mgr, Edge::const1(), &cut[0]);
        assert_eq!(t, 0xFFFF);
    }

    #[test]
    fn elementary_pi_truth_matches_its_mask() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let (cuts, _) = enumerate_cuts(&mgr, a.node(), 4, 256);
        let t = cut_truth_table(&mgr, a, &cuts[0]);
        assert_eq!(t, ELEM_MASKS[0]);
    }

    #[test]
    fn mffc_of_and_chain_counts_interior_nodes() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let ab = mgr.and(a, b);
        let abc = mgr.and(ab, c);
        mgr.create_po(abc);
        // MFFC of `abc` pinned at leaves {a, b, c}: both `ab` and `abc`
        // disappear if `abc`'s output is rerouted.
        let size = mffc_size(&mgr, abc.node(), &[a.node(), b.node(), c.node()]);
        assert_eq!(size, 2);
    }
}
