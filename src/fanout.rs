//! Fanout index (C4): an intrusive doubly-linked ring per node, threaded
//! through the per-node `fanout_link`/`fanout_head` fields of `node.rs`.
//! Maintaining it is optional and toggled process-wide on the `Manager`
//! (spec §4.4: "enabling the fanout index is a process-wide configuration").

use crate::arena::NodeId;
use crate::node::{FanoutSlot, Node};

/// Adds `(succ, side)` to the fanout ring owned by `fanin`.
pub fn add(nodes: &mut crate::arena::Arena<Node>, fanin: NodeId, succ: NodeId, side: u8) {
    let slot = FanoutSlot { succ, side };
    match nodes[fanin].fanout_head {
        None => {
            nodes[fanin].fanout_head = Some(slot);
            nodes[succ].fanout_link[side as usize] = Some((slot, slot));
        }
        Some(head) => {
            let tail = nodes[head.succ].fanout_link[head.side as usize]
                .expect("ring head must have a link")
                .1;
            nodes[succ].fanout_link[side as usize] = Some((head, tail));
            nodes[tail.succ].fanout_link[tail.side as usize]
                .as_mut()
                .unwrap()
                .0 = slot;
            nodes[head.succ].fanout_link[head.side as usize]
                .as_mut()
                .unwrap()
                .1 = slot;
        }
    }
}

/// Removes `(succ, side)` from the fanout ring owned by `fanin`.
pub fn remove(nodes: &mut crate::arena::Arena<Node>, fanin: NodeId, succ: NodeId, side: u8) {
    let slot = FanoutSlot { succ, side };
    let (next, prev) = match nodes[succ].fanout_link[side as usize].take() {
        Some(link) => link,
        None => return,
    };
    if next == slot && prev == slot {
        nodes[fanin].fanout_head = None;
        return;
    }
    if let Some(link) = nodes[next.succ].fanout_link[next.side as usize].as_mut() {
        link.1 = prev;
    }
    if let Some(link) = nodes[prev.succ].fanout_link[prev.side as usize].as_mut() {
        link.0 = next;
    }
    if nodes[fanin].fanout_head == Some(slot) {
        nodes[fanin].fanout_head = Some(next);
    }
}

/// Snapshots the fanout ring of `fanin` into an auxiliary vector so that
/// callers may mutate the graph while iterating (spec §4.4).
pub fn snapshot(nodes: &crate::arena::Arena<Node>, fanin: NodeId) -> Vec<(NodeId, u8)> {
    let mut out = Vec::new();
    let head = match nodes[fanin].fanout_head {
        Some(h) => h,
        None => return out,
    };
    let mut cur = head;
    loop {
        out.push((cur.succ, cur.side));
        let (next, _) = nodes[cur.succ].fanout_link[cur.side as usize].expect("live ring slot");
        if next == head {
            break;
        }
        cur = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplaceOptions;
    use crate::manager::Manager;

    /// With the fanout index enabled, a node's ring lists exactly its live
    /// successors, regardless of which fanin side they entered through.
    #[test]
    fn ring_reflects_every_live_fanout_of_a_shared_node() {
        let mut mgr = Manager::new();
        mgr.enable_fanout_index();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let ab = mgr.and(a, b);
        let ac = mgr.and(a, c);
        mgr.create_po(ab);
        mgr.create_po(ac);

        let fanouts = snapshot(&mgr.nodes, a.node());
        let succs: Vec<NodeId> = fanouts.iter().map(|&(s, _)| s).collect();
        assert_eq!(succs.len(), 2);
        assert!(succs.contains(&ab.node()));
        assert!(succs.contains(&ac.node()));
    }

    /// Deleting one successor shrinks the ring without disturbing the
    /// other, and `replace` (which snapshots the ring under the hood when
    /// the index is enabled) keeps it consistent with a full invariant
    /// check afterward.
    #[test]
    fn ring_shrinks_as_fanouts_are_replaced_away() {
        let mut mgr = Manager::new();
        mgr.enable_fanout_index();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let ab = mgr.and(a, b);
        let ac = mgr.and(a, c);
        mgr.create_po(ab);
        let ac_po = mgr.create_po(ac);

        mgr.replace(ac.node(), c, ReplaceOptions::default()).unwrap();

        let fanouts = snapshot(&mgr.nodes, a.node());
        assert_eq!(fanouts.len(), 1, "only ab still fans out from a");
        assert_eq!(fanouts[0].0, ab.node());
        assert_eq!(mgr.fanin0(ac_po).unwrap(), c);
        mgr.check().unwrap();
    }

    #[test]
    fn empty_ring_snapshots_to_nothing() {
        let mgr = Manager::new();
        assert!(snapshot(&mgr.nodes, NodeId::CONST1).is_empty());
    }
}
