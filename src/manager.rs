//! The AIG manager (C1–C5): owns the node arena, the structural hash table,
//! the ordered PI/PO/latch sequences, and the canonical constructors.
//! Grounded on `ivyMan.c` (manager lifecycle) and `ivyCanon.c`/`ivyOper.c`
//! (canonical `and`/`exor`/`latch` construction and `Ivy_ObjReplace`).

use cranelift_entity::EntityRef;
use log::{debug, trace};

use crate::arena::{Arena, NodeId};
use crate::config::ReplaceOptions;
use crate::edge::Edge;
use crate::error::{AigError, AigResult};
use crate::fanout;
use crate::hash_table::HashTable;
use crate::node::{Init, Node, NodeType};

/// Live-node counts by type, used for `verbose` pass reporting
/// (SPEC_FULL.md supplement 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub pis: usize,
    pub pos: usize,
    pub latches: usize,
    pub ands: usize,
    pub exors: usize,
    pub bufs: usize,
}

/// An arena of typed AIG nodes with structural hashing, reference counting
/// and an optional fanout index (spec §3 "Manager").
pub struct Manager {
    pub(crate) nodes: Arena<Node>,
    pub(crate) hash: HashTable,
    pub(crate) pis: Vec<NodeId>,
    pub(crate) pos: Vec<NodeId>,
    pub(crate) latches: Vec<NodeId>,
    pub(crate) travel_id: u32,
    pub(crate) fanout_enabled: bool,
    /// Set for the duration of a `replace(..., free_top_only: true)` call:
    /// tells `dec_ref` to tombstone a node that drops to zero without
    /// cascading into its fanins, since the caller (a rewrite/rewiring
    /// pass that already scored the whole MFFC itself) takes
    /// responsibility for the rest of the cone.
    pub(crate) shallow_delete: bool,
}

impl Manager {
    /// `managerStart()` (spec §6): allocates the constant-1 node at id 0.
    pub fn new() -> Manager {
        let mut nodes = Arena::new();
        let const1 = nodes.alloc(Node::default());
        debug_assert_eq!(const1, NodeId::CONST1);
        {
            let n = &mut nodes[const1];
            n.ty = NodeType::Const1;
            n.phase = true;
            n.level = 0;
        }
        Manager {
            nodes,
            hash: HashTable::new(),
            pis: Vec::new(),
            pos: Vec::new(),
            latches: Vec::new(),
            travel_id: 0,
            fanout_enabled: false,
            shallow_delete: false,
        }
    }

    /// Enables the fanout index (spec §4.4). Must be called before any
    /// construction if the caller wants the index populated from the
    /// start; enabling it later only covers nodes created afterward.
    pub fn enable_fanout_index(&mut self) {
        self.fanout_enabled = true;
    }

    pub fn fanout_index_enabled(&self) -> bool {
        self.fanout_enabled
    }

    pub fn const1(&self) -> Edge {
        Edge::const1()
    }

    pub fn const0(&self) -> Edge {
        Edge::const0()
    }

    pub fn num_pis(&self) -> usize {
        self.pis.len()
    }

    pub fn num_pos(&self) -> usize {
        self.pos.len()
    }

    pub fn pi(&self, index: usize) -> Edge {
        Edge::regular_edge(self.pis[index])
    }

    pub fn po_input(&self, index: usize) -> Edge {
        self.nodes[self.pos[index]].fanin0.unwrap()
    }

    pub fn pis(&self) -> &[NodeId] {
        &self.pis
    }

    pub fn pos(&self) -> &[NodeId] {
        &self.pos
    }

    pub fn latches(&self) -> &[NodeId] {
        &self.latches
    }

    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.nodes[id].ty
    }

    pub fn level(&self, id: NodeId) -> u32 {
        self.nodes[id].level
    }

    pub fn refs(&self, id: NodeId) -> u32 {
        self.nodes[id].refs
    }

    pub fn fanin0(&self, id: NodeId) -> Option<Edge> {
        self.nodes[id].fanin0
    }

    pub fn fanin1(&self, id: NodeId) -> Option<Edge> {
        self.nodes[id].fanin1
    }

    pub fn init(&self, id: NodeId) -> Init {
        self.nodes[id].init
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Live-node counts by type (SPEC_FULL.md supplement 1).
    pub fn stats(&self) -> Stats {
        let mut s = Stats::default();
        for id in self.nodes.iter_ids() {
            match self.nodes[id].ty {
                NodeType::Pi => s.pis += 1,
                NodeType::Po | NodeType::Assert => s.pos += 1,
                NodeType::Latch => s.latches += 1,
                NodeType::And => s.ands += 1,
                NodeType::Exor => s.exors += 1,
                NodeType::Buf => s.bufs += 1,
                NodeType::Const1 | NodeType::None => {}
            }
        }
        s
    }

    /// `createPi(Manager) -> Edge`.
    pub fn create_pi(&mut self) -> Edge {
        let id = self.nodes.alloc(Node::default());
        self.nodes[id].ty = NodeType::Pi;
        self.nodes[id].level = 0;
        self.nodes[id].phase = false; // PI is 0 under the all-zero simulation point
        self.pis.push(id);
        Edge::regular_edge(id)
    }

    /// `createPo(Manager, Edge)`.
    pub fn create_po(&mut self, input: Edge) -> NodeId {
        let id = self.nodes.alloc(Node::default());
        self.nodes[id].ty = NodeType::Po;
        self.nodes[id].fanin0 = Some(input);
        self.nodes[id].level = self.nodes[input.node()].level;
        self.nodes[id].phase = self.nodes[input.node()].phase ^ input.is_complement();
        self.inc_ref(input.node());
        self.link_fanin(id, 0, input);
        self.pos.push(id);
        id
    }

    // ---- reference counting & deletion -----------------------------------

    pub(crate) fn inc_ref(&mut self, id: NodeId) {
        self.nodes[id].refs += 1;
    }

    pub(crate) fn dec_ref(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id].refs > 0, "ref underflow on node {id}");
        self.nodes[id].refs -= 1;
        if self.nodes[id].refs == 0 && !matches!(self.nodes[id].ty, NodeType::Pi | NodeType::Po | NodeType::Const1 | NodeType::Assert)
        {
            if self.shallow_delete {
                self.delete_node_shallow(id);
            } else {
                self.delete_node(id);
            }
        }
    }

    /// Recursively frees `id` and, transitively, any fanin that drops to
    /// zero refs as a result (spec §3 "Lifecycles": deletion is recursive).
    fn delete_node(&mut self, id: NodeId) {
        let Some((fanin0, fanin1)) = self.delete_node_shallow(id) else {
            return;
        };
        if let Some(f0) = fanin0 {
            self.dec_ref(f0.node());
        }
        if let Some(f1) = fanin1 {
            self.dec_ref(f1.node());
        }
    }

    /// Tombstones `id` alone: removes it from the hash table and fanout
    /// rings, frees its arena slot, but never touches its fanins' ref
    /// counts (spec §6 `replace`'s `freeTopOnly`). Returns the node's old
    /// fanins so a caller that *does* want the recursive behaviour
    /// (`delete_node`) can drive it from here, or `None` if `id` was
    /// already a tombstone.
    fn delete_node_shallow(&mut self, id: NodeId) -> Option<(Option<Edge>, Option<Edge>)> {
        let ty = self.nodes[id].ty;
        if ty == NodeType::None {
            return None; // already a tombstone
        }
        if ty.is_hashable() {
            self.hash.remove(&self.nodes, id);
        }
        let fanin0 = self.nodes[id].fanin0;
        let fanin1 = self.nodes[id].fanin1;
        if self.fanout_enabled {
            if let Some(f0) = fanin0 {
                fanout::remove(&mut self.nodes, f0.node(), id, 0);
            }
            if let Some(f1) = fanin1 {
                fanout::remove(&mut self.nodes, f1.node(), id, 1);
            }
        }
        self.nodes[id] = Node::default();
        self.nodes.free(id);
        Some((fanin0, fanin1))
    }

    fn link_fanin(&mut self, succ: NodeId, side: u8, edge: Edge) {
        if self.fanout_enabled {
            fanout::add(&mut self.nodes, edge.node(), succ, side);
        }
    }

    fn unlink_fanin(&mut self, succ: NodeId, side: u8, edge: Edge) {
        if self.fanout_enabled {
            fanout::remove(&mut self.nodes, edge.node(), succ, side);
        }
    }

    // ---- canonical constructors -------------------------------------------

    /// `and(Manager, Edge, Edge) -> Edge`.
    pub fn and(&mut self, a: Edge, b: Edge) -> Edge {
        if a == b {
            return a;
        }
        if a == b.invert() {
            return self.const0();
        }
        if a.is_const1() {
            return b;
        }
        if b.is_const1() {
            return a;
        }
        if a.is_const0() || b.is_const0() {
            return self.const0();
        }
        let (lo, hi) = if a.node().index() <= b.node().index() {
            (a, b)
        } else {
            (b, a)
        };
        self.canon_pair(NodeType::And, lo, hi, Init::None)
    }

    /// `exor(Manager, Edge, Edge) -> Edge`.
    pub fn exor(&mut self, a: Edge, b: Edge) -> Edge {
        let out_compl = a.is_complement() ^ b.is_complement();
        let a = a.regular();
        let b = b.regular();
        if a == b {
            return self.const0().not_cond(out_compl);
        }
        if a.is_const1() {
            return b.invert().not_cond(out_compl);
        }
        if b.is_const1() {
            return a.invert().not_cond(out_compl);
        }
        let (lo, hi) = if a.node().index() <= b.node().index() {
            (a, b)
        } else {
            (b, a)
        };
        let result = self.canon_pair(NodeType::Exor, lo, hi, Init::None);
        result.not_cond(out_compl)
    }

    /// `latch(Manager, Edge, Init) -> Edge`.
    pub fn latch(&mut self, a: Edge, init: Init) -> AigResult<Edge> {
        let compl = a.is_complement();
        let regular = a.regular();
        let init = init.not_cond(compl);
        if let Some(existing) = self
            .hash
            .lookup(&self.nodes, NodeType::Latch, regular, None, init)
        {
            return Ok(Edge::regular_edge(existing));
        }
        Ok(Edge::regular_edge(self.create_hashed(
            NodeType::Latch,
            regular,
            None,
            init,
        )))
    }

    /// `Ivy_CanonPair_rec`: builds the canonical And/Exor node, pulling a
    /// common latch wrapper through both fanins when possible (spec §4.5).
    fn canon_pair(&mut self, ty: NodeType, fanin0: Edge, fanin1: Edge, init: Init) -> Edge {
        let both_latches = self.nodes[fanin0.node()].ty == NodeType::Latch
            && self.nodes[fanin1.node()].ty == NodeType::Latch;
        if !both_latches {
            if let Some(existing) =
                self.hash
                    .lookup(&self.nodes, ty, fanin0, Some(fanin1), init)
            {
                return Edge::regular_edge(existing);
            }
            return Edge::regular_edge(self.create_hashed(ty, fanin0, Some(fanin1), init));
        }
        // Pull the latches through: build `op(data0, data1)` then wrap in a
        // single latch with the combined init.
        let (lat0, lat1) = (fanin0.node(), fanin1.node());
        let (c0, c1) = (fanin0.is_complement(), fanin1.is_complement());
        let data0 = self.nodes[lat0].fanin0.unwrap().not_cond(c0);
        let data1 = self.nodes[lat1].fanin0.unwrap().not_cond(c1);
        let inner = if ty == NodeType::And {
            self.and(data0, data1)
        } else {
            self.exor(data0, data1)
        };
        let init0 = self.nodes[lat0].init.not_cond(c0);
        let init1 = self.nodes[lat1].init.not_cond(c1);
        let combined = if ty == NodeType::And {
            Init::and(init0, init1)
        } else {
            Init::exor(init0, init1)
        };
        self.latch(inner, combined)
            .expect("latch construction from canonicalised data never violates contracts")
    }

    /// Allocates a fresh node under the canonical key `(ty, fanin0, fanin1,
    /// init)`, wires up ref counts, the fanout index, level and phase, and
    /// inserts it into the hash table.
    fn create_hashed(
        &mut self,
        ty: NodeType,
        fanin0: Edge,
        fanin1: Option<Edge>,
        init: Init,
    ) -> NodeId {
        let id = self.nodes.alloc(Node::default());
        {
            let n = &mut self.nodes[id];
            n.ty = ty;
            n.fanin0 = Some(fanin0);
            n.fanin1 = fanin1;
            n.init = init;
        }
        self.inc_ref(fanin0.node());
        self.link_fanin(id, 0, fanin0);
        if let Some(f1) = fanin1 {
            self.inc_ref(f1.node());
            self.link_fanin(id, 1, f1);
        }
        let level = self.local_level(id);
        self.nodes[id].level = level;
        let phase = match ty {
            NodeType::And => {
                let p0 = self.nodes[fanin0.node()].phase ^ fanin0.is_complement();
                let p1 = self.nodes[fanin1.unwrap().node()].phase ^ fanin1.unwrap().is_complement();
                p0 && p1
            }
            NodeType::Exor => {
                let p0 = self.nodes[fanin0.node()].phase ^ fanin0.is_complement();
                let p1 = self.nodes[fanin1.unwrap().node()].phase ^ fanin1.unwrap().is_complement();
                p0 ^ p1
            }
            NodeType::Latch => init == Init::One,
            _ => false,
        };
        self.nodes[id].phase = phase;
        if ty == NodeType::Latch {
            self.latches.push(id);
        }
        self.hash.insert(&self.nodes, id);
        trace!("created {:?} node {:?}", ty, id);
        id
    }

    /// `Ivy_NodeCreateBuf`: a fresh, never-deduplicated single-input node
    /// that passes `input` through unchanged logically, absorbing any
    /// complement so that the edge handed back is always regular.
    fn create_buf(&mut self, input: Edge) -> Edge {
        let id = self.nodes.alloc(Node::default());
        {
            let n = &mut self.nodes[id];
            n.ty = NodeType::Buf;
            n.fanin0 = Some(input);
        }
        self.inc_ref(input.node());
        self.link_fanin(id, 0, input);
        let level = self.nodes[input.node()].level;
        self.nodes[id].level = level;
        self.nodes[id].phase = self.nodes[input.node()].phase ^ input.is_complement();
        Edge::regular_edge(id)
    }

    // ---- replace ------------------------------------------------------

    /// `replace(Manager, NodeId, Edge, options)` (spec §4.5, §3
    /// "Lifecycles").
    pub fn replace(&mut self, old: NodeId, new: Edge, opts: ReplaceOptions) -> AigResult<()> {
        if old == new.node() {
            return Ok(()); // no-op, testable property 8
        }
        if self.nodes[new.node()].ty == NodeType::Po {
            return Err(AigError::ContractViolation(
                "replacement target cannot be a Po".into(),
            ));
        }
        let target = if new.is_complement() {
            self.create_buf(new)
        } else {
            new
        };
        self.inc_ref(target.node());

        let fanouts: Vec<(NodeId, u8)> = if self.fanout_enabled {
            fanout::snapshot(&self.nodes, old)
        } else {
            self.scan_fanouts(old)
        };
        let seeds: Vec<NodeId> = fanouts.iter().map(|&(succ, _)| succ).collect();
        self.shallow_delete = opts.free_top_only;
        for &(succ, side) in &fanouts {
            self.rewire(succ, side, old, target);
        }
        self.shallow_delete = false;

        self.dec_ref(target.node()); // undo the temporary hold above
        // Each rewired fanout already released its edge into `old` via
        // `dec_ref` inside `rewire`; once the last one lands, `old`'s MFFC
        // is freed automatically (spec §3 "deleting the old node's MFFC").

        if opts.update_level {
            self.propagate_levels_forward(seeds);
        }
        Ok(())
    }

    /// Fallback used when the fanout index is disabled: an O(|nodes|) scan
    /// for successors whose fanin references `old`.
    pub(crate) fn scan_fanouts(&self, old: NodeId) -> Vec<(NodeId, u8)> {
        let mut out = Vec::new();
        for id in self.nodes.iter_ids() {
            let n = &self.nodes[id];
            if !n.is_live() {
                continue;
            }
            if let Some(f0) = n.fanin0 {
                if f0.node() == old {
                    out.push((id, 0));
                }
            }
            if let Some(f1) = n.fanin1 {
                if f1.node() == old {
                    out.push((id, 1));
                }
            }
        }
        out
    }

    /// Rewires one fanin edge of `succ` from `old` to `target`, preserving
    /// the complement bit the edge carried, then re-canonicalises `succ` if
    /// it is a hashable node whose key just changed. Re-canonicalisation
    /// goes through the same public `and`/`exor`/`latch` constructors used
    /// everywhere else rather than hand-rolling an in-place trivial-case
    /// fixup: it always allocates a fresh congruent/simplified node and
    /// cascades a further `replace`, which is simpler to get right than
    /// mutating `succ`'s stored polarity in place at the cost of a little
    /// extra churn (see DESIGN.md).
    fn rewire(&mut self, succ: NodeId, side: u8, old: NodeId, target: Edge) {
        let old_edge = if side == 0 {
            self.nodes[succ].fanin0.unwrap()
        } else {
            self.nodes[succ].fanin1.unwrap()
        };
        debug_assert_eq!(old_edge.node(), old);
        let new_edge = Edge::new(target.node(), old_edge.is_complement() ^ target.is_complement());

        let ty = self.nodes[succ].ty;
        if ty.is_hashable() {
            self.hash.remove(&self.nodes, succ);
        }
        self.unlink_fanin(succ, side, old_edge);
        self.inc_ref(new_edge.node());
        if side == 0 {
            self.nodes[succ].fanin0 = Some(new_edge);
        } else {
            self.nodes[succ].fanin1 = Some(new_edge);
        }
        self.link_fanin(succ, side, new_edge);
        self.dec_ref(old);

        if !ty.is_hashable() {
            // Po/Buf/Assert: no canonical key. Its level is left stale here
            // on purpose; the caller's `propagate_levels_forward` walk (seeded
            // with `old`'s original fanouts) reaches `succ` and recomputes it
            // from its now-current fanin, then keeps walking into whatever
            // `succ` itself fans out to.
            return;
        }

        let f0 = self.nodes[succ].fanin0.unwrap();
        let f1 = self.nodes[succ].fanin1;
        let init = self.nodes[succ].init;
        let resolved = match ty {
            NodeType::And => self.and(f0, f1.unwrap()),
            NodeType::Exor => self.exor(f0, f1.unwrap()),
            NodeType::Latch => self
                .latch(f0, init)
                .expect("latch input is a plain edge, never contract-violating here"),
            _ => unreachable!("only hashable types reach here"),
        };
        self.replace(
            succ,
            resolved,
            ReplaceOptions {
                update_level: false,
                free_top_only: false,
            },
        )
        .expect("re-canonicalising a live node never violates a caller contract");
    }

    /// Eliminates every live `Buf` node by splicing its single fanin
    /// directly into each of its fanouts (spec §4.10: "buffers are
    /// propagated forward until stable"), restoring invariant 5 ("no Buf
    /// appears as an input of an And/Exor in a settled graph"). Reuses
    /// `rewire`'s splice-and-recanonicalise logic directly: it already
    /// supports a complemented `target` edge natively, so no new buffer is
    /// needed to eliminate an old one.
    pub fn propagate_buffers(&mut self) {
        loop {
            let bufs: Vec<NodeId> = self
                .nodes
                .iter_ids()
                .filter(|&id| self.nodes[id].ty == NodeType::Buf)
                .collect();
            if bufs.is_empty() {
                break;
            }
            for id in bufs {
                if self.nodes[id].ty != NodeType::Buf {
                    continue; // eliminated already as a side effect this round
                }
                let inner = self.nodes[id].fanin0.unwrap();
                let fanouts = if self.fanout_enabled {
                    fanout::snapshot(&self.nodes, id)
                } else {
                    self.scan_fanouts(id)
                };
                for (succ, side) in fanouts {
                    if self.nodes[id].ty != NodeType::Buf {
                        break; // fully dereffed and deleted by an earlier iteration
                    }
                    self.rewire(succ, side, id, inner);
                }
            }
        }
    }

    /// `check()` (SPEC_FULL.md supplement 2): validates the §3 invariants,
    /// returning a descriptive error on the first violation instead of
    /// panicking.
    pub fn check(&mut self) -> AigResult<()> {
        let mut live_incoming: Vec<u32> = vec![0; self.nodes.len()];
        for id in self.nodes.iter_ids() {
            let n = self.nodes[id].clone();
            if !n.is_live() {
                continue;
            }
            if n.ty.is_hashable() {
                let found = self.hash.lookup(&self.nodes, n.ty, n.fanin0.unwrap(), n.fanin1, n.init);
                if found != Some(id) {
                    return Err(AigError::StructuralInvariant(format!(
                        "node {id} missing from hash table under its own canonical key"
                    )));
                }
            }
            let expected_level = self.local_level(id);
            if expected_level != n.level {
                return Err(AigError::StructuralInvariant(format!(
                    "node {id} has level {} but recomputed level is {}",
                    n.level, expected_level
                )));
            }
            if let Some(f0) = n.fanin0 {
                live_incoming[f0.node().index()] += 1;
            }
            if let Some(f1) = n.fanin1 {
                live_incoming[f1.node().index()] += 1;
            }
        }
        // Testable property 3 / invariant 7: ref count equals the number of
        // live incoming edges. Pi/Po/Const1/Assert are exempt from deletion
        // at zero refs (see `dec_ref`) but must still account honestly.
        for id in self.nodes.iter_ids() {
            if !self.nodes[id].is_live() {
                continue;
            }
            let expected = live_incoming[id.index()];
            if self.nodes[id].refs != expected {
                return Err(AigError::StructuralInvariant(format!(
                    "node {id} has refs={} but {expected} live incoming edges",
                    self.nodes[id].refs
                )));
            }
        }
        self.check_acyclic()?;
        Ok(())
    }

    /// `to_topo_vec` (SPEC_FULL.md supplement 3): walks every PO and latch
    /// input in topological order and re-issues the canonical constructors
    /// against a fresh manager, producing a deterministic re-serialization.
    /// Node ids in the returned manager depend only on construction order,
    /// not on the original manager's id assignment or any freed/reused
    /// slots, which is what lets two managers built from the same logical
    /// circuit compare equal node-for-node (used by the FRAIG idempotence
    /// test: `fraig(fraig(M))` and `fraig(M)` re-serialize identically).
    pub fn to_topo_vec(&mut self) -> Manager {
        let mut fresh = Manager::new();
        let mut map: std::collections::HashMap<NodeId, Edge> = std::collections::HashMap::new();
        map.insert(NodeId::CONST1, fresh.const1());
        for &pi in &self.pis.clone() {
            map.insert(pi, fresh.create_pi());
        }

        let mut order = Vec::new();
        self.sequential_dfs(|id| order.push(id));

        for id in order {
            if map.contains_key(&id) {
                continue; // a PI, already seeded above
            }
            let resolve = |m: &std::collections::HashMap<NodeId, Edge>, e: Edge| -> Edge {
                m[&e.node()].not_cond(e.is_complement())
            };
            let edge = match self.node_type(id) {
                NodeType::Const1 | NodeType::Pi | NodeType::None => continue,
                NodeType::And => {
                    let f0 = resolve(&map, self.fanin0(id).unwrap());
                    let f1 = resolve(&map, self.fanin1(id).unwrap());
                    fresh.and(f0, f1)
                }
                NodeType::Exor => {
                    let f0 = resolve(&map, self.fanin0(id).unwrap());
                    let f1 = resolve(&map, self.fanin1(id).unwrap());
                    fresh.exor(f0, f1)
                }
                NodeType::Latch => {
                    let f0 = resolve(&map, self.fanin0(id).unwrap());
                    fresh
                        .latch(f0, self.init(id))
                        .expect("latch input resolved from a valid source manager")
                }
                NodeType::Buf => resolve(&map, self.fanin0(id).unwrap()),
                NodeType::Po | NodeType::Assert => continue, // emitted below, in original PO order
            };
            map.insert(id, edge);
        }

        for &po in &self.pos.clone() {
            let input = self.fanin0(po).unwrap();
            let edge = map[&input.node()].not_cond(input.is_complement());
            fresh.create_po(edge);
        }
        fresh
    }
}

impl Default for Manager {
    fn default() -> Self {
        Manager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplaceOptions;

    /// Testable property 8: `replace(r, r, ...)` is a no-op.
    #[test]
    fn replace_with_self_is_a_noop() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let ab = mgr.and(a, b);
        mgr.create_po(ab);
        let before_nodes = mgr.num_nodes();
        let before_refs = mgr.refs(ab.node());

        mgr.replace(ab.node(), ab, ReplaceOptions::default()).unwrap();

        assert_eq!(mgr.num_nodes(), before_nodes);
        assert_eq!(mgr.refs(ab.node()), before_refs);
        mgr.check().unwrap();
    }

    /// `free_top_only` tombstones just the replaced node, leaving its old
    /// fanins' ref counts untouched instead of cascading the delete
    /// through the rest of the MFFC.
    #[test]
    fn free_top_only_skips_the_mffc_cascade() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let d = mgr.create_pi();
        let ab = mgr.and(a, b);
        mgr.create_po(ab);
        assert_eq!(mgr.refs(ab.node()), 1);
        let refs_a_before = mgr.refs(a.node());
        let refs_b_before = mgr.refs(b.node());

        mgr.replace(
            ab.node(),
            d,
            ReplaceOptions {
                update_level: false,
                free_top_only: true,
            },
        )
        .unwrap();

        assert_eq!(mgr.node_type(ab.node()), NodeType::None);
        assert_eq!(mgr.refs(a.node()), refs_a_before);
        assert_eq!(mgr.refs(b.node()), refs_b_before);
    }

    /// Testable properties 1-5: after a sequence of constructions, every
    /// live hashable node round-trips through its own canonical key, levels
    /// match a full recompute, ref counts match live incoming edges, and
    /// the graph stays acyclic.
    #[test]
    fn invariants_hold_after_a_mixed_construction_sequence() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let ab = mgr.and(a, b);
        let abc = mgr.exor(ab, c);
        mgr.create_po(abc);
        let ab_again = mgr.and(a, b);
        mgr.create_po(ab_again);
        mgr.check().unwrap();
    }
}
