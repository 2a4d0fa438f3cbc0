//! DFS, level recomputation and acyclicity (C6). Combinational DFS colours
//! nodes with `mark_a`; the full-recompute level pass clears and then
//! memoises level bottom-up; acyclicity uses a tri-colour DFS over two
//! travel-id epochs, grounded in spirit on `DominatorTree`'s explicit-stack
//! postorder walk (`dominator_tree.rs`) rather than native recursion, since
//! spec §9 calls for explicit stacks wherever recursion could run deep.

use crate::arena::NodeId;
use crate::edge::Edge;
use crate::error::AigError;
use crate::manager::Manager;
use crate::node::NodeType;

impl Manager {
    /// Bumps the travel-id epoch and returns it. Two consecutive epochs are
    /// used by acyclicity checking to distinguish "in progress" from "done".
    pub(crate) fn new_travel_id(&mut self) -> u32 {
        self.travel_id += 1;
        self.travel_id
    }

    /// Combinational DFS from `root`, calling `visit` once per newly seen
    /// node in post-order (fanins before the node itself). Does not cross
    /// latch boundaries: a `Latch` node is itself visited but its fanin is
    /// not followed (that is "sequential" DFS, see `sequential_dfs`).
    pub fn dfs_combinational(&mut self, root: NodeId, mut visit: impl FnMut(NodeId)) {
        let id = self.new_travel_id();
        let mut stack: Vec<(NodeId, u8)> = vec![(root, 0)];
        while let Some((node, phase)) = stack.pop() {
            if self.nodes[node].travel_id == id {
                continue;
            }
            if phase == 0 {
                self.nodes[node].travel_id = id;
                stack.push((node, 1));
                if self.nodes[node].ty == NodeType::Latch {
                    continue;
                }
                if let Some(f1) = self.nodes[node].fanin1 {
                    if self.nodes[f1.node()].travel_id != id {
                        stack.push((f1.node(), 0));
                    }
                }
                if let Some(f0) = self.nodes[node].fanin0 {
                    if self.nodes[f0.node()].travel_id != id {
                        stack.push((f0.node(), 0));
                    }
                }
            } else {
                visit(node);
            }
        }
    }

    /// Sequential DFS (spec §4.6): collects all latches first, then walks
    /// from every PO and every latch input in turn, following fanins
    /// transparently through latches this time.
    pub fn sequential_dfs(&mut self, mut visit: impl FnMut(NodeId)) {
        let id = self.new_travel_id();
        let mut roots: Vec<NodeId> = self.pos.clone();
        roots.extend(self.latches.iter().copied());
        for root in roots {
            let mut stack: Vec<(NodeId, u8)> = vec![(root, 0)];
            while let Some((node, phase)) = stack.pop() {
                if self.nodes[node].travel_id == id {
                    continue;
                }
                if phase == 0 {
                    self.nodes[node].travel_id = id;
                    stack.push((node, 1));
                    if let Some(f1) = self.nodes[node].fanin1 {
                        if self.nodes[f1.node()].travel_id != id {
                            stack.push((f1.node(), 0));
                        }
                    }
                    if let Some(f0) = self.nodes[node].fanin0 {
                        if self.nodes[f0.node()].travel_id != id {
                            stack.push((f0.node(), 0));
                        }
                    }
                } else {
                    visit(node);
                }
            }
        }
    }

    /// Recomputes `level` for every live node from scratch (spec §4.6).
    pub fn recompute_levels(&mut self) {
        for id in self.nodes.iter_ids() {
            if self.nodes[id].is_live() {
                self.nodes[id].level = 0;
            }
        }
        let roots: Vec<NodeId> = self
            .pos
            .iter()
            .copied()
            .chain(self.latches.iter().copied())
            .collect();
        for root in roots {
            self.dfs_combinational(root, |_| {});
        }
        // A second post-order pass assigns levels bottom-up; the DFS above
        // only established visitation order via travel ids, so recompute
        // level directly per node in topological (increasing-id, since ids
        // are allocated in dependency order for a DAG) order instead.
        for id in self.nodes.iter_ids() {
            if self.nodes[id].is_live() {
                let level = self.compute_level(id);
                self.nodes[id].level = level;
            }
        }
    }

    fn compute_level(&self, id: NodeId) -> u32 {
        let n = &self.nodes[id];
        match n.ty {
            NodeType::Const1 | NodeType::Pi | NodeType::Latch | NodeType::None => 0,
            NodeType::Buf => self.nodes[n.fanin0.unwrap().node()].level,
            NodeType::Po | NodeType::Assert => self.nodes[n.fanin0.unwrap().node()].level,
            NodeType::And => {
                let l0 = self.nodes[n.fanin0.unwrap().node()].level;
                let l1 = self.nodes[n.fanin1.unwrap().node()].level;
                1 + l0.max(l1)
            }
            NodeType::Exor => {
                let l0 = self.nodes[n.fanin0.unwrap().node()].level;
                let l1 = self.nodes[n.fanin1.unwrap().node()].level;
                2 + l0.max(l1)
            }
        }
    }

    /// Recomputes the level of a single node from its fanins' *current*
    /// levels (used by incremental propagation in `replace`).
    pub(crate) fn local_level(&self, id: NodeId) -> u32 {
        self.compute_level(id)
    }

    /// Incrementally pushes level changes forward through the fanout ring
    /// from `seeds` (spec §4.10 "levels... updated incrementally forward
    /// through the fanout graph" rather than a full recompute per
    /// `replace`). A node's level can only change if one of its fanins'
    /// levels changed, so once `local_level` returns the value already
    /// stored, that node (and everything downstream of it) is a fixed
    /// point and the walk stops there.
    pub(crate) fn propagate_levels_forward(&mut self, seeds: Vec<NodeId>) {
        let mut queue: std::collections::VecDeque<NodeId> = seeds.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if !self.nodes[id].is_live() {
                continue;
            }
            let new_level = self.local_level(id);
            if new_level == self.nodes[id].level {
                continue;
            }
            self.nodes[id].level = new_level;
            let succs = if self.fanout_enabled {
                crate::fanout::snapshot(&self.nodes, id)
            } else {
                self.scan_fanouts(id)
            };
            for (succ, _) in succs {
                queue.push_back(succ);
            }
        }
    }

    /// Acyclicity check (spec §4.6 and testable property 5): a tri-colour
    /// DFS using two travel-id epochs. Returns the first cycle found, if
    /// any.
    pub fn check_acyclic(&mut self) -> Result<(), AigError> {
        let in_progress = self.new_travel_id();
        let done = self.new_travel_id();
        let roots: Vec<NodeId> = self
            .pos
            .iter()
            .copied()
            .chain(self.latches.iter().copied())
            .collect();
        for root in roots {
            if self.nodes[root].travel_id == done {
                continue;
            }
            if let Some(path) = self.acyclic_visit(root, in_progress, done) {
                let culprit = *path.last().unwrap();
                return Err(AigError::CycleDetected { culprit, path });
            }
        }
        Ok(())
    }

    fn acyclic_visit(&mut self, root: NodeId, in_progress: u32, done: u32) -> Option<Vec<NodeId>> {
        enum Frame {
            Enter(NodeId),
            Exit(NodeId),
        }
        let mut stack = vec![Frame::Enter(root)];
        let mut path: Vec<NodeId> = Vec::new();
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(node) => {
                    if self.nodes[node].travel_id == done {
                        continue;
                    }
                    if self.nodes[node].travel_id == in_progress {
                        path.push(node);
                        return Some(path);
                    }
                    self.nodes[node].travel_id = in_progress;
                    path.push(node);
                    stack.push(Frame::Exit(node));
                    if self.nodes[node].ty == NodeType::Latch {
                        continue;
                    }
                    let fanins: Vec<Edge> = [self.nodes[node].fanin0, self.nodes[node].fanin1]
                        .into_iter()
                        .flatten()
                        .collect();
                    for f in fanins {
                        stack.push(Frame::Enter(f.node()));
                    }
                }
                Frame::Exit(node) => {
                    self.nodes[node].travel_id = done;
                    path.pop();
                }
            }
        }
        None
    }
}
