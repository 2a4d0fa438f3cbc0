//! Cut enumeration (C7), grounded on `ivyCut.c`'s `Ivy_NodeComputeCuts` and
//! `Ivy_CutExtendLeaf`: for PI/constant leaves stop, for `Buf`/`Latch`
//! leaves cross transparently into their single fanin (bumping a latch-depth
//! counter on a genuine `Latch` crossing), for `And`/`Exor` leaves expand
//! into both fanins.

use std::collections::VecDeque;

use smallvec::{smallvec, SmallVec};

use crate::arena::NodeId;
use crate::manager::Manager;
use crate::node::NodeType;

/// Cuts never exceed 6 leaves (spec §4.7: "K ≤ 6"); inline storage avoids a
/// heap allocation for the overwhelming majority of cuts enumerated during a
/// rewrite pass, the same trade-off `cranelift-codegen`'s instruction-operand
/// lists make with `smallvec`.
type LeafVec = SmallVec<[LeafDescriptor; 6]>;

/// One leaf of a cut: the node it terminates on, and how many latch
/// boundaries were crossed getting there from the cut's root (spec §4.7).
/// The source packs this into the low 8 bits of a 32-bit field; a plain
/// struct is clearer here and costs nothing since cuts are always small.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafDescriptor {
    pub node: NodeId,
    pub latch_depth: u8,
}

/// `ivyCut.c` refuses to extend a leaf past 15 latch crossings.
const MAX_LATCH_DEPTH: u8 = 15;

/// An ordered, duplicate-free set of ≤K leaves separating `root` from the
/// rest of the graph, plus the signature hash used to short-circuit
/// dominance tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cut {
    pub leaves: LeafVec,
    pub hash: u32,
}

impl Cut {
    fn singleton(node: NodeId) -> Cut {
        let leaves: LeafVec = smallvec![LeafDescriptor {
            node,
            latch_depth: 0,
        }];
        Cut {
            hash: cut_hash(&leaves),
            leaves,
        }
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.leaves.iter().map(|l| l.node)
    }

    /// True if every leaf of `self` is also a leaf of `other` (spec §4.7
    /// dominance: "any stored cut is a subset of it").
    fn is_subset_of(&self, other: &Cut) -> bool {
        if self.hash & !other.hash != 0 {
            return false;
        }
        self.node_ids().all(|n| other.node_ids().any(|m| m == n))
    }
}

fn cut_hash(leaves: &[LeafDescriptor]) -> u32 {
    leaves
        .iter()
        .fold(0u32, |acc, l| acc | (1u32 << (l.node.as_u32() % 31)))
}

/// Builds a new leaf set by removing `leaves[at]` and splicing in
/// `replacement`, deduplicating by node id (spec §4.7: "a cut whose two
/// prospective new leaves are identical is flattened to one") and keeping
/// leaves in increasing id-major/depth-minor order.
fn splice(leaves: &[LeafDescriptor], at: usize, replacement: &[LeafDescriptor]) -> LeafVec {
    let mut out: LeafVec = leaves
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != at)
        .map(|(_, l)| *l)
        .collect();
    for r in replacement {
        if let Some(existing) = out.iter_mut().find(|l| l.node == r.node) {
            existing.latch_depth = existing.latch_depth.min(r.latch_depth);
        } else {
            out.push(*r);
        }
    }
    out.sort_by_key(|l| (l.node.as_u32(), l.latch_depth));
    out
}

/// Whether `id` can be expanded further by cut enumeration: constants and
/// plain primary inputs are hard leaves (no fanin to cross into).
fn is_expandable(mgr: &Manager, id: NodeId) -> bool {
    !matches!(mgr.node_type(id), NodeType::Const1 | NodeType::Pi)
}

/// Enumerates all K-feasible cuts rooted at `root` (spec §4.7), capped at
/// `store_limit` stored cuts. Returns the stored cuts and whether the store
/// saturated (hit the cap before the frontier was exhausted).
pub fn enumerate_cuts(
    mgr: &Manager,
    root: NodeId,
    max_leaves: usize,
    store_limit: usize,
) -> (Vec<Cut>, bool) {
    let trivial = Cut::singleton(root);
    let mut store = vec![trivial.clone()];
    let mut queue: VecDeque<Cut> = VecDeque::new();
    queue.push_back(trivial);
    let mut saturated = false;

    while let Some(cut) = queue.pop_front() {
        if store.len() >= store_limit {
            saturated = true;
            break;
        }
        for i in 0..cut.leaves.len() {
            let leaf = cut.leaves[i];
            if !is_expandable(mgr, leaf.node) {
                continue;
            }
            let ty = mgr.node_type(leaf.node);
            let fanin0 = mgr.fanin0(leaf.node);
            let fanin1 = mgr.fanin1(leaf.node);
            let replacement: Vec<LeafDescriptor> = match ty {
                NodeType::Buf => {
                    vec![LeafDescriptor {
                        node: fanin0.unwrap().node(),
                        latch_depth: leaf.latch_depth,
                    }]
                }
                NodeType::Latch => {
                    let depth = leaf.latch_depth + 1;
                    if depth > MAX_LATCH_DEPTH {
                        continue;
                    }
                    vec![LeafDescriptor {
                        node: fanin0.unwrap().node(),
                        latch_depth: depth,
                    }]
                }
                NodeType::And | NodeType::Exor => vec![
                    LeafDescriptor {
                        node: fanin0.unwrap().node(),
                        latch_depth: leaf.latch_depth,
                    },
                    LeafDescriptor {
                        node: fanin1.unwrap().node(),
                        latch_depth: leaf.latch_depth,
                    },
                ],
                _ => continue,
            };
            let new_leaves = splice(&cut.leaves, i, &replacement);
            if new_leaves.len() > max_leaves {
                continue;
            }
            let candidate = Cut {
                hash: cut_hash(&new_leaves),
                leaves: new_leaves,
            };
            if candidate.leaves == cut.leaves {
                continue; // flattened back to the same cut, e.g. both fanins already present
            }
            if store.iter().any(|stored| stored.is_subset_of(&candidate)) {
                continue; // dominated by an existing, smaller cut
            }
            store.retain(|stored| !candidate.is_subset_of(stored));
            store.push(candidate.clone());
            queue.push_back(candidate);
        }
    }
    (store, saturated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::Manager;

    #[test]
    fn pi_has_exactly_one_trivial_cut() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let (cuts, _) = enumerate_cuts(&mgr, a.node(), 4, 256);
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].leaves.len(), 1);
        assert_eq!(cuts[0].leaves[0].node, a.node());
    }

    #[test]
    fn const1_has_exactly_one_trivial_cut() {
        let mgr = Manager::new();
        let (cuts, _) = enumerate_cuts(&mgr, NodeId::CONST1, 4, 256);
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].leaves[0].node, NodeId::CONST1);
    }

    #[test]
    fn and_of_two_pis_has_the_pair_cut() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let x = mgr.and(a, b);
        let (cuts, _) = enumerate_cuts(&mgr, x.node(), 4, 256);
        assert!(cuts.iter().any(|c| c.leaves.len() == 2
            && c.node_ids().any(|n| n == a.node())
            && c.node_ids().any(|n| n == b.node())));
    }
}
