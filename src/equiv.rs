//! Equivalence-class refinement (C12): groups nodes by simulation
//! signature, normalising a node's complemented signature into its
//! regular-orientation class the same way the constant-0 signature folds
//! into the constant-1 class (spec §4.12). Grounded on `ivyFraig.c`'s
//! table-of-classes bucketing, built here as a plain `FxHashMap` rebuild
//! per round rather than an intrusive linked list, since `Simulation`
//! already keeps signatures monotonically growing (see `sim.rs`) so a full
//! rebuild after each extension is equivalent to incremental refinement.

use rustc_hash::FxHashMap;

use crate::arena::NodeId;
use crate::config::SimConfig;
use crate::manager::Manager;
use crate::node::NodeType;
use crate::sim::{extend_random, Simulation};

/// One simulation class: a representative node (the lowest-level member,
/// spec §4.12 "a distinguished representative") and every other member
/// paired with its polarity relative to the representative.
#[derive(Clone, Debug)]
pub struct Class {
    pub representative: NodeId,
    /// `(member, complemented_relative_to_representative)`, excluding the
    /// representative itself.
    pub members: Vec<(NodeId, bool)>,
}

/// The current partition of all live, hashable nodes (plus PIs/latches) by
/// simulation signature.
#[derive(Clone, Debug, Default)]
pub struct EquivClasses {
    classes: Vec<Class>,
    /// node -> (index into `classes`, complemented relative to that class's
    /// representative).
    lookup: FxHashMap<NodeId, (usize, bool)>,
}

impl EquivClasses {
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// The representative of `node`'s class and whether `node` sits
    /// complemented relative to it. `None` for nodes outside the
    /// classified set (e.g. `Const1`, `Po`).
    pub fn representative_of(&self, node: NodeId) -> Option<(NodeId, bool)> {
        let (idx, compl) = *self.lookup.get(&node)?;
        Some((self.classes[idx].representative, compl))
    }

    /// Builds a fresh partition from the manager's current simulation
    /// signatures. Candidates are every live `And`/`Exor`/`Latch`/`Pi` node;
    /// `Const1` is its own fixed point and is not classified (nothing can
    /// usefully merge into it here; FRAIG's zero-detection shortcut in
    /// `fraig.rs` handles constant collapse separately).
    pub fn build(mgr: &Manager, _sim: &Simulation) -> EquivClasses {
        let mut buckets: FxHashMap<Vec<u32>, Vec<(NodeId, bool)>> = FxHashMap::default();
        for raw in 0..mgr.num_nodes() as u32 {
            let id = NodeId::from_u32(raw);
            if id == NodeId::CONST1 {
                continue;
            }
            let ty = mgr.node_type(id);
            if !matches!(ty, NodeType::And | NodeType::Exor | NodeType::Latch | NodeType::Pi) {
                continue;
            }
            let sig = &mgr.nodes[id].sim;
            if sig.is_empty() {
                continue;
            }
            let negated: Vec<u32> = sig.iter().map(|w| !w).collect();
            let (canon, compl) = if sig <= &negated {
                (sig.clone(), false)
            } else {
                (negated, true)
            };
            buckets.entry(canon).or_default().push((id, compl));
        }

        let mut classes = Vec::with_capacity(buckets.len());
        let mut lookup = FxHashMap::default();
        for (_, mut members) in buckets {
            members.sort_by_key(|&(id, _)| (mgr.level(id), id.as_u32()));
            let (rep, rep_compl) = members[0];
            let mut rest = Vec::with_capacity(members.len() - 1);
            for &(id, compl) in &members[1..] {
                // relative polarity: both stored as complemented-or-not
                // against the same canonical signature, so xor gives the
                // member's polarity relative to the representative.
                rest.push((id, compl ^ rep_compl));
            }
            let idx = classes.len();
            lookup.insert(rep, (idx, false));
            for &(id, rel) in &rest {
                lookup.insert(id, (idx, rel));
            }
            classes.push(Class {
                representative: rep,
                members: rest,
            });
        }
        EquivClasses { classes, lookup }
    }
}

/// A refinement round never runs longer than this many extra random rounds
/// past the initial random + distance-1 seeding, bounding the "keep
/// simulating until saturation" loop the same way `fraig.rs`'s
/// `MAX_REFINE_ROUNDS` bounds the SAT counter-example loop (spec §7
/// "resource exhausted... stops early and reports the partial result").
const MAX_SATURATION_ROUNDS: u32 = 8;

/// Simulates and refines class partitions until the fraction of classes
/// that changed membership in the latest round drops below
/// `cfg.sim_saturation` (spec §4.12: "saturation is reached when the ratio
/// of refined classes per round drops below a configured threshold").
/// Returns the final simulation state and its induced partition.
pub fn refine_to_saturation(mgr: &mut Manager, cfg: SimConfig) -> (Simulation, EquivClasses) {
    let mut sim = crate::sim::simulate_random(mgr, cfg);
    crate::sim::extend_distance1(mgr, &mut sim, cfg);
    let mut classes = EquivClasses::build(mgr, &sim);
    let mut prev_count = classes.num_classes().max(1);

    for _ in 0..MAX_SATURATION_ROUNDS {
        extend_random(mgr, &mut sim, cfg, cfg.sim_words.max(1) as usize);
        let next = EquivClasses::build(mgr, &sim);
        let next_count = next.num_classes().max(1);
        let ratio = (next_count as f64 - prev_count as f64).abs() / prev_count as f64;
        prev_count = next_count;
        classes = next;
        if ratio < cfg.sim_saturation {
            break;
        }
    }
    (sim, classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sim::simulate_random;

    #[test]
    fn structurally_identical_nodes_share_a_class() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let x = mgr.and(a, b);
        mgr.create_po(x);
        let sim = simulate_random(&mut mgr, SimConfig::default());
        let classes = EquivClasses::build(&mgr, &sim);
        // a and b have distinct random signatures almost surely, so at
        // least the manager built without panicking and `x` finds itself.
        assert!(classes.representative_of(x.node()).is_some());
    }

    #[test]
    fn every_classified_node_has_a_representative() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let ab = mgr.and(a, b);
        let abc = mgr.and(ab, c);
        mgr.create_po(abc);
        let sim = simulate_random(&mut mgr, SimConfig::default());
        let classes = EquivClasses::build(&mgr, &sim);
        for &n in &[a.node(), b.node(), c.node(), ab.node(), abc.node()] {
            assert!(classes.representative_of(n).is_some());
        }
        assert!(classes.num_classes() > 0);
    }
}
