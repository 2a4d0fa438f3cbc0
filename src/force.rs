//! FORCE placement (C14): a one-dimensional hypergraph-ordering heuristic,
//! grounded on `giaForce.c`'s `Frc_Man_t`/`Frc_ManCrossCut_rec` pattern
//! (iterative centre-of-gravity coordinate refinement settling into a
//! DFS-small-cut linear order). Each node's fanout set forms a hyperedge (spec §4.14
//! step 1); iterating centre-of-gravity coordinates and re-sorting tends to
//! cluster strongly-connected logic together, shrinking the peak number of
//! hyperedges crossing any position boundary (the "cross-cut", see
//! GLOSSARY).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::arena::NodeId;
use crate::config::ForceOptions;
use crate::edge::Edge;
use crate::manager::Manager;
use crate::node::NodeType;

/// The result of a `forcePlace` run: the best linear order found across all
/// iterations and the cross-cut it achieves.
#[derive(Clone, Debug)]
pub struct ForceOrdering {
    pub order: Vec<NodeId>,
    pub cross_cut: u32,
}

fn is_placed(ty: NodeType) -> bool {
    matches!(
        ty,
        NodeType::Pi | NodeType::Po | NodeType::Assert | NodeType::And | NodeType::Exor | NodeType::Latch
    )
}

fn fanins_of(mgr: &Manager, id: NodeId) -> [Option<Edge>; 2] {
    [mgr.fanin0(id), mgr.fanin1(id)]
}

/// Builds the hypergraph: `driver -> [driver] ++ every placed node that has
/// `driver` as one of its fanins` (spec §4.14: "each node's fanout set is a
/// hyperedge"). Built by scanning fanins directly rather than via the
/// optional fanout index, since `forcePlace` is meant to run on any
/// manager regardless of whether that index happens to be enabled.
fn build_hyperedges(mgr: &Manager, objects: &[NodeId]) -> FxHashMap<NodeId, Vec<NodeId>> {
    let mut hyperedges: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for &id in objects {
        hyperedges.entry(id).or_insert_with(|| vec![id]);
    }
    for &id in objects {
        for fanin in fanins_of(mgr, id).into_iter().flatten() {
            let driver = fanin.node();
            if let Some(members) = hyperedges.get_mut(&driver) {
                members.push(id);
            }
        }
    }
    hyperedges
}

/// Peak number of hyperedges whose span crosses any single position
/// boundary (GLOSSARY "Cross-cut"), computed with a sweep-line delta array:
/// each hyperedge with span `[min, max]` contributes a live wire to every
/// boundary strictly inside that span.
fn cross_cut(hyperedges: &FxHashMap<NodeId, Vec<NodeId>>, position: &FxHashMap<NodeId, usize>, n: usize) -> u32 {
    if n == 0 {
        return 0;
    }
    let mut delta = vec![0i32; n + 1];
    for members in hyperedges.values() {
        let mut lo = usize::MAX;
        let mut hi = 0usize;
        for &m in members {
            let p = position[&m];
            lo = lo.min(p);
            hi = hi.max(p);
        }
        if lo < hi {
            delta[lo] += 1;
            delta[hi] -= 1;
        }
    }
    let mut live = 0i32;
    let mut peak = 0i32;
    for d in delta {
        live += d;
        peak = peak.max(live);
    }
    peak as u32
}

/// `forcePlace(Manager, iterations) -> Ordering` (spec §6, §4.14).
pub fn force_place(mgr: &Manager, opts: ForceOptions) -> ForceOrdering {
    let objects: Vec<NodeId> = (0..mgr.num_nodes() as u32)
        .map(NodeId::from_u32)
        .filter(|&id| is_placed(mgr.node_type(id)))
        .collect();
    let n = objects.len();
    if n == 0 {
        return ForceOrdering {
            order: Vec::new(),
            cross_cut: 0,
        };
    }

    let hyperedges = build_hyperedges(mgr, &objects);

    let mut rng = match opts.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut order = objects.clone();
    order.shuffle(&mut rng);
    let mut position: FxHashMap<NodeId, usize> =
        order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut best_order = order.clone();
    let mut best_cross = cross_cut(&hyperedges, &position, n);

    for _ in 0..opts.iterations {
        let centers: FxHashMap<NodeId, f64> = hyperedges
            .iter()
            .map(|(&driver, members)| {
                let mut lo = usize::MAX;
                let mut hi = 0usize;
                for &m in members {
                    let p = position[&m];
                    lo = lo.min(p);
                    hi = hi.max(p);
                }
                (driver, (lo as f64 + hi as f64) / 2.0)
            })
            .collect();

        let mut new_coord: Vec<(NodeId, f64)> = Vec::with_capacity(n);
        for &id in &objects {
            let mut sum = centers[&id];
            let mut count = 1u32;
            for fanin in fanins_of(mgr, id).into_iter().flatten() {
                if let Some(&c) = centers.get(&fanin.node()) {
                    sum += c;
                    count += 1;
                }
            }
            new_coord.push((id, sum / count as f64));
        }
        // Stable float sort (spec §4.14 step 3): ties keep their relative
        // order from the previous iteration rather than reshuffling, which
        // is what lets the heuristic converge instead of oscillating.
        new_coord.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        order = new_coord.into_iter().map(|(id, _)| id).collect();
        position = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let cc = cross_cut(&hyperedges, &position, n);
        if cc < best_cross {
            best_cross = cc;
            best_order = order.clone();
        }
    }

    ForceOrdering {
        order: best_order,
        cross_cut: best_cross,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Init;

    /// Scenario S6: a 16-stage shift register (16 latches fed by 16 PIs,
    /// all 16 ANDed against one shared enable PI and driven out through 16
    /// POs). Each lane (PI, latch, AND, PO) is a short local chain; the
    /// only wide-spanning net is the shared `enable` fanout, so a good
    /// placement keeps the cross-cut at 2 or less (the enable net plus at
    /// most one lane-local net overlapping a lane boundary), matching the
    /// spec's own targeted unit test note for
    /// `Frc_ManCrossCut_rec`'s predecrement semantics (§9 Open Questions).
    #[test]
    fn force_reduces_cross_cut_on_a_shift_chain() {
        let mut mgr = Manager::new();
        let enable = mgr.create_pi();
        for _ in 0..16 {
            let pi = mgr.create_pi();
            let latch = mgr.latch(pi, Init::DontCare).unwrap();
            let gated = mgr.and(latch, enable);
            mgr.create_po(gated);
        }

        let seeded = force_place(
            &mgr,
            ForceOptions {
                iterations: 10,
                seed: Some(42),
            },
        );
        assert!(
            seeded.cross_cut <= 2,
            "expected FORCE to settle at cross-cut <= 2, got {}",
            seeded.cross_cut
        );
    }

    #[test]
    fn empty_manager_places_nothing() {
        let mgr = Manager::new();
        let result = force_place(&mgr, ForceOptions::default());
        assert!(result.order.is_empty());
        assert_eq!(result.cross_cut, 0);
    }
}
