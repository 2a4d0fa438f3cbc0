//! Cut-rewriting (C10), grounded on `ivyRwr.c`'s per-node rewrite loop:
//! enumerate cuts, canonicalise the cut's function, look up candidate
//! replacement subgraphs for that NPN class, and splice in whichever one
//! saves the most nodes.

use log::{debug, trace};

use crate::arena::NodeId;
use crate::config::{ReplaceOptions, RewriteOptions, RewriteStats};
use crate::cut::enumerate_cuts;
use crate::edge::Edge;
use crate::manager::Manager;
use crate::mffc::{cut_truth_table, mffc_size};
use crate::node::NodeType;
use crate::npn::{library, tables};
use crate::required::RequiredLevels;

/// One fully-resolved rewrite candidate for a node: the replacement edge,
/// how many brand new nodes instantiating it cost, and the MFFC size it
/// would free.
struct Candidate {
    edge: Edge,
    new_nodes: u32,
    mffc_save: u32,
    level: u32,
}

impl Candidate {
    /// Spec §4.10 step 6: "score = MFFC save minus new nodes added".
    fn score(&self) -> i64 {
        self.mffc_save as i64 - self.new_nodes as i64
    }
}

/// Drops a speculative instantiation that did not win: bumping and
/// immediately releasing the reference lets the normal ref-counted deletion
/// cascade reclaim any node that instantiation created but nothing else yet
/// points to, without disturbing nodes it merely reused via hash-consing.
fn discard(mgr: &mut Manager, edge: Edge) {
    mgr.inc_ref(edge.node());
    mgr.dec_ref(edge.node());
}

/// Explores every stored cut of `node` and returns the best-scoring
/// replacement found, if any (spec §4.10 steps 1-6).
fn best_candidate(
    mgr: &mut Manager,
    node: NodeId,
    opts: RewriteOptions,
    required: &RequiredLevels,
    cuts_enumerated: &mut u64,
) -> Option<Candidate> {
    let (cuts, _saturated) =
        enumerate_cuts(mgr, node, opts.max_cut_size as usize, opts.cut_store_limit as usize);
    *cuts_enumerated += cuts.len() as u64;

    let required_level = if opts.update_level {
        required.get(node)
    } else {
        u32::MAX
    };

    let mut best: Option<Candidate> = None;
    for cut in &cuts {
        if cut.leaves.len() < 2 || cut.leaves.len() > 4 {
            continue; // a single-leaf cut is the node itself: nothing to rewrite
        }
        let leaf_nodes: Vec<NodeId> = cut.leaves.iter().map(|l| l.node).collect();
        let truth = cut_truth_table(mgr, Edge::regular_edge(node), cut);
        let entry = tables().lookup(truth);
        let candidates = library().bucket(entry.canon);
        if candidates.is_empty() {
            continue;
        }
        let mffc_save = mffc_size(mgr, node, &leaf_nodes);
        let mask = entry.input_neg();

        for sg in candidates {
            let mut leaves = [Edge::const1(); 4];
            for i in 0..4usize {
                let real_idx = entry.perm[i] as usize;
                if real_idx < leaf_nodes.len() {
                    let negate = (mask >> entry.perm[i]) & 1 != 0;
                    leaves[i] = Edge::regular_edge(leaf_nodes[real_idx]).not_cond(negate);
                }
            }
            let (raw_result, new_nodes) = sg.instantiate(mgr, &leaves);
            let result = raw_result.not_cond(entry.output_neg());

            if result.node() == node {
                discard(mgr, raw_result);
                continue; // rediscovered the same node: no actual change
            }
            let level = mgr.level(result.node());
            if level > required_level {
                discard(mgr, raw_result);
                continue; // would lengthen the critical path to some PO
            }
            let candidate = Candidate {
                edge: result,
                new_nodes,
                mffc_save,
                level,
            };
            let keep = match &best {
                None => true,
                Some(b) => {
                    (candidate.score(), std::cmp::Reverse(candidate.level))
                        > (b.score(), std::cmp::Reverse(b.level))
                }
            };
            if keep {
                if let Some(prev) = best.take() {
                    discard(mgr, prev.edge);
                }
                best = Some(candidate);
            } else {
                discard(mgr, raw_result);
            }
        }
    }
    best
}

/// Runs one cut-rewriting pass over every And/Exor node that existed when
/// the pass started (spec §4.10, §5 "the pass iterates only up to the
/// pre-pass max id so newly created nodes are not re-processed").
pub fn rewrite(mgr: &mut Manager, opts: RewriteOptions) -> RewriteStats {
    let mut stats = RewriteStats {
        nodes_before: mgr.stats().ands + mgr.stats().exors,
        ..Default::default()
    };

    let required = if opts.update_level {
        mgr.compute_required_levels()
    } else {
        RequiredLevels::default()
    };

    let frontier = mgr.num_nodes() as u32;
    let mut cuts_enumerated = 0u64;
    for raw_id in 0..frontier {
        let id = NodeId::from_u32(raw_id);
        if !matches!(mgr.node_type(id), NodeType::And | NodeType::Exor) {
            continue;
        }
        if mgr.refs(id) == 0 {
            continue; // already dead (freed by an earlier replacement this pass)
        }
        let Some(candidate) = best_candidate(mgr, id, opts, &required, &mut cuts_enumerated) else {
            continue;
        };
        let gain = candidate.score();
        if gain > 0 || (gain == 0 && opts.use_zero_cost) {
            if opts.verbose {
                debug!(
                    "rewrite: node {:?} -> {:?} (save {}, new {})",
                    id, candidate.edge, candidate.mffc_save, candidate.new_nodes
                );
            }
            mgr.replace(
                id,
                candidate.edge,
                ReplaceOptions {
                    update_level: false,
                    free_top_only: false,
                },
            )
            .expect("a winning candidate was already checked against the required level");
            stats.replacements_applied += 1;
        } else {
            discard(mgr, candidate.edge);
        }
    }

    mgr.propagate_buffers();
    if opts.update_level {
        mgr.recompute_levels();
    }
    stats.cuts_enumerated = cuts_enumerated;
    stats.nodes_after = mgr.stats().ands + mgr.stats().exors;
    trace!(
        "rewrite pass: {} -> {} and/exor nodes, {} replacements",
        stats.nodes_before, stats.nodes_after, stats.replacements_applied
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distributivity_reduces_and_of_or_to_fewer_nodes() {
        // a & (b | c) == (a&b) | (a&c) but the single-fanin-shared form
        // needs one fewer AND than a naive two-product expansion; build the
        // three-AND/inverter expansion of `a & (b|c)` and confirm a rewrite
        // pass does not increase node count and keeps the function intact.
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let or_bc = mgr.and(b.invert(), c.invert()).invert(); // b | c
        let f = mgr.and(a, or_bc);
        mgr.create_po(f);
        let before = mgr.stats().ands + mgr.stats().exors;

        let stats = rewrite(&mut mgr, RewriteOptions::default());

        assert!(stats.nodes_after <= before);
        mgr.check().expect("manager stays structurally sound after a rewrite pass");
    }

    #[test]
    fn pass_only_touches_nodes_that_existed_at_pass_start() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let ab = mgr.and(a, b);
        mgr.create_po(ab);
        let stats = rewrite(&mut mgr, RewriteOptions::default());
        // A two-leaf AND has no smaller replacement available; the pass
        // must leave it alone rather than looping on its own output.
        assert_eq!(stats.replacements_applied, 0);
    }

    /// Testable property 9: running `rewrite` twice is never worse than
    /// running it once.
    #[test]
    fn second_rewrite_pass_is_never_worse_than_the_first() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let c = mgr.create_pi();
        let ab = mgr.and(a, b);
        let ac = mgr.and(a, c);
        let f = mgr.and(ab.invert(), ac.invert()).invert();
        mgr.create_po(f);

        let stats1 = rewrite(&mut mgr, RewriteOptions::default());
        let stats2 = rewrite(&mut mgr, RewriteOptions::default());

        assert!(stats2.nodes_after <= stats1.nodes_after);
        mgr.check().expect("manager stays structurally sound across repeated passes");
    }
}
