//! Parallel simulation kernel (C11), grounded on `ivySeq.c`'s
//! `Ivy_ManSeqRandomSim` and on `ivyFraig.c`'s distance-1 pattern generator.
//! Each live node carries a 32-bit-word signature (`Node::sim`) whose total
//! width starts at `SimConfig::sim_words` random words, is extended with one
//! distance-1 word per PI, and grows by one more word every time FRAIG feeds
//! a SAT counter-example back in (spec §4.11, §4.13 "feed it into
//! simulation"). Growing rather than overwriting keeps refinement
//! monotonic: once two nodes' signatures differ they never differ "less",
//! which is what lets equivalence-class refinement in `equiv.rs` only ever
//! split classes, never merge them back together.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arena::NodeId;
use crate::config::SimConfig;
use crate::edge::Edge;
use crate::manager::Manager;
use crate::node::NodeType;

/// The current simulation state: just the accumulated word count: the
/// signatures themselves live on `Node::sim`, one vector per node, so that
/// `equiv.rs` can read them directly without a parallel lookup structure.
#[derive(Clone, Copy, Debug, Default)]
pub struct Simulation {
    pub words: usize,
}

impl Simulation {
    /// The node's current signature, with its own complement applied.
    pub fn signature(mgr: &Manager, edge: Edge) -> Vec<u32> {
        let base = &mgr.nodes[edge.node()].sim;
        if edge.is_complement() {
            base.iter().map(|w| !w).collect()
        } else {
            base.clone()
        }
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Seeds every PI/latch with `cfg.sim_words` random words (constants get an
/// all-ones word), then propagates to a fixed point in increasing-id
/// (topological, per §5 "node ids grow monotonically") order.
///
/// Latches are modelled as free variables here, the same choice §4.8 makes
/// for truth-table leaves: this crate does not carry a clocked/sequential
/// simulation model (spec's Non-goals exclude timing), so a latch's
/// "present state" is just another unconstrained random signal.
pub fn simulate_random(mgr: &mut Manager, cfg: SimConfig) -> Simulation {
    let words = cfg.sim_words.max(1) as usize;
    let mut rng = rng_from(cfg.seed);
    seed_random(mgr, &mut rng, words);
    propagate(mgr, words);
    Simulation { words }
}

fn seed_random(mgr: &mut Manager, rng: &mut StdRng, words: usize) {
    mgr.nodes[NodeId::CONST1].sim = vec![u32::MAX; words];
    for &pi in &mgr.pis.clone() {
        mgr.nodes[pi].sim = (0..words).map(|_| rng.gen::<u32>()).collect();
    }
    for &latch in &mgr.latches.clone() {
        mgr.nodes[latch].sim = (0..words).map(|_| rng.gen::<u32>()).collect();
    }
}

/// Appends one distance-1 word per PI (capped at `cfg.sim_words` words, spec
/// §4.11: "flips exactly one PI bit in each of the first `nPIs` words
/// relative to a seed pattern"): word `k` is the shared seed pattern with
/// only PI `k`'s own copy of that word flipped at bit `k mod 32`, so that
/// word forms a 1-Hamming-ball neighbour of the seed restricted to PI `k`.
pub fn extend_distance1(mgr: &mut Manager, sim: &mut Simulation, cfg: SimConfig) {
    let mut rng = rng_from(cfg.seed);
    let seed_word = rng.gen::<u32>();
    let pis = mgr.pis.clone();
    let extra = pis.len().min(cfg.sim_words.max(1) as usize);
    if extra == 0 {
        return;
    }
    mgr.nodes[NodeId::CONST1]
        .sim
        .extend(std::iter::repeat(u32::MAX).take(extra));
    for (i, &pi) in pis.iter().enumerate() {
        for k in 0..extra {
            let word = if i == k {
                seed_word ^ (1u32 << (k % 32))
            } else {
                seed_word
            };
            mgr.nodes[pi].sim.push(word);
        }
    }
    for &latch in &mgr.latches.clone() {
        for _ in 0..extra {
            mgr.nodes[latch].sim.push(rng.gen::<u32>());
        }
    }
    sim.words += extra;
    propagate(mgr, sim.words);
}

/// Appends `words` more freshly-random words (spec §4.12: a refinement round
/// beyond the initial random + distance-1 seeding, used by
/// `equiv::refine_to_saturation` to keep splitting classes until the ratio
/// of newly-split classes drops below `simSaturation`).
pub fn extend_random(mgr: &mut Manager, sim: &mut Simulation, cfg: SimConfig, words: usize) {
    if words == 0 {
        return;
    }
    let mut rng = rng_from(cfg.seed.map(|s| s.wrapping_add(sim.words as u64)));
    mgr.nodes[NodeId::CONST1]
        .sim
        .extend(std::iter::repeat(u32::MAX).take(words));
    for &pi in &mgr.pis.clone() {
        for _ in 0..words {
            mgr.nodes[pi].sim.push(rng.gen::<u32>());
        }
    }
    for &latch in &mgr.latches.clone() {
        for _ in 0..words {
            mgr.nodes[latch].sim.push(rng.gen::<u32>());
        }
    }
    sim.words += words;
    propagate(mgr, sim.words);
}

/// Appends a single don't-care-free word encoding one concrete PI assignment
/// (a SAT counter-example, spec §4.13) and re-propagates.
pub fn add_counterexample(mgr: &mut Manager, sim: &mut Simulation, pi_values: &[bool]) {
    mgr.nodes[NodeId::CONST1].sim.push(u32::MAX);
    for (&pi, &v) in mgr.pis.clone().iter().zip(pi_values) {
        mgr.nodes[pi].sim.push(if v { u32::MAX } else { 0 });
    }
    for &latch in &mgr.latches.clone() {
        mgr.nodes[latch].sim.push(0);
    }
    sim.words += 1;
    propagate(mgr, sim.words);
}

/// Recomputes every non-CI node's signature from its fanins, in increasing
/// node-id order. Cheap enough at the scale this engine targets that a full
/// recompute after every extension is simpler (and just as correct) as
/// patching only the newly appended words.
fn propagate(mgr: &mut Manager, words: usize) {
    for raw in 0..mgr.num_nodes() as u32 {
        let id = NodeId::from_u32(raw);
        let ty = mgr.node_type(id);
        let sig = match ty {
            NodeType::Const1 | NodeType::Pi | NodeType::Latch | NodeType::None => continue,
            NodeType::Buf | NodeType::Po | NodeType::Assert => {
                let f0 = mgr.fanin0(id).unwrap();
                Simulation::signature(mgr, f0)
            }
            NodeType::And => {
                let f0 = mgr.fanin0(id).unwrap();
                let f1 = mgr.fanin1(id).unwrap();
                let a = Simulation::signature(mgr, f0);
                let b = Simulation::signature(mgr, f1);
                a.iter().zip(&b).map(|(x, y)| x & y).collect()
            }
            NodeType::Exor => {
                let f0 = mgr.fanin0(id).unwrap();
                let f1 = mgr.fanin1(id).unwrap();
                let a = Simulation::signature(mgr, f0);
                let b = Simulation::signature(mgr, f1);
                a.iter().zip(&b).map(|(x, y)| x ^ y).collect()
            }
        };
        debug_assert_eq!(sig.len(), words);
        mgr.nodes[id].sim = sig;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn structural_truth_matches_simulation_over_all_patterns() {
        // a & !b over all 4 input patterns, checked by brute-force
        // simulation rather than the 32-lane random kernel: seed each PI's
        // signature to exactly one bit pattern per combination.
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let f = mgr.and(a, b.invert());

        mgr.nodes[NodeId::CONST1].sim = vec![u32::MAX];
        mgr.nodes[a.node()].sim = vec![0b1010];
        mgr.nodes[b.node()].sim = vec![0b1100];
        propagate(&mut mgr, 1);

        let sig = Simulation::signature(&mgr, f);
        let expected = 0b1010 & !0b1100 & 0b1111;
        assert_eq!(sig[0] & 0b1111, expected);
    }

    #[test]
    fn random_simulation_fills_every_node() {
        let mut mgr = Manager::new();
        let a = mgr.create_pi();
        let b = mgr.create_pi();
        let f = mgr.and(a, b);
        mgr.create_po(f);
        let sim = simulate_random(&mut mgr, SimConfig::default());
        assert_eq!(mgr.nodes[f.node()].sim.len(), sim.words);
    }
}
