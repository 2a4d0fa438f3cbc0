//! NPN canonicalisation and the replacement-subgraph library (C9), grounded
//! on `ivyDsd.c`'s truth-table gymnastics and on `cranelift-codegen`'s habit
//! of building a read-only table once behind a `OnceLock` rather than a
//! module-level `static mut` (spec §9 "Global mutable state").
//!
//! The canonical-form table would be a 65536-entry constant table generated
//! by `build.rs` in the original; here it is brute-forced once, on first
//! use, into a process-wide cache (SPEC_FULL.md Open Question resolution).

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::edge::Edge;
use crate::manager::Manager;

/// The four elementary 4-variable truth tables (spec §4.8): bit `i` of
/// `ELEM_MASKS[v]` is the value of variable `v` under minterm `i`.
pub const ELEM_MASKS: [u16; 4] = [0xAAAA, 0xCCCC, 0xF0F0, 0xFF00];

/// One entry of the canonical-form table: the canonical truth table for this
/// function's NPN class, the input/output negation phase that reaches it,
/// and the input permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NpnEntry {
    pub canon: u16,
    /// Bits 0..3: input negation mask. Bit 4: output negation (spec §4.9
    /// "5 bits including output phase").
    pub phase: u8,
    pub perm: [u8; 4],
}

impl NpnEntry {
    pub fn input_neg(self) -> u8 {
        self.phase & 0x0F
    }

    pub fn output_neg(self) -> bool {
        self.phase & 0x10 != 0
    }
}

/// The full 65536-entry canonical-form table plus the distinct canonical
/// classes it reduces to.
pub struct NpnTables {
    table: Vec<NpnEntry>,
    classes: Vec<u16>,
}

impl NpnTables {
    fn build() -> NpnTables {
        let perms = all_permutations();
        let mut table = Vec::with_capacity(1 << 16);
        for f in 0..=u16::MAX {
            // Identity negation/permutation/output-phase always reproduces
            // `f` itself, so it is a valid (if not yet minimal) starting
            // candidate.
            let mut best = NpnEntry {
                canon: f,
                phase: 0,
                perm: [0, 1, 2, 3],
            };
            for neg_mask in 0u8..16 {
                let negated = negate_inputs(f, neg_mask);
                for perm in &perms {
                    let permuted = permute(negated, *perm);
                    for out_neg in [false, true] {
                        let candidate = if out_neg { !permuted } else { permuted };
                        if candidate < best.canon {
                            best = NpnEntry {
                                canon: candidate,
                                phase: neg_mask | ((out_neg as u8) << 4),
                                perm: *perm,
                            };
                        }
                    }
                }
            }
            table.push(best);
            if f == u16::MAX {
                break;
            }
        }
        let mut classes: Vec<u16> = table.iter().map(|e| e.canon).collect();
        classes.sort_unstable();
        classes.dedup();
        NpnTables { table, classes }
    }

    pub fn lookup(&self, truth: u16) -> NpnEntry {
        self.table[truth as usize]
    }

    /// The distinct canonical representative values (spec §4.9: "a separate
    /// table lists the representative canonical classes").
    pub fn classes(&self) -> &[u16] {
        &self.classes
    }
}

static TABLES: OnceLock<NpnTables> = OnceLock::new();

/// The shared, immutable NPN table, built on first use.
pub fn tables() -> &'static NpnTables {
    TABLES.get_or_init(NpnTables::build)
}

fn negate_inputs(table: u16, mask: u8) -> u16 {
    let mut out = 0u16;
    for x in 0..16u16 {
        let bit = (table >> (x ^ mask as u16)) & 1;
        out |= bit << x;
    }
    out
}

fn permute(table: u16, perm: [u8; 4]) -> u16 {
    let mut out = 0u16;
    for x in 0..16u16 {
        let mut y = 0u16;
        for i in 0..4u16 {
            let bit = (x >> i) & 1;
            y |= bit << perm[i as usize];
        }
        let bit = (table >> y) & 1;
        out |= bit << x;
    }
    out
}

fn all_permutations() -> Vec<[u8; 4]> {
    let mut items = [0u8, 1, 2, 3];
    let mut out = Vec::with_capacity(24);
    permute_rec(&mut items, 0, &mut out);
    out
}

fn permute_rec(items: &mut [u8; 4], k: usize, out: &mut Vec<[u8; 4]>) {
    if k == items.len() {
        out.push(*items);
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute_rec(items, k + 1, out);
        items.swap(k, i);
    }
}

/// A precomputed replacement subgraph (spec §4.9): a small decomposition
/// graph over up to 4 leaf variables, stored as a flat list of two-input AND
/// gates (each operand either a leaf index or, with the high bit set, an
/// earlier gate in this same subgraph), with an explicit output polarity.
#[derive(Clone, Debug)]
pub struct Subgraph {
    /// `gates[i] = (lhs, rhs)`; operand encoding: `0..=3` is leaf variable
    /// `v`, `4 + j` is the output of `gates[j]` (always non-complemented at
    /// that granularity; the sign lives in the low bit alongside the index,
    /// packed the same way `Edge` packs a node id and complement).
    pub gates: Vec<(u16, u16)>,
    /// Root operand, encoded as above, plus its own complement bit.
    pub root: u16,
    pub volume: u32,
    pub level: u32,
}

impl Subgraph {
    fn new(gates: Vec<(u16, u16)>, root: u16) -> Subgraph {
        let volume = gates.len() as u32;
        let mut level = 0u32;
        let mut levels = vec![0u32; gates.len()];
        for (i, (a, b)) in gates.iter().enumerate() {
            let la = operand_level(*a, &levels);
            let lb = operand_level(*b, &levels);
            levels[i] = 1 + la.max(lb);
            level = level.max(levels[i]);
        }
        Subgraph {
            gates,
            root,
            volume,
            level,
        }
    }

    /// Instantiates this subgraph under `mgr` against the given `leaves`
    /// (already NPN-permuted/phased to match this subgraph's canonical
    /// order), counting how many *new* nodes the instantiation would create
    /// (spec §4.10 step 5: "counting genuinely new nodes").
    pub fn instantiate(&self, mgr: &mut Manager, leaves: &[Edge; 4]) -> (Edge, u32) {
        let before = mgr.num_nodes();
        let mut values: Vec<Edge> = Vec::with_capacity(self.gates.len());
        for &(a, b) in &self.gates {
            let ea = resolve_operand(a, leaves, &values);
            let eb = resolve_operand(b, leaves, &values);
            values.push(mgr.and(ea, eb));
        }
        let root = resolve_operand(self.root, leaves, &values);
        let after = mgr.num_nodes();
        (root, after.saturating_sub(before) as u32)
    }
}

fn operand_level(operand: u16, levels: &[u32]) -> u32 {
    let idx = operand >> 1;
    if idx < 4 {
        0
    } else {
        levels[(idx - 4) as usize]
    }
}

fn resolve_operand(operand: u16, leaves: &[Edge; 4], values: &[Edge]) -> Edge {
    let idx = operand >> 1;
    let compl = operand & 1 != 0;
    let base = if idx < 4 {
        leaves[idx as usize]
    } else {
        values[(idx - 4) as usize]
    };
    base.not_cond(compl)
}

/// The replacement-subgraph forest: one bucket of candidate `Subgraph`s per
/// canonical class (spec §4.9). Kept deliberately small relative to the
/// source's ~2000-subgraph library: a handful of structurally distinct
/// decompositions per class are enough to demonstrate genuine MFFC-saving
/// rewrites (associativity/commutativity/distributivity reshufflings of up
/// to four leaves) without shipping a multi-megabyte generated table.
pub struct Library {
    buckets: FxHashMap<u16, Vec<Subgraph>>,
}

impl Library {
    pub fn bucket(&self, canon: u16) -> &[Subgraph] {
        self.buckets.get(&canon).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

static LIBRARY: OnceLock<Library> = OnceLock::new();

pub fn library() -> &'static Library {
    LIBRARY.get_or_init(build_library)
}

/// Leaf operand for variable `v`, non-complemented.
fn leaf(v: u16) -> u16 {
    v << 1
}

/// Gate operand referring to the output of `gates[j]` (0-indexed within the
/// subgraph under construction), with complement bit `c`.
fn gate(j: u16, c: bool) -> u16 {
    ((4 + j) << 1) | (c as u16)
}

fn build_library() -> Library {
    let mut buckets: FxHashMap<u16, Vec<Subgraph>> = FxHashMap::default();
    // Every candidate is only kept if its own truth table is *already* its
    // NPN-canonical representative (not merely NPN-equivalent to it): the
    // rewriting engine instantiates these subgraphs directly against
    // leaves that have already been permuted/phased into canonical order,
    // so the stored structure must compute exactly the canonical function,
    // bit for bit, not just an isomorphic one.
    let mut insert = |sg: Subgraph| {
        let t = truth_of(&sg);
        if tables().lookup(t).canon != t {
            return;
        }
        let bucket = buckets.entry(t).or_default();
        if bucket.len() < 4 {
            bucket.push(sg);
        }
    };

    // Depth 1: a two-leaf AND/NAND/OR/NOR reading over the two lowest
    // canonical slots, covering every class whose canonical function
    // depends on exactly two variables (permutation symmetry always moves
    // a two-variable dependency down to slots 0,1 during canonicalisation,
    // so restricting construction to those slots loses no classes).
    for lo_c in [false, true] {
        for hi_c in [false, true] {
            for root_c in [false, true] {
                let sg = Subgraph::new(
                    vec![(leaf(0).with_compl(lo_c), leaf(1).with_compl(hi_c))],
                    gate(0, root_c),
                );
                insert(sg);
            }
        }
    }

    // Depth 2: a third leaf (slot 2) ANDed, at either polarity, with the
    // depth-1 gate's output, also at either polarity — covering
    // three-variable classes such as `a & (b | c)` via De Morgan through
    // the inner gate's complement, exactly the reduction spec's S4
    // scenario exercises.
    for lo_c in [false, true] {
        for hi_c in [false, true] {
            let inner = (leaf(0).with_compl(lo_c), leaf(1).with_compl(hi_c));
            for third_c in [false, true] {
                for inner_c in [false, true] {
                    for root_c in [false, true] {
                        let sg = Subgraph::new(
                            vec![inner, (leaf(2).with_compl(third_c), gate(0, inner_c))],
                            gate(1, root_c),
                        );
                        insert(sg);
                    }
                }
            }
        }
    }

    // Depth 3: a fourth leaf (slot 3) ANDed, at either polarity, with the
    // depth-2 gate's output, also at either polarity — covering
    // four-variable classes that genuinely depend on every cut leaf, the
    // way `(a & (b | c)) | d`-shaped reductions do.
    for lo_c in [false, true] {
        for hi_c in [false, true] {
            let inner = (leaf(0).with_compl(lo_c), leaf(1).with_compl(hi_c));
            for third_c in [false, true] {
                for inner_c in [false, true] {
                    let mid = (leaf(2).with_compl(third_c), gate(0, inner_c));
                    for fourth_c in [false, true] {
                        for mid_c in [false, true] {
                            for root_c in [false, true] {
                                let sg = Subgraph::new(
                                    vec![
                                        inner,
                                        mid,
                                        (leaf(3).with_compl(fourth_c), gate(1, mid_c)),
                                    ],
                                    gate(2, root_c),
                                );
                                insert(sg);
                            }
                        }
                    }
                }
            }
        }
    }

    Library { buckets }
}

trait WithCompl {
    fn with_compl(self, c: bool) -> Self;
}
impl WithCompl for u16 {
    fn with_compl(self, c: bool) -> u16 {
        self | (c as u16)
    }
}

/// Evaluates a subgraph's truth table directly over the four elementary
/// masks, used only while building the static library above.
fn truth_of(sg: &Subgraph) -> u16 {
    let mut values: Vec<u16> = Vec::with_capacity(sg.gates.len());
    for &(a, b) in &sg.gates {
        let ta = truth_operand(a, &values);
        let tb = truth_operand(b, &values);
        values.push(ta & tb);
    }
    truth_operand(sg.root, &values)
}

fn truth_operand(operand: u16, values: &[u16]) -> u16 {
    let idx = operand >> 1;
    let compl = operand & 1 != 0;
    let base = if idx < 4 {
        ELEM_MASKS[idx as usize]
    } else {
        values[(idx - 4) as usize]
    };
    if compl {
        !base
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const1_canonicalises_to_all_ones() {
        let e = tables().lookup(0xFFFF);
        assert_eq!(e.canon, 0xFFFF);
    }

    #[test]
    fn elementary_variable_is_its_own_class_or_negation() {
        let e = tables().lookup(ELEM_MASKS[0]);
        // The elementary variable and its complement (0x5555) land in the
        // same two-candidate orbit; canonical form is whichever is smaller.
        assert!(e.canon == ELEM_MASKS[0] || e.canon == !ELEM_MASKS[0]);
    }

    #[test]
    fn xor_of_and_pairs_has_a_stable_canonical_form() {
        // f = (a & b) ^ (c & d), spec S3's function.
        let f: u16 = (ELEM_MASKS[0] & ELEM_MASKS[1]) ^ (ELEM_MASKS[2] & ELEM_MASKS[3]);
        assert_eq!(f, 0x6996);
        let e1 = tables().lookup(f);
        let e2 = tables().lookup(f);
        assert_eq!(e1, e2);
    }
}
