//! Structural hash table (C3): open addressing with linear probing over a
//! prime-sized table, grounded on `ivyTable.c`'s `Ivy_Hash`/`Ivy_TableFind`
//! and on the probing style of `cranelift-codegen`'s `constant_hash.rs`
//! (though that one is quadratic-probe over a precomputed table; ours
//! rehashes in place as the node count grows, as `ivyTable.c`'s
//! `Ivy_TableResize` does).

use crate::arena::NodeId;
use crate::edge::Edge;
use crate::node::{Init, Node, NodeType};

/// Multiplies used to mix the canonical key fields (spec §4.3), carried
/// over verbatim from the source's `Ivy_Hash`.
const EXOR_PRIME: u32 = 1699;
const FANIN0_PRIME: u32 = 7937;
const FANIN1_PRIME: u32 = 2971;
const COMPL0_PRIME: u32 = 911;
const COMPL1_PRIME: u32 = 353;
const INIT_PRIME: u32 = 911;

fn key_hash(ty: NodeType, fanin0: Edge, fanin1: Option<Edge>, init: Init) -> u32 {
    let mut key = if ty == NodeType::Exor { EXOR_PRIME } else { 0 };
    key ^= (fanin0.node().as_u32()).wrapping_mul(FANIN0_PRIME);
    if let Some(f1) = fanin1 {
        key ^= (f1.node().as_u32()).wrapping_mul(FANIN1_PRIME);
        key ^= (f1.is_complement() as u32).wrapping_mul(COMPL1_PRIME);
    }
    key ^= (fanin0.is_complement() as u32).wrapping_mul(COMPL0_PRIME);
    key ^= (init_tag(init)).wrapping_mul(INIT_PRIME);
    key
}

fn init_tag(init: Init) -> u32 {
    match init {
        Init::None => 0,
        Init::Zero => 1,
        Init::One => 2,
        Init::DontCare => 3,
    }
}

/// The next prime at or above `n`, used to size the table (spec §4.3: "the
/// capacity is always a prime").
fn next_prime(n: usize) -> usize {
    fn is_prime(n: usize) -> bool {
        if n < 2 {
            return false;
        }
        if n % 2 == 0 {
            return n == 2;
        }
        let mut d = 3usize;
        while d.saturating_mul(d) <= n {
            if n % d == 0 {
                return false;
            }
            d += 2;
        }
        true
    }
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Open-addressed, linear-probed table mapping a canonical `(type, fanin0,
/// fanin1, init)` key to the unique node with that key.
pub struct HashTable {
    slots: Vec<Option<NodeId>>,
    count: usize,
}

impl HashTable {
    pub fn new() -> Self {
        HashTable {
            slots: vec![None; next_prime(97)],
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Looks up the canonical key of `node`'s description in `nodes`,
    /// returning the existing node id on a hit.
    pub fn lookup(
        &self,
        nodes: &crate::arena::Arena<Node>,
        ty: NodeType,
        fanin0: Edge,
        fanin1: Option<Edge>,
        init: Init,
    ) -> Option<NodeId> {
        let hash = key_hash(ty, fanin0, fanin1, init) as usize;
        let cap = self.capacity();
        let mut idx = hash % cap;
        loop {
            match self.slots[idx] {
                None => return None,
                Some(candidate) => {
                    let n = &nodes[candidate];
                    if n.ty == ty
                        && n.fanin0 == Some(fanin0)
                        && n.fanin1 == fanin1
                        && n.init == init
                    {
                        return Some(candidate);
                    }
                }
            }
            idx = (idx + 1) % cap;
        }
    }

    /// Inserts `id` under its own canonical key. Caller must have already
    /// performed `lookup` and gotten `None` (spec §4.3: "insert requires the
    /// caller to guarantee no duplicate").
    pub fn insert(&mut self, nodes: &crate::arena::Arena<Node>, id: NodeId) {
        if (self.count + 1) * 2 > self.capacity() {
            self.resize(nodes, next_prime(self.capacity() * 2 + 1));
        }
        let n = &nodes[id];
        let hash = key_hash(n.ty, n.fanin0.unwrap(), n.fanin1, n.init) as usize;
        let cap = self.capacity();
        let mut idx = hash % cap;
        while self.slots[idx].is_some() {
            idx = (idx + 1) % cap;
        }
        self.slots[idx] = Some(id);
        self.count += 1;
    }

    /// Removes `id` from the table and re-inserts the probe cluster
    /// following its slot so that later lookups remain consistent (spec
    /// §4.3: "delete re-inserts the probe cluster following the removed
    /// slot").
    pub fn remove(&mut self, nodes: &crate::arena::Arena<Node>, id: NodeId) {
        let n = &nodes[id];
        let hash = key_hash(n.ty, n.fanin0.unwrap(), n.fanin1, n.init) as usize;
        let cap = self.capacity();
        let mut idx = hash % cap;
        loop {
            match self.slots[idx] {
                Some(candidate) if candidate == id => break,
                Some(_) => idx = (idx + 1) % cap,
                None => return, // not present; nothing to do
            }
        }
        self.slots[idx] = None;
        self.count -= 1;

        // Re-insert the rest of the probe cluster starting at idx+1 so that
        // nothing that probed past the removed slot becomes unreachable.
        let mut probe = (idx + 1) % cap;
        let mut displaced = Vec::new();
        while let Some(other) = self.slots[probe] {
            displaced.push(other);
            self.slots[probe] = None;
            self.count -= 1;
            probe = (probe + 1) % cap;
        }
        for other in displaced {
            self.insert(nodes, other);
        }
    }

    fn resize(&mut self, nodes: &crate::arena::Arena<Node>, new_capacity: usize) {
        let old_slots = std::mem::replace(&mut self.slots, vec![None; new_capacity]);
        self.count = 0;
        for slot in old_slots.into_iter().flatten() {
            self.insert(nodes, slot);
        }
    }
}

impl Default for HashTable {
    fn default() -> Self {
        HashTable::new()
    }
}
