//! Edges: a `(node id, complement bit)` pair packed into one machine word
//! (spec §3/§9 "Pointer-encoded complement bits"). `Edge` is `Copy` and all
//! helpers are pure arithmetic, matching the source's pointer-tagging trick
//! without reintroducing raw pointers.

use std::fmt;

use cranelift_entity::EntityRef;

use crate::arena::NodeId;

/// A `(node, complement)` pair. The complement bit lives in bit 0; the node
/// id occupies the remaining bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Edge(u32);

impl Edge {
    /// Builds an edge pointing at `node` with the given complement bit.
    pub fn new(node: NodeId, complement: bool) -> Edge {
        Edge(((node.index() as u32) << 1) | (complement as u32))
    }

    /// A non-complemented edge to `node`.
    pub fn regular_edge(node: NodeId) -> Edge {
        Edge::new(node, false)
    }

    /// The constant-0 edge: the complemented constant-1 node.
    pub fn const0() -> Edge {
        Edge::new(NodeId::CONST1, true)
    }

    /// The constant-1 edge.
    pub fn const1() -> Edge {
        Edge::new(NodeId::CONST1, false)
    }

    pub fn node(self) -> NodeId {
        NodeId::from_u32(self.0 >> 1)
    }

    pub fn is_complement(self) -> bool {
        self.0 & 1 != 0
    }

    /// The same node, complement bit cleared.
    pub fn regular(self) -> Edge {
        Edge(self.0 & !1)
    }

    /// The same node, complement bit flipped.
    pub fn invert(self) -> Edge {
        Edge(self.0 ^ 1)
    }

    /// Flips the complement bit iff `cond` is true (`Ivy_NotCond`).
    pub fn not_cond(self, cond: bool) -> Edge {
        if cond {
            self.invert()
        } else {
            self
        }
    }

    pub fn is_regular(self) -> bool {
        !self.is_complement()
    }

    pub fn is_const0(self) -> bool {
        self.node() == NodeId::CONST1 && self.is_complement()
    }

    pub fn is_const1(self) -> bool {
        self.node() == NodeId::CONST1 && !self.is_complement()
    }

    pub fn is_const(self) -> bool {
        self.node() == NodeId::CONST1
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complement() {
            write!(f, "!{}", self.node().index())
        } else {
            write!(f, "{}", self.node().index())
        }
    }
}

/// A stack-local node descriptor used to probe the structural hash table
/// without allocating (spec §4.2 "ghost node"). Not all fields are
/// meaningful for every `ty`: `Latch`/`Po`/`Buf`/`Assert` only use `fanin0`.
#[derive(Clone, Copy, Debug)]
pub struct Ghost {
    pub ty: crate::node::NodeType,
    pub fanin0: Edge,
    pub fanin1: Option<Edge>,
    pub init: crate::node::Init,
}
