//! The node model (C2): a tagged variant (spec §9 "Dynamic dispatch by node
//! type" → represent as a small enum, branch on the tag, nothing inherits
//! from anything else) plus the per-node bookkeeping fields spec §3 lists.

use crate::arena::NodeId;
use crate::edge::Edge;

/// Two-bit latch initial value (spec §3).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Init {
    #[default]
    None,
    Zero,
    One,
    DontCare,
}

impl Init {
    /// `Ivy_InitNotCond`: flips `Zero`/`One` when `cond` is set; `DontCare`
    /// and `None` are fixed points.
    pub fn not_cond(self, cond: bool) -> Init {
        if !cond {
            return self;
        }
        match self {
            Init::Zero => Init::One,
            Init::One => Init::Zero,
            other => other,
        }
    }

    /// Combine two latch inits across an `And` (spec §4.5).
    pub fn and(a: Init, b: Init) -> Init {
        use Init::*;
        match (a, b) {
            (Zero, _) | (_, Zero) => Zero,
            (DontCare, _) | (_, DontCare) => DontCare,
            _ => One,
        }
    }

    /// Combine two latch inits across an `Exor` (spec §4.5).
    pub fn exor(a: Init, b: Init) -> Init {
        use Init::*;
        match (a, b) {
            (DontCare, _) | (_, DontCare) => DontCare,
            (Zero, One) | (One, Zero) => One,
            _ => Zero,
        }
    }
}

/// The node type tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeType {
    Const1,
    Pi,
    Po,
    Assert,
    Latch,
    And,
    Exor,
    Buf,
    /// Tombstone left behind by a freed slot; never reachable.
    None,
}

impl NodeType {
    /// Nodes that participate in the structural hash table (spec §3
    /// invariant 1: "for every `And`/`Exor`/`Latch` node...").
    pub fn is_hashable(self) -> bool {
        matches!(self, NodeType::And | NodeType::Exor | NodeType::Latch)
    }

    /// Nodes with a single input edge (`fanin1` absent).
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            NodeType::Po | NodeType::Buf | NodeType::Latch | NodeType::Assert
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(self, NodeType::And | NodeType::Exor)
    }

    pub fn is_ci(self) -> bool {
        matches!(self, NodeType::Pi | NodeType::Latch)
    }

    pub fn is_co(self) -> bool {
        matches!(self, NodeType::Po | NodeType::Assert)
    }

    pub fn has_no_fanin(self) -> bool {
        matches!(self, NodeType::Const1 | NodeType::Pi | NodeType::None)
    }
}

/// One in-ring fanout slot: which successor, entered through which fanin
/// side of that successor (spec §4.4: "two next/prev pointers, one per
/// fanin side").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FanoutSlot {
    pub succ: NodeId,
    pub side: u8,
}

/// A node record. `fanin1`/ring fields are unused (left at their default)
/// for unary node types.
#[derive(Clone, Debug)]
pub struct Node {
    pub ty: NodeType,
    pub travel_id: u32,
    pub mark_a: bool,
    pub mark_b: bool,
    pub exor_fanout: bool,
    pub phase: bool,
    pub fail_tfo: bool,
    pub init: Init,
    pub level: u32,
    pub refs: u32,
    pub fanin0: Option<Edge>,
    pub fanin1: Option<Edge>,
    /// Head of this node's own fanout ring (successors that use *this* node
    /// as a fanin), only maintained when the manager's fanout index is
    /// enabled.
    pub fanout_head: Option<FanoutSlot>,
    /// The two ring links for *this* node as a successor of its own fanins,
    /// one per fanin side: `fanout_link[0]` is this node's `(next, prev)`
    /// slot in the ring owned by `fanin0().node()`, `fanout_link[1]` the
    /// same for `fanin1().node()`.
    pub fanout_link: [Option<(FanoutSlot, FanoutSlot)>; 2],
    /// FRAIG / choice-node bookkeeping: the representative this node was
    /// found equivalent to, if any.
    pub equiv: Option<Edge>,
    /// 32-word parallel simulation signature (C11), resized lazily.
    pub sim: Vec<u32>,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            ty: NodeType::None,
            travel_id: 0,
            mark_a: false,
            mark_b: false,
            exor_fanout: false,
            phase: false,
            fail_tfo: false,
            init: Init::None,
            level: 0,
            refs: 0,
            fanin0: None,
            fanin1: None,
            fanout_head: None,
            fanout_link: [None, None],
            equiv: None,
            sim: Vec::new(),
        }
    }
}

impl Node {
    pub fn is_live(&self) -> bool {
        self.ty != NodeType::None
    }
}
