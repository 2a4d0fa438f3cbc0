//! A small, dependency-free SAT backend (SPEC_FULL.md Open Question
//! resolution: spec §4.13/§9 treats the SAT solver as "an opaque
//! interface"; this port defines the `SatSolver` trait plus one concrete
//! `DpllSolver` sized for the per-query miters FRAIG builds — a few hundred
//! variables at most, not a production CDCL engine). Grounded in spirit on
//! how `cranelift-codegen` keeps an algorithm's core decision procedure
//! behind a narrow trait (e.g. `RegisterMapping`) so it can be swapped
//! without touching callers.

use rustc_hash::FxHashMap;

/// A CNF literal: a nonzero, 1-based variable index; positive means the
/// variable itself, negative its negation. Mirrors DIMACS convention.
pub type Lit = i32;

pub fn var_of(lit: Lit) -> u32 {
    lit.unsigned_abs()
}

pub fn is_positive(lit: Lit) -> bool {
    lit > 0
}

/// Outcome of a bounded solve (spec §7 "SAT undecided"): `Undecided` means
/// the query exhausted its conflict budget before reaching a verdict, not
/// that the formula has no answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SatOutcome {
    Sat,
    Unsat,
    Undecided,
}

/// The solver interface FRAIG programs against. Any CNF-level DPLL/CDCL
/// engine could implement this; `DpllSolver` below is the only one this
/// crate ships.
pub trait SatSolver {
    fn new_var(&mut self) -> u32;
    fn add_clause(&mut self, lits: &[Lit]);
    /// Solves under a per-query conflict budget (spec §6
    /// `satConflictPerNode`/`satConflictPerMiter`); exceeding it returns
    /// `Undecided` rather than blocking indefinitely (spec §5 "a cancelled
    /// query is equivalent to an undecided result").
    fn solve(&mut self, conflict_budget: u32) -> SatOutcome;
    /// The satisfying value of `v`, valid only immediately after a `Sat`
    /// outcome.
    fn value(&self, v: u32) -> Option<bool>;
    /// Conflicts spent across every `solve` call on this instance so far
    /// (spec §6 `satTotalBudget`: a running total the caller can compare
    /// against a global ceiling, distinct from the per-query
    /// `satConflictPerNode`/`satConflictPerMiter` budgets). Default 0 for
    /// any implementor that doesn't track it.
    fn conflicts_used(&self) -> u64 {
        0
    }
    /// Search nodes visited across every `solve` call so far (spec §6
    /// `satTotalInspects`).
    fn inspects_used(&self) -> u64 {
        0
    }
}

/// A recursive DPLL solver: unit propagation to a fixed point, then
/// case-split on the first unassigned variable. No clause learning,
/// watched literals, or restart schedule — correct and simple, which is
/// all the small per-miter CNFs FRAIG builds here need. A conflict counter
/// doubles as the search's cancellation budget.
pub struct DpllSolver {
    num_vars: u32,
    clauses: Vec<Vec<Lit>>,
    model: Vec<Option<bool>>,
    total_conflicts: u64,
    total_inspects: u64,
    /// Per-variable branch priority (spec §6 `activityConeRatio`/
    /// `activityConeBumpMax`): higher activity is tried first, the same
    /// role a VSIDS score plays in a CDCL solver, but bumped once up front
    /// by the caller rather than updated per conflict.
    activity: Vec<f64>,
}

impl DpllSolver {
    pub fn new() -> DpllSolver {
        DpllSolver {
            num_vars: 0,
            clauses: Vec::new(),
            model: Vec::new(),
            total_conflicts: 0,
            total_inspects: 0,
            activity: vec![0.0],
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Raises `var`'s branch priority. Caller-driven rather than
    /// conflict-driven: this solver has no clause learning to derive
    /// activity from, so `fraig.rs` bumps the variables nearest a miter's
    /// roots before solving, biasing the search toward the part of the
    /// cone most likely to pin down the answer quickly.
    pub fn bump_activity(&mut self, var: u32, amount: f64) {
        if let Some(slot) = self.activity.get_mut(var as usize) {
            *slot += amount;
        }
    }

    fn propagate_units(&self, assign: &mut [Option<bool>]) -> PropResult {
        let mut fixed_any = false;
        for clause in &self.clauses {
            let mut satisfied = false;
            let mut unassigned: Option<Lit> = None;
            let mut unassigned_count = 0u32;
            for &lit in clause {
                match assign[var_of(lit) as usize] {
                    Some(v) if v == is_positive(lit) => {
                        satisfied = true;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        unassigned_count += 1;
                        unassigned = Some(lit);
                    }
                }
            }
            if satisfied {
                continue;
            }
            if unassigned_count == 0 {
                return PropResult::Conflict;
            }
            if unassigned_count == 1 {
                let lit = unassigned.unwrap();
                assign[var_of(lit) as usize] = Some(is_positive(lit));
                fixed_any = true;
            }
        }
        if fixed_any {
            PropResult::Fixed
        } else {
            PropResult::Done
        }
    }

    /// Recursive search. Returns `Some(true)`/`Some(false)` for a decided
    /// outcome, `None` once `conflicts` has consumed the budget.
    fn search(
        &self,
        assign: &mut Vec<Option<bool>>,
        budget: u32,
        conflicts: &mut u32,
        inspects: &mut u64,
    ) -> Option<bool> {
        *inspects += 1;
        loop {
            match self.propagate_units(assign) {
                PropResult::Conflict => {
                    *conflicts += 1;
                    return Some(false);
                }
                PropResult::Fixed => continue,
                PropResult::Done => break,
            }
        }
        if *conflicts > budget {
            return None;
        }
        let next = (1..=self.num_vars)
            .filter(|&v| assign[v as usize].is_none())
            .max_by(|&a, &b| {
                self.activity[a as usize]
                    .partial_cmp(&self.activity[b as usize])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(v) = next else {
            return Some(true); // every clause already checked satisfied above
        };
        for val in [true, false] {
            let mut branch = assign.clone();
            branch[v as usize] = Some(val);
            match self.search(&mut branch, budget, conflicts, inspects) {
                Some(true) => {
                    *assign = branch;
                    return Some(true);
                }
                Some(false) => continue,
                None => return None,
            }
        }
        *conflicts += 1;
        Some(false)
    }
}

impl Default for DpllSolver {
    fn default() -> Self {
        DpllSolver::new()
    }
}

enum PropResult {
    Conflict,
    Fixed,
    Done,
}

impl SatSolver for DpllSolver {
    fn new_var(&mut self) -> u32 {
        self.num_vars += 1;
        self.activity.push(0.0);
        self.num_vars
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        self.clauses.push(lits.to_vec());
    }

    fn solve(&mut self, conflict_budget: u32) -> SatOutcome {
        let mut assign = vec![None; (self.num_vars + 1) as usize];
        let mut conflicts = 0u32;
        let mut inspects = 0u64;
        let outcome = self.search(&mut assign, conflict_budget, &mut conflicts, &mut inspects);
        self.total_conflicts += conflicts as u64;
        self.total_inspects += inspects;
        match outcome {
            Some(true) => {
                self.model = assign;
                SatOutcome::Sat
            }
            Some(false) => SatOutcome::Unsat,
            None => SatOutcome::Undecided,
        }
    }

    fn value(&self, v: u32) -> Option<bool> {
        self.model.get(v as usize).copied().flatten()
    }

    fn conflicts_used(&self) -> u64 {
        self.total_conflicts
    }

    fn inspects_used(&self) -> u64 {
        self.total_inspects
    }
}

/// Tseitin-encodes an AIG node (and its transitive fanins) into `solver`,
/// memoising each node's variable in `vars` so shared subgraphs are encoded
/// once (spec §4.13: "build CNF lazily by walking from both candidate nodes
/// to a frontier of already-encoded nodes"). Free function rather than a
/// struct borrowing the solver, so callers can interleave encoding calls
/// for several edges without fighting the borrow checker.
pub fn encode_edge(
    mgr: &crate::manager::Manager,
    solver: &mut impl SatSolver,
    vars: &mut FxHashMap<crate::arena::NodeId, u32>,
    edge: crate::edge::Edge,
) -> Lit {
    let v = encode_node(mgr, solver, vars, edge.node()) as i32;
    if edge.is_complement() {
        -v
    } else {
        v
    }
}

fn encode_node(
    mgr: &crate::manager::Manager,
    solver: &mut impl SatSolver,
    vars: &mut FxHashMap<crate::arena::NodeId, u32>,
    id: crate::arena::NodeId,
) -> u32 {
    use crate::node::NodeType;
    if let Some(&v) = vars.get(&id) {
        return v;
    }
    let v = solver.new_var();
    vars.insert(id, v);
    match mgr.node_type(id) {
        NodeType::Const1 => solver.add_clause(&[v as Lit]),
        NodeType::Pi | NodeType::Latch => {} // free variable, no defining clauses
        NodeType::Buf => {
            let a = encode_edge(mgr, solver, vars, mgr.fanin0(id).unwrap());
            solver.add_clause(&[-(v as Lit), a]);
            solver.add_clause(&[v as Lit, -a]);
        }
        NodeType::And => {
            let a = encode_edge(mgr, solver, vars, mgr.fanin0(id).unwrap());
            let b = encode_edge(mgr, solver, vars, mgr.fanin1(id).unwrap());
            let vi = v as Lit;
            solver.add_clause(&[-a, -b, vi]);
            solver.add_clause(&[a, -vi]);
            solver.add_clause(&[b, -vi]);
        }
        NodeType::Exor => {
            let a = encode_edge(mgr, solver, vars, mgr.fanin0(id).unwrap());
            let b = encode_edge(mgr, solver, vars, mgr.fanin1(id).unwrap());
            let vi = v as Lit;
            solver.add_clause(&[-a, -b, -vi]);
            solver.add_clause(&[a, b, -vi]);
            solver.add_clause(&[a, -b, vi]);
            solver.add_clause(&[-a, b, vi]);
        }
        NodeType::Po | NodeType::Assert | NodeType::None => {
            debug_assert!(false, "POs/tombstones are never encoded directly");
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_clause_forces_its_literal() {
        let mut s = DpllSolver::new();
        let a = s.new_var();
        s.add_clause(&[a as Lit]);
        assert_eq!(s.solve(100), SatOutcome::Sat);
        assert_eq!(s.value(a), Some(true));
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let mut s = DpllSolver::new();
        let a = s.new_var();
        s.add_clause(&[a as Lit]);
        s.add_clause(&[-(a as Lit)]);
        assert_eq!(s.solve(100), SatOutcome::Unsat);
    }

    #[test]
    fn and_gate_tautology_is_unsat() {
        // Encode c <-> (a & b), then assert c=1, a=0: unsatisfiable.
        let mut s = DpllSolver::new();
        let a = s.new_var() as Lit;
        let b = s.new_var() as Lit;
        let c = s.new_var() as Lit;
        s.add_clause(&[-a, -b, c]);
        s.add_clause(&[a, -c]);
        s.add_clause(&[b, -c]);
        s.add_clause(&[c]);
        s.add_clause(&[-a]);
        assert_eq!(s.solve(1000), SatOutcome::Unsat);
    }

    #[test]
    fn branch_priority_does_not_change_the_decided_outcome() {
        // Activity bumps only reorder the search, never its answer: same
        // tautology-violation miter as above, but with every variable's
        // priority bumped beforehand.
        let mut s = DpllSolver::new();
        let a = s.new_var() as Lit;
        let b = s.new_var() as Lit;
        let c = s.new_var() as Lit;
        s.add_clause(&[-a, -b, c]);
        s.add_clause(&[a, -c]);
        s.add_clause(&[b, -c]);
        s.add_clause(&[c]);
        s.add_clause(&[-a]);
        s.bump_activity(var_of(c), 10.0);
        s.bump_activity(var_of(b), 5.0);
        assert_eq!(s.solve(1000), SatOutcome::Unsat);
    }

    #[test]
    fn solver_accumulates_conflicts_and_inspects_across_calls() {
        let mut s = DpllSolver::new();
        let a = s.new_var();
        s.add_clause(&[a as Lit]);
        assert_eq!(s.conflicts_used(), 0);
        assert_eq!(s.inspects_used(), 0);
        s.solve(100);
        s.solve(100);
        // Two successful solves with no conflicts still each visit at
        // least one search node.
        assert!(s.inspects_used() >= 2);
    }
}
