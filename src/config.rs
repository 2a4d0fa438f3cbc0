//! Configuration option structs (spec §6). Plain `Copy` structs with
//! `Default` impls carrying the documented defaults, passed by value —
//! mirrors `cranelift-codegen`'s `Flags`-style settings objects rather than
//! a global or builder.

/// Options for `Manager::replace`.
#[derive(Clone, Copy, Debug)]
pub struct ReplaceOptions {
    /// Keep levels/required-levels live during the replace (spec §6
    /// `updateLevel`).
    pub update_level: bool,
    /// Free only the top node of the old MFFC rather than recursing (used
    /// internally by rewriting when the replaced cone is handled
    /// separately).
    pub free_top_only: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        ReplaceOptions {
            update_level: true,
            free_top_only: false,
        }
    }
}

/// Options for `rewrite` (C10).
#[derive(Clone, Copy, Debug)]
pub struct RewriteOptions {
    pub update_level: bool,
    pub use_zero_cost: bool,
    pub verbose: bool,
    pub max_cut_size: u32,
    pub cut_store_limit: u32,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            update_level: true,
            use_zero_cost: false,
            verbose: false,
            max_cut_size: 4,
            cut_store_limit: 256,
        }
    }
}

/// Statistics returned by a `rewrite` pass (spec §7 "pass routines return a
/// status code plus a statistics block").
#[derive(Clone, Copy, Debug, Default)]
pub struct RewriteStats {
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub cuts_enumerated: u64,
    pub replacements_applied: u64,
}

/// Simulation configuration (C11).
#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    /// Signature width in 32-bit words (default 32, i.e. 1024 patterns).
    pub sim_words: u32,
    /// Refinement saturation ratio (default 0.5%).
    pub sim_saturation: f64,
    /// RNG seed for pattern generation; `None` draws fresh entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            sim_words: 32,
            sim_saturation: 0.005,
            seed: None,
        }
    }
}

/// FRAIG configuration (C13).
#[derive(Clone, Copy, Debug)]
pub struct FraigOptions {
    pub sim: SimConfig,
    pub sat_conflict_per_node: u32,
    pub sat_conflict_per_miter: u32,
    pub sat_total_budget: u32,
    pub sat_total_inspects: u64,
    pub activity_cone_ratio: f64,
    pub activity_cone_bump_max: f64,
    pub verbose: bool,
}

impl Default for FraigOptions {
    fn default() -> Self {
        FraigOptions {
            sim: SimConfig::default(),
            sat_conflict_per_node: 100,
            sat_conflict_per_miter: 500_000,
            sat_total_budget: 20_000_000,
            sat_total_inspects: 2_000_000_000,
            activity_cone_ratio: 0.3,
            activity_cone_bump_max: 10.0,
            verbose: false,
        }
    }
}

/// Statistics returned by a `fraig` pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct FraigStats {
    pub classes_initial: usize,
    pub classes_final: usize,
    pub merges: u64,
    pub sat_calls: u64,
    pub sat_undecided: u64,
    pub counterexamples: u64,
    /// Conflicts spent across every SAT query issued by this pass (spec §6
    /// `satTotalBudget`).
    pub sat_conflicts_total: u64,
    /// Search nodes visited across every SAT query issued by this pass
    /// (spec §6 `satTotalInspects`).
    pub sat_inspects_total: u64,
    /// Queries skipped because the running total above already exceeded
    /// `satTotalBudget`/`satTotalInspects`; each one is conservatively kept
    /// distinct rather than merged (spec §7 "resource exhausted... stops
    /// early and reports the partial result").
    pub sat_budget_stops: u64,
}

/// FORCE placement options (C14).
#[derive(Clone, Copy, Debug)]
pub struct ForceOptions {
    pub iterations: u32,
    pub seed: Option<u64>,
}

impl Default for ForceOptions {
    fn default() -> Self {
        ForceOptions {
            iterations: 10,
            seed: None,
        }
    }
}
