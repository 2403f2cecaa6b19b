//! Normalized actions and rotation rows — the analysis core's main
//! intermediate and output shapes.

use serde::{Deserialize, Serialize};

use crate::tables::DamageType;

/// Probability of each hit type for one action. Always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitProbabilities {
    /// Normal hit.
    pub p_n: f64,
    /// Critical hit.
    pub p_c: f64,
    /// Direct hit.
    pub p_d: f64,
    /// Critical direct hit.
    pub p_cd: f64,
}

impl HitProbabilities {
    pub fn sum(&self) -> f64 {
        self.p_n + self.p_c + self.p_d + self.p_cd
    }

    /// Degenerate vector for a guaranteed hit type (0..=3).
    pub fn guaranteed(hit_type: u8) -> Self {
        let mut p = Self { p_n: 0.0, p_c: 0.0, p_d: 0.0, p_cd: 0.0 };
        match hit_type {
            1 => p.p_c = 1.0,
            2 => p.p_d = 1.0,
            3 => p.p_cd = 1.0,
            _ => p.p_n = 1.0,
        }
        p
    }
}

/// One damage event normalized into the canonical action shape.
///
/// Built once per analysis and treated as immutable by each pipeline stage,
/// which produces a new snapshot rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAction {
    /// Absolute Unix ms.
    pub timestamp: i64,
    /// Seconds since the first retained event.
    pub elapsed_time: f64,
    /// Display name with tick/pet qualifiers, e.g. `"Dia (tick)"`.
    pub ability_name: String,
    /// Unique name including the canonical buff token set,
    /// e.g. `"Midare Setsugekka-card6_1001298"`.
    pub action_name: String,
    pub ability_id: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub packet_id: Option<i64>,
    pub amount: i64,
    pub tick: bool,
    pub hit_type: u8,
    pub direct_hit: bool,
    pub bonus_percent: Option<i64>,
    /// Canonicalized buff tokens, sorted and deduplicated.
    pub buffs: Vec<String>,
    /// Total damage multiplier; `None` only for ground-effect ticks whose
    /// multiplier has not been estimated yet.
    pub multiplier: Option<f64>,
    pub probabilities: HitProbabilities,
    /// Critical damage multiplier, e.g. 1.574.
    pub crit_damage_multiplier: f64,
    /// Main-stat delta (medication modeled as a stat increase).
    pub main_stat_add: i64,
}

impl NormalizedAction {
    /// Rebuild `action_name` from the base name and current buff set.
    /// Called after job appliers add or rewrite buff tokens.
    pub fn rebuild_action_name(&mut self) {
        let mut tokens = self.buffs.clone();
        tokens.sort();
        tokens.dedup();
        self.action_name = if tokens.is_empty() {
            self.ability_name.clone()
        } else {
            format!("{}-{}", self.ability_name, tokens.join("_"))
        };
    }
}

/// One deduplicated rotation row: `n` statistically identical hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationRow {
    /// Unique name: base action + buffs + falloff + bonus qualifiers.
    pub action_name: String,
    /// The normalized display name this row traces back to.
    pub base_action: String,
    /// Number of occurrences.
    pub n: u32,
    pub p_n: f64,
    pub p_c: f64,
    pub p_d: f64,
    pub p_cd: f64,
    /// Canonical buff tokens shared by every hit in this row.
    pub buffs: Vec<String>,
    /// Total damage multiplier from buffs.
    pub multiplier: f64,
    pub crit_damage_multiplier: f64,
    pub main_stat_add: i64,
    /// Final potency: reference potency x matched falloff, floored.
    pub potency: u32,
    pub damage_type: DamageType,
}
