//! Reference-table row types.
//!
//! Each row carries a `[valid_start, valid_end]` Unix-ms range; the core
//! selects the row set valid at fight start. Tables are loaded once by the
//! caller and treated as immutable for the lifetime of an analysis batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job::Job;

/// A damage buff with its multiplicative strength (e.g. 1.05).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageBuff {
    pub buff_id: String,
    pub buff_name: String,
    pub buff_strength: f64,
    pub valid_start: i64,
    pub valid_end: i64,
}

/// A critical-hit or direct-hit rate buff (additive rate, e.g. 0.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBuff {
    pub buff_id: String,
    pub buff_name: String,
    pub rate_buff: f64,
    pub valid_start: i64,
    pub valid_end: i64,
}

/// An ability whose hits always land as the given hit type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuaranteedHitByAction {
    pub action_id: i64,
    /// 0 normal, 1 critical, 2 direct, 3 critical-direct.
    pub hit_type: u8,
    pub valid_start: i64,
    pub valid_end: i64,
}

/// A buff that makes a specific ability's hits land as the given hit type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuaranteedHitByBuff {
    pub buff_id: String,
    pub affected_action_id: i64,
    pub hit_type: u8,
    pub valid_start: i64,
    pub valid_end: i64,
}

/// Damage category of a rotation row, carried through to the distribution
/// engine (DoT and pet damage scale differently from direct damage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Direct,
    MagicDot,
    PhysicalDot,
    Pet,
    Auto,
}

fn default_falloff() -> Vec<f64> {
    vec![1.0]
}

/// Potency reference row, scoped by job, level, and validity window.
///
/// An ability may have several rows differing in `buff_id`: the resolver
/// picks the row matching the buffs actually present on a hit. Combo,
/// positional, and combo+positional overrides apply when the logged bonus
/// marker equals the respective bonus threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotencyRow {
    pub ability_id: i64,
    pub ability_name: String,
    pub job: Job,
    pub level: u8,
    #[serde(default)]
    pub buff_id: Option<String>,
    pub base_potency: u32,
    #[serde(default)]
    pub combo_potency: Option<u32>,
    #[serde(default)]
    pub combo_bonus: Option<i64>,
    #[serde(default)]
    pub positional_potency: Option<u32>,
    #[serde(default)]
    pub positional_bonus: Option<i64>,
    #[serde(default)]
    pub combo_positional_potency: Option<u32>,
    #[serde(default)]
    pub combo_positional_bonus: Option<i64>,
    /// Candidate falloff tiers for secondary targets, primary first.
    #[serde(default = "default_falloff")]
    pub potency_falloff: Vec<f64>,
    pub damage_type: DamageType,
    pub valid_start: i64,
    pub valid_end: i64,
}

/// Phases defined per encounter, keyed by phase id with a display name.
/// Used to decide whether a "next phase" exists when resolving bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterPhases(pub BTreeMap<i64, BTreeMap<u8, String>>);

impl EncounterPhases {
    /// Highest phase id defined for an encounter, if any phases are known.
    pub fn last_phase(&self, encounter_id: i64) -> Option<u8> {
        self.0
            .get(&encounter_id)
            .and_then(|phases| phases.keys().next_back().copied())
    }
}

/// The full set of reference tables injected into an analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub damage_buffs: Vec<DamageBuff>,
    pub critical_hit_rate_buffs: Vec<RateBuff>,
    pub direct_hit_rate_buffs: Vec<RateBuff>,
    pub guaranteed_hits_by_action: Vec<GuaranteedHitByAction>,
    pub guaranteed_hits_by_buff: Vec<GuaranteedHitByBuff>,
    pub potencies: Vec<PotencyRow>,
    pub encounter_phases: EncounterPhases,
}
