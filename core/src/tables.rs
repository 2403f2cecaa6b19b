//! Time-scoped views over the injected reference tables.
//!
//! [`ActiveTables`] selects the rows valid at fight start (and, for
//! potencies, matching the analyzed job/level) and indexes them for O(1)
//! lookup during normalization. The underlying [`ReferenceTables`] are
//! loaded once by the caller and shared read-only across analyses.

use critline_types::{
    CardClass, EncounterPhases, GuaranteedHitByBuff, Job, PotencyRow, ReferenceTables,
};
use hashbrown::{HashMap, HashSet};

const RANGED_CARD_NAMES: &[&str] = &["The Bole", "The Spire", "The Ewer"];
const MELEE_CARD_NAMES: &[&str] = &["The Arrow", "The Balance", "The Spear"];

/// Reference rows valid at one fight's start time, scoped to one job/level.
#[derive(Debug, Clone)]
pub struct ActiveTables {
    /// Buff id -> damage multiplier strength (e.g. 1.05).
    damage_buff_strengths: HashMap<String, f64>,
    /// Buff id -> additive crit rate.
    crit_rate_buffs: HashMap<String, f64>,
    /// Buff id -> additive direct-hit rate.
    dh_rate_buffs: HashMap<String, f64>,
    /// Ability id -> guaranteed hit type.
    guaranteed_by_action: HashMap<i64, u8>,
    /// (buff, ability) pairs granting a guaranteed hit type.
    guaranteed_by_buff: Vec<GuaranteedHitByBuff>,
    ranged_cards: HashSet<String>,
    melee_cards: HashSet<String>,
    /// Potency rows for the analyzed job and level.
    pub potencies: Vec<PotencyRow>,
    pub encounter_phases: EncounterPhases,
}

impl ActiveTables {
    pub fn at(tables: &ReferenceTables, fight_start: i64, job: Job, level: u8) -> Self {
        let valid = |start: i64, end: i64| start <= fight_start && fight_start <= end;

        let damage_buff_strengths = tables
            .damage_buffs
            .iter()
            .filter(|b| valid(b.valid_start, b.valid_end))
            .map(|b| (b.buff_id.clone(), b.buff_strength))
            .collect();

        let card_set = |names: &[&str]| -> HashSet<String> {
            tables
                .damage_buffs
                .iter()
                .filter(|b| valid(b.valid_start, b.valid_end) && names.contains(&b.buff_name.as_str()))
                .map(|b| b.buff_id.clone())
                .collect()
        };

        Self {
            damage_buff_strengths,
            crit_rate_buffs: tables
                .critical_hit_rate_buffs
                .iter()
                .filter(|b| valid(b.valid_start, b.valid_end))
                .map(|b| (b.buff_id.clone(), b.rate_buff))
                .collect(),
            dh_rate_buffs: tables
                .direct_hit_rate_buffs
                .iter()
                .filter(|b| valid(b.valid_start, b.valid_end))
                .map(|b| (b.buff_id.clone(), b.rate_buff))
                .collect(),
            guaranteed_by_action: tables
                .guaranteed_hits_by_action
                .iter()
                .filter(|g| valid(g.valid_start, g.valid_end))
                .map(|g| (g.action_id, g.hit_type))
                .collect(),
            guaranteed_by_buff: tables
                .guaranteed_hits_by_buff
                .iter()
                .filter(|g| valid(g.valid_start, g.valid_end))
                .cloned()
                .collect(),
            ranged_cards: card_set(RANGED_CARD_NAMES),
            melee_cards: card_set(MELEE_CARD_NAMES),
            potencies: tables
                .potencies
                .iter()
                .filter(|p| valid(p.valid_start, p.valid_end) && p.job == job && p.level == level)
                .cloned()
                .collect(),
            encounter_phases: tables.encounter_phases.clone(),
        }
    }

    pub fn crit_rate_buff(&self, buff_id: &str) -> Option<f64> {
        self.crit_rate_buffs.get(buff_id).copied()
    }

    pub fn dh_rate_buff(&self, buff_id: &str) -> Option<f64> {
        self.dh_rate_buffs.get(buff_id).copied()
    }

    pub fn damage_buff_strength(&self, buff_id: &str) -> Option<f64> {
        self.damage_buff_strengths.get(buff_id).copied()
    }

    /// Guaranteed hit type granted by one of `buff_ids` for this ability.
    pub fn guaranteed_by_buff(&self, buff_ids: &[String], ability_id: i64) -> Option<u8> {
        self.guaranteed_by_buff
            .iter()
            .find(|g| g.affected_action_id == ability_id && buff_ids.iter().any(|b| *b == g.buff_id))
            .map(|g| g.hit_type)
    }

    /// Whether `buff_id` grants a guaranteed hit type for this ability.
    pub fn is_guaranteed_hit_buff(&self, buff_id: &str, ability_id: i64) -> bool {
        self.guaranteed_by_buff
            .iter()
            .any(|g| g.affected_action_id == ability_id && g.buff_id == buff_id)
    }

    /// Guaranteed hit type intrinsic to the ability itself.
    pub fn guaranteed_by_action(&self, ability_id: i64) -> Option<u8> {
        self.guaranteed_by_action.get(&ability_id).copied()
    }

    /// Card class of a buff id, when the buff is an arcanum card.
    pub fn card_class_of(&self, buff_id: &str) -> Option<CardClass> {
        if self.ranged_cards.contains(buff_id) {
            Some(CardClass::Ranged)
        } else if self.melee_cards.contains(buff_id) {
            Some(CardClass::Melee)
        } else {
            None
        }
    }
}
