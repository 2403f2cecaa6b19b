//! Raw combat-log event and fight metadata as delivered by the log service.
//!
//! Field names mirror the upstream JSON payload (`sourceID`, `abilityGameID`,
//! ...) so event dumps deserialize without a translation layer.

use serde::{Deserialize, Serialize};

/// Hit-type code reported per damage event. Normal and direct hits share
/// code 1; direct hits are flagged separately via `directHit`.
pub const HIT_TYPE_NORMAL: u8 = 1;
/// Critical hits are reported with hit-type code 2.
pub const HIT_TYPE_CRIT: u8 = 2;

/// Event categories relevant to damage analysis. Anything else (casts,
/// buff applications, deaths) is carried through deserialization but
/// discarded by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Direct damage, reported when the snapshot is calculated.
    CalculatedDamage,
    /// Applied damage; only interesting when it is a DoT/ground-effect tick.
    Damage,
    #[serde(other)]
    Other,
}

/// One raw damage event for a single source/target pair.
///
/// Timestamps are milliseconds relative to the report start. Ground-effect
/// ticks carry no multiplier (it is estimated later from co-occurring buff
/// sets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDamageEvent {
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "sourceID")]
    pub source_id: i64,
    #[serde(rename = "targetID")]
    pub target_id: i64,
    #[serde(rename = "abilityGameID")]
    pub ability_game_id: i64,
    pub amount: i64,
    #[serde(default, rename = "hitType")]
    pub hit_type: u8,
    #[serde(default, rename = "directHit")]
    pub direct_hit: bool,
    /// Dot-separated buff id list as logged, e.g. `"1000049.1001368."`.
    #[serde(default)]
    pub buffs: Option<String>,
    #[serde(default)]
    pub tick: bool,
    /// Total damage multiplier from active buffs; absent for ground effects.
    #[serde(default)]
    pub multiplier: Option<f64>,
    /// Combo/positional bonus marker attached by the log service.
    #[serde(default, rename = "bonusPercent")]
    pub bonus_percent: Option<i64>,
    /// Groups all damage instances of one cast against multiple targets.
    #[serde(default, rename = "packetID")]
    pub packet_id: Option<i64>,
    /// Present on cast-begin events whose damage never went out.
    #[serde(default)]
    pub unpaired: bool,
}

/// A recorded phase transition: the encounter entered phase `id` at
/// `start_time` (ms relative to report start).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub id: u8,
    #[serde(rename = "startTime")]
    pub start_time: i64,
}

/// Fight metadata needed to resolve analysis time bounds.
///
/// All times are milliseconds; `start_time`/`end_time` are relative to
/// `report_start`, which is a Unix epoch timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightInfo {
    pub report_start: i64,
    pub encounter_id: i64,
    pub name: String,
    pub start_time: i64,
    pub end_time: i64,
    pub kill: bool,
    pub has_echo: bool,
    pub phase_transitions: Vec<PhaseTransition>,
    /// Downtime windows (no valid damage targets), relative ms pairs.
    #[serde(default)]
    pub downtime: Vec<(i64, i64)>,
}

impl FightInfo {
    /// Absolute fight start (Unix ms).
    pub fn absolute_start(&self) -> i64 {
        self.report_start + self.start_time
    }

    /// Absolute fight end (Unix ms).
    pub fn absolute_end(&self) -> i64 {
        self.report_start + self.end_time
    }
}
