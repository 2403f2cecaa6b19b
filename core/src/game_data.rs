//! Static game constants: patch windows, echo strengths, and well-known
//! ability/buff ids referenced by the normalizer and job appliers.

use phf::phf_map;

/// A patch validity window in Unix ms.
#[derive(Debug, Clone, Copy)]
pub struct PatchWindow {
    pub patch: f64,
    pub start: i64,
    pub end: i64,
}

/// Patch release windows. Used to scope reference tables and per-job
/// mechanics (e.g. card collapsing only applies before 7.0).
pub static PATCH_WINDOWS: &[PatchWindow] = &[
    PatchWindow { patch: 6.4, start: 1_684_836_000_000, end: 1_696_327_199_999 },
    PatchWindow { patch: 6.5, start: 1_696_327_200_000, end: 1_719_565_299_999 },
    PatchWindow { patch: 7.0, start: 1_719_565_200_000, end: 1_721_109_699_999 },
    PatchWindow { patch: 7.01, start: 1_721_109_600_000, end: 1_722_322_899_999 },
    PatchWindow { patch: 7.05, start: 1_722_322_800_000, end: 1_731_427_199_999 },
    PatchWindow { patch: 7.1, start: 1_731_427_200_000, end: 1_741_791_600_000 },
];

/// Map a fight start time to its patch number, 0.0 if unknown.
pub fn patch_at(timestamp: i64) -> f64 {
    PATCH_WINDOWS
        .iter()
        .find(|w| w.start <= timestamp && timestamp <= w.end)
        .map(|w| w.patch)
        .unwrap_or(0.0)
}

/// Echo bonus granted to outdated content, by sub-window.
pub const ECHO_10_START: i64 = 1_707_818_400_000; // patch 6.57
pub const ECHO_15_START: i64 = 1_710_849_600_000; // patch 6.58
pub const ECHO_10_MULT: f64 = 1.10;
pub const ECHO_15_MULT: f64 = 1.15;
pub const ECHO_10_TOKEN: &str = "echo10";
pub const ECHO_15_TOKEN: &str = "echo15";

/// Medication (tincture) buff. The log approximates it as a flat 5%
/// multiplier; the distribution model treats it as a main-stat increase,
/// so the multiplier is divided back out during normalization.
pub const MEDICATION_BUFF_ID: &str = "1000049";
pub const MEDICATION_MULTIPLIER: f64 = 1.05;

/// Radiant Finale logs one id regardless of coda count; strength is
/// estimated from elapsed time.
pub const RADIANT_FINALE_BUFF_ID: &str = "1002964";

/// Direct-hit damage bonus.
pub const DIRECT_HIT_MULT: f64 = 1.25;

// ─── Job-specific ability/buff ids ───────────────────────────────────────────

pub mod dark_knight {
    pub const EDGE_OF_SHADOW: i64 = 16470;
    pub const FLOOD_OF_SHADOW: i64 = 16469;
    pub const DARKSIDE_TOKEN: &str = "Darkside";
    pub const DARKSIDE_MULT: f64 = 1.10;
    /// Darkside timer: each Edge/Flood extends by 30s, capped at 60s.
    pub const DARKSIDE_EXTENSION_S: f64 = 30.0;
    pub const DARKSIDE_CAP_S: f64 = 60.0;
}

pub mod paladin {
    pub const REQUIESCAT_BUFF_ID: &str = "1001368";
    pub const DIVINE_MIGHT_BUFF_ID: &str = "1002673";
    pub const HOLY_IDS: &[i64] = &[7384, 16458];
    pub const BLADE_IDS: &[i64] = &[16459, 25748, 25749, 25750];
}

pub mod monk {
    pub const BOOTSHINE: i64 = 53;
    pub const LEAPING_OPO: i64 = 36945;
    pub const DRAGON_KICK: i64 = 74;
    pub const TWIN_SNAKES: i64 = 61;
    pub const RISING_RAPTOR: i64 = 36946;
    pub const DEMOLISH: i64 = 66;
    pub const POUNCING_COEURL: i64 = 36947;
    pub const OPO_OPO_FORM_BUFF_ID: &str = "1000107";
    pub const FORMLESS_FIST_BUFF_ID: &str = "1002513";
    pub const LEADEN_FIST_BUFF_ID: &str = "1001861";
    pub const FURY_TOKEN: &str = "fury";
}

pub mod samurai {
    pub const ENPI: i64 = 7486;
    pub const ENHANCED_ENPI_BUFF_ID: &str = "1001236";
}

pub mod machinist {
    pub const WILDFIRE_GROUND_EFFECT: i64 = 1000861;
    pub const DRILL: i64 = 16498;
    /// Weaponskills that add Wildfire potency stacks.
    pub const WEAPONSKILL_IDS: &[i64] =
        &[7411, 7412, 7413, 16497, 16498, 16499, 16500, 25788, 36981, 36978];
    /// In-game cap on Wildfire potency stacks.
    pub const WILDFIRE_GCD_CAP: usize = 6;
}

pub mod bard {
    pub const PITCH_PERFECT: i64 = 7404;
    pub const BURST_SHOT: i64 = 16495;
    pub const RADIANT_ENCORE: i64 = 36977;
    pub const PITCH_PERFECT_POTENCIES: [(u8, u32); 3] = [(1, 100), (2, 220), (3, 360)];
    pub const BURST_SHOT_POTENCY: u32 = 220;
}

/// Targets the log service periodically excludes from damage totals
/// (e.g. intermission crystals), keyed by encounter id.
pub static EXCLUDED_TARGET_IDS: phf::Map<u32, &'static [i64]> = phf_map! {
    1079u32 => &[17828],
};

/// Excluded targets for an encounter, empty when none are configured.
pub fn excluded_targets(encounter_id: i64) -> &'static [i64] {
    u32::try_from(encounter_id)
        .ok()
        .and_then(|id| EXCLUDED_TARGET_IDS.get(&id))
        .copied()
        .unwrap_or(&[])
}
