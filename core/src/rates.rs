//! Hit-type rate math: converts critical-hit and direct-hit stats into
//! probabilities and damage multipliers.
//!
//! The distribution engine consumes the resulting probability vectors; this
//! module only mirrors the game's published stat formulas closely enough to
//! reproduce what the log reports.

use critline_types::HitProbabilities;

use crate::error::AnalysisError;
use crate::game_data::DIRECT_HIT_MULT;

/// Per-level growth constants: sub-stat baseline and divisor.
#[derive(Debug, Clone, Copy)]
struct LevelCoefficients {
    level: u8,
    sub: f64,
    div: f64,
}

static LEVEL_COEFFICIENTS: &[LevelCoefficients] = &[
    LevelCoefficients { level: 70, sub: 364.0, div: 900.0 },
    LevelCoefficients { level: 80, sub: 380.0, div: 3300.0 },
    LevelCoefficients { level: 90, sub: 400.0, div: 1900.0 },
    LevelCoefficients { level: 100, sub: 420.0, div: 2780.0 },
];

/// Hit-type rates derived from a player's crit/DH stats at a given level.
#[derive(Debug, Clone, Copy)]
pub struct Rates {
    base_crit_rate: f64,
    base_dh_rate: f64,
    crit_damage: f64,
}

impl Rates {
    pub fn new(critical_hit: u32, direct_hit: u32, level: u8) -> Result<Self, AnalysisError> {
        let c = LEVEL_COEFFICIENTS
            .iter()
            .find(|c| c.level == level)
            .ok_or(AnalysisError::UnsupportedLevel { level })?;

        let crit_growth = (200.0 * (f64::from(critical_hit) - c.sub) / c.div).floor() / 1000.0;
        let dh_growth = (550.0 * (f64::from(direct_hit) - c.sub) / c.div).floor() / 1000.0;

        Ok(Self {
            base_crit_rate: 0.05 + crit_growth,
            base_dh_rate: dh_growth,
            crit_damage: 1.4 + crit_growth,
        })
    }

    /// Critical damage multiplier, e.g. 1.574.
    pub fn crit_damage_multiplier(&self) -> f64 {
        self.crit_damage
    }

    /// Hit-type probability vector under the given additive rate buffs.
    ///
    /// A guaranteed hit type (1 crit, 2 direct, 3 crit-direct) collapses the
    /// vector to one-hot; rate buffs are then compensated through
    /// [`Rates::guaranteed_hit_damage_buff`] instead.
    pub fn p(&self, crit_rate_buff: f64, dh_rate_buff: f64, guaranteed: Option<u8>) -> HitProbabilities {
        if let Some(hit_type) = guaranteed {
            return HitProbabilities::guaranteed(hit_type);
        }
        let crit = (self.base_crit_rate + crit_rate_buff).clamp(0.0, 1.0);
        let dh = (self.base_dh_rate + dh_rate_buff).clamp(0.0, 1.0);
        HitProbabilities {
            p_n: (1.0 - crit) * (1.0 - dh),
            p_c: crit * (1.0 - dh),
            p_d: (1.0 - crit) * dh,
            p_cd: crit * dh,
        }
    }

    /// Mean damage multiplier compensating rate buffs on a guaranteed hit.
    ///
    /// A crit-rate buff cannot raise the crit rate of an always-critical
    /// hit; the game instead scales its damage by the rate the buff would
    /// have added, weighted by the hit type's damage bonus.
    pub fn guaranteed_hit_damage_buff(
        &self,
        hit_type: u8,
        crit_rate_buff: f64,
        dh_rate_buff: f64,
    ) -> f64 {
        let mut buff = 1.0;
        if hit_type == 1 || hit_type == 3 {
            buff *= 1.0 + crit_rate_buff * (self.crit_damage - 1.0);
        }
        if hit_type == 2 || hit_type == 3 {
            buff *= 1.0 + dh_rate_buff * (DIRECT_HIT_MULT - 1.0);
        }
        buff
    }
}
