//! Bard: Pitch Perfect stacks and Radiant Encore coda count.
//!
//! Pitch Perfect's potency depends on Repertoire stacks (100/220/360)
//! that never reach the log. Stacks are inferred by comparing each hit's
//! buff-and-hit-type-normalized damage against the fight's mean Burst
//! Shot damage, whose 220 potency makes it a natural yardstick. Radiant
//! Encore's coda count is inferred from elapsed time, like Radiant
//! Finale's strength.

use critline_types::event::HIT_TYPE_CRIT;
use critline_types::{Job, NormalizedAction};

use crate::error::AnalysisError;
use crate::game_data::bard::{
    BURST_SHOT, BURST_SHOT_POTENCY, PITCH_PERFECT, PITCH_PERFECT_POTENCIES, RADIANT_ENCORE,
};
use crate::game_data::{DIRECT_HIT_MULT, MEDICATION_MULTIPLIER};

use super::{JobAdjuster, JobContext, push_buff};

/// Before this many seconds into a pull only one coda can be collected.
const RADIANT_ENCORE_OPENER_CUTOFF: f64 = 40.0;

pub struct Bard;

impl JobAdjuster for Bard {
    fn job(&self) -> Job {
        Job::Bard
    }

    fn apply(
        &self,
        mut actions: Vec<NormalizedAction>,
        _ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        apply_pitch_perfect(&mut actions);
        for action in actions.iter_mut() {
            if action.ability_id == RADIANT_ENCORE {
                let coda = if action.elapsed_time < RADIANT_ENCORE_OPENER_CUTOFF {
                    "c1"
                } else {
                    "c3"
                };
                push_buff(action, coda);
            }
        }
        Ok(actions)
    }
}

fn apply_pitch_perfect(actions: &mut [NormalizedAction]) {
    // Unmedicated Burst Shots only: medication shifts base damage in a
    // way the multiplier column does not capture.
    let baseline: Vec<f64> = actions
        .iter()
        .filter(|a| a.ability_id == BURST_SHOT && a.main_stat_add == 0)
        .filter_map(normalized_damage)
        .collect();
    if baseline.is_empty() {
        return;
    }
    let burst_shot_mean = baseline.iter().sum::<f64>() / baseline.len() as f64;

    // Midpoints between adjacent stack potencies, as fractions of Burst
    // Shot's 220.
    let p = PITCH_PERFECT_POTENCIES;
    let low = f64::from((p[0].1 + p[1].1) / 2) / f64::from(BURST_SHOT_POTENCY);
    let high = f64::from((p[1].1 + p[2].1) / 2) / f64::from(BURST_SHOT_POTENCY);

    for action in actions.iter_mut() {
        if action.ability_id != PITCH_PERFECT {
            continue;
        }
        let Some(mut damage) = normalized_damage(action) else {
            continue;
        };
        if action.main_stat_add > 0 {
            damage /= MEDICATION_MULTIPLIER;
        }
        let ratio = damage / burst_shot_mean;
        let stacks = if ratio < low {
            p[0].0
        } else if ratio < high {
            p[1].0
        } else {
            p[2].0
        };
        push_buff(action, &format!("pp{stacks}"));
    }
}

/// Damage with buff multipliers and hit-type bonuses divided back out.
fn normalized_damage(action: &NormalizedAction) -> Option<f64> {
    let mut damage = action.amount as f64 / action.multiplier?;
    if action.hit_type == HIT_TYPE_CRIT {
        damage /= action.crit_damage_multiplier;
    }
    if action.direct_hit {
        damage /= DIRECT_HIT_MULT;
    }
    Some(damage)
}
