//! Dark Knight: Darkside uptime reconstruction.
//!
//! Darkside (+10% damage) never appears on damage events, but every Edge
//! of Shadow / Flood of Shadow cast spends the gauge that refreshes it by
//! 30s, capped at 60s. Walking those casts recovers the windows where the
//! buff was down, which the log cannot show directly.

use critline_types::{Job, NormalizedAction};

use crate::buffs::propagate_group_flag;
use crate::error::AnalysisError;
use crate::game_data::dark_knight::{
    DARKSIDE_CAP_S, DARKSIDE_EXTENSION_S, DARKSIDE_MULT, DARKSIDE_TOKEN, EDGE_OF_SHADOW,
    FLOOD_OF_SHADOW,
};
use crate::normalize::round6;

use super::{JobAdjuster, JobContext, push_buff};

const SALTED_EARTH_TICK: &str = "Salted Earth (tick)";

pub struct DarkKnight;

impl JobAdjuster for DarkKnight {
    fn job(&self) -> Job {
        Job::DarkKnight
    }

    fn apply(
        &self,
        mut actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        let gaps = darkside_gaps(&actions);

        // Direct damage takes Darkside from its own timestamp. Pets have
        // their own gauge-independent damage, and Salted Earth snapshots.
        for action in actions.iter_mut() {
            if ctx.pet_ids.contains(&action.source_id) || action.ability_name == SALTED_EARTH_TICK {
                continue;
            }
            if darkside_up(&gaps, action.elapsed_time) {
                apply_darkside(action);
            }
        }

        apply_salted_earth(&mut actions, &gaps, ctx);
        Ok(actions)
    }
}

/// Intervals (seconds, half-open) where Darkside was down.
fn darkside_gaps(actions: &[NormalizedAction]) -> Vec<(f64, f64)> {
    let mut casts: Vec<f64> = actions
        .iter()
        .filter(|a| a.ability_id == EDGE_OF_SHADOW || a.ability_id == FLOOD_OF_SHADOW)
        .map(|a| a.elapsed_time)
        .collect();
    casts.sort_by(f64::total_cmp);

    let mut gaps = Vec::new();
    let mut prev_t = 0.0;
    let mut prev_remaining = 0.0;
    for (i, &t) in casts.iter().enumerate() {
        let remaining = if i == 0 {
            // The opener applies Darkside before the first spender lands,
            // so the pre-pull window counts as covered only up to t=0.
            if t > 0.0 {
                gaps.push((0.0, t));
            }
            DARKSIDE_EXTENSION_S
        } else {
            let carried = prev_remaining + prev_t - t;
            if carried < 0.0 {
                gaps.push((t + carried, t));
            }
            (carried.max(0.0) + DARKSIDE_EXTENSION_S).min(DARKSIDE_CAP_S)
        };
        prev_t = t;
        prev_remaining = remaining;
    }
    // After the last refresh, coverage ends once the timer runs out.
    if !casts.is_empty() {
        gaps.push((prev_t + prev_remaining, f64::INFINITY));
    }
    gaps
}

fn darkside_up(gaps: &[(f64, f64)], t: f64) -> bool {
    !gaps.iter().any(|&(start, end)| start <= t && t < end)
}

fn apply_darkside(action: &mut NormalizedAction) {
    action.multiplier = action.multiplier.map(|m| round6(m * DARKSIDE_MULT));
    push_buff(action, DARKSIDE_TOKEN);
}

/// Salted Earth ticks snapshot Darkside at application: group ticks into
/// applications by tick-gap, then give the whole group the buff if any
/// tick in it had Darkside up.
fn apply_salted_earth(
    actions: &mut [NormalizedAction],
    gaps: &[(f64, f64)],
    ctx: &JobContext<'_>,
) {
    let indices: Vec<usize> = actions
        .iter()
        .enumerate()
        .filter(|(_, a)| a.ability_name == SALTED_EARTH_TICK)
        .map(|(i, _)| i)
        .collect();
    if indices.is_empty() {
        return;
    }

    let elapsed: Vec<f64> = indices.iter().map(|&i| actions[i].elapsed_time).collect();
    let up: Vec<bool> = elapsed.iter().map(|&t| darkside_up(gaps, t)).collect();
    let snapshotted = propagate_group_flag(&elapsed, &up, ctx.snapshot);

    for (&i, with_darkside) in indices.iter().zip(snapshotted) {
        if with_darkside {
            apply_darkside(&mut actions[i]);
        }
    }
}
