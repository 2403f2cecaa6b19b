//! Machinist: Wildfire detonation potency.
//!
//! Wildfire detonates for 240 potency per weaponskill landed during the
//! buff, capped at six. It is dealt by an invisible actor, cannot crit or
//! direct hit, and its damage multiplier is missing from the log. The GCD
//! count is recovered by counting the player's weaponskills in the ten
//! seconds before each detonation, and the multiplier is imputed from
//! actions with an identical buff set.

use critline_types::{HitProbabilities, Job, NormalizedAction};

use crate::buffs::estimate_ground_effect_multiplier;
use crate::error::AnalysisError;
use crate::game_data::machinist::{WEAPONSKILL_IDS, WILDFIRE_GCD_CAP, WILDFIRE_GROUND_EFFECT};

use super::{JobAdjuster, JobContext, push_buff};

/// Weaponskills landed after this cutoff (seconds before detonation)
/// contribute to the detonation.
const WILDFIRE_WINDOW_S: f64 = 10.0;

pub struct Machinist;

impl JobAdjuster for Machinist {
    fn job(&self) -> Job {
        Job::Machinist
    }

    fn apply(
        &self,
        mut actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        estimate_ground_effect_multiplier(&mut actions, WILDFIRE_GROUND_EFFECT, |b| {
            ctx.tables.damage_buff_strength(b)
        });

        let weaponskill_times: Vec<f64> = actions
            .iter()
            .filter(|a| a.source_id == ctx.player_id && WEAPONSKILL_IDS.contains(&a.ability_id))
            .map(|a| a.elapsed_time)
            .collect();

        for action in actions.iter_mut() {
            if action.ability_id != WILDFIRE_GROUND_EFFECT {
                continue;
            }
            // Detonations never crit or direct hit.
            action.probabilities = HitProbabilities::guaranteed(0);

            let t = action.elapsed_time;
            let gcds = weaponskill_times
                .iter()
                .filter(|&&w| t - WILDFIRE_WINDOW_S <= w && w <= t)
                .count()
                .min(WILDFIRE_GCD_CAP);
            push_buff(action, &format!("wildfire_{gcds}"));
        }
        Ok(actions)
    }
}
