//! Monk: form-based guaranteed crits and Dawntrail fury stacks.
//!
//! Bootshine / Leaping Opo crit automatically under Opo-opo Form or
//! Formless Fist; the form buffs are fetched as uptime windows and the
//! probability vector rebuilt here. Dawntrail's fury gauges (Dragon Kick
//! feeding Leaping Opo, Twin Snakes feeding Rising Raptor, Demolish
//! feeding Pouncing Coeurl) are invisible to the log entirely, so stack
//! state is replayed from the cast sequence.

use critline_types::{Job, NormalizedAction};

use crate::error::AnalysisError;
use crate::game_data::monk::{
    BOOTSHINE, DEMOLISH, DRAGON_KICK, FORMLESS_FIST_BUFF_ID, FURY_TOKEN, LEADEN_FIST_BUFF_ID,
    LEAPING_OPO, OPO_OPO_FORM_BUFF_ID, POUNCING_COEURL, RISING_RAPTOR, TWIN_SNAKES,
};
use crate::normalize::{round2, round6};

use super::{JobAdjuster, JobContext, push_buff};

pub struct Monk;

impl JobAdjuster for Monk {
    fn job(&self) -> Job {
        Job::Monk
    }

    fn apply(
        &self,
        mut actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        apply_form_autocrit(&mut actions, ctx);
        if ctx.patch < 7.0 {
            apply_leaden_fist(&mut actions, ctx);
        } else {
            apply_fury_stacks(&mut actions);
        }
        Ok(actions)
    }
}

fn apply_form_autocrit(actions: &mut [NormalizedAction], ctx: &JobContext<'_>) {
    for action in actions.iter_mut() {
        if action.ability_id != BOOTSHINE && action.ability_id != LEAPING_OPO {
            continue;
        }
        let t = action.timestamp;
        let in_form = ctx.buff_windows.active_at(OPO_OPO_FORM_BUFF_ID, t)
            || ctx.buff_windows.active_at(FORMLESS_FIST_BUFF_ID, t);
        if !in_form {
            continue;
        }
        // Guaranteed crit: crit rate buffs can no longer proc, so their
        // expected value moves into the damage multiplier instead.
        let crit_rate_buff = round2(
            action
                .buffs
                .iter()
                .filter_map(|b| ctx.tables.crit_rate_buff(b))
                .sum(),
        );
        let dh_rate_buff = round2(
            action
                .buffs
                .iter()
                .filter_map(|b| ctx.tables.dh_rate_buff(b))
                .sum(),
        );
        action.probabilities = ctx.rates.p(crit_rate_buff, dh_rate_buff, Some(1));
        action.multiplier = action.multiplier.map(|m| {
            round6(m * ctx.rates.guaranteed_hit_damage_buff(1, crit_rate_buff, dh_rate_buff))
        });
        push_buff(action, OPO_OPO_FORM_BUFF_ID);
    }
}

fn apply_leaden_fist(actions: &mut [NormalizedAction], ctx: &JobContext<'_>) {
    for action in actions.iter_mut() {
        if action.ability_id == BOOTSHINE
            && ctx.buff_windows.active_at(LEADEN_FIST_BUFF_ID, action.timestamp)
        {
            push_buff(action, LEADEN_FIST_BUFF_ID);
        }
    }
}

/// Replays the three Dawntrail fury gauges over the cast sequence and
/// tags spenders that had a stack available.
fn apply_fury_stacks(actions: &mut [NormalizedAction]) {
    let mut opo_charged = false;
    let mut raptor_charged = false;
    let mut coeurl_stacks = 0u8;

    for action in actions.iter_mut() {
        match action.ability_id {
            DRAGON_KICK => opo_charged = true,
            BOOTSHINE => opo_charged = false,
            LEAPING_OPO => {
                if opo_charged {
                    push_buff(action, FURY_TOKEN);
                }
                opo_charged = false;
            }
            TWIN_SNAKES => raptor_charged = true,
            RISING_RAPTOR => {
                if raptor_charged {
                    push_buff(action, FURY_TOKEN);
                }
                raptor_charged = false;
            }
            DEMOLISH => coeurl_stacks = 2,
            POUNCING_COEURL => {
                if coeurl_stacks > 0 {
                    push_buff(action, FURY_TOKEN);
                    coeurl_stacks -= 1;
                }
            }
            _ => {}
        }
    }
}
