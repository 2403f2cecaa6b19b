//! Paladin: Requiescat and Divine Might potency upgrades.
//!
//! Holy Spirit/Circle and the Blade combo deal upgraded potency under
//! Requiescat or Divine Might, but neither buff is attached to the damage
//! event. Their uptime windows are fetched separately and matched back
//! here by timestamp.

use critline_types::{Job, NormalizedAction};

use crate::error::AnalysisError;
use crate::game_data::paladin::{BLADE_IDS, DIVINE_MIGHT_BUFF_ID, HOLY_IDS, REQUIESCAT_BUFF_ID};

use super::{JobAdjuster, JobContext, push_buff};

pub struct Paladin;

impl JobAdjuster for Paladin {
    fn job(&self) -> Job {
        Job::Paladin
    }

    fn apply(
        &self,
        mut actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        for action in actions.iter_mut() {
            let t = action.timestamp;
            if HOLY_IDS.contains(&action.ability_id) {
                // Divine Might is consumed first when both are up.
                if ctx.buff_windows.active_at(DIVINE_MIGHT_BUFF_ID, t) {
                    push_buff(action, DIVINE_MIGHT_BUFF_ID);
                } else if ctx.buff_windows.active_at(REQUIESCAT_BUFF_ID, t) {
                    push_buff(action, REQUIESCAT_BUFF_ID);
                }
            } else if BLADE_IDS.contains(&action.ability_id)
                && ctx.buff_windows.active_at(REQUIESCAT_BUFF_ID, t)
            {
                push_buff(action, REQUIESCAT_BUFF_ID);
            }
        }
        Ok(actions)
    }
}
