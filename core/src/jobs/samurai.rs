//! Samurai: Enhanced Enpi.
//!
//! Enpi jumps from 100 to 270 potency under Enhanced Enpi. The buff is
//! not attached to the damage event, so its uptime windows are matched
//! back by timestamp.

use critline_types::{Job, NormalizedAction};

use crate::error::AnalysisError;
use crate::game_data::samurai::{ENHANCED_ENPI_BUFF_ID, ENPI};

use super::{JobAdjuster, JobContext, push_buff};

pub struct Samurai;

impl JobAdjuster for Samurai {
    fn job(&self) -> Job {
        Job::Samurai
    }

    fn apply(
        &self,
        mut actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        for action in actions.iter_mut() {
            if action.ability_id == ENPI
                && ctx.buff_windows.active_at(ENHANCED_ENPI_BUFF_ID, action.timestamp)
            {
                push_buff(action, ENHANCED_ENPI_BUFF_ID);
            }
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use critline_types::Job;

    use crate::buffs::BuffWindows;
    use crate::jobs::test_support::{action, ctx, empty_tables};
    use crate::rates::Rates;

    use super::*;

    #[test]
    fn enpi_tagged_only_inside_window() {
        let rates = Rates::new(2576, 1510, 100).unwrap();
        let tables = empty_tables(Job::Samurai);
        let mut windows = BuffWindows::default();
        windows.insert(ENHANCED_ENPI_BUFF_ID, vec![(0, 10_000)]);

        let rows = vec![
            action(ENPI, "Enpi", 5.0),
            action(ENPI, "Enpi", 30.0),
        ];
        let out = Samurai.apply(rows, &ctx(&rates, &tables, &windows)).unwrap();
        assert_eq!(out[0].action_name, "Enpi-1001236");
        assert_eq!(out[1].action_name, "Enpi");
    }
}
