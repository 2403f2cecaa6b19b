//! Job-specific rotation adjustments.
//!
//! Some buffs never show up on damage events: the log either omits them
//! (Darkside, combo forms) or records them without the gauge state that
//! decides their effect (coda counts, fury stacks, Wildfire GCDs). Each
//! job module reconstructs that state from the event stream itself and
//! rewrites the affected rows — extra buff tokens, adjusted multipliers,
//! or replaced hit probabilities — before potency resolution.

use critline_types::{Job, NormalizedAction};
use hashbrown::HashMap;

use crate::buffs::{BuffWindows, SnapshotPolicy};
use crate::error::AnalysisError;
use crate::rates::Rates;
use crate::tables::ActiveTables;

mod bard;
mod dark_knight;
mod machinist;
mod monk;
mod paladin;
mod samurai;

pub use bard::Bard;
pub use dark_knight::DarkKnight;
pub use machinist::Machinist;
pub use monk::Monk;
pub use paladin::Paladin;
pub use samurai::Samurai;

/// Shared inputs for job adjusters.
pub struct JobContext<'a> {
    pub player_id: i64,
    pub pet_ids: &'a [i64],
    pub patch: f64,
    pub rates: &'a Rates,
    pub tables: &'a ActiveTables,
    /// Buff uptime intervals fetched separately from the damage stream
    /// (combo forms, Requiescat, Enhanced Enpi, Wildfire, ...).
    pub buff_windows: &'a BuffWindows,
    pub snapshot: SnapshotPolicy,
}

/// A job's rotation rewrite pass.
pub trait JobAdjuster: Send + Sync {
    fn job(&self) -> Job;

    /// Rewrites the normalized table in place and returns it.
    fn apply(
        &self,
        actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError>;
}

/// Dispatch table from job to its adjuster. Jobs without special
/// mechanics pass through unchanged.
pub struct JobRegistry {
    adjusters: HashMap<Job, Box<dyn JobAdjuster>>,
}

impl JobRegistry {
    pub fn empty() -> Self {
        Self {
            adjusters: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(DarkKnight));
        registry.register(Box::new(Paladin));
        registry.register(Box::new(Monk));
        registry.register(Box::new(Samurai));
        registry.register(Box::new(Machinist));
        registry.register(Box::new(Bard));
        registry
    }

    pub fn register(&mut self, adjuster: Box<dyn JobAdjuster>) {
        self.adjusters.insert(adjuster.job(), adjuster);
    }

    pub fn apply(
        &self,
        job: Job,
        actions: Vec<NormalizedAction>,
        ctx: &JobContext<'_>,
    ) -> Result<Vec<NormalizedAction>, AnalysisError> {
        match self.adjusters.get(&job) {
            Some(adjuster) => adjuster.apply(actions, ctx),
            None => Ok(actions),
        }
    }
}

/// Appends a buff token and rebuilds the composite action name.
fn push_buff(action: &mut NormalizedAction, token: &str) {
    if !action.buffs.iter().any(|b| b == token) {
        action.buffs.push(token.to_owned());
    }
    action.rebuild_action_name();
}
