//! Per-player analysis orchestration.
//!
//! Wires the pipeline end to end: resolve the fight/phase window, scope
//! the reference tables, normalize the event stream, run the job
//! adjuster, apply the Echo, and build the rotation table. Party-wide
//! analysis fans the per-player work out over rayon.

use std::sync::atomic::{AtomicUsize, Ordering};

use critline_types::{FightInfo, Job, NormalizedAction, RawDamageEvent, ReferenceTables};
use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::buffs::{BuffWindows, SnapshotPolicy};
use crate::error::AnalysisError;
use crate::fight::{Echo, FightTimes};
use crate::game_data::excluded_targets;
use crate::jobs::{JobContext, JobRegistry};
use crate::normalize::{self, NormalizeContext, round6};
use crate::rates::Rates;
use crate::rotation::{self, RotationResult};
use crate::tables::ActiveTables;

/// Combat stats of the analyzed player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerStats {
    pub critical_hit: u32,
    pub direct_hit: u32,
    pub level: u8,
    /// Main-stat gain of the consumed medication tier, 0 if none.
    pub medication_amount: i64,
}

/// One player's worth of inputs, assembled by the caller from the log
/// service and the player's gear set.
pub struct AnalysisRequest {
    pub fight: FightInfo,
    pub events: Vec<RawDamageEvent>,
    /// Ability game id -> display name, from the report's master data.
    pub ability_names: HashMap<i64, String>,
    pub job: Job,
    pub player_id: i64,
    pub pet_ids: Vec<i64>,
    pub stats: PlayerStats,
    /// Phase to analyze; 0 means the whole fight.
    pub phase: u8,
    /// Uptime windows for buffs the damage stream does not carry.
    pub buff_windows: BuffWindows,
}

/// The finished analysis for one player.
#[derive(Debug, Clone)]
pub struct PlayerAnalysis {
    pub job: Job,
    pub player_id: i64,
    pub phase: u8,
    pub times: FightTimes,
    pub actions: Vec<NormalizedAction>,
    pub rotation: RotationResult,
}

/// Progress callback for party-wide analysis. Called once per finished
/// member, from worker threads.
pub trait ProgressSink: Sync {
    fn on_member_complete(&self, done: usize, total: usize);
}

/// Sink for callers that do not track progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_member_complete(&self, _done: usize, _total: usize) {}
}

/// Analyzes one player.
///
/// Returns `Ok(None)` when the requested phase has no recorded
/// transition or the window contains no damage from this player — both
/// are data gaps rather than faults.
pub fn analyze_player(
    request: &AnalysisRequest,
    tables: &ReferenceTables,
    registry: &JobRegistry,
) -> Result<Option<PlayerAnalysis>, AnalysisError> {
    let Some(times) = FightTimes::resolve(&request.fight, request.phase, &tables.encounter_phases)
    else {
        debug!(phase = request.phase, "no transition recorded for phase");
        return Ok(None);
    };

    let window_start = times.start - request.fight.report_start;
    let window_end = times.end - request.fight.report_start;
    let windowed: Vec<RawDamageEvent> = request
        .events
        .iter()
        .filter(|e| window_start <= e.timestamp && e.timestamp <= window_end)
        .cloned()
        .collect();

    let active = ActiveTables::at(
        tables,
        request.fight.absolute_start(),
        request.job,
        request.stats.level,
    );
    let rates = Rates::new(
        request.stats.critical_hit,
        request.stats.direct_hit,
        request.stats.level,
    )?;

    let ctx = NormalizeContext {
        report_start: request.fight.report_start,
        window_start,
        player_id: request.player_id,
        pet_ids: &request.pet_ids,
        ability_names: &request.ability_names,
        tables: &active,
        rates: &rates,
        job: request.job,
        patch: times.patch,
        medication_amount: request.stats.medication_amount,
    };
    let actions = normalize::normalize(&windowed, &ctx);
    if actions.is_empty() {
        debug!(player_id = request.player_id, "no damage in window");
        return Ok(None);
    }

    let job_ctx = JobContext {
        player_id: request.player_id,
        pet_ids: &request.pet_ids,
        patch: times.patch,
        rates: &rates,
        tables: &active,
        buff_windows: &request.buff_windows,
        snapshot: SnapshotPolicy::default(),
    };
    let mut actions = registry.apply(request.job, actions, &job_ctx)?;

    if let Some(echo) = times.echo {
        apply_echo(&mut actions, echo);
    }

    let rotation = rotation::resolve(
        &actions,
        &active,
        excluded_targets(request.fight.encounter_id),
    )?;

    info!(
        player_id = request.player_id,
        job = ?request.job,
        phase = request.phase,
        rows = rotation.rows.len(),
        hits = rotation.total_hits(),
        "rotation resolved"
    );

    Ok(Some(PlayerAnalysis {
        job: request.job,
        player_id: request.player_id,
        phase: request.phase,
        times,
        actions,
        rotation,
    }))
}

/// The Echo is a flat multiplier on everything, modeled as one more
/// damage buff so rows inside and outside comparison fights stay
/// distinguishable.
fn apply_echo(actions: &mut [NormalizedAction], echo: Echo) {
    for action in actions.iter_mut() {
        action.multiplier = action.multiplier.map(|m| round6(m * echo.multiplier));
        if !action.buffs.iter().any(|b| b == echo.token) {
            action.buffs.push(echo.token.to_owned());
        }
        action.rebuild_action_name();
    }
}

/// Analyzes a whole party in parallel, preserving request order.
pub fn analyze_party(
    requests: &[AnalysisRequest],
    tables: &ReferenceTables,
    registry: &JobRegistry,
    progress: &dyn ProgressSink,
) -> Vec<Result<Option<PlayerAnalysis>, AnalysisError>> {
    let done = AtomicUsize::new(0);
    requests
        .par_iter()
        .map(|request| {
            let result = analyze_player(request, tables, registry);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.on_member_complete(finished, requests.len());
            result
        })
        .collect()
}
