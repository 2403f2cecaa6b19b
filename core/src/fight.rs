//! Fight/phase time resolution.
//!
//! Establishes the absolute analysis window, active (downtime-corrected)
//! duration, patch, and echo state for a requested phase. Missing phase
//! data degrades to the fight-end fallback; it is never an error.

use critline_types::{EncounterPhases, FightInfo};
use tracing::debug;

use crate::game_data::{
    ECHO_10_MULT, ECHO_10_START, ECHO_10_TOKEN, ECHO_15_MULT, ECHO_15_START, ECHO_15_TOKEN,
    patch_at,
};

/// Echo bonus in effect for a fight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Echo {
    pub multiplier: f64,
    pub token: &'static str,
}

/// Resolved absolute time bounds for one analysis window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FightTimes {
    /// Absolute Unix ms.
    pub start: i64,
    pub end: i64,
    /// Seconds of active damage time (downtime subtracted).
    pub dps_time: f64,
    pub patch: f64,
    pub echo: Option<Echo>,
}

impl FightTimes {
    /// Resolve the analysis window for `phase` (0 = whole fight).
    ///
    /// Returns `None` when a non-zero phase was requested but no transition
    /// for it was recorded — an upstream data gap, not a fault.
    pub fn resolve(fight: &FightInfo, phase: u8, phases: &EncounterPhases) -> Option<Self> {
        let (rel_start, rel_end) = if phase == 0 {
            (fight.start_time, fight.end_time)
        } else {
            let start = fight
                .phase_transitions
                .iter()
                .find(|t| t.id == phase)?
                .start_time;
            let end = next_phase_start(fight, phase, phases).unwrap_or(fight.end_time);
            (start, end)
        };

        let start = fight.report_start + rel_start;
        let end = fight.report_start + rel_end;
        let downtime_ms = downtime_in(&fight.downtime, rel_start, rel_end);
        let dps_time = ((rel_end - rel_start - downtime_ms) as f64 / 1000.0).max(0.0);
        let patch = patch_at(start);

        debug!(
            phase,
            start, end, dps_time, patch, "resolved analysis window"
        );

        Some(Self {
            start,
            end,
            dps_time,
            patch,
            echo: echo_for(fight, start),
        })
    }
}

/// Start of the next phase, when the encounter defines one and a transition
/// for it was actually recorded. Absent on wipes before the next phase.
fn next_phase_start(fight: &FightInfo, phase: u8, phases: &EncounterPhases) -> Option<i64> {
    let last = phases.last_phase(fight.encounter_id)?;
    if phase >= last {
        return None;
    }
    fight
        .phase_transitions
        .iter()
        .find(|t| t.id == phase + 1)
        .map(|t| t.start_time)
}

/// Total overlap of the downtime windows with `[start, end]`, in ms.
fn downtime_in(windows: &[(i64, i64)], start: i64, end: i64) -> i64 {
    windows
        .iter()
        .map(|&(s, e)| (e.min(end) - s.max(start)).max(0))
        .sum()
}

/// Echo state for a fight that carries the echo flag, strength chosen by
/// the patch sub-window its start falls in.
fn echo_for(fight: &FightInfo, absolute_start: i64) -> Option<Echo> {
    if !fight.has_echo {
        return None;
    }
    if absolute_start >= ECHO_15_START {
        Some(Echo { multiplier: ECHO_15_MULT, token: ECHO_15_TOKEN })
    } else if absolute_start >= ECHO_10_START {
        Some(Echo { multiplier: ECHO_10_MULT, token: ECHO_10_TOKEN })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use critline_types::PhaseTransition;

    use super::*;

    const REPORT_START: i64 = 1_000;

    fn three_phase_encounter() -> EncounterPhases {
        let mut phases = std::collections::BTreeMap::new();
        phases.insert(
            1,
            [(1, "P1".to_string()), (2, "P2".to_string()), (3, "P3".to_string())]
                .into_iter()
                .collect(),
        );
        EncounterPhases(phases)
    }

    fn fight(transitions: Vec<PhaseTransition>) -> FightInfo {
        FightInfo {
            report_start: REPORT_START,
            encounter_id: 1,
            name: "Test Encounter".to_string(),
            start_time: 0,
            end_time: 10_000,
            kill: false,
            has_echo: false,
            phase_transitions: transitions,
            downtime: vec![],
        }
    }

    fn transitions() -> Vec<PhaseTransition> {
        vec![
            PhaseTransition { id: 1, start_time: 2_000 },
            PhaseTransition { id: 2, start_time: 4_000 },
            PhaseTransition { id: 3, start_time: 8_000 },
        ]
    }

    #[test]
    fn phase_zero_uses_whole_fight() {
        let t = FightTimes::resolve(&fight(transitions()), 0, &three_phase_encounter()).unwrap();
        assert_eq!(t.start, REPORT_START);
        assert_eq!(t.end, REPORT_START + 10_000);
        assert!((t.dps_time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn interior_phases_are_bounded_by_next_transition() {
        let phases = three_phase_encounter();
        let f = fight(transitions());

        let p1 = FightTimes::resolve(&f, 1, &phases).unwrap();
        assert_eq!(p1.start, REPORT_START + 2_000);
        assert_eq!(p1.end, REPORT_START + 4_000);

        let p2 = FightTimes::resolve(&f, 2, &phases).unwrap();
        assert_eq!(p2.start, REPORT_START + 4_000);
        assert_eq!(p2.end, REPORT_START + 8_000);
    }

    #[test]
    fn final_phase_runs_to_fight_end() {
        let t = FightTimes::resolve(&fight(transitions()), 3, &three_phase_encounter()).unwrap();
        assert_eq!(t.start, REPORT_START + 8_000);
        assert_eq!(t.end, REPORT_START + 10_000);
    }

    #[test]
    fn wipe_before_next_phase_falls_back_to_fight_end() {
        // Party wiped in phase 1: no transition for phase 2 was recorded.
        let f = fight(vec![PhaseTransition { id: 1, start_time: 2_000 }]);
        let t = FightTimes::resolve(&f, 1, &three_phase_encounter()).unwrap();
        assert_eq!(t.start, REPORT_START + 2_000);
        assert_eq!(t.end, REPORT_START + 10_000);
    }

    #[test]
    fn unrecorded_phase_is_a_data_gap() {
        let f = fight(vec![PhaseTransition { id: 1, start_time: 2_000 }]);
        assert!(FightTimes::resolve(&f, 2, &three_phase_encounter()).is_none());
    }

    #[test]
    fn downtime_overlap_reduces_dps_time() {
        let mut f = fight(transitions());
        f.downtime = vec![(1_000, 3_000), (9_000, 12_000)];
        let t = FightTimes::resolve(&f, 0, &three_phase_encounter()).unwrap();
        // 2000ms + 1000ms of overlap inside [0, 10000]
        assert!((t.dps_time - 7.0).abs() < 1e-9);
    }

    #[test]
    fn echo_window_selects_strength() {
        let mut f = fight(transitions());
        f.has_echo = true;
        f.report_start = ECHO_15_START + 1;
        let t = FightTimes::resolve(&f, 0, &three_phase_encounter()).unwrap();
        assert_eq!(t.echo, Some(Echo { multiplier: 1.15, token: "echo15" }));

        f.report_start = ECHO_10_START + 1;
        let t = FightTimes::resolve(&f, 0, &three_phase_encounter()).unwrap();
        assert_eq!(t.echo.unwrap().multiplier, 1.10);

        // Echo flag without a known window applies nothing.
        f.report_start = 1_000;
        let t = FightTimes::resolve(&f, 0, &three_phase_encounter()).unwrap();
        assert!(t.echo.is_none());
    }
}
