//! Tests for rotation table construction.
//!
//! Covers multi-target falloff snapping, bonus-percent potency upgrades,
//! grouping determinism, and the corrupt-data failure modes.

use critline_types::{
    DamageType, EncounterPhases, HitProbabilities, Job, NormalizedAction, PotencyRow,
    ReferenceTables,
};

use crate::error::AnalysisError;
use crate::tables::ActiveTables;

use super::{FALLOFF_TOLERANCE, resolve};

fn potency_row(ability_id: i64, name: &str, base: u32) -> PotencyRow {
    PotencyRow {
        ability_id,
        ability_name: name.to_owned(),
        job: Job::Samurai,
        level: 100,
        buff_id: None,
        base_potency: base,
        combo_potency: None,
        combo_bonus: None,
        positional_potency: None,
        positional_bonus: None,
        combo_positional_potency: None,
        combo_positional_bonus: None,
        potency_falloff: vec![1.0],
        damage_type: DamageType::Direct,
        valid_start: 0,
        valid_end: i64::MAX,
    }
}

fn tables(potencies: Vec<PotencyRow>) -> ActiveTables {
    ActiveTables::at(
        &ReferenceTables {
            damage_buffs: vec![],
            critical_hit_rate_buffs: vec![],
            direct_hit_rate_buffs: vec![],
            guaranteed_hits_by_action: vec![],
            guaranteed_hits_by_buff: vec![],
            potencies,
            encounter_phases: EncounterPhases::default(),
        },
        0,
        Job::Samurai,
        100,
    )
}

fn hit(ability_id: i64, name: &str, amount: i64, packet_id: Option<i64>) -> NormalizedAction {
    let mut a = NormalizedAction {
        timestamp: 1_000,
        elapsed_time: 1.0,
        ability_name: name.to_owned(),
        action_name: String::new(),
        ability_id,
        source_id: 1,
        target_id: 20,
        packet_id,
        amount,
        tick: false,
        hit_type: 1,
        direct_hit: false,
        bonus_percent: None,
        buffs: vec![],
        multiplier: Some(1.0),
        probabilities: HitProbabilities {
            p_n: 0.6,
            p_c: 0.2,
            p_d: 0.15,
            p_cd: 0.05,
        },
        crit_damage_multiplier: 1.555,
        main_stat_add: 0,
    };
    a.rebuild_action_name();
    a
}

#[test]
fn identical_hits_collapse_into_one_row() {
    let tables = tables(vec![potency_row(7486, "Enpi", 100)]);
    let actions = vec![
        hit(7486, "Enpi", 10_000, None),
        hit(7486, "Enpi", 10_500, None),
        hit(7486, "Enpi", 9_800, None),
    ];
    let result = resolve(&actions, &tables, &[]).unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].n, 3);
    assert_eq!(result.rows[0].potency, 100);
    assert_eq!(result.total_hits(), 3);
}

#[test]
fn resolution_is_deterministic() {
    let tables = tables(vec![
        potency_row(7486, "Enpi", 100),
        potency_row(7867, "Ogi Namikiri", 1000),
    ]);
    let mut actions = vec![
        hit(7486, "Enpi", 10_000, None),
        hit(7867, "Ogi Namikiri", 90_000, None),
        hit(7486, "Enpi", 11_000, None),
    ];
    actions[2].buffs = vec!["1000910".into()];
    actions[2].rebuild_action_name();

    let first = resolve(&actions, &tables, &[]).unwrap();
    let second = resolve(&actions, &tables, &[]).unwrap();
    assert_eq!(first.rows, second.rows);
}

#[test]
fn half_falloff_snaps_to_published_value() {
    let mut row = potency_row(7867, "Ogi Namikiri", 1000);
    row.potency_falloff = vec![1.0, 0.5];
    let tables = tables(vec![row]);

    // 10_150 / 20_000 = 0.5075, within tolerance of 0.5.
    let actions = vec![
        hit(7867, "Ogi Namikiri", 20_000, Some(42)),
        hit(7867, "Ogi Namikiri", 10_150, Some(42)),
    ];
    let result = resolve(&actions, &tables, &[]).unwrap();
    assert_eq!(result.rows.len(), 2);
    let secondary = result
        .rows
        .iter()
        .find(|r| r.action_name.ends_with("_0.5"))
        .unwrap();
    assert_eq!(secondary.potency, 500);
    let primary = result.rows.iter().find(|r| r.potency == 1000).unwrap();
    assert_eq!(primary.n, 1);
}

#[test]
fn crit_secondary_hit_deinflated_before_matching() {
    let mut row = potency_row(7867, "Ogi Namikiri", 1000);
    row.potency_falloff = vec![1.0, 0.5];
    let tables = tables(vec![row]);

    let mut crit = hit(7867, "Ogi Namikiri", (10_000.0 * 1.555) as i64, Some(42));
    crit.hit_type = 2;
    let actions = vec![hit(7867, "Ogi Namikiri", 20_000, Some(42)), crit];
    let result = resolve(&actions, &tables, &[]).unwrap();
    assert!(result.rows.iter().any(|r| r.potency == 500));
}

#[test]
fn unmatched_falloff_is_fatal() {
    let tables = tables(vec![potency_row(7867, "Ogi Namikiri", 1000)]);
    // Secondary at 30% of primary; only 1.0 is published.
    let actions = vec![
        hit(7867, "Ogi Namikiri", 20_000, Some(42)),
        hit(7867, "Ogi Namikiri", 6_000, Some(42)),
    ];
    let err = resolve(&actions, &tables, &[]).unwrap_err();
    match err {
        AnalysisError::FalloffMatch { observed, tolerance, .. } => {
            assert!((observed - 0.3).abs() < 1e-9);
            assert_eq!(tolerance, FALLOFF_TOLERANCE);
        }
        other => panic!("expected falloff error, got {other}"),
    }
}

#[test]
fn unknown_ability_is_fatal() {
    let tables = tables(vec![potency_row(7486, "Enpi", 100)]);
    let actions = vec![
        hit(7486, "Enpi", 10_000, None),
        hit(9999, "Mystery Skill", 5_000, None),
    ];
    let err = resolve(&actions, &tables, &[]).unwrap_err();
    match err {
        AnalysisError::RotationMismatch { actions } => {
            assert_eq!(actions, vec!["Mystery Skill".to_owned()]);
        }
        other => panic!("expected mismatch error, got {other}"),
    }
}

#[test]
fn buff_specific_potency_outranks_base_row() {
    let base = potency_row(7486, "Enpi", 100);
    let mut enhanced = potency_row(7486, "Enpi", 270);
    enhanced.buff_id = Some("1001236".to_owned());
    let tables = tables(vec![base, enhanced]);

    let mut enhanced_hit = hit(7486, "Enpi", 27_000, None);
    enhanced_hit.buffs = vec!["1001236".into()];
    enhanced_hit.rebuild_action_name();
    let actions = vec![hit(7486, "Enpi", 10_000, None), enhanced_hit];
    let result = resolve(&actions, &tables, &[]).unwrap();

    let enhanced_row = result
        .rows
        .iter()
        .find(|r| r.buffs == vec!["1001236".to_owned()])
        .unwrap();
    assert_eq!(enhanced_row.potency, 270);
    let base_row = result.rows.iter().find(|r| r.buffs.is_empty()).unwrap();
    assert_eq!(base_row.potency, 100);
}

#[test]
fn bonus_percent_selects_combo_and_positional_tiers() {
    let mut row = potency_row(2255, "Aeolian Edge", 140);
    row.combo_potency = Some(280);
    row.combo_bonus = Some(100);
    row.positional_potency = Some(200);
    row.positional_bonus = Some(43);
    row.combo_positional_potency = Some(340);
    row.combo_positional_bonus = Some(143);
    let tables = tables(vec![row]);

    let mut combo = hit(2255, "Aeolian Edge", 28_000, None);
    combo.bonus_percent = Some(100);
    let mut both = hit(2255, "Aeolian Edge", 34_000, None);
    both.bonus_percent = Some(143);
    let plain = hit(2255, "Aeolian Edge", 14_000, None);
    let result = resolve(&[combo, both, plain], &tables, &[]).unwrap();

    let find = |suffix: &str| {
        result
            .rows
            .iter()
            .find(|r| r.action_name.ends_with(suffix))
            .unwrap()
    };
    assert_eq!(find("_combo").potency, 280);
    assert_eq!(find("_combo_positional").potency, 340);
    assert_eq!(
        result.rows.iter().find(|r| r.potency == 140).unwrap().n,
        1
    );
}

#[test]
fn excluded_targets_and_zero_damage_dropped() {
    let tables = tables(vec![potency_row(7486, "Enpi", 100)]);
    let mut crystal = hit(7486, "Enpi", 10_000, None);
    crystal.target_id = 99;
    let mut whiffed = hit(7486, "Enpi", 0, None);
    whiffed.target_id = 20;
    let actions = vec![hit(7486, "Enpi", 10_000, None), crystal, whiffed];
    let result = resolve(&actions, &tables, &[99]).unwrap();
    assert_eq!(result.total_hits(), 1);
}

#[test]
fn probabilities_sum_to_one_in_every_row() {
    let tables = tables(vec![potency_row(7486, "Enpi", 100)]);
    let actions = vec![hit(7486, "Enpi", 10_000, None)];
    let result = resolve(&actions, &tables, &[]).unwrap();
    for row in &result.rows {
        let sum = row.p_n + row.p_c + row.p_d + row.p_cd;
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(row.potency > 0);
        assert!(row.multiplier > 0.0);
    }
}

#[test]
fn missing_multiplier_is_fatal() {
    let tables = tables(vec![potency_row(25755, "Salted Earth (tick)", 50)]);
    let mut tick = hit(25755, "Salted Earth (tick)", 2_000, None);
    tick.tick = true;
    tick.multiplier = None;
    let err = resolve(&[tick], &tables, &[]).unwrap_err();
    assert!(matches!(err, AnalysisError::MissingMultiplier { .. }));
}
