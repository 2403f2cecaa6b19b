//! Damage event normalization.
//!
//! Turns raw log events into [`NormalizedAction`] rows: filters to the
//! analyzed actor's direct damage and dot ticks, resolves ability names,
//! canonicalizes buff tokens (medication, Radiant Finale strength, arcanum
//! cards), folds guaranteed hits into the damage multiplier, and attaches
//! the hit-type probability vector for the cast's buff state.

use critline_types::{CardClass, EventKind, Job, NormalizedAction, RawDamageEvent};
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::game_data::{
    MEDICATION_BUFF_ID, MEDICATION_MULTIPLIER, RADIANT_FINALE_BUFF_ID,
};
use crate::rates::Rates;
use crate::tables::ActiveTables;

/// Elapsed-time threshold below which Radiant Finale can only carry one
/// coda (the opener), seconds.
const RADIANT_FINALE_OPENER_CUTOFF: f64 = 100.0;

/// Everything the normalizer needs besides the events themselves.
pub struct NormalizeContext<'a> {
    pub report_start: i64,
    /// Window start in report-relative ms; elapsed time is measured from here.
    pub window_start: i64,
    pub player_id: i64,
    pub pet_ids: &'a [i64],
    pub ability_names: &'a HashMap<i64, String>,
    pub tables: &'a ActiveTables,
    pub rates: &'a Rates,
    pub job: Job,
    pub patch: f64,
    /// Main-stat gain of the consumed medication tier, 0 if none.
    pub medication_amount: i64,
}

/// Normalizes the raw event stream for one player.
///
/// Events must already be windowed to the analyzed fight/phase. Unpaired
/// events and events from other actors are dropped here.
pub fn normalize(events: &[RawDamageEvent], ctx: &NormalizeContext) -> Vec<NormalizedAction> {
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        if !retain(event, ctx) {
            continue;
        }
        let Some(base_name) = ctx.ability_names.get(&event.ability_game_id) else {
            debug!(ability_id = event.ability_game_id, "unnamed ability dropped");
            continue;
        };

        let is_pet = ctx.pet_ids.contains(&event.source_id);
        let mut ability_name = base_name.clone();
        if event.tick {
            ability_name.push_str(" (tick)");
        }
        if is_pet {
            ability_name.push_str(" (Pet)");
        }

        let mut multiplier = event.multiplier;
        let mut main_stat_add = 0;
        let buffs = canonical_buffs(event, ctx);

        if buffs.iter().any(|b| b == MEDICATION_BUFF_ID) {
            main_stat_add = ctx.medication_amount;
            multiplier = multiplier.map(|m| round6(m / MEDICATION_MULTIPLIER));
        }

        let crit_rate_buff = round2(sum_rates(&buffs, |b| ctx.tables.crit_rate_buff(b)));
        let dh_rate_buff = round2(sum_rates(&buffs, |b| ctx.tables.dh_rate_buff(b)));

        // Buff-granted guaranteed hits take precedence over ones intrinsic
        // to the ability.
        let guaranteed = ctx
            .tables
            .guaranteed_by_buff(&buffs, event.ability_game_id)
            .or_else(|| ctx.tables.guaranteed_by_action(event.ability_game_id));
        if let Some(hit_type) = guaranteed {
            multiplier = multiplier.map(|m| {
                round6(m * ctx.rates.guaranteed_hit_damage_buff(hit_type, crit_rate_buff, dh_rate_buff))
            });
        }

        let probabilities = ctx.rates.p(crit_rate_buff, dh_rate_buff, guaranteed);

        let mut action = NormalizedAction {
            timestamp: ctx.report_start + event.timestamp,
            elapsed_time: (event.timestamp - ctx.window_start) as f64 / 1000.0,
            action_name: String::new(),
            ability_name,
            ability_id: event.ability_game_id,
            source_id: event.source_id,
            target_id: event.target_id,
            packet_id: event.packet_id,
            amount: event.amount,
            tick: event.tick,
            hit_type: event.hit_type,
            direct_hit: event.direct_hit,
            bonus_percent: event.bonus_percent,
            buffs,
            multiplier,
            probabilities,
            crit_damage_multiplier: ctx.rates.crit_damage_multiplier(),
            main_stat_add,
        };
        action.rebuild_action_name();
        out.push(action);
    }
    out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    out
}

fn retain(event: &RawDamageEvent, ctx: &NormalizeContext) -> bool {
    if event.unpaired {
        return false;
    }
    if event.source_id != ctx.player_id && !ctx.pet_ids.contains(&event.source_id) {
        return false;
    }
    match event.kind {
        EventKind::CalculatedDamage => true,
        EventKind::Damage => event.tick,
        EventKind::Other => false,
    }
}

/// Splits the dot-separated buff field and canonicalizes tokens: Radiant
/// Finale gains its coda count, pre-Dawntrail arcanum cards collapse into
/// their strength class, and tokens the tables know nothing about are
/// dropped so identical buff states compare equal.
fn canonical_buffs(event: &RawDamageEvent, ctx: &NormalizeContext) -> Vec<String> {
    let raw = event.buffs.as_deref().unwrap_or("");
    let elapsed = (event.timestamp - ctx.window_start) as f64 / 1000.0;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in raw.split('.').filter(|t| !t.is_empty()) {
        let token = canonicalize(token, event, elapsed, ctx);
        if let Some(token) = token {
            if seen.insert(token.clone()) {
                out.push(token);
            }
        }
    }
    out
}

fn canonicalize(
    token: &str,
    event: &RawDamageEvent,
    elapsed: f64,
    ctx: &NormalizeContext,
) -> Option<String> {
    if token == RADIANT_FINALE_BUFF_ID {
        // Coda count is not in the log; before ~100s into a pull only one
        // coda can have been collected.
        return Some(if elapsed < RADIANT_FINALE_OPENER_CUTOFF {
            "RadiantFinale1".to_owned()
        } else {
            "RadiantFinale3".to_owned()
        });
    }
    if ctx.patch < 7.0
        && let Some(card_class) = ctx.tables.card_class_of(token)
    {
        // Pre-Dawntrail cards gave 6% to their matching role, 3% otherwise.
        return Some(if matches_card_class(ctx.job, card_class) {
            "card6".to_owned()
        } else {
            "card3".to_owned()
        });
    }
    let known = token == MEDICATION_BUFF_ID
        || ctx.tables.damage_buff_strength(token).is_some()
        || ctx.tables.crit_rate_buff(token).is_some()
        || ctx.tables.dh_rate_buff(token).is_some()
        || ctx.tables.is_guaranteed_hit_buff(token, event.ability_game_id);
    known.then(|| token.to_owned())
}

fn matches_card_class(job: Job, card_class: CardClass) -> bool {
    job.card_class() == card_class
}

fn sum_rates(buffs: &[String], rate: impl Fn(&str) -> Option<f64>) -> f64 {
    buffs.iter().filter_map(|b| rate(b)).sum()
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub(crate) fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use critline_types::{
        DamageBuff, EncounterPhases, GuaranteedHitByAction, Job, RateBuff, ReferenceTables,
    };

    use super::*;

    fn reference() -> ReferenceTables {
        ReferenceTables {
            damage_buffs: vec![
                buff("1002964", "Radiant Finale", 1.06),
                buff("1000000", "Trick Attack", 1.10),
                buff("10003242", "The Balance", 1.06),
            ],
            critical_hit_rate_buffs: vec![RateBuff {
                buff_id: "1000910".into(),
                buff_name: "Battle Litany".into(),
                rate_buff: 0.10,
                valid_start: 0,
                valid_end: i64::MAX,
            }],
            direct_hit_rate_buffs: vec![RateBuff {
                buff_id: "1001185".into(),
                buff_name: "Battle Voice".into(),
                rate_buff: 0.20,
                valid_start: 0,
                valid_end: i64::MAX,
            }],
            guaranteed_hits_by_action: vec![GuaranteedHitByAction {
                action_id: 16465,
                hit_type: 3,
                valid_start: 0,
                valid_end: i64::MAX,
            }],
            guaranteed_hits_by_buff: vec![],
            potencies: vec![],
            encounter_phases: EncounterPhases::default(),
        }
    }

    fn buff(id: &str, name: &str, strength: f64) -> DamageBuff {
        DamageBuff {
            buff_id: id.into(),
            buff_name: name.into(),
            buff_strength: strength,
            valid_start: 0,
            valid_end: i64::MAX,
        }
    }

    fn event(ability_id: i64, buffs: &str) -> RawDamageEvent {
        RawDamageEvent {
            timestamp: 10_000,
            kind: EventKind::CalculatedDamage,
            source_id: 1,
            target_id: 20,
            ability_game_id: ability_id,
            amount: 12_345,
            hit_type: 1,
            direct_hit: false,
            bonus_percent: None,
            packet_id: Some(77),
            buffs: (!buffs.is_empty()).then(|| buffs.to_owned()),
            tick: false,
            multiplier: Some(1.0),
            unpaired: false,
        }
    }

    struct Fixture {
        tables: ActiveTables,
        rates: Rates,
        names: HashMap<i64, String>,
    }

    fn fixture() -> Fixture {
        let reference = reference();
        Fixture {
            tables: ActiveTables::at(&reference, 0, Job::Bard, 100),
            rates: Rates::new(2576, 1510, 100).unwrap(),
            names: HashMap::from_iter([
                (7486, "Enpi".to_owned()),
                (16465, "Midare Setsugekka".to_owned()),
            ]),
        }
    }

    fn ctx<'a>(f: &'a Fixture) -> NormalizeContext<'a> {
        NormalizeContext {
            report_start: 1_000_000,
            window_start: 0,
            player_id: 1,
            pet_ids: &[],
            ability_names: &f.names,
            tables: &f.tables,
            rates: &f.rates,
            job: Job::Bard,
            patch: 7.05,
            medication_amount: 392,
        }
    }

    #[test]
    fn buff_tokens_sorted_into_action_name() {
        let f = fixture();
        let rows = normalize(&[event(7486, "1001185.1000910.")], &ctx(&f));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action_name, "Enpi-1000910_1001185");
        assert!((rows[0].probabilities.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_buffs_are_dropped() {
        let f = fixture();
        let rows = normalize(&[event(7486, "9999999.1000000.")], &ctx(&f));
        assert_eq!(rows[0].buffs, vec!["1000000".to_owned()]);
    }

    #[test]
    fn medication_divides_multiplier_and_sets_main_stat() {
        let f = fixture();
        let rows = normalize(&[event(7486, &format!("{MEDICATION_BUFF_ID}."))], &ctx(&f));
        assert_eq!(rows[0].main_stat_add, 392);
        assert_eq!(rows[0].multiplier, Some(round6(1.0 / 1.05)));
    }

    #[test]
    fn radiant_finale_strength_from_elapsed_time() {
        let f = fixture();
        let mut early = event(7486, "1002964.");
        early.timestamp = 5_000;
        let mut late = event(7486, "1002964.");
        late.timestamp = 150_000;
        let rows = normalize(&[early, late], &ctx(&f));
        assert_eq!(rows[0].buffs, vec!["RadiantFinale1".to_owned()]);
        assert_eq!(rows[1].buffs, vec!["RadiantFinale3".to_owned()]);
    }

    #[test]
    fn pre_dawntrail_cards_collapse_by_role() {
        let f = fixture();
        let mut c = ctx(&f);
        c.patch = 6.5;
        // The Balance is a melee card; Bard holds ranged cards.
        let rows = normalize(&[event(7486, "10003242.")], &c);
        assert_eq!(rows[0].buffs, vec!["card3".to_owned()]);
    }

    #[test]
    fn guaranteed_hit_folds_rate_buffs_into_multiplier() {
        let f = fixture();
        let rows = normalize(&[event(16465, "1000910.")], &ctx(&f));
        let p = &rows[0].probabilities;
        assert_eq!((p.p_n, p.p_c, p.p_d, p.p_cd), (0.0, 0.0, 0.0, 1.0));
        let m = rows[0].multiplier.unwrap();
        assert!(m > 1.0, "rate buffs must convert to damage, got {m}");
    }

    #[test]
    fn dot_ticks_and_unpaired_events_filtered() {
        let f = fixture();
        let mut tick = event(7486, "");
        tick.kind = EventKind::Damage;
        tick.tick = true;
        let mut untracked = event(7486, "");
        untracked.kind = EventKind::Damage;
        let mut unpaired = event(7486, "");
        unpaired.unpaired = true;
        let rows = normalize(&[tick, untracked, unpaired], &ctx(&f));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ability_name, "Enpi (tick)");
    }
}
