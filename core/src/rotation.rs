//! Rotation table construction.
//!
//! Collapses the normalized action stream into statistically identical
//! rows: actions sharing a name, buff state, hit probabilities, damage
//! multiplier, and potency are one row with a count. Multi-target casts
//! are recognized through their shared packet id and snapped to the
//! ability's published falloff values so secondary hits dedupe with each
//! other rather than smearing into per-amount rows.

use critline_types::event::HIT_TYPE_CRIT;
use critline_types::{NormalizedAction, PotencyRow, RotationRow};
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::error::AnalysisError;
use crate::game_data::DIRECT_HIT_MULT;
use crate::tables::ActiveTables;

/// Maximum distance between an observed damage fraction and a published
/// falloff value before the match is treated as corrupt data.
pub const FALLOFF_TOLERANCE: f64 = 0.1;

/// The finished rotation table for one player and window.
#[derive(Debug, Clone)]
pub struct RotationResult {
    pub rows: Vec<RotationRow>,
}

impl RotationResult {
    /// Total hit count across all rows.
    pub fn total_hits(&self) -> u64 {
        self.rows.iter().map(|r| u64::from(r.n)).sum()
    }
}

/// Builds the rotation table from normalized (and job-adjusted) actions.
///
/// `excluded_targets` removes damage to actors that the encounter's
/// scoring ignores (e.g. Dark Crystals in P5_2) before grouping.
pub fn resolve(
    actions: &[NormalizedAction],
    tables: &ActiveTables,
    excluded_targets: &[i64],
) -> Result<RotationResult, AnalysisError> {
    let potencies = index_potencies(tables);

    let mut retained: Vec<&NormalizedAction> = actions
        .iter()
        .filter(|a| a.amount > 0 && !excluded_targets.contains(&a.target_id))
        .collect();
    retained.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.target_id.cmp(&b.target_id))
    });

    let fractions = falloff_fractions(&retained);

    let mut groups: HashMap<GroupKey, Group<'_>> = HashMap::new();
    let mut mismatched: HashSet<String> = HashSet::new();
    for (action, fraction) in retained.iter().zip(fractions) {
        let Some(candidates) = potencies.get(&action.ability_id) else {
            mismatched.insert(action.ability_name.clone());
            continue;
        };
        let falloff = snap_falloff(action, candidates, fraction)?;
        let key = GroupKey::new(action, falloff);
        groups
            .entry(key)
            .and_modify(|g| g.n += 1)
            .or_insert(Group { action, falloff, n: 1 });
    }

    if !mismatched.is_empty() {
        let mut actions: Vec<String> = mismatched.into_iter().collect();
        actions.sort();
        return Err(AnalysisError::RotationMismatch { actions });
    }

    let mut rows = Vec::with_capacity(groups.len());
    for group in groups.into_values() {
        rows.push(build_row(&group, &potencies)?);
    }
    rows.sort_by(|a, b| a.action_name.cmp(&b.action_name));
    Ok(RotationResult { rows })
}

/// Potency rows by ability id.
fn index_potencies(tables: &ActiveTables) -> HashMap<i64, Vec<&PotencyRow>> {
    let mut index: HashMap<i64, Vec<&PotencyRow>> = HashMap::new();
    for row in &tables.potencies {
        index.entry(row.ability_id).or_default().push(row);
    }
    index
}

/// Observed fraction of the primary hit's damage, per retained action.
///
/// Hits from one multi-target cast share a packet id; the largest
/// de-inflated amount in the packet group is the primary. Dot ticks and
/// packetless events are always primary.
fn falloff_fractions(actions: &[&NormalizedAction]) -> Vec<f64> {
    let mut packet_max: HashMap<i64, f64> = HashMap::new();
    for action in actions {
        if action.tick {
            continue;
        }
        if let Some(packet) = action.packet_id {
            let amount = base_amount(action);
            packet_max
                .entry(packet)
                .and_modify(|m| *m = m.max(amount))
                .or_insert(amount);
        }
    }

    actions
        .iter()
        .map(|action| match action.packet_id {
            Some(packet) if !action.tick => {
                let max = packet_max[&packet];
                if max > 0.0 { base_amount(action) / max } else { 1.0 }
            }
            _ => 1.0,
        })
        .collect()
}

/// Damage with hit-type inflation divided back out, so crit secondary
/// hits compare against non-crit primaries on equal footing.
fn base_amount(action: &NormalizedAction) -> f64 {
    let mut amount = action.amount as f64;
    if action.hit_type == HIT_TYPE_CRIT {
        amount /= action.crit_damage_multiplier;
    }
    if action.direct_hit {
        amount /= DIRECT_HIT_MULT;
    }
    amount
}

/// Snaps an observed damage fraction to the nearest published falloff
/// value. A fraction no candidate comes within [`FALLOFF_TOLERANCE`] of
/// indicates corrupt data and fails the analysis.
fn snap_falloff(
    action: &NormalizedAction,
    candidates: &[&PotencyRow],
    fraction: f64,
) -> Result<f64, AnalysisError> {
    let mut best: Option<(f64, f64)> = None;
    for row in candidates {
        for &falloff in &row.potency_falloff {
            let distance = (falloff - fraction).abs();
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, falloff));
            }
        }
    }
    match best {
        Some((distance, falloff)) if distance <= FALLOFF_TOLERANCE => Ok(falloff),
        _ => Err(AnalysisError::FalloffMatch {
            ability_id: action.ability_id,
            ability_name: action.ability_name.clone(),
            observed: fraction,
            tolerance: FALLOFF_TOLERANCE,
        }),
    }
}

/// Everything that must match for two hits to share a rotation row.
#[derive(PartialEq, Eq, Hash)]
struct GroupKey {
    action_name: String,
    multiplier: Option<u64>,
    probabilities: [u64; 4],
    main_stat_add: i64,
    falloff: u64,
    bonus_percent: Option<i64>,
}

impl GroupKey {
    fn new(action: &NormalizedAction, falloff: f64) -> Self {
        let p = &action.probabilities;
        Self {
            action_name: action.action_name.clone(),
            multiplier: action.multiplier.map(f64::to_bits),
            probabilities: [
                p.p_n.to_bits(),
                p.p_c.to_bits(),
                p.p_d.to_bits(),
                p.p_cd.to_bits(),
            ],
            main_stat_add: action.main_stat_add,
            falloff: falloff.to_bits(),
            bonus_percent: action.bonus_percent,
        }
    }
}

struct Group<'a> {
    action: &'a NormalizedAction,
    falloff: f64,
    n: u32,
}

fn build_row(
    group: &Group<'_>,
    potencies: &HashMap<i64, Vec<&PotencyRow>>,
) -> Result<RotationRow, AnalysisError> {
    let action = group.action;
    let Some(multiplier) = action.multiplier else {
        return Err(AnalysisError::MissingMultiplier {
            action_name: action.action_name.clone(),
            elapsed_time: action.elapsed_time,
        });
    };
    // resolve() already errored on abilities without potency rows.
    let candidates = &potencies[&action.ability_id];
    let (potency, suffix, damage_type) = resolve_potency(action, candidates);

    let final_potency = (f64::from(potency) * group.falloff).floor() as u32;
    debug_assert!(final_potency > 0, "zero potency for {}", action.action_name);

    let mut action_name = action.action_name.clone();
    if !suffix.is_empty() {
        action_name.push_str(suffix);
    }
    if group.falloff < 1.0 {
        action_name.push_str(&format!("_{}", group.falloff));
    }

    let p = &action.probabilities;
    Ok(RotationRow {
        action_name,
        base_action: action.ability_name.clone(),
        n: group.n,
        p_n: p.p_n,
        p_c: p.p_c,
        p_d: p.p_d,
        p_cd: p.p_cd,
        buffs: action.buffs.clone(),
        multiplier,
        crit_damage_multiplier: action.crit_damage_multiplier,
        main_stat_add: action.main_stat_add,
        potency: final_potency,
        damage_type,
    })
}

/// Picks the potency row for an action's buff state, then applies combo
/// and positional upgrades recorded through the event's bonus percent.
///
/// Rows naming a buff the action carries outrank buff-less base rows,
/// which outrank rows naming absent buffs.
fn resolve_potency(
    action: &NormalizedAction,
    candidates: &[&PotencyRow],
) -> (u32, &'static str, critline_types::DamageType) {
    let mut best: Option<(u8, &PotencyRow)> = None;
    for row in candidates {
        let priority = match &row.buff_id {
            Some(buff) if action.buffs.iter().any(|b| b == buff) => 2,
            None => 1,
            Some(_) => 0,
        };
        if best.is_none_or(|(p, _)| priority > p) {
            best = Some((priority, row));
        }
    }
    // candidates is non-empty by construction.
    let (_, row) = best.unwrap_or_else(|| unreachable!());

    if let (Some(bonus), Some(potency), Some(threshold)) = (
        action.bonus_percent,
        row.combo_positional_potency,
        row.combo_positional_bonus,
    ) && bonus == i64::from(threshold)
    {
        return (potency, "_combo_positional", row.damage_type);
    }
    if let (Some(bonus), Some(potency), Some(threshold)) =
        (action.bonus_percent, row.combo_potency, row.combo_bonus)
        && bonus == i64::from(threshold)
    {
        return (potency, "_combo", row.damage_type);
    }
    if let (Some(bonus), Some(potency), Some(threshold)) = (
        action.bonus_percent,
        row.positional_potency,
        row.positional_bonus,
    ) && bonus == i64::from(threshold)
    {
        return (potency, "_positional", row.damage_type);
    }
    if action.bonus_percent.is_some_and(|b| b > 0) {
        debug!(
            action = %action.action_name,
            bonus = ?action.bonus_percent,
            "bonus percent matched no combo or positional tier"
        );
    }
    (row.base_potency, "", row.damage_type)
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod rotation_tests;
