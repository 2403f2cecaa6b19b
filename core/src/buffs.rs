//! Buff uptime windows and damage-over-time snapshot grouping.
//!
//! Job adjusters reason about two time axes: which buffs were up when a
//! cast happened ([`BuffWindows`]), and which application a given dot tick
//! belongs to ([`assign_snapshot_groups`]). The latter matters because dot
//! damage snapshots its buffs at application time, so ticks inherit state
//! from the cast that applied them rather than from their own timestamp.

use critline_types::NormalizedAction;
use hashbrown::HashMap;

/// Per-buff active intervals in absolute report time (ms).
///
/// The sentinel interval `(-1, -1)` marks a buff known to the caller but
/// never active during this fight; it matches no timestamp.
#[derive(Debug, Clone, Default)]
pub struct BuffWindows {
    windows: HashMap<String, Vec<(i64, i64)>>,
}

impl BuffWindows {
    pub fn new(windows: HashMap<String, Vec<(i64, i64)>>) -> Self {
        Self { windows }
    }

    pub fn insert(&mut self, buff_id: impl Into<String>, intervals: Vec<(i64, i64)>) {
        self.windows.insert(buff_id.into(), intervals);
    }

    /// Whether `buff_id` was active at absolute time `t`.
    pub fn active_at(&self, buff_id: &str, t: i64) -> bool {
        self.windows
            .get(buff_id)
            .is_some_and(|spans| spans.iter().any(|&(start, end)| start <= t && t < end))
    }

    pub fn intervals(&self, buff_id: &str) -> &[(i64, i64)] {
        self.windows.get(buff_id).map_or(&[], Vec::as_slice)
    }
}

/// How far apart two ticks of the same dot may be before they are treated
/// as belonging to separate applications.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPolicy {
    /// Maximum gap between consecutive ticks of one application, seconds.
    pub max_tick_gap: f64,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        // Server ticks land every 3s; 10s absorbs jitter and short downtime
        // without merging distinct applications.
        Self { max_tick_gap: 10.0 }
    }
}

/// Assigns each index in `elapsed` (sorted ascending, seconds) a group id.
/// A new group starts whenever the gap to the previous tick exceeds the
/// policy's threshold.
pub fn assign_snapshot_groups(elapsed: &[f64], policy: SnapshotPolicy) -> Vec<usize> {
    let mut groups = Vec::with_capacity(elapsed.len());
    let mut group = 0usize;
    for (i, &t) in elapsed.iter().enumerate() {
        if i > 0 && t - elapsed[i - 1] > policy.max_tick_gap {
            group += 1;
        }
        groups.push(group);
    }
    groups
}

/// Snapshots a buff onto dot ticks: within each application group, if any
/// tick has the buff, every tick in that group gets it.
///
/// Returns the per-tick result, parallel to `elapsed`.
pub fn propagate_group_flag(
    elapsed: &[f64],
    has_buff: &[bool],
    policy: SnapshotPolicy,
) -> Vec<bool> {
    debug_assert_eq!(elapsed.len(), has_buff.len());
    let groups = assign_snapshot_groups(elapsed, policy);
    let mut group_any: HashMap<usize, bool> = HashMap::new();
    for (&g, &b) in groups.iter().zip(has_buff) {
        *group_any.entry(g).or_insert(false) |= b;
    }
    groups.iter().map(|g| group_any[g]).collect()
}

/// Fills in missing multipliers for a ground-effect ability.
///
/// Ground effects are cast by an invisible actor, so the log omits their
/// damage multiplier. For each tick with a missing multiplier, borrow the
/// multiplier of any other action carrying an identical buff set; when no
/// such action exists, fall back to the product of the individual buff
/// strengths from the damage-buff table.
pub fn estimate_ground_effect_multiplier(
    actions: &mut [NormalizedAction],
    ability_id: i64,
    buff_strength: impl Fn(&str) -> Option<f64>,
) {
    let mut by_buff_set: HashMap<Vec<String>, f64> = HashMap::new();
    for a in actions.iter() {
        if a.ability_id == ability_id {
            continue;
        }
        if let Some(m) = a.multiplier {
            let mut key = a.buffs.clone();
            key.sort_unstable();
            by_buff_set.entry(key).or_insert(m);
        }
    }

    for a in actions.iter_mut() {
        if a.ability_id != ability_id || a.multiplier.is_some() {
            continue;
        }
        let mut key = a.buffs.clone();
        key.sort_unstable();
        let estimated = by_buff_set.get(&key).copied().unwrap_or_else(|| {
            key.iter()
                .filter_map(|b| buff_strength(b))
                .product::<f64>()
        });
        a.multiplier = Some(estimated);
    }
}
