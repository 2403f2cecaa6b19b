//! critline - rotation table analysis from exported combat-log JSON.
//!
//! Reads a fight description, its damage events, and the reference
//! tables from JSON files, runs the analysis core for one player, and
//! prints the resolved rotation table.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use critline_core::{
    AnalysisRequest, BuffWindows, JobRegistry, PlayerStats, analyze_player,
};
use critline_types::{FightInfo, Job, RawDamageEvent, ReferenceTables, RotationRow};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Combat log rotation analysis")]
struct Cli {
    /// Fight metadata JSON (report start, fight bounds, phase transitions).
    #[arg(long)]
    fight: PathBuf,
    /// Damage events JSON array for the analyzed player and pets.
    #[arg(long)]
    events: PathBuf,
    /// Reference tables JSON (buffs, potencies, encounter phases).
    #[arg(long)]
    tables: PathBuf,
    /// Ability id -> name mapping JSON from the report's master data.
    #[arg(long)]
    names: PathBuf,
    /// Buff uptime windows JSON, buff id -> [[start, end], ...]. Optional.
    #[arg(long)]
    buffs: Option<PathBuf>,
    /// Job abbreviation or name, e.g. "Samurai".
    #[arg(long)]
    job: String,
    #[arg(long)]
    player_id: i64,
    /// Pet actor ids, repeatable.
    #[arg(long = "pet-id")]
    pet_ids: Vec<i64>,
    /// Critical hit stat.
    #[arg(long)]
    crit: u32,
    /// Direct hit stat.
    #[arg(long)]
    dh: u32,
    #[arg(long, default_value_t = 100)]
    level: u8,
    /// Main-stat gain of the consumed medication tier.
    #[arg(long, default_value_t = 0)]
    medication: i64,
    /// Phase to analyze; 0 means the whole fight.
    #[arg(long, default_value_t = 0)]
    phase: u8,
    /// Emit the rotation table as JSON instead of a text table.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    let fight: FightInfo = load_json(&cli.fight)?;
    let events: Vec<RawDamageEvent> = load_json(&cli.events)?;
    let tables: ReferenceTables = load_json(&cli.tables)?;
    let names: HashMap<i64, String> = load_json(&cli.names)?;
    let job: Job = serde_json::from_value(serde_json::Value::String(cli.job.clone()))
        .map_err(|_| format!("unknown job: {}", cli.job))?;

    let buff_windows = match &cli.buffs {
        Some(path) => {
            let raw: HashMap<String, Vec<(i64, i64)>> = load_json(path)?;
            BuffWindows::new(raw.into_iter().collect())
        }
        None => BuffWindows::default(),
    };

    let request = AnalysisRequest {
        fight,
        events,
        ability_names: names.into_iter().collect(),
        job,
        player_id: cli.player_id,
        pet_ids: cli.pet_ids,
        stats: PlayerStats {
            critical_hit: cli.crit,
            direct_hit: cli.dh,
            level: cli.level,
            medication_amount: cli.medication,
        },
        phase: cli.phase,
        buff_windows,
    };

    let registry = JobRegistry::with_defaults();
    let analysis = analyze_player(&request, &tables, &registry)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            "no analyzable damage in the requested window (missing phase or empty stream)"
                .to_owned()
        })?;

    if cli.json {
        let out = serde_json::to_string_pretty(&analysis.rotation.rows)
            .map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print_table(&analysis.rotation.rows);
        println!(
            "\n{} rows, {} hits, {:.1}s active time, patch {}",
            analysis.rotation.rows.len(),
            analysis.rotation.total_hits(),
            analysis.times.dps_time,
            analysis.times.patch,
        );
    }
    Ok(())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, String> {
    let data = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("{}: {e}", path.display()))
}

fn print_table(rows: &[RotationRow]) {
    let name_width = rows
        .iter()
        .map(|r| r.action_name.len())
        .max()
        .unwrap_or(6)
        .max(6);
    println!(
        "{:<name_width$}  {:>4}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}  {:>8}",
        "action", "n", "potency", "p_n", "p_c", "p_d", "p_cd", "mult"
    );
    for row in rows {
        println!(
            "{:<name_width$}  {:>4}  {:>7}  {:>6.4}  {:>6.4}  {:>6.4}  {:>6.4}  {:>8.4}",
            row.action_name, row.n, row.potency, row.p_n, row.p_c, row.p_d, row.p_cd,
            row.multiplier
        );
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
