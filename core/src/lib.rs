//! critline analysis core.
//!
//! Turns a raw combat-log event stream for one player/fight into a
//! deduplicated rotation table (hit-type probabilities, buffs, potencies)
//! suitable for an external damage-distribution engine, plus utilities to
//! interpret the distributions that engine returns.
//!
//! The pipeline is strictly sequential per analysis:
//! fight/phase resolution -> event normalization -> job-specific
//! adjustment -> potency resolution. Independent analyses (e.g. all eight
//! party members) run in parallel over a rayon pool; the only shared state
//! is the immutable reference tables.

pub mod analysis;
pub mod buffs;
pub mod distribution;
pub mod error;
pub mod fight;
pub mod game_data;
pub mod jobs;
pub mod normalize;
pub mod rates;
pub mod rotation;
pub mod tables;

pub use analysis::{
    AnalysisRequest, NoProgress, PlayerAnalysis, PlayerStats, ProgressSink, analyze_party,
    analyze_player,
};
pub use buffs::{BuffWindows, SnapshotPolicy};
pub use distribution::Distribution;
pub use error::AnalysisError;
pub use fight::FightTimes;
pub use jobs::{JobAdjuster, JobContext, JobRegistry};
pub use rates::Rates;
pub use rotation::RotationResult;
pub use tables::ActiveTables;
