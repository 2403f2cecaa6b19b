//! Shared data types for critline.
//!
//! Plain serde types exchanged between the analysis core, the CLI, and
//! external collaborators (event fetchers, the distribution engine,
//! reporting). No logic lives here beyond small accessors.

pub mod event;
pub mod job;
pub mod rotation;
pub mod tables;

pub use event::{EventKind, FightInfo, PhaseTransition, RawDamageEvent};
pub use job::{CardClass, Job, Role};
pub use rotation::{HitProbabilities, NormalizedAction, RotationRow};
pub use tables::{
    DamageBuff, DamageType, EncounterPhases, GuaranteedHitByAction, GuaranteedHitByBuff,
    PotencyRow, RateBuff, ReferenceTables,
};
