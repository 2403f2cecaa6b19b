//! Combat job identities and role groupings.

use serde::{Deserialize, Serialize};

/// Combat jobs, PascalCase to match how the log service reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Job {
    Astrologian,
    Bard,
    BlackMage,
    Dancer,
    DarkKnight,
    Dragoon,
    Gunbreaker,
    Machinist,
    Monk,
    Ninja,
    Paladin,
    Pictomancer,
    Reaper,
    RedMage,
    Sage,
    Samurai,
    Scholar,
    Summoner,
    Viper,
    Warrior,
    WhiteMage,
}

/// Party role, used for card-buff strength and tincture selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Tank,
    Healer,
    Melee,
    PhysicalRanged,
    MagicalRanged,
}

/// Card-buff class: ranged cards give 6% to ranged jobs and 3% to melee
/// jobs, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardClass {
    Ranged,
    Melee,
}

impl Job {
    pub fn role(self) -> Role {
        use Job::*;
        match self {
            DarkKnight | Gunbreaker | Paladin | Warrior => Role::Tank,
            Astrologian | Sage | Scholar | WhiteMage => Role::Healer,
            Dragoon | Monk | Ninja | Reaper | Samurai | Viper => Role::Melee,
            Bard | Dancer | Machinist => Role::PhysicalRanged,
            BlackMage | Pictomancer | RedMage | Summoner => Role::MagicalRanged,
        }
    }

    /// Which card class buffs this job at full strength.
    pub fn card_class(self) -> CardClass {
        match self.role() {
            Role::Tank | Role::Melee => CardClass::Melee,
            Role::Healer | Role::PhysicalRanged | Role::MagicalRanged => CardClass::Ranged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tanks_take_melee_cards() {
        assert_eq!(Job::DarkKnight.card_class(), CardClass::Melee);
        assert_eq!(Job::Samurai.card_class(), CardClass::Melee);
    }

    #[test]
    fn casters_and_ranged_take_ranged_cards() {
        assert_eq!(Job::BlackMage.card_class(), CardClass::Ranged);
        assert_eq!(Job::Machinist.card_class(), CardClass::Ranged);
        assert_eq!(Job::WhiteMage.card_class(), CardClass::Ranged);
    }

    #[test]
    fn job_roundtrips_through_json() {
        let s = serde_json::to_string(&Job::DarkKnight).unwrap();
        assert_eq!(s, "\"DarkKnight\"");
        let j: Job = serde_json::from_str(&s).unwrap();
        assert_eq!(j, Job::DarkKnight);
    }
}
