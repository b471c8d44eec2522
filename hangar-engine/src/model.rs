//! Roster data: machines, heroes, artifacts and the account-wide modifiers.
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::calculator::max_blueprint_level;
use crate::constants::{
    CREW_SLOT_THRESHOLDS, DIFFICULTY_MULTIPLIER_EASY, DIFFICULTY_MULTIPLIER_HARD,
    DIFFICULTY_MULTIPLIER_INSANE, DIFFICULTY_MULTIPLIER_NIGHTMARE, DIFFICULTY_MULTIPLIER_NORMAL,
    RIFT_BONUS_DIAMOND, RIFT_BONUS_EMERALD, RIFT_BONUS_PLATINUM, RIFT_BONUS_RUBY,
    RIFT_BONUS_SAPPHIRE,
};
use crate::numbers::Decimal;

/// Crew list storage; six is the largest slot count any engineer level grants.
pub type Crew = SmallVec<[Hero; 6]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Titan,
    Angel,
    Celestial,
}

impl Rarity {
    pub const ALL: [Self; 9] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::Mythic,
        Self::Titan,
        Self::Angel,
        Self::Celestial,
    ];

    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::Common => 0,
            Self::Uncommon => 1,
            Self::Rare => 2,
            Self::Epic => 3,
            Self::Legendary => 4,
            Self::Mythic => 5,
            Self::Titan => 6,
            Self::Angel => 7,
            Self::Celestial => 8,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Mythic => "mythic",
            Self::Titan => "titan",
            Self::Angel => "angel",
            Self::Celestial => "celestial",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rarity| rarity.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Combat role. Only the tank/non-tank split matters to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    #[default]
    #[serde(alias = "damage")]
    Dps,
    Support,
}

impl Role {
    #[must_use]
    pub const fn is_tank(self) -> bool {
        matches!(self, Self::Tank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Damage,
    Health,
    Armor,
}

impl StatKind {
    pub const ALL: [Self; 3] = [Self::Damage, Self::Health, Self::Armor];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Damage => "damage",
            Self::Health => "health",
            Self::Armor => "armor",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine<T> {
    pub damage: T,
    pub health: T,
    pub armor: T,
}

impl<T: Copy> StatLine<T> {
    pub const fn new(damage: T, health: T, armor: T) -> Self {
        Self {
            damage,
            health,
            armor,
        }
    }

    pub fn get(&self, kind: StatKind) -> T {
        match kind {
            StatKind::Damage => self.damage,
            StatKind::Health => self.health,
            StatKind::Armor => self.armor,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut T {
        match kind {
            StatKind::Damage => &mut self.damage,
            StatKind::Health => &mut self.health,
            StatKind::Armor => &mut self.armor,
        }
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(StatKind, T) -> U) -> StatLine<U> {
        StatLine {
            damage: f(StatKind::Damage, self.damage),
            health: f(StatKind::Health, self.health),
            armor: f(StatKind::Armor, self.armor),
        }
    }
}

/// Derived stats used in combat. `max_health` mirrors `health` until a battle starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStats {
    pub damage: Decimal,
    pub health: Decimal,
    pub armor: Decimal,
    pub max_health: Decimal,
}

impl CombatStats {
    #[must_use]
    pub fn from_line(line: StatLine<Decimal>) -> Self {
        Self {
            damage: line.damage,
            health: line.health,
            armor: line.armor,
            max_health: line.health,
        }
    }

    #[must_use]
    pub const fn get(&self, kind: StatKind) -> Decimal {
        match kind {
            StatKind::Damage => self.damage,
            StatKind::Health => self.health,
            StatKind::Armor => self.armor,
        }
    }
}

/// Which stat block a computation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Campaign,
    Arena,
}

impl Mode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Arena => "arena",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign difficulty, declared in sweep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Insane,
    Nightmare,
}

impl Difficulty {
    pub const ALL: [Self; 5] = [
        Self::Easy,
        Self::Normal,
        Self::Hard,
        Self::Insane,
        Self::Nightmare,
    ];

    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Easy => DIFFICULTY_MULTIPLIER_EASY,
            Self::Normal => DIFFICULTY_MULTIPLIER_NORMAL,
            Self::Hard => DIFFICULTY_MULTIPLIER_HARD,
            Self::Insane => DIFFICULTY_MULTIPLIER_INSANE,
            Self::Nightmare => DIFFICULTY_MULTIPLIER_NIGHTMARE,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Insane => "insane",
            Self::Nightmare => "nightmare",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiftRank {
    #[default]
    #[serde(rename = "")]
    Unranked,
    Bronze,
    Silver,
    Gold,
    Pearl,
    Sapphire,
    Emerald,
    Ruby,
    Platinum,
    Diamond,
}

impl RiftRank {
    #[must_use]
    pub const fn bonus(self) -> f64 {
        match self {
            Self::Unranked | Self::Bronze | Self::Silver | Self::Gold | Self::Pearl => 0.0,
            Self::Sapphire => RIFT_BONUS_SAPPHIRE,
            Self::Emerald => RIFT_BONUS_EMERALD,
            Self::Ruby => RIFT_BONUS_RUBY,
            Self::Platinum => RIFT_BONUS_PLATINUM,
            Self::Diamond => RIFT_BONUS_DIAMOND,
        }
    }
}

/// Artifact stacks for one stat: percentage tier to quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub stat: StatKind,
    #[serde(default)]
    pub values: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Display only.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub percentages: StatLine<i32>,
}

impl Hero {
    #[must_use]
    pub fn new(id: impl Into<String>, percentages: StatLine<i32>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            role: String::new(),
            percentages,
        }
    }

    /// A hero that grants nothing never takes a crew slot.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        StatKind::ALL
            .iter()
            .all(|&kind| self.percentages.get(kind) <= 0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub base_stats: StatLine<Decimal>,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, deserialize_with = "non_negative")]
    pub level: u32,
    #[serde(default, deserialize_with = "non_negative_line")]
    pub blueprints: StatLine<u32>,
    #[serde(default, deserialize_with = "non_negative")]
    pub inscription_level: u32,
    #[serde(default, deserialize_with = "non_negative")]
    pub sacred_level: u32,
    #[serde(default)]
    pub crew: Crew,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battle_stats: Option<CombatStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arena_stats: Option<CombatStats>,
}

fn clamp_level(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Progression counters arrive as signed numbers; negatives read as 0.
fn non_negative<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    i64::deserialize(deserializer).map(clamp_level)
}

fn non_negative_line<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<StatLine<u32>, D::Error> {
    let line = StatLine::<i64>::deserialize(deserializer)?;
    Ok(line.map(|_, value| clamp_level(value)))
}

impl Machine {
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role, base_stats: StatLine<Decimal>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            role,
            base_stats,
            ..Self::default()
        }
    }

    /// Stats for the given mode, if they have been computed.
    #[must_use]
    pub const fn stats(&self, mode: Mode) -> Option<&CombatStats> {
        match mode {
            Mode::Campaign => self.battle_stats.as_ref(),
            Mode::Arena => self.arena_stats.as_ref(),
        }
    }

    /// Whether the player has invested anything into this machine.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.level > 0
            || self.rarity != Rarity::Common
            || self.inscription_level > 0
            || self.sacred_level > 0
            || StatKind::ALL
                .iter()
                .any(|&kind| self.blueprints.get(kind) > 0)
    }

    /// Clamp blueprint levels to the cap their machine level allows.
    /// Returns `true` when anything changed.
    pub fn sanitize(&mut self) -> bool {
        let cap = max_blueprint_level(self.level);
        let mut changed = false;
        for kind in StatKind::ALL {
            let level = self.blueprints.get_mut(kind);
            if *level > cap {
                log::warn!(
                    "machine {} {kind} blueprint {} exceeds cap {cap}; clamping",
                    self.id,
                    *level
                );
                *level = cap;
                changed = true;
            }
        }
        changed
    }

    pub fn crew_ids(&self) -> impl Iterator<Item = &str> {
        self.crew.iter().map(|hero| hero.id.as_str())
    }
}

/// Account-wide modifiers shared by every machine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub engineer_level: u32,
    pub scarab_level: u32,
    pub rift_rank: RiftRank,
    pub global_rarity_levels: u32,
    pub artifacts: Vec<ArtifactEntry>,
}

impl Account {
    #[must_use]
    pub fn max_crew_slots(&self) -> usize {
        max_crew_slots(self.engineer_level)
    }
}

#[must_use]
pub fn max_crew_slots(engineer_level: u32) -> usize {
    CREW_SLOT_THRESHOLDS
        .iter()
        .find(|(threshold, _)| engineer_level >= *threshold)
        .map_or(CREW_SLOT_THRESHOLDS[CREW_SLOT_THRESHOLDS.len() - 1].1, |(_, slots)| *slots)
}

#[must_use]
pub fn owned_machines(machines: &[Machine]) -> Vec<Machine> {
    machines.iter().filter(|m| m.is_owned()).cloned().collect()
}

#[must_use]
pub fn owned_heroes(heroes: &[Hero]) -> Vec<Hero> {
    heroes.iter().filter(|h| !h.is_inert()).cloned().collect()
}

/// Sum of rarity ordinals across the roster.
#[must_use]
pub fn global_rarity_levels(machines: &[Machine]) -> u32 {
    machines.iter().map(|m| m.rarity.ordinal()).sum()
}
