//! Hero scoring: how much a hero is worth on a given machine.
//!
//! A hero's raw gain is `percentage × current stat`, which for late-game machines is
//! far beyond `f64`. Each gain is compressed with `log10(1 + gain)` before weighting,
//! which keeps scores finite and still strictly increasing in every percentage.
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::{
    ARENA_DPS_WEIGHTS, ARENA_TANK_WEIGHTS, CAMPAIGN_DPS_WEIGHTS, CAMPAIGN_TANK_WEIGHTS,
};
use crate::model::{CombatStats, Hero, Mode, Role, StatKind};
use crate::numbers::{Decimal, finite_or_zero};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatWeights {
    pub damage: f64,
    pub health: f64,
    pub armor: f64,
}

impl StatWeights {
    #[must_use]
    pub const fn from_array(values: [f64; 3]) -> Self {
        Self {
            damage: values[0],
            health: values[1],
            armor: values[2],
        }
    }

    #[must_use]
    pub const fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Damage => self.damage,
            StatKind::Health => self.health,
            StatKind::Armor => self.armor,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        for kind in StatKind::ALL {
            let value = self.get(kind);
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { field, stat: kind });
            }
            if value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// User-tunable weight table, injected into every optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroScoringWeights {
    #[serde(default = "HeroScoringWeights::default_campaign_tank")]
    pub campaign_tank: StatWeights,
    #[serde(default = "HeroScoringWeights::default_campaign_dps")]
    pub campaign_dps: StatWeights,
    #[serde(default = "HeroScoringWeights::default_arena_tank")]
    pub arena_tank: StatWeights,
    #[serde(default = "HeroScoringWeights::default_arena_dps")]
    pub arena_dps: StatWeights,
}

impl HeroScoringWeights {
    const fn default_campaign_tank() -> StatWeights {
        StatWeights::from_array(CAMPAIGN_TANK_WEIGHTS)
    }

    const fn default_campaign_dps() -> StatWeights {
        StatWeights::from_array(CAMPAIGN_DPS_WEIGHTS)
    }

    const fn default_arena_tank() -> StatWeights {
        StatWeights::from_array(ARENA_TANK_WEIGHTS)
    }

    const fn default_arena_dps() -> StatWeights {
        StatWeights::from_array(ARENA_DPS_WEIGHTS)
    }

    #[must_use]
    pub const fn weights_for(&self, mode: Mode, role: Role) -> StatWeights {
        match (mode, role.is_tank()) {
            (Mode::Campaign, true) => self.campaign_tank,
            (Mode::Campaign, false) => self.campaign_dps,
            (Mode::Arena, true) => self.arena_tank,
            (Mode::Arena, false) => self.arena_dps,
        }
    }

    /// # Errors
    ///
    /// Returns an error if any weight is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.campaign_tank.validate("heroWeights.campaignTank")?;
        self.campaign_dps.validate("heroWeights.campaignDps")?;
        self.arena_tank.validate("heroWeights.arenaTank")?;
        self.arena_dps.validate("heroWeights.arenaDps")
    }
}

impl Default for HeroScoringWeights {
    fn default() -> Self {
        Self {
            campaign_tank: Self::default_campaign_tank(),
            campaign_dps: Self::default_campaign_dps(),
            arena_tank: Self::default_arena_tank(),
            arena_dps: Self::default_arena_dps(),
        }
    }
}

/// Score `hero` on a machine with `role` whose current stats are `stats`.
/// Zero for heroes that add nothing.
#[must_use]
pub fn hero_score(
    hero: &Hero,
    role: Role,
    stats: &CombatStats,
    mode: Mode,
    weights: &HeroScoringWeights,
) -> f64 {
    let weights = weights.weights_for(mode, role);
    let score: f64 = StatKind::ALL
        .iter()
        .filter_map(|&kind| {
            let pct = hero.percentages.get(kind);
            (pct > 0).then(|| {
                let gain = stats.get(kind) * Decimal::from(f64::from(pct) / 100.0);
                let compressed = if gain.is_positive() {
                    (gain + Decimal::ONE).log10()
                } else {
                    0.0
                };
                weights.get(kind) * compressed
            })
        })
        .sum();
    if !score.is_finite() {
        log::warn!("hero {} produced a non-finite score; treating as 0", hero.id);
    }
    finite_or_zero(score).max(0.0)
}
