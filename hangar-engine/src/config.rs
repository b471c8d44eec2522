//! Planner tuning knobs with serde defaults and validation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_LOCAL_SEARCH_ITERATIONS, DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_MAX_MISSION,
    DEFAULT_MAX_ROUNDS, DEFAULT_MONTE_CARLO_SIMULATIONS, DEFAULT_REOPTIMIZE_INTERVAL,
    DEFAULT_UPGRADE_BUDGET, DEFAULT_UPGRADE_TRIALS,
};
use crate::model::StatKind;
use crate::scoring::HeroScoringWeights;

/// Errors raised when planner configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} has a non-finite {stat} weight")]
    NonFiniteWeight {
        field: &'static str,
        stat: StatKind,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerSettings {
    #[serde(default = "PlannerSettings::default_max_mission")]
    pub max_mission: u32,
    #[serde(default = "PlannerSettings::default_max_rounds")]
    pub max_rounds: u32,
    /// The campaign sweep rebuilds its team every this many missions.
    #[serde(default = "PlannerSettings::default_reoptimize_interval")]
    pub reoptimize_interval: u32,
    /// Battle attempts per mission in the push phase.
    #[serde(default = "PlannerSettings::default_monte_carlo_simulations")]
    pub monte_carlo_simulations: u32,
    #[serde(default = "PlannerSettings::default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "PlannerSettings::default_local_search_iterations")]
    pub local_search_iterations: u32,
    #[serde(default = "PlannerSettings::default_upgrade_trials")]
    pub upgrade_trials: u32,
    /// Largest upgrade cost, in points, the analyzer will consider.
    #[serde(default = "PlannerSettings::default_upgrade_budget")]
    pub upgrade_budget: u32,
    #[serde(default)]
    pub hero_weights: HeroScoringWeights,
}

impl PlannerSettings {
    const fn default_max_mission() -> u32 {
        DEFAULT_MAX_MISSION
    }

    const fn default_max_rounds() -> u32 {
        DEFAULT_MAX_ROUNDS
    }

    const fn default_reoptimize_interval() -> u32 {
        DEFAULT_REOPTIMIZE_INTERVAL
    }

    const fn default_monte_carlo_simulations() -> u32 {
        DEFAULT_MONTE_CARLO_SIMULATIONS
    }

    const fn default_max_consecutive_failures() -> u32 {
        DEFAULT_MAX_CONSECUTIVE_FAILURES
    }

    const fn default_local_search_iterations() -> u32 {
        DEFAULT_LOCAL_SEARCH_ITERATIONS
    }

    const fn default_upgrade_trials() -> u32 {
        DEFAULT_UPGRADE_TRIALS
    }

    const fn default_upgrade_budget() -> u32 {
        DEFAULT_UPGRADE_BUDGET
    }

    /// # Errors
    ///
    /// Returns an error if a knob is outside its usable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let at_least_one = [
            ("settings.maxMission", self.max_mission),
            ("settings.maxRounds", self.max_rounds),
            ("settings.reoptimizeInterval", self.reoptimize_interval),
            ("settings.monteCarloSimulations", self.monte_carlo_simulations),
            ("settings.maxConsecutiveFailures", self.max_consecutive_failures),
            ("settings.upgradeTrials", self.upgrade_trials),
        ];
        for (field, value) in at_least_one {
            if value == 0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1.0,
                    value: 0.0,
                });
            }
        }
        if self.max_rounds > 1_000 {
            return Err(ConfigError::RangeViolation {
                field: "settings.maxRounds",
                min: 1.0,
                max: 1_000.0,
                value: f64::from(self.max_rounds),
            });
        }
        if self.upgrade_budget > 64 {
            return Err(ConfigError::RangeViolation {
                field: "settings.upgradeBudget",
                min: 0.0,
                max: 64.0,
                value: f64::from(self.upgrade_budget),
            });
        }
        self.hero_weights.validate()
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_mission: Self::default_max_mission(),
            max_rounds: Self::default_max_rounds(),
            reoptimize_interval: Self::default_reoptimize_interval(),
            monte_carlo_simulations: Self::default_monte_carlo_simulations(),
            max_consecutive_failures: Self::default_max_consecutive_failures(),
            local_search_iterations: Self::default_local_search_iterations(),
            upgrade_trials: Self::default_upgrade_trials(),
            upgrade_budget: Self::default_upgrade_budget(),
            hero_weights: HeroScoringWeights::default(),
        }
    }
}
