//! Centralized balance constants for the planner.
//!
//! These values have to match the live game's balance tables for the planner's
//! answers to line up with what players see in their own campaign, so they live in
//! code and change only through review.

// Progression growth -------------------------------------------------------
/// Every progression axis (level, blueprints, rarity, cards) compounds by this factor.
pub const BASE_GROWTH: f64 = 1.05;
pub const BLUEPRINT_CAP_BASE: u32 = 5;
pub const BLUEPRINT_CAP_STEP: u32 = 5;
pub const BLUEPRINT_CAP_LEVEL_INTERVAL: u32 = 5;

// Crew slots ---------------------------------------------------------------
/// `(minimum engineer level, crew slots)` from highest to lowest.
pub const CREW_SLOT_THRESHOLDS: [(u32, usize); 3] = [(60, 6), (30, 5), (0, 4)];

// Power score --------------------------------------------------------------
pub const POWER_DAMAGE_WEIGHT: f64 = 10.0;
pub const POWER_HEALTH_WEIGHT: f64 = 1.0;
pub const POWER_ARMOR_WEIGHT: f64 = 10.0;
pub const POWER_EXPONENT: f64 = 0.7;

// Enemy scaling ------------------------------------------------------------
pub const BASE_ENEMY_DAMAGE: f64 = 260.0;
pub const BASE_ENEMY_HEALTH: f64 = 1560.0;
pub const BASE_ENEMY_ARMOR: f64 = 30.0;
pub const ENEMY_MISSION_GROWTH: f64 = 1.2;
pub const ENEMY_MILESTONE_INTERVAL: u32 = 10;
pub const ENEMY_MILESTONE_BASE: f64 = 3.0;
/// Gentler milestone curve used only for the power gate.
pub const REQUIREMENT_MILESTONE_BASE: f64 = 2.0;
pub const ENEMY_TEAM_SIZE: usize = 5;

pub const DIFFICULTY_MULTIPLIER_EASY: f64 = 1.0;
pub const DIFFICULTY_MULTIPLIER_NORMAL: f64 = 360.0;
pub const DIFFICULTY_MULTIPLIER_HARD: f64 = 2_478_600.0;
pub const DIFFICULTY_MULTIPLIER_INSANE: f64 = 5.8e12;
pub const DIFFICULTY_MULTIPLIER_NIGHTMARE: f64 = 2.92e18;

// Required power -----------------------------------------------------------
pub const REQUIRED_POWER_EARLY_EASY_LAST_MISSION: u32 = 10;
pub const REQUIRED_POWER_MID_EASY_LAST_MISSION: u32 = 30;
pub const REQUIRED_POWER_EARLY_EASY_PERCENT: f64 = 0.3;
pub const REQUIRED_POWER_MID_EASY_PERCENT: f64 = 0.5;
pub const REQUIRED_POWER_DEFAULT_PERCENT: f64 = 0.8;
pub const REQUIRED_POWER_ROUNDING: f64 = 100.0;

// Arena --------------------------------------------------------------------
pub const SCARAB_BASE_LEVEL: i64 = 3;
pub const SCARAB_LEVELS_PER_STEP: i64 = 2;
pub const SCARAB_BONUS_PER_STEP: f64 = 0.002;
pub const SCARAB_BONUS_CAP: f64 = 1.0;

pub const RIFT_BONUS_SAPPHIRE: f64 = 0.01;
pub const RIFT_BONUS_EMERALD: f64 = 0.02;
pub const RIFT_BONUS_RUBY: f64 = 0.03;
pub const RIFT_BONUS_PLATINUM: f64 = 0.04;
pub const RIFT_BONUS_DIAMOND: f64 = 0.05;

// Artifacts ----------------------------------------------------------------
pub const ARTIFACT_TIERS: [u32; 8] = [30, 35, 40, 45, 50, 55, 60, 65];

// Abilities ----------------------------------------------------------------
pub const OVERDRIVE_BASE_CHANCE: f64 = 0.25;
pub const OVERDRIVE_CHANCE_PER_RARITY: f64 = 0.03;

// Battle -------------------------------------------------------------------
pub const DEFAULT_MAX_ROUNDS: u32 = 20;
/// Slot order used both for acting and for picking targets.
pub const ATTACK_ORDER: [usize; 5] = [0, 1, 2, 4, 3];
pub const FORMATION_SIZE: usize = 5;

// Optimizer defaults ---------------------------------------------------------
pub const DEFAULT_MAX_MISSION: u32 = 90;
pub const DEFAULT_REOPTIMIZE_INTERVAL: u32 = 5;
pub const DEFAULT_MONTE_CARLO_SIMULATIONS: u32 = 1;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;
pub const DEFAULT_LOCAL_SEARCH_ITERATIONS: u32 = 100;

// Upgrade analyzer -----------------------------------------------------------
pub const LEVEL_UPGRADE_COST: u32 = 2;
pub const BLUEPRINT_UPGRADE_COST: u32 = 1;
pub const DEFAULT_UPGRADE_TRIALS: u32 = 1;
pub const DEFAULT_UPGRADE_BUDGET: u32 = 12;
pub const MAX_UPGRADE_PATH_STEPS: u32 = 4;
pub const MAX_UPGRADE_MACHINES: usize = 2;

// Hero scoring defaults ------------------------------------------------------
pub const CAMPAIGN_TANK_WEIGHTS: [f64; 3] = [0.2, 1.0, 0.8];
pub const CAMPAIGN_DPS_WEIGHTS: [f64; 3] = [1.0, 0.3, 0.2];
pub const ARENA_TANK_WEIGHTS: [f64; 3] = [0.3, 1.0, 0.9];
pub const ARENA_DPS_WEIGHTS: [f64; 3] = [1.0, 0.5, 0.4];
