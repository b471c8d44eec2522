//! Hangar Planner Engine
//!
//! Platform-agnostic core for the Hangar roster planner: stat formulas over an
//! arbitrary-magnitude number type, a deterministic battle simulator, crew assignment,
//! campaign star search, arena lineups and upgrade path analysis.
//! This crate has no UI or platform-specific dependencies.

pub mod assignment;
pub mod battle;
pub mod calculator;
pub mod config;
pub mod constants;
pub mod error;
pub mod formation;
pub mod model;
pub mod numbers;
pub mod optimizer;
pub mod request;
pub mod scoring;
pub mod storage;
pub mod upgrade;

// Re-export commonly used types
pub use battle::{BattleEngine, BattleResult, Fighter};
pub use config::{ConfigError, PlannerSettings};
pub use error::EngineError;
pub use model::{
    Account, ArtifactEntry, CombatStats, Difficulty, Hero, Machine, Mode, Rarity, RiftRank, Role,
    StatKind, StatLine, global_rarity_levels, max_crew_slots, owned_heroes, owned_machines,
};
pub use numbers::Decimal;
pub use optimizer::{
    ArenaReport, CampaignReport, MissionAttempt, MissionClear, OptimizeOutcome, Optimizer,
    SearchPhase, optimize,
};
pub use request::{
    ErrorPayload, OptimizeRequest, Response, RosterInput, UpgradeRequest, handle_json,
    handle_request, handle_upgrade_json, handle_upgrade_request,
};
pub use scoring::{HeroScoringWeights, StatWeights, hero_score};
pub use storage::{Planner, ProfileSnapshot, ProfileStorage};
pub use upgrade::{
    TargetMission, UpgradeAnalyzer, UpgradeKind, UpgradePath, UpgradeReport, UpgradeStep,
};
