//! Cheapest progression increments that unblock the next mission.
//!
//! A level increment costs [`LEVEL_UPGRADE_COST`] points and a blueprint increment
//! [`BLUEPRINT_UPGRADE_COST`]. Candidates touch one or two machines with at most
//! [`MAX_UPGRADE_PATH_STEPS`] increments in total and are tried cheapest first.
use serde::{Deserialize, Serialize};

use crate::battle::BattleEngine;
use crate::calculator::{
    enemy_squad_power, enemy_stats, enemy_team, formation_power, max_blueprint_level,
    refresh_stats, required_power,
};
use crate::config::PlannerSettings;
use crate::constants::{
    BLUEPRINT_UPGRADE_COST, ENEMY_MILESTONE_BASE, LEVEL_UPGRADE_COST, MAX_UPGRADE_MACHINES,
    MAX_UPGRADE_PATH_STEPS,
};
use crate::error::EngineError;
use crate::formation::arrange;
use crate::model::{Account, Difficulty, Machine, Mode, StatKind};
use crate::numbers::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Level,
    Blueprint(StatKind),
}

impl UpgradeKind {
    pub const ALL: [Self; 4] = [
        Self::Level,
        Self::Blueprint(StatKind::Damage),
        Self::Blueprint(StatKind::Health),
        Self::Blueprint(StatKind::Armor),
    ];

    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Level => LEVEL_UPGRADE_COST,
            Self::Blueprint(_) => BLUEPRINT_UPGRADE_COST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeStep {
    pub machine_id: String,
    pub kind: UpgradeKind,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePath {
    pub steps: Vec<UpgradeStep>,
    pub cost: u32,
    /// Total increments across all steps.
    pub size: u32,
    pub squad_power: Decimal,
    pub rounds: u32,
}

/// The blocked mission upgrades are aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMission {
    pub mission: u32,
    pub difficulty: Difficulty,
    pub required_power: Decimal,
    pub enemy_power: Decimal,
    pub squad_power: Decimal,
    pub deficit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeReport {
    pub target: Option<TargetMission>,
    /// Every mission up to the search limit is already cleared.
    pub already_clearable: bool,
    pub paths: Vec<UpgradePath>,
}

/// Increments per kind, indexed like [`UpgradeKind::ALL`].
type Allocation = [u32; 4];

#[derive(Debug, Clone)]
struct Candidate {
    parts: Vec<(usize, Allocation)>,
    cost: u32,
    size: u32,
}

#[derive(Debug, Clone)]
pub struct UpgradeAnalyzer {
    account: Account,
    settings: PlannerSettings,
    engine: BattleEngine,
}

impl UpgradeAnalyzer {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `settings` fail validation.
    pub fn new(account: Account, settings: PlannerSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        let engine = BattleEngine::new(settings.max_rounds);
        Ok(Self {
            account,
            settings,
            engine,
        })
    }

    fn wins(
        &self,
        team: &[Machine],
        mission: u32,
        difficulty: Difficulty,
    ) -> Result<Option<u32>, EngineError> {
        if team.is_empty()
            || formation_power(team, Mode::Campaign) < required_power(mission, difficulty)
        {
            return Ok(None);
        }
        let formation = arrange(team, &enemy_stats(mission, difficulty));
        let enemy = enemy_team(mission, difficulty);
        for _ in 0..self.settings.upgrade_trials {
            let result = self.engine.run_formation(&formation, &enemy)?;
            if result.player_won {
                return Ok(Some(result.rounds));
            }
        }
        Ok(None)
    }

    /// First uncleared mission per difficulty, keeping the one with the smallest
    /// combined gap to its required power and its enemy squad power.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle engine rejects the formation.
    pub fn find_target(&self, formation: &[Machine]) -> Result<Option<TargetMission>, EngineError> {
        let squad_power = formation_power(formation, Mode::Campaign);
        let mut best: Option<TargetMission> = None;
        for difficulty in Difficulty::ALL {
            let mut blocked = None;
            for mission in 1..=self.settings.max_mission {
                if self.wins(formation, mission, difficulty)?.is_none() {
                    blocked = Some(mission);
                    break;
                }
            }
            let Some(mission) = blocked else {
                continue;
            };
            let required = required_power(mission, difficulty);
            let enemy_power = enemy_squad_power(mission, difficulty, ENEMY_MILESTONE_BASE);
            let deficit = (required - squad_power).max(Decimal::ZERO)
                + (enemy_power - squad_power).max(Decimal::ZERO);
            if best.as_ref().is_none_or(|current| deficit < current.deficit) {
                best = Some(TargetMission {
                    mission,
                    difficulty,
                    required_power: required,
                    enemy_power,
                    squad_power,
                    deficit,
                });
            }
        }
        Ok(best)
    }

    /// Cheapest path for each path size that turns the target mission into a win.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle engine rejects a formation.
    pub fn analyze(&self, formation: &[Machine]) -> Result<UpgradeReport, EngineError> {
        if formation.is_empty() {
            return Ok(UpgradeReport {
                target: None,
                already_clearable: false,
                paths: Vec::new(),
            });
        }
        let Some(target) = self.find_target(formation)? else {
            return Ok(UpgradeReport {
                target: None,
                already_clearable: true,
                paths: Vec::new(),
            });
        };

        let mut found: Vec<UpgradePath> = Vec::new();
        let candidates = self.candidates(formation);
        log::debug!(
            "upgrade search for mission {} {}: {} candidate(s)",
            target.mission,
            target.difficulty,
            candidates.len()
        );
        for candidate in candidates {
            if found.iter().any(|path| path.size == candidate.size) {
                continue;
            }
            let team = self.apply(formation, &candidate);
            if let Some(rounds) = self.wins(&team, target.mission, target.difficulty)? {
                found.push(UpgradePath {
                    steps: steps_for(formation, &candidate),
                    cost: candidate.cost,
                    size: candidate.size,
                    squad_power: formation_power(&team, Mode::Campaign),
                    rounds,
                });
                if found.len() == MAX_UPGRADE_PATH_STEPS as usize {
                    break;
                }
            }
        }
        found.sort_by_key(|path| (path.cost, path.size));
        log::info!(
            "upgrade search found {} path(s) for mission {} {}",
            found.len(),
            target.mission,
            target.difficulty
        );
        Ok(UpgradeReport {
            target: Some(target),
            already_clearable: false,
            paths: found,
        })
    }

    fn candidates(&self, formation: &[Machine]) -> Vec<Candidate> {
        let allocations = allocations(MAX_UPGRADE_PATH_STEPS);
        let budget = self.settings.upgrade_budget;
        let mut out = Vec::new();

        for (index, machine) in formation.iter().enumerate() {
            for allocation in &allocations {
                if fits(machine, allocation) {
                    out.push(Candidate::new(vec![(index, *allocation)]));
                }
            }
        }

        if MAX_UPGRADE_MACHINES >= 2 {
            let paired: Vec<&Allocation> = allocations
                .iter()
                .filter(|allocation| kinds_used(allocation) <= 2)
                .collect();
            for first in 0..formation.len() {
                for second in first + 1..formation.len() {
                    for a in &paired {
                        if !fits(&formation[first], a) {
                            continue;
                        }
                        for b in &paired {
                            if total(a) + total(b) > MAX_UPGRADE_PATH_STEPS
                                || !fits(&formation[second], b)
                            {
                                continue;
                            }
                            out.push(Candidate::new(vec![(first, **a), (second, **b)]));
                        }
                    }
                }
            }
        }

        out.retain(|candidate| candidate.cost <= budget);
        out.sort_by_key(|candidate| (candidate.cost, candidate.size, candidate.parts.len()));
        out
    }

    fn apply(&self, formation: &[Machine], candidate: &Candidate) -> Vec<Machine> {
        let mut team = formation.to_vec();
        for (index, allocation) in &candidate.parts {
            let machine = &mut team[*index];
            for (kind, amount) in UpgradeKind::ALL.iter().zip(allocation) {
                match kind {
                    UpgradeKind::Level => machine.level = machine.level.saturating_add(*amount),
                    UpgradeKind::Blueprint(stat) => {
                        let current = machine.blueprints.get_mut(*stat);
                        *current = current.saturating_add(*amount);
                    }
                }
            }
            refresh_stats(machine, &self.account);
        }
        team
    }
}

impl Candidate {
    fn new(parts: Vec<(usize, Allocation)>) -> Self {
        let cost = parts
            .iter()
            .map(|(_, allocation)| allocation_cost(allocation))
            .sum();
        let size = parts.iter().map(|(_, allocation)| total(allocation)).sum();
        Self { parts, cost, size }
    }
}

fn total(allocation: &Allocation) -> u32 {
    allocation.iter().sum()
}

fn kinds_used(allocation: &Allocation) -> usize {
    allocation.iter().filter(|amount| **amount > 0).count()
}

fn allocation_cost(allocation: &Allocation) -> u32 {
    UpgradeKind::ALL
        .iter()
        .zip(allocation)
        .map(|(kind, amount)| kind.cost() * amount)
        .sum()
}

/// Every non-empty allocation of at most `max_total` increments.
fn allocations(max_total: u32) -> Vec<Allocation> {
    let mut out = Vec::new();
    for level in 0..=max_total {
        for damage in 0..=max_total - level {
            for health in 0..=max_total - level - damage {
                for armor in 0..=max_total - level - damage - health {
                    let allocation = [level, damage, health, armor];
                    if total(&allocation) > 0 {
                        out.push(allocation);
                    }
                }
            }
        }
    }
    out
}

/// Blueprint increments must stay within the cap of the machine's projected level.
fn fits(machine: &Machine, allocation: &Allocation) -> bool {
    let cap = max_blueprint_level(machine.level.saturating_add(allocation[0]));
    StatKind::ALL
        .iter()
        .zip(&allocation[1..])
        .all(|(&stat, amount)| machine.blueprints.get(stat).saturating_add(*amount) <= cap)
}

fn steps_for(formation: &[Machine], candidate: &Candidate) -> Vec<UpgradeStep> {
    candidate
        .parts
        .iter()
        .flat_map(|(index, allocation)| {
            let machine_id = formation[*index].id.clone();
            UpgradeKind::ALL
                .into_iter()
                .zip(*allocation)
                .filter(|(_, amount)| *amount > 0)
                .map(move |(kind, amount)| UpgradeStep {
                    machine_id: machine_id.clone(),
                    kind,
                    amount,
                })
        })
        .collect()
}
