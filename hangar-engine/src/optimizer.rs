//! Team building and campaign search.
//!
//! An [`Optimizer`] owns a sanitized copy of one roster snapshot. Callers' machines and
//! heroes are never modified; every report carries fresh machine records.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::assignment::{assign_crews, refine_by_swaps};
use crate::battle::BattleEngine;
use crate::calculator::{enemy_stats, enemy_team, formation_power, refresh_stats, required_power};
use crate::config::PlannerSettings;
use crate::error::EngineError;
use crate::formation::{arrange, best_five};
use crate::model::{Account, Difficulty, Hero, Machine, Mode};
use crate::numbers::Decimal;

/// Outcome of trying one mission at one difficulty.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionAttempt {
    /// Squad power is below the entry requirement; no battle was fought.
    Underpowered { squad_power: Decimal, required: Decimal },
    Lost { rounds: u32 },
    Won { formation: Vec<Machine>, rounds: u32 },
}

impl MissionAttempt {
    #[must_use]
    pub const fn is_won(&self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPhase {
    Sweep,
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionClear {
    pub mission: u32,
    pub difficulty: Difficulty,
    pub phase: SearchPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignReport {
    pub total_stars: u32,
    pub last_cleared: BTreeMap<Difficulty, Option<u32>>,
    pub formation: Vec<Machine>,
    pub battle_power: Decimal,
    pub arena_power: Decimal,
    #[serde(default)]
    pub clears: Vec<MissionClear>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaReport {
    pub formation: Vec<Machine>,
    pub arena_power: Decimal,
    pub battle_power: Decimal,
}

#[derive(Debug, Clone)]
pub struct Optimizer {
    machines: Vec<Machine>,
    heroes: Vec<Hero>,
    account: Account,
    settings: PlannerSettings,
    max_slots: usize,
    engine: BattleEngine,
}

impl Optimizer {
    /// Snapshot a roster. Crews on the input machines are discarded, blueprint levels are
    /// clamped, heroes that grant nothing and repeated hero ids are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `settings` fail validation.
    pub fn new(
        machines: &[Machine],
        heroes: &[Hero],
        account: Account,
        settings: PlannerSettings,
    ) -> Result<Self, EngineError> {
        settings.validate()?;

        let machines = machines
            .iter()
            .map(|machine| {
                let mut copy = machine.clone();
                copy.sanitize();
                copy.crew.clear();
                refresh_stats(&mut copy, &account);
                copy
            })
            .collect();

        let mut seen = HashSet::new();
        let heroes = heroes
            .iter()
            .filter(|hero| !hero.is_inert())
            .filter(|hero| {
                let fresh = seen.insert(hero.id.clone());
                if !fresh {
                    log::warn!("hero {} listed more than once; keeping the first", hero.id);
                }
                fresh
            })
            .cloned()
            .collect();

        let max_slots = account.max_crew_slots();
        let engine = BattleEngine::new(settings.max_rounds);
        Ok(Self {
            machines,
            heroes,
            account,
            settings,
            max_slots,
            engine,
        })
    }

    #[must_use]
    pub const fn max_slots(&self) -> usize {
        self.max_slots
    }

    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    #[must_use]
    pub const fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    #[must_use]
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    #[must_use]
    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    /// Best five machines under `mode`, crewed and refined. Not yet arranged.
    #[must_use]
    pub fn build_team(&self, mode: Mode) -> Vec<Machine> {
        let mut team = best_five(&self.machines, mode);
        let placed = self.assign_crews(&mut team, mode);
        let swaps = refine_by_swaps(
            &mut team,
            &self.account,
            mode,
            self.settings.local_search_iterations,
        );
        log::debug!(
            "built {mode} team of {} with {placed} hero(es) placed, {swaps} swap(s)",
            team.len()
        );
        team
    }

    /// Replace the crews of `team` with the best assignment of this roster's heroes.
    pub fn assign_crews(&self, team: &mut [Machine], mode: Mode) -> usize {
        assign_crews(
            team,
            &self.heroes,
            &self.account,
            mode,
            &self.settings.hero_weights,
            self.max_slots,
        )
    }

    /// Arrange `team` against the enemy of one mission.
    #[must_use]
    pub fn arrange_for(
        &self,
        team: &[Machine],
        mission: u32,
        difficulty: Difficulty,
    ) -> Vec<Machine> {
        arrange(team, &enemy_stats(mission, difficulty))
    }

    /// Check the power gate, then fight one battle.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle engine rejects the team.
    pub fn attempt_mission(
        &self,
        team: &[Machine],
        mission: u32,
        difficulty: Difficulty,
    ) -> Result<MissionAttempt, EngineError> {
        let squad_power = formation_power(team, Mode::Campaign);
        let required = required_power(mission, difficulty);
        if team.is_empty() || squad_power < required {
            return Ok(MissionAttempt::Underpowered {
                squad_power,
                required,
            });
        }
        let formation = self.arrange_for(team, mission, difficulty);
        let result = self
            .engine
            .run_formation(&formation, &enemy_team(mission, difficulty))?;
        Ok(if result.player_won {
            MissionAttempt::Won {
                formation,
                rounds: result.rounds,
            }
        } else {
            MissionAttempt::Lost {
                rounds: result.rounds,
            }
        })
    }

    /// Repeat [`Self::attempt_mission`] up to `trials` times, accepting the first win and
    /// giving up after `max_consecutive_failures` losses in a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle engine rejects the team.
    pub fn attempt_with_trials(
        &self,
        team: &[Machine],
        mission: u32,
        difficulty: Difficulty,
        trials: u32,
    ) -> Result<MissionAttempt, EngineError> {
        let mut failures = 0;
        let mut last = self.attempt_mission(team, mission, difficulty)?;
        for _ in 1..trials.max(1) {
            match last {
                MissionAttempt::Lost { .. } => {
                    failures += 1;
                    if failures >= self.settings.max_consecutive_failures {
                        break;
                    }
                }
                MissionAttempt::Underpowered { .. } | MissionAttempt::Won { .. } => break,
            }
            last = self.attempt_mission(team, mission, difficulty)?;
        }
        Ok(last)
    }

    /// Build the campaign team and try a single mission with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle engine rejects the team.
    pub fn optimize_for_mission(
        &self,
        mission: u32,
        difficulty: Difficulty,
    ) -> Result<MissionAttempt, EngineError> {
        let team = self.build_team(Mode::Campaign);
        self.attempt_with_trials(&team, mission, difficulty, self.settings.monte_carlo_simulations)
    }

    /// Count how many stars the roster can earn.
    ///
    /// A deterministic sweep walks missions in order and every difficulty within a mission
    /// until one is out of reach; it stops at the first mission after the first that yields
    /// nothing. A push phase then continues each difficulty on its own from its last clear.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle engine rejects a team.
    pub fn optimize_campaign_max_stars(&self) -> Result<CampaignReport, EngineError> {
        let mut search = CampaignSearch::default();
        let mut team = Vec::new();
        let interval = self.settings.reoptimize_interval;

        for mission in 1..=self.settings.max_mission {
            if mission == 1 || (mission - 1) % interval == 0 {
                team = self.build_team(Mode::Campaign);
            }
            let mut cleared = 0;
            for difficulty in Difficulty::ALL {
                match self.attempt_mission(&team, mission, difficulty)? {
                    MissionAttempt::Underpowered {
                        squad_power,
                        required,
                    } => {
                        log::debug!(
                            "mission {mission} {difficulty}: squad {squad_power} \
                             below required {required}"
                        );
                        break;
                    }
                    MissionAttempt::Lost { rounds } => {
                        log::debug!("mission {mission} {difficulty}: lost after {rounds} round(s)");
                        break;
                    }
                    MissionAttempt::Won { formation, rounds } => {
                        log::debug!("mission {mission} {difficulty}: won in {rounds} round(s)");
                        search.record(mission, difficulty, SearchPhase::Sweep, formation);
                        cleared += 1;
                    }
                }
            }
            if cleared == 0 && mission > 1 {
                log::debug!("campaign sweep plateaued at mission {mission}");
                break;
            }
        }

        self.push_phase(&team, &mut search)?;

        let report = search.into_report();
        log::info!(
            "campaign search: {} star(s), battle power {}",
            report.total_stars,
            report.battle_power
        );
        Ok(report)
    }

    fn push_phase(&self, team: &[Machine], search: &mut CampaignSearch) -> Result<(), EngineError> {
        for difficulty in Difficulty::ALL {
            let start = search
                .last_cleared(difficulty)
                .map_or(1, |mission| mission + 1);
            for mission in start..=self.settings.max_mission {
                let attempt = self.attempt_with_trials(
                    team,
                    mission,
                    difficulty,
                    self.settings.monte_carlo_simulations,
                )?;
                let MissionAttempt::Won { formation, .. } = attempt else {
                    log::debug!("push phase: {difficulty} stops at mission {mission}");
                    break;
                };
                search.record(mission, difficulty, SearchPhase::Push, formation);
            }
        }
        Ok(())
    }

    /// Strongest arena lineup. Arena has no real opponent, so slot order uses the
    /// mission 1 easy enemy as a reference shape.
    #[must_use]
    pub fn optimize_for_arena(&self) -> ArenaReport {
        let team = self.build_team(Mode::Arena);
        let formation = arrange(&team, &enemy_stats(1, Difficulty::Easy));
        let report = ArenaReport {
            arena_power: formation_power(&formation, Mode::Arena),
            battle_power: formation_power(&formation, Mode::Campaign),
            formation,
        };
        log::info!("arena search: arena power {}", report.arena_power);
        report
    }
}

#[derive(Debug, Default)]
struct CampaignSearch {
    total_stars: u32,
    last_cleared: BTreeMap<Difficulty, u32>,
    formation: Vec<Machine>,
    clears: Vec<MissionClear>,
}

impl CampaignSearch {
    fn record(
        &mut self,
        mission: u32,
        difficulty: Difficulty,
        phase: SearchPhase,
        formation: Vec<Machine>,
    ) {
        self.total_stars += 1;
        self.last_cleared.insert(difficulty, mission);
        self.formation = formation;
        self.clears.push(MissionClear {
            mission,
            difficulty,
            phase,
        });
    }

    fn last_cleared(&self, difficulty: Difficulty) -> Option<u32> {
        self.last_cleared.get(&difficulty).copied()
    }

    fn into_report(self) -> CampaignReport {
        let last_cleared = Difficulty::ALL
            .into_iter()
            .map(|difficulty| (difficulty, self.last_cleared.get(&difficulty).copied()))
            .collect();
        CampaignReport {
            total_stars: self.total_stars,
            last_cleared,
            battle_power: formation_power(&self.formation, Mode::Campaign),
            arena_power: formation_power(&self.formation, Mode::Arena),
            formation: self.formation,
            clears: self.clears,
        }
    }
}

/// Run the search for `mode` over one roster snapshot.
///
/// # Errors
///
/// Returns an error if the settings are invalid or a battle cannot be simulated.
pub fn optimize(
    mode: Mode,
    machines: &[Machine],
    heroes: &[Hero],
    account: Account,
    settings: PlannerSettings,
) -> Result<OptimizeOutcome, EngineError> {
    let optimizer = Optimizer::new(machines, heroes, account, settings)?;
    Ok(match mode {
        Mode::Campaign => OptimizeOutcome::Campaign(optimizer.optimize_campaign_max_stars()?),
        Mode::Arena => OptimizeOutcome::Arena(optimizer.optimize_for_arena()),
    })
}

/// Search result tagged with the mode it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum OptimizeOutcome {
    Campaign(CampaignReport),
    Arena(ArenaReport),
}

impl OptimizeOutcome {
    #[must_use]
    pub fn formation(&self) -> &[Machine] {
        match self {
            Self::Campaign(report) => &report.formation,
            Self::Arena(report) => &report.formation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, StatLine};

    fn strong_machine(id: &str, role: Role) -> Machine {
        let mut machine = Machine::new(
            id,
            role,
            StatLine::new(
                Decimal::from(5_000.0),
                Decimal::from(60_000.0),
                Decimal::from(400.0),
            ),
        );
        machine.level = 1;
        machine
    }

    fn account() -> Account {
        Account {
            engineer_level: 1,
            ..Account::default()
        }
    }

    fn small_settings() -> PlannerSettings {
        PlannerSettings {
            max_mission: 6,
            ..PlannerSettings::default()
        }
    }

    #[test]
    fn inputs_are_left_untouched() {
        let mut machine = strong_machine("m", Role::Dps);
        machine.blueprints = StatLine::new(99, 0, 0);
        machine.crew.push(Hero::new("h", StatLine::new(10, 0, 0)));
        let machines = vec![machine.clone()];
        let optimizer = Optimizer::new(&machines, &[], account(), small_settings()).unwrap();
        assert_eq!(machines[0], machine);
        assert_eq!(optimizer.machines()[0].blueprints.damage, 5);
        assert!(optimizer.machines()[0].crew.is_empty());
        assert!(optimizer.machines()[0].battle_stats.is_some());
    }

    #[test]
    fn duplicate_and_inert_heroes_are_dropped() {
        let heroes = vec![
            Hero::new("a", StatLine::new(10, 0, 0)),
            Hero::new("a", StatLine::new(50, 0, 0)),
            Hero::new("b", StatLine::new(0, 0, 0)),
        ];
        let optimizer = Optimizer::new(&[], &heroes, account(), small_settings()).unwrap();
        assert_eq!(optimizer.heroes().len(), 1);
        assert_eq!(optimizer.heroes()[0].percentages.damage, 10);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = PlannerSettings {
            max_rounds: 0,
            ..PlannerSettings::default()
        };
        let err = Optimizer::new(&[], &[], account(), settings).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn strong_roster_clears_early_missions() {
        let machines = vec![strong_machine("m1", Role::Tank), strong_machine("m2", Role::Dps)];
        let optimizer = Optimizer::new(&machines, &[], account(), small_settings()).unwrap();
        let report = optimizer.optimize_campaign_max_stars().unwrap();
        assert!(report.total_stars >= 1);
        assert_eq!(report.last_cleared.len(), 5);
        assert!(report.last_cleared[&Difficulty::Easy].is_some());
        assert_eq!(report.clears.len() as u32, report.total_stars);
        assert!(report.battle_power.is_positive());
        assert!(!report.formation.is_empty());
    }

    #[test]
    fn single_mission_attempt_reports_gate() {
        let optimizer = Optimizer::new(&[], &[], account(), small_settings()).unwrap();
        let attempt = optimizer.optimize_for_mission(1, Difficulty::Easy).unwrap();
        assert!(matches!(attempt, MissionAttempt::Underpowered { .. }));
        assert!(!attempt.is_won());
    }

    #[test]
    fn outcome_serializes_with_mode_tag() {
        let optimizer = Optimizer::new(&[], &[], account(), small_settings()).unwrap();
        let outcome = OptimizeOutcome::Arena(optimizer.optimize_for_arena());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "arena");
        assert_eq!(json["arenaPower"], "0");
        assert!(json["formation"].as_array().unwrap().is_empty());
    }
}
