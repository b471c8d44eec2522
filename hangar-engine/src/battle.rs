//! Deterministic turn-based combat between two formations of up to five units.
//!
//! A round is one full player attack phase followed, if any enemy still stands, by
//! one enemy attack phase. Units act in slot order `[0, 1, 2, 4, 3]` and always hit
//! the first living defender in that same order.
use serde::{Deserialize, Serialize};

use crate::calculator::damage_taken;
use crate::constants::{ATTACK_ORDER, DEFAULT_MAX_ROUNDS, FORMATION_SIZE};
use crate::error::EngineError;
use crate::model::{CombatStats, Machine, Mode, Role};
use crate::numbers::Decimal;

/// A combat copy of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fighter {
    pub id: String,
    pub role: Role,
    pub damage: Decimal,
    pub health: Decimal,
    pub max_health: Decimal,
    pub armor: Decimal,
    pub is_dead: bool,
}

impl Fighter {
    #[must_use]
    pub fn from_stats(id: impl Into<String>, role: Role, stats: &CombatStats) -> Self {
        Self {
            id: id.into(),
            role,
            damage: stats.damage,
            health: stats.health,
            max_health: stats.max_health,
            armor: stats.armor,
            is_dead: false,
        }
    }

    /// Copy a machine's stats for `mode` into a fighter.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingBattleStats`] if the machine's stats were never computed.
    pub fn from_machine(machine: &Machine, mode: Mode) -> Result<Self, EngineError> {
        let stats = machine
            .stats(mode)
            .ok_or_else(|| EngineError::MissingBattleStats {
                id: machine.id.clone(),
            })?;
        Ok(Self::from_stats(machine.id.clone(), machine.role, stats))
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.is_dead
    }
}

/// Final state of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    pub player_won: bool,
    pub rounds: u32,
    pub player_team: Vec<Fighter>,
    pub enemy_team: Vec<Fighter>,
    #[serde(rename = "playerTotalHP")]
    pub player_total_hp: Decimal,
    #[serde(rename = "enemyTotalHP")]
    pub enemy_total_hp: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleEngine {
    max_rounds: u32,
}

impl Default for BattleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS)
    }
}

impl BattleEngine {
    #[must_use]
    pub const fn new(max_rounds: u32) -> Self {
        Self { max_rounds }
    }

    #[must_use]
    pub const fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Simulate a battle. The input teams are copied, never modified.
    ///
    /// # Errors
    ///
    /// Returns an error if either team is empty or larger than a formation.
    pub fn run(&self, player: &[Fighter], enemy: &[Fighter]) -> Result<BattleResult, EngineError> {
        validate_team("player", player)?;
        validate_team("enemy", enemy)?;

        let mut player_team = fresh_copy(player);
        let mut enemy_team = fresh_copy(enemy);
        let mut rounds = 0;

        while any_alive(&player_team) && any_alive(&enemy_team) && rounds < self.max_rounds {
            attack_phase(&player_team, &mut enemy_team);
            if any_alive(&enemy_team) {
                attack_phase(&enemy_team, &mut player_team);
            }
            rounds += 1;
        }

        let player_won = !any_alive(&enemy_team) && any_alive(&player_team);
        Ok(BattleResult {
            player_won,
            rounds,
            player_total_hp: remaining_health(&player_team),
            enemy_total_hp: remaining_health(&enemy_team),
            player_team,
            enemy_team,
        })
    }

    /// Convert a formation's battle stats and simulate it against `enemy`.
    ///
    /// # Errors
    ///
    /// Returns an error if a machine has no battle stats or a team has an invalid size.
    pub fn run_formation(
        &self,
        formation: &[Machine],
        enemy: &[Fighter],
    ) -> Result<BattleResult, EngineError> {
        let player = formation
            .iter()
            .map(|machine| Fighter::from_machine(machine, Mode::Campaign))
            .collect::<Result<Vec<_>, _>>()?;
        self.run(&player, enemy)
    }
}

fn validate_team(side: &'static str, team: &[Fighter]) -> Result<(), EngineError> {
    if team.is_empty() {
        return Err(EngineError::EmptyTeam { side });
    }
    if team.len() > FORMATION_SIZE {
        return Err(EngineError::OversizedTeam {
            side,
            size: team.len(),
            max: FORMATION_SIZE,
        });
    }
    Ok(())
}

fn fresh_copy(team: &[Fighter]) -> Vec<Fighter> {
    team.iter()
        .cloned()
        .map(|mut fighter| {
            fighter.is_dead = false;
            fighter
        })
        .collect()
}

fn any_alive(team: &[Fighter]) -> bool {
    team.iter().any(Fighter::is_alive)
}

fn remaining_health(team: &[Fighter]) -> Decimal {
    team.iter()
        .filter(|fighter| fighter.is_alive())
        .map(|fighter| fighter.health)
        .sum()
}

fn first_living_target(defenders: &[Fighter]) -> Option<usize> {
    ATTACK_ORDER
        .iter()
        .copied()
        .find(|&slot| defenders.get(slot).is_some_and(Fighter::is_alive))
}

fn attack_phase(attackers: &[Fighter], defenders: &mut [Fighter]) {
    for slot in ATTACK_ORDER {
        let Some(attacker) = attackers.get(slot) else {
            continue;
        };
        if attacker.is_dead {
            continue;
        }
        let Some(target_slot) = first_living_target(defenders) else {
            return;
        };
        let target = &mut defenders[target_slot];
        let dealt = damage_taken(attacker.damage, target.armor);
        if dealt.is_zero() {
            continue;
        }
        target.health = (target.health - dealt).max(Decimal::ZERO);
        if target.health.is_zero() {
            target.is_dead = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatLine;

    fn fighter(id: &str, damage: f64, health: f64, armor: f64) -> Fighter {
        Fighter::from_stats(
            id,
            Role::Dps,
            &CombatStats::from_line(StatLine::new(
                Decimal::from(damage),
                Decimal::from(health),
                Decimal::from(armor),
            )),
        )
    }

    #[test]
    fn overwhelming_player_wins_in_one_round() {
        let player = vec![fighter("p", 1000.0, 500.0, 0.0)];
        let enemy = vec![fighter("e", 10.0, 1.0, 0.0)];
        let result = BattleEngine::default().run(&player, &enemy).unwrap();
        assert!(result.player_won);
        assert_eq!(result.rounds, 1);
        assert!(result.enemy_total_hp.is_zero());
        assert_eq!(result.player_total_hp, Decimal::from(500.0));
    }

    #[test]
    fn armor_wall_times_out_as_loss() {
        let player = vec![fighter("p", 10.0, 100.0, 50.0)];
        let enemy = vec![fighter("e", 10.0, 100.0, 50.0)];
        let engine = BattleEngine::new(7);
        let result = engine.run(&player, &enemy).unwrap();
        assert!(!result.player_won);
        assert_eq!(result.rounds, 7);
        assert_eq!(result.enemy_total_hp, Decimal::from(100.0));
    }

    #[test]
    fn targets_follow_fixed_slot_priority() {
        let player = vec![fighter("p", 100.0, 1000.0, 0.0)];
        let enemy: Vec<Fighter> = (0..5)
            .map(|i| fighter(&format!("e{i}"), 0.0, 50.0, 0.0))
            .collect();
        let result = BattleEngine::new(3).run(&player, &enemy).unwrap();
        let dead: Vec<&str> = result
            .enemy_team
            .iter()
            .filter(|f| f.is_dead)
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(dead, vec!["e0", "e1", "e2"]);

        let result = BattleEngine::new(4).run(&player, &enemy).unwrap();
        assert!(result.enemy_team[4].is_dead);
        assert!(!result.enemy_team[3].is_dead);
    }

    #[test]
    fn deaths_within_a_phase_redirect_later_attackers() {
        let player: Vec<Fighter> = (0..3)
            .map(|i| fighter(&format!("p{i}"), 60.0, 1000.0, 0.0))
            .collect();
        let enemy = vec![
            fighter("e0", 0.0, 100.0, 0.0),
            fighter("e1", 0.0, 100.0, 0.0),
        ];
        let result = BattleEngine::new(1).run(&player, &enemy).unwrap();
        assert!(result.enemy_team[0].is_dead);
        assert_eq!(result.enemy_team[1].health, Decimal::from(40.0));
    }

    #[test]
    fn wiped_player_loses_even_after_damaging_enemy() {
        let player = vec![fighter("p", 100.0, 50.0, 0.0), fighter("p2", 0.0, 1.0, 0.0)];
        let enemy = vec![fighter("e", 100.0, 150.0, 0.0)];
        let result = BattleEngine::default().run(&player, &enemy).unwrap();
        assert!(!result.player_won);
        assert!(result.player_total_hp.is_zero());
        assert_eq!(result.enemy_total_hp, Decimal::from(50.0));
        assert_eq!(result.rounds, 2);
    }

    #[test]
    fn rejects_empty_and_oversized_teams() {
        let one = vec![fighter("p", 1.0, 1.0, 0.0)];
        let engine = BattleEngine::default();
        assert!(matches!(
            engine.run(&[], &one),
            Err(EngineError::EmptyTeam { side: "player" })
        ));
        let six: Vec<Fighter> = (0..6).map(|i| fighter(&format!("e{i}"), 1.0, 1.0, 0.0)).collect();
        assert!(matches!(
            engine.run(&one, &six),
            Err(EngineError::OversizedTeam { size: 6, .. })
        ));
    }

    #[test]
    fn formation_without_stats_is_rejected() {
        let machine = Machine::new("bare", Role::Tank, StatLine::default());
        let enemy = vec![fighter("e", 1.0, 1.0, 0.0)];
        let err = BattleEngine::default()
            .run_formation(&[machine], &enemy)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingBattleStats { ref id } if id == "bare"));
    }
}
