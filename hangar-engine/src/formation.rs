//! Team selection and slot ordering.
use crate::calculator::{damage_taken, machine_power};
use crate::constants::FORMATION_SIZE;
use crate::model::{CombatStats, Machine, Mode};
use crate::numbers::Decimal;

fn power_under(machine: &Machine, mode: Mode) -> Decimal {
    machine.stats(mode).map_or(Decimal::ZERO, machine_power)
}

/// The five strongest machines under `mode`. Ties keep pool order.
#[must_use]
pub fn best_five(pool: &[Machine], mode: Mode) -> Vec<Machine> {
    let mut ranked: Vec<(Decimal, &Machine)> =
        pool.iter().map(|m| (power_under(m, mode), m)).collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
        .into_iter()
        .take(FORMATION_SIZE)
        .map(|(_, machine)| machine.clone())
        .collect()
}

fn battle(machine: &Machine) -> CombatStats {
    machine.battle_stats.unwrap_or_default()
}

/// A tank that loses more than half its health to one enemy hit, or a
/// non-tank that cannot get through the enemy's armor.
#[must_use]
pub fn is_useless(machine: &Machine, enemy: &CombatStats) -> bool {
    let stats = battle(machine);
    if machine.role.is_tank() {
        damage_taken(enemy.damage, stats.armor) > stats.health / Decimal::from(2.0)
    } else {
        damage_taken(stats.damage, enemy.armor).is_zero()
    }
}

/// Order a team for battle against `enemy`.
///
/// Useless machines go first (healthiest first), then working tanks (frailest
/// first), then damage dealers by ascending damage. In a full five-unit team the
/// hardest hitter is moved to the fourth slot, which acts last in the attack order.
#[must_use]
pub fn arrange(team: &[Machine], enemy: &CombatStats) -> Vec<Machine> {
    let (mut useless, working): (Vec<&Machine>, Vec<&Machine>) =
        team.iter().partition(|m| is_useless(m, enemy));
    let (mut tanks, mut dealers): (Vec<&Machine>, Vec<&Machine>) =
        working.into_iter().partition(|m| m.role.is_tank());

    useless.sort_by(|a, b| battle(b).health.cmp(&battle(a).health));
    tanks.sort_by(|a, b| battle(a).health.cmp(&battle(b).health));
    dealers.sort_by(|a, b| battle(a).damage.cmp(&battle(b).damage));

    let strongest = if team.len() == FORMATION_SIZE {
        dealers.pop()
    } else {
        None
    };

    let mut order: Vec<Machine> = useless
        .into_iter()
        .chain(tanks)
        .chain(dealers)
        .cloned()
        .collect();
    if let Some(strongest) = strongest {
        let slot = order.len().saturating_sub(1);
        order.insert(slot, strongest.clone());
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, StatLine};

    fn unit(id: &str, role: Role, damage: f64, health: f64, armor: f64) -> Machine {
        let mut machine = Machine::new(id, role, StatLine::default());
        let stats = CombatStats::from_line(StatLine::new(
            Decimal::from(damage),
            Decimal::from(health),
            Decimal::from(armor),
        ));
        machine.battle_stats = Some(stats);
        machine.arena_stats = Some(stats);
        machine
    }

    fn enemy() -> CombatStats {
        CombatStats::from_line(StatLine::new(
            Decimal::from(260.0),
            Decimal::from(1560.0),
            Decimal::from(30.0),
        ))
    }

    fn ids(order: &[Machine]) -> Vec<&str> {
        order.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn best_five_ranks_by_mode_power() {
        let pool: Vec<Machine> = (0..7)
            .map(|i| unit(&format!("m{i}"), Role::Dps, 100.0 * f64::from(i + 1), 1000.0, 10.0))
            .collect();
        let five = best_five(&pool, Mode::Campaign);
        assert_eq!(ids(&five), vec!["m6", "m5", "m4", "m3", "m2"]);
        assert!(best_five(&[], Mode::Arena).is_empty());
    }

    #[test]
    fn fragile_tank_is_useless_and_leads() {
        let team = vec![
            unit("dps-a", Role::Dps, 500.0, 1000.0, 0.0),
            unit("tank-ok", Role::Tank, 50.0, 5000.0, 100.0),
            unit("tank-paper", Role::Tank, 50.0, 300.0, 0.0),
            unit("dps-b", Role::Dps, 900.0, 1000.0, 0.0),
            unit("dps-c", Role::Dps, 200.0, 1000.0, 0.0),
        ];
        assert!(is_useless(&team[2], &enemy()));
        assert!(!is_useless(&team[1], &enemy()));
        let order = arrange(&team, &enemy());
        assert_eq!(
            ids(&order),
            vec!["tank-paper", "tank-ok", "dps-c", "dps-b", "dps-a"]
        );
    }

    #[test]
    fn dealer_blocked_by_armor_is_useless() {
        let blunt = unit("blunt", Role::Support, 30.0, 4000.0, 0.0);
        assert!(is_useless(&blunt, &enemy()));
    }

    #[test]
    fn short_team_keeps_plain_ordering() {
        let team = vec![
            unit("dps-a", Role::Dps, 500.0, 1000.0, 0.0),
            unit("tank-1", Role::Tank, 50.0, 6000.0, 300.0),
            unit("tank-2", Role::Tank, 50.0, 4000.0, 300.0),
        ];
        let order = arrange(&team, &enemy());
        assert_eq!(ids(&order), vec!["tank-2", "tank-1", "dps-a"]);
    }
}
