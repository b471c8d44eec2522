//! Stat formulas: progression bonuses, crew bonuses, arena rescaling, power scores
//! and enemy scaling.
//!
//! Everything here is a pure function over [`Decimal`]; the optimizer and the
//! upgrade analyzer call into it after every crew or progression change.
use crate::battle::Fighter;
use crate::constants::{
    ARTIFACT_TIERS, BASE_ENEMY_ARMOR, BASE_ENEMY_DAMAGE, BASE_ENEMY_HEALTH, BASE_GROWTH,
    BLUEPRINT_CAP_BASE, BLUEPRINT_CAP_LEVEL_INTERVAL, BLUEPRINT_CAP_STEP, ENEMY_MILESTONE_BASE,
    ENEMY_MILESTONE_INTERVAL, ENEMY_MISSION_GROWTH, ENEMY_TEAM_SIZE, OVERDRIVE_BASE_CHANCE,
    OVERDRIVE_CHANCE_PER_RARITY, POWER_ARMOR_WEIGHT, POWER_DAMAGE_WEIGHT, POWER_EXPONENT,
    POWER_HEALTH_WEIGHT, REQUIRED_POWER_DEFAULT_PERCENT, REQUIRED_POWER_EARLY_EASY_LAST_MISSION,
    REQUIRED_POWER_EARLY_EASY_PERCENT, REQUIRED_POWER_MID_EASY_LAST_MISSION,
    REQUIRED_POWER_MID_EASY_PERCENT, REQUIRED_POWER_ROUNDING, REQUIREMENT_MILESTONE_BASE,
    SCARAB_BASE_LEVEL, SCARAB_BONUS_CAP, SCARAB_BONUS_PER_STEP, SCARAB_LEVELS_PER_STEP,
};
use crate::model::{
    Account, ArtifactEntry, CombatStats, Difficulty, Hero, Machine, Mode, Rarity, Role, StatKind,
    StatLine,
};
use crate::numbers::{Decimal, finite_or_zero, i64_to_f64};

/// Damage that gets through armor; zero means the attack misses.
#[must_use]
pub fn damage_taken(attacker_damage: Decimal, defender_armor: Decimal) -> Decimal {
    (attacker_damage - defender_armor).max(Decimal::ZERO)
}

/// `BASE_GROWTH^n − 1`, defined for negative `n` as well.
#[must_use]
pub fn growth_bonus(n: i64) -> Decimal {
    Decimal::powi(BASE_GROWTH, n) - Decimal::ONE
}

/// Level 0 yields a penalty because the exponent starts at `level − 1`.
#[must_use]
pub fn level_bonus(level: u32) -> Decimal {
    growth_bonus(i64::from(level) - 1)
}

#[must_use]
pub fn engineer_bonus(engineer_level: u32) -> Decimal {
    growth_bonus(i64::from(engineer_level) - 1)
}

#[must_use]
pub fn blueprint_bonus(blueprint_level: u32) -> Decimal {
    growth_bonus(i64::from(blueprint_level))
}

#[must_use]
pub fn rarity_bonus(rarity: Rarity, global_rarity_levels: u32) -> Decimal {
    growth_bonus(i64::from(rarity.ordinal()) + i64::from(global_rarity_levels))
}

/// Shared by sacred and inscription cards.
#[must_use]
pub fn card_bonus(card_level: u32) -> Decimal {
    growth_bonus(i64::from(card_level))
}

/// Product of `(1 + tier/100)^quantity` over every artifact stack for `stat`, minus one.
/// Tiers outside the known table still count; a warning is logged.
#[must_use]
pub fn artifact_bonus(artifacts: &[ArtifactEntry], stat: StatKind) -> Decimal {
    let product = artifacts
        .iter()
        .filter(|entry| entry.stat == stat)
        .flat_map(|entry| entry.values.iter())
        .filter(|(_, quantity)| **quantity > 0)
        .fold(Decimal::ONE, |acc, (&tier, &quantity)| {
            if !ARTIFACT_TIERS.contains(&tier) {
                log::warn!("artifact tier {tier}% is not a known tier");
            }
            let factor = 1.0 + f64::from(tier) / 100.0;
            acc * Decimal::from(factor).pow(f64::from(quantity))
        });
    product - Decimal::ONE
}

/// The multiplicative stack for one stat, before crew bonuses.
#[must_use]
pub fn basic_attribute(machine: &Machine, account: &Account, stat: StatKind) -> Decimal {
    let one = Decimal::ONE;
    machine.base_stats.get(stat)
        * (one + level_bonus(machine.level))
        * (one + engineer_bonus(account.engineer_level))
        * (one + blueprint_bonus(machine.blueprints.get(stat)))
        * (one + rarity_bonus(machine.rarity, account.global_rarity_levels))
        * (one + card_bonus(machine.sacred_level))
        * (one + card_bonus(machine.inscription_level))
        * (one + artifact_bonus(&account.artifacts, stat))
}

#[must_use]
pub fn basic_attributes(machine: &Machine, account: &Account) -> StatLine<Decimal> {
    machine
        .base_stats
        .map(|stat, _| basic_attribute(machine, account, stat))
}

/// Additive crew bonus for one stat. Non-positive percentages are ignored.
#[must_use]
pub fn crew_bonus(crew: &[Hero], stat: StatKind) -> Decimal {
    crew.iter()
        .map(|hero| hero.percentages.get(stat))
        .filter(|pct| *pct > 0)
        .map(|pct| Decimal::from(f64::from(pct) / 100.0))
        .sum()
}

#[must_use]
pub fn battle_stats(machine: &Machine, account: &Account) -> CombatStats {
    let line = basic_attributes(machine, account)
        .map(|stat, basic| basic * (Decimal::ONE + crew_bonus(&machine.crew, stat)));
    CombatStats::from_line(line)
}

#[must_use]
pub fn mech_fury_bonus(global_rarity_levels: u32) -> Decimal {
    growth_bonus(i64::from(global_rarity_levels))
}

/// One step every two scarab levels past the third, capped.
#[must_use]
pub fn scarab_bonus(scarab_level: u32) -> f64 {
    let steps = ((i64::from(scarab_level) - SCARAB_BASE_LEVEL).div_euclid(SCARAB_LEVELS_PER_STEP)
        + 1)
    .max(0);
    (i64_to_f64(steps) * SCARAB_BONUS_PER_STEP).min(SCARAB_BONUS_CAP)
}

/// Rescale battle stats for the arena. Base stats are only read.
#[must_use]
pub fn arena_stats(machine: &Machine, battle: &CombatStats, account: &Account) -> CombatStats {
    let one = Decimal::ONE;
    let account_factor = (one + mech_fury_bonus(account.global_rarity_levels))
        * Decimal::from(1.0 + scarab_bonus(account.scarab_level))
        * Decimal::from(1.0 + account.rift_rank.bonus());
    let line = machine.base_stats.map(|stat, base| {
        let Some(ratio) = battle.get(stat).checked_div(base) else {
            return Decimal::ZERO;
        };
        if !ratio.is_positive() {
            return Decimal::ZERO;
        }
        let log_term = finite_or_zero(ratio.log10() + 1.0);
        base * Decimal::from(log_term * log_term) * account_factor
    });
    CombatStats::from_line(line)
}

/// Recompute both stat blocks in place after any crew or progression change.
pub fn refresh_stats(machine: &mut Machine, account: &Account) {
    let battle = battle_stats(machine, account);
    machine.arena_stats = Some(arena_stats(machine, &battle, account));
    machine.battle_stats = Some(battle);
}

#[must_use]
pub fn machine_power(stats: &CombatStats) -> Decimal {
    (stats.damage * Decimal::from(POWER_DAMAGE_WEIGHT)).pow(POWER_EXPONENT)
        + (stats.health * Decimal::from(POWER_HEALTH_WEIGHT)).pow(POWER_EXPONENT)
        + (stats.armor * Decimal::from(POWER_ARMOR_WEIGHT)).pow(POWER_EXPONENT)
}

/// Sum of machine powers, floored after every addition.
#[must_use]
pub fn squad_power<'a>(stats: impl IntoIterator<Item = &'a CombatStats>) -> Decimal {
    stats
        .into_iter()
        .fold(Decimal::ZERO, |total, s| (total + machine_power(s)).floor())
}

/// Squad power of a formation under the given mode. Machines without stats count as zero.
#[must_use]
pub fn formation_power(formation: &[Machine], mode: Mode) -> Decimal {
    squad_power(formation.iter().filter_map(|m| m.stats(mode)))
}

#[must_use]
pub fn enemy_stat(base: f64, mission: u32, difficulty: Difficulty, milestone_base: f64) -> Decimal {
    let mission_index = i64::from(mission.max(1) - 1);
    let milestones = i64::from((mission.max(1) - 1) / ENEMY_MILESTONE_INTERVAL);
    Decimal::from(base)
        * Decimal::from(difficulty.multiplier())
        * Decimal::powi(ENEMY_MISSION_GROWTH, mission_index)
        * Decimal::powi(milestone_base, milestones)
}

fn enemy_stats_with(mission: u32, difficulty: Difficulty, milestone_base: f64) -> CombatStats {
    CombatStats::from_line(StatLine::new(
        enemy_stat(BASE_ENEMY_DAMAGE, mission, difficulty, milestone_base),
        enemy_stat(BASE_ENEMY_HEALTH, mission, difficulty, milestone_base),
        enemy_stat(BASE_ENEMY_ARMOR, mission, difficulty, milestone_base),
    ))
}

/// Stats of one enemy unit on the real (combat) curve.
#[must_use]
pub fn enemy_stats(mission: u32, difficulty: Difficulty) -> CombatStats {
    enemy_stats_with(mission, difficulty, ENEMY_MILESTONE_BASE)
}

/// Five identical enemy units for a mission.
#[must_use]
pub fn enemy_team(mission: u32, difficulty: Difficulty) -> Vec<Fighter> {
    let stats = enemy_stats(mission, difficulty);
    (0..ENEMY_TEAM_SIZE)
        .map(|slot| {
            Fighter::from_stats(
                format!("enemy-{mission}-{difficulty}-{slot}"),
                Role::Dps,
                &stats,
            )
        })
        .collect()
}

#[must_use]
pub fn enemy_squad_power(mission: u32, difficulty: Difficulty, milestone_base: f64) -> Decimal {
    let stats = enemy_stats_with(mission, difficulty, milestone_base);
    squad_power(std::iter::repeat_n(&stats, ENEMY_TEAM_SIZE))
}

/// Share of the enemy squad power a player must reach before a mission is attempted.
#[must_use]
pub fn mission_power_percent(mission: u32, difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy if mission <= REQUIRED_POWER_EARLY_EASY_LAST_MISSION => {
            REQUIRED_POWER_EARLY_EASY_PERCENT
        }
        Difficulty::Easy if mission <= REQUIRED_POWER_MID_EASY_LAST_MISSION => {
            REQUIRED_POWER_MID_EASY_PERCENT
        }
        _ => REQUIRED_POWER_DEFAULT_PERCENT,
    }
}

#[must_use]
pub fn required_power(mission: u32, difficulty: Difficulty) -> Decimal {
    let enemy_power = enemy_squad_power(mission, difficulty, REQUIREMENT_MILESTONE_BASE);
    (enemy_power * Decimal::from(mission_power_percent(mission, difficulty)))
        .floor_to(REQUIRED_POWER_ROUNDING)
}

/// Chance for an ability to trigger; only the abilities combat variant reads it.
#[must_use]
pub fn overdrive_chance(rarity: Rarity) -> f64 {
    OVERDRIVE_BASE_CHANCE + f64::from(rarity.ordinal()) * OVERDRIVE_CHANCE_PER_RARITY
}

/// Highest blueprint level a machine of `level` may hold.
#[must_use]
pub const fn max_blueprint_level(level: u32) -> u32 {
    BLUEPRINT_CAP_BASE
        .saturating_add((level / BLUEPRINT_CAP_LEVEL_INTERVAL).saturating_mul(BLUEPRINT_CAP_STEP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiftRank;
    use std::collections::BTreeMap;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn machine() -> Machine {
        Machine::new(
            "vanguard",
            Role::Dps,
            StatLine::new(Decimal::from(100.0), Decimal::from(1000.0), Decimal::from(10.0)),
        )
    }

    #[test]
    fn damage_taken_floors_at_zero() {
        let d = Decimal::from(1000.0);
        assert_eq!(damage_taken(d, Decimal::from(300.0)), Decimal::from(700.0));
        assert!(damage_taken(d, d).is_zero());
        assert!(damage_taken(d, Decimal::from(5000.0)).is_zero());
    }

    #[test]
    fn level_zero_is_a_penalty() {
        assert!(close(level_bonus(0).to_f64(), 1.0 / 1.05 - 1.0));
        assert!(level_bonus(1).is_zero());
        assert!(close(level_bonus(10).to_f64(), 1.05f64.powi(9) - 1.0));
    }

    #[test]
    fn basic_attribute_stacks_every_multiplier() {
        let mut m = machine();
        m.level = 11;
        m.rarity = Rarity::Epic;
        m.blueprints = StatLine::new(4, 0, 0);
        m.sacred_level = 2;
        m.inscription_level = 1;
        let account = Account {
            engineer_level: 6,
            global_rarity_levels: 2,
            ..Account::default()
        };
        let expected = 100.0 * 1.05f64.powi(10 + 5 + 4 + 3 + 2 + 2 + 1);
        assert!(close(
            basic_attribute(&m, &account, StatKind::Damage).to_f64(),
            expected
        ));
    }

    #[test]
    fn artifact_bonus_multiplies_tiers_for_matching_stat() {
        let artifacts = vec![
            ArtifactEntry {
                stat: StatKind::Damage,
                values: BTreeMap::from([(30, 2), (50, 1)]),
            },
            ArtifactEntry {
                stat: StatKind::Health,
                values: BTreeMap::from([(65, 3)]),
            },
        ];
        let bonus = artifact_bonus(&artifacts, StatKind::Damage).to_f64();
        assert!(close(bonus, 1.3f64 * 1.3 * 1.5 - 1.0));
        assert!(artifact_bonus(&artifacts, StatKind::Armor).is_zero());
    }

    #[test]
    fn crew_bonus_is_additive_and_ignores_non_positive() {
        let crew = [
            Hero::new("a", StatLine::new(20, 0, -5)),
            Hero::new("b", StatLine::new(15, 10, 0)),
        ];
        assert!(close(crew_bonus(&crew, StatKind::Damage).to_f64(), 0.35));
        assert!(close(crew_bonus(&crew, StatKind::Health).to_f64(), 0.10));
        assert!(crew_bonus(&crew, StatKind::Armor).is_zero());
    }

    #[test]
    fn battle_stats_apply_crew_after_stack() {
        let mut m = machine();
        m.level = 1;
        let account = Account {
            engineer_level: 1,
            ..Account::default()
        };
        let bare = battle_stats(&m, &account);
        assert!(close(bare.damage.to_f64(), 100.0));
        assert_eq!(bare.max_health, bare.health);
        m.crew.push(Hero::new("h", StatLine::new(50, 0, 0)));
        let crewed = battle_stats(&m, &account);
        assert!(close(crewed.damage.to_f64(), 150.0));
        assert_eq!(crewed.health, bare.health);
    }

    #[test]
    fn scarab_bonus_steps_and_caps() {
        assert!(close(scarab_bonus(0), 0.0));
        assert!(close(scarab_bonus(2), 0.0));
        assert!(close(scarab_bonus(3), 0.002));
        assert!(close(scarab_bonus(4), 0.002));
        assert!(close(scarab_bonus(5), 0.004));
        assert!(close(scarab_bonus(10_000), 1.0));
    }

    #[test]
    fn arena_stats_use_log_rescaling() {
        let mut m = machine();
        m.level = 1;
        let account = Account {
            engineer_level: 1,
            rift_rank: RiftRank::Diamond,
            ..Account::default()
        };
        let battle = CombatStats::from_line(StatLine::new(
            Decimal::from(1000.0),
            Decimal::from(1000.0),
            Decimal::from(10.0),
        ));
        let arena = arena_stats(&m, &battle, &account);
        // ratio 10 on damage => (1 + 1)^2 = 4, ratio 1 on the rest => 1
        assert!(close(arena.damage.to_f64(), 100.0 * 4.0 * 1.05));
        assert!(close(arena.health.to_f64(), 1000.0 * 1.05));
        assert_eq!(arena.max_health, arena.health);
        assert_eq!(m.base_stats.damage, Decimal::from(100.0));
    }

    #[test]
    fn machine_power_uses_weighted_exponent() {
        let stats = CombatStats::from_line(StatLine::new(
            Decimal::from(1000.0),
            Decimal::from(5000.0),
            Decimal::from(50.0),
        ));
        let expected = 10_000f64.powf(0.7) + 5000f64.powf(0.7) + 500f64.powf(0.7);
        assert!((machine_power(&stats).to_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn squad_power_floors_each_step() {
        // health of 1.6^(1/0.7) gives a machine power of 1.6 with zero damage and armor
        let health = Decimal::from(1.6f64.powf(1.0 / 0.7));
        let stats = CombatStats::from_line(StatLine::new(Decimal::ZERO, health, Decimal::ZERO));
        let single = machine_power(&stats).to_f64();
        assert!((single - 1.6).abs() < 1e-9);
        let total = squad_power([&stats, &stats]);
        // floor(1.6) = 1, floor(1 + 1.6) = 2; flooring only at the end would give 3
        assert_eq!(total, Decimal::from(2.0));
    }

    #[test]
    fn integer_power_survives_a_powerless_member() {
        let health = Decimal::from(113.0f64.powf(1.0 / 0.7));
        let strong = CombatStats::from_line(StatLine::new(Decimal::ZERO, health, Decimal::ZERO));
        let idle = CombatStats::from_line(StatLine::default());
        assert!(machine_power(&idle).is_zero());
        let alone = squad_power([&strong]);
        assert_eq!(squad_power([&strong, &idle]), alone);
        assert_eq!(squad_power([&strong, &idle, &idle]), alone);
    }

    #[test]
    fn required_power_matches_native_rounding() {
        // 5 floored enemy powers at 80 %, rounded down to the hundred
        assert_eq!(
            required_power(82, Difficulty::Hard),
            Decimal::from(84_549_840_267_100.0)
        );
        assert_eq!(required_power(82, Difficulty::Hard).to_string(), "84549840267100");
    }

    #[test]
    fn enemy_scaling_compounds_per_mission_and_milestone() {
        let first = enemy_stats(1, Difficulty::Easy);
        assert!(close(first.damage.to_f64(), 260.0));
        assert!(close(first.health.to_f64(), 1560.0));
        assert!(close(first.armor.to_f64(), 30.0));
        let eleventh = enemy_stats(11, Difficulty::Normal);
        assert!(close(
            eleventh.damage.to_f64(),
            260.0 * 360.0 * 1.2f64.powi(10) * 3.0
        ));
        let gated = enemy_stat(BASE_ENEMY_DAMAGE, 11, Difficulty::Normal, 2.0);
        assert!(close(gated.to_f64(), 260.0 * 360.0 * 1.2f64.powi(10) * 2.0));
        assert_eq!(enemy_team(1, Difficulty::Easy).len(), 5);
    }

    #[test]
    fn nightmare_late_missions_exceed_native_range_without_error() {
        let stats = enemy_stats(90, Difficulty::Nightmare);
        assert!(stats.health.log10() > 25.0);
        assert!(
            required_power(90, Difficulty::Nightmare) > required_power(89, Difficulty::Nightmare)
        );
    }

    #[test]
    fn required_power_uses_mission_brackets() {
        assert_eq!(required_power(1, Difficulty::Easy), Decimal::from(700.0));
        assert!(close(mission_power_percent(10, Difficulty::Easy), 0.3));
        assert!(close(mission_power_percent(11, Difficulty::Easy), 0.5));
        assert!(close(mission_power_percent(30, Difficulty::Easy), 0.5));
        assert!(close(mission_power_percent(31, Difficulty::Easy), 0.8));
        assert!(close(mission_power_percent(1, Difficulty::Normal), 0.8));
        assert!(required_power(1, Difficulty::Normal) > required_power(1, Difficulty::Easy));
    }

    #[test]
    fn blueprint_cap_and_overdrive() {
        assert_eq!(max_blueprint_level(0), 5);
        assert_eq!(max_blueprint_level(4), 5);
        assert_eq!(max_blueprint_level(5), 10);
        assert_eq!(max_blueprint_level(23), 25);
        assert_eq!(max_blueprint_level(u32::MAX), u32::MAX);
        assert!(close(overdrive_chance(Rarity::Common), 0.25));
        assert!(close(overdrive_chance(Rarity::Celestial), 0.49));
    }
}
