//! Invariants every optimizer result must satisfy.
use anyhow::{Context, Result, bail, ensure};
use hangar_engine::calculator::{enemy_team, formation_power};
use hangar_engine::{
    ArenaReport, BattleEngine, CampaignReport, Difficulty, Machine, Mode, UpgradeReport,
};
use std::collections::HashSet;

const FORMATION_SIZE: usize = 5;

/// No hero serves on two machines and no crew exceeds the slot cap.
pub fn crews_are_valid(formation: &[Machine], max_slots: usize) -> Result<()> {
    ensure!(
        formation.len() <= FORMATION_SIZE,
        "formation has {} machines",
        formation.len()
    );
    let mut seen = HashSet::new();
    for machine in formation {
        ensure!(
            machine.crew.len() <= max_slots,
            "machine {} carries {} heroes with {max_slots} slot(s)",
            machine.id,
            machine.crew.len()
        );
        for hero in &machine.crew {
            ensure!(
                seen.insert(hero.id.as_str()),
                "hero {} placed on more than one machine",
                hero.id
            );
            ensure!(!hero.is_inert(), "inert hero {} took a crew slot", hero.id);
        }
    }
    Ok(())
}

/// The same battle fought twice gives the same result and ends within the round cap.
pub fn battle_is_deterministic(
    engine: &BattleEngine,
    formation: &[Machine],
    mission: u32,
    difficulty: Difficulty,
) -> Result<()> {
    if formation.is_empty() {
        return Ok(());
    }
    let enemy = enemy_team(mission, difficulty);
    let first = engine
        .run_formation(formation, &enemy)
        .context("first battle")?;
    let second = engine
        .run_formation(formation, &enemy)
        .context("second battle")?;
    ensure!(
        first == second,
        "mission {mission} {difficulty}: repeated battle diverged"
    );
    ensure!(
        first.rounds <= engine.max_rounds(),
        "battle ran {} rounds with a cap of {}",
        first.rounds,
        engine.max_rounds()
    );
    if !first.player_won {
        return Ok(());
    }
    ensure!(
        first.enemy_team.iter().all(|fighter| !fighter.is_alive()),
        "won with enemies still standing"
    );
    Ok(())
}

pub fn campaign_is_consistent(report: &CampaignReport, max_mission: u32) -> Result<()> {
    ensure!(
        report.clears.len() == report.total_stars as usize,
        "{} clears recorded for {} stars",
        report.clears.len(),
        report.total_stars
    );
    ensure!(
        report.battle_power == formation_power(&report.formation, Mode::Campaign),
        "battle power does not match the formation"
    );
    ensure!(
        report.arena_power == formation_power(&report.formation, Mode::Arena),
        "arena power does not match the formation"
    );
    let mut unique = HashSet::new();
    for clear in &report.clears {
        ensure!(
            (1..=max_mission).contains(&clear.mission),
            "mission {} outside 1..={max_mission}",
            clear.mission
        );
        ensure!(
            unique.insert((clear.mission, clear.difficulty)),
            "mission {} {} counted twice",
            clear.mission,
            clear.difficulty
        );
    }
    for difficulty in Difficulty::ALL {
        let best = report
            .clears
            .iter()
            .filter(|clear| clear.difficulty == difficulty)
            .map(|clear| clear.mission)
            .max();
        let reported = report.last_cleared.get(&difficulty).copied().flatten();
        ensure!(
            best == reported,
            "{difficulty}: last cleared {reported:?} but clears reach {best:?}"
        );
    }
    if report.total_stars == 0 {
        ensure!(report.formation.is_empty(), "no stars but a formation");
        ensure!(report.battle_power.is_zero(), "no stars but battle power");
    }
    Ok(())
}

pub fn arena_is_consistent(report: &ArenaReport) -> Result<()> {
    ensure!(
        report.arena_power == formation_power(&report.formation, Mode::Arena),
        "arena power does not match the formation"
    );
    ensure!(
        report.battle_power == formation_power(&report.formation, Mode::Campaign),
        "battle power does not match the formation"
    );
    for pair in report.formation.windows(2) {
        if pair[0].id == pair[1].id {
            bail!("machine {} fielded twice", pair[0].id);
        }
    }
    Ok(())
}

pub fn upgrade_is_consistent(report: &UpgradeReport, budget: u32) -> Result<()> {
    if report.already_clearable {
        ensure!(report.target.is_none(), "clearable roster still has a target");
        ensure!(report.paths.is_empty(), "clearable roster still has paths");
        return Ok(());
    }
    if report.target.is_none() {
        ensure!(report.paths.is_empty(), "paths without a target");
    }
    let mut sizes = HashSet::new();
    for path in &report.paths {
        ensure!(path.cost <= budget, "path costs {} over budget {budget}", path.cost);
        ensure!((1..=4).contains(&path.size), "path size {}", path.size);
        ensure!(sizes.insert(path.size), "two paths of size {}", path.size);
        let increments: u32 = path.steps.iter().map(|step| step.amount).sum();
        ensure!(
            increments == path.size,
            "path size {} but {increments} increments",
            path.size
        );
    }
    ensure!(
        report.paths.windows(2).all(|w| w[0].cost <= w[1].cost),
        "paths are not cheapest first"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_engine::{Decimal, Hero, Role, StatLine};

    fn crewed(id: &str, heroes: &[&str]) -> Machine {
        let mut machine = Machine::new(
            id,
            Role::Dps,
            StatLine::new(Decimal::from(10.0), Decimal::from(100.0), Decimal::ZERO),
        );
        machine.crew = heroes
            .iter()
            .map(|hero| Hero::new(*hero, StatLine::new(5, 0, 0)))
            .collect();
        machine
    }

    #[test]
    fn shared_heroes_are_flagged() {
        let formation = vec![crewed("a", &["h1"]), crewed("b", &["h1"])];
        let err = crews_are_valid(&formation, 4).unwrap_err();
        assert!(err.to_string().contains("h1"));
    }

    #[test]
    fn crew_cap_is_enforced() {
        let formation = vec![crewed("a", &["h1", "h2", "h3"])];
        assert!(crews_are_valid(&formation, 3).is_ok());
        assert!(crews_are_valid(&formation, 2).is_err());
    }

    #[test]
    fn empty_campaign_report_is_consistent() {
        let report = CampaignReport {
            total_stars: 0,
            last_cleared: Difficulty::ALL.into_iter().map(|d| (d, None)).collect(),
            formation: Vec::new(),
            battle_power: Decimal::ZERO,
            arena_power: Decimal::ZERO,
            clears: Vec::new(),
        };
        assert!(campaign_is_consistent(&report, 10).is_ok());
    }
}
