use anyhow::{Context, Result, ensure};
use hangar_engine::{
    Account, Difficulty, Machine, Mode, Optimizer, PlannerSettings, UpgradeAnalyzer,
    global_rarity_levels, handle_json, handle_upgrade_json, owned_heroes, owned_machines,
};
use serde_json::Value;

use crate::logic::checks::{
    arena_is_consistent, battle_is_deterministic, campaign_is_consistent, crews_are_valid,
    upgrade_is_consistent,
};
use crate::logic::roster::{Roster, settings};

#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub verbose: bool,
}

pub type ScenarioFn = fn(&ScenarioCtx) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[TestScenario] = &[
    TestScenario {
        name: "smoke",
        description: "JSON requests for every entry point answer without errors",
        run: smoke,
    },
    TestScenario {
        name: "campaign",
        description: "Campaign star search on a seeded roster",
        run: campaign,
    },
    TestScenario {
        name: "arena",
        description: "Arena lineup on a seeded roster",
        run: arena,
    },
    TestScenario {
        name: "upgrade",
        description: "Upgrade paths for the campaign team stay within budget",
        run: upgrade,
    },
    TestScenario {
        name: "battle",
        description: "Repeated battles are identical and end within the round cap",
        run: battle,
    },
    TestScenario {
        name: "plateau",
        description: "A roster below mission 1 requirements earns nothing",
        run: plateau,
    },
    TestScenario {
        name: "roster-sweep",
        description: "Every invariant across both modes on a larger mission range",
        run: roster_sweep,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.name, s.description))
}

pub fn get_scenario(name: &str) -> Option<&'static TestScenario> {
    CATALOG.iter().find(|s| s.name == name)
}

/// Replace `all` with the full catalog, keeping other names in order.
pub fn expand_scenarios(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = names.iter().filter(|n| *n != "all").cloned().collect();
    if names.iter().any(|n| n == "all") {
        for (name, _) in list_scenarios() {
            if !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
    }
    out
}

/// Upstream filtering plus a derived global rarity count, the way a profile is prepared.
fn prepared(roster: &Roster, settings: PlannerSettings) -> Result<Optimizer> {
    let machines = owned_machines(&roster.machines);
    let heroes = owned_heroes(&roster.heroes);
    let account = Account {
        global_rarity_levels: global_rarity_levels(&machines),
        ..roster.account.clone()
    };
    Optimizer::new(&machines, &heroes, account, settings)
        .with_context(|| format!("seed {}: optimizer rejected the roster", roster.seed))
}

fn response(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).context("response is not JSON")?;
    if let Some(error) = value.get("error") {
        anyhow::bail!("engine answered with an error: {error}");
    }
    Ok(value)
}

fn smoke(ctx: &ScenarioCtx) -> Result<()> {
    let roster = Roster::generate(ctx.seed);
    for mode in ["campaign", "arena"] {
        let mut request = serde_json::to_value(roster.request(5))?;
        request["mode"] = Value::from(mode);
        let reply = response(&handle_json(&request.to_string()))
            .with_context(|| format!("{mode} request"))?;
        ensure!(reply["mode"] == mode, "reply tagged {}", reply["mode"]);
        let formation = reply["formation"]
            .as_array()
            .context("reply has no formation")?;
        ensure!(formation.len() <= 5, "formation of {}", formation.len());
    }
    let request = serde_json::to_value(roster.request(5))?;
    let reply = response(&handle_upgrade_json(&request.to_string())).context("upgrade request")?;
    ensure!(reply["paths"].is_array(), "upgrade reply has no paths");
    Ok(())
}

fn campaign(ctx: &ScenarioCtx) -> Result<()> {
    let max_mission = 10;
    let optimizer = prepared(&Roster::generate(ctx.seed), settings(max_mission))?;
    let report = optimizer.optimize_campaign_max_stars()?;
    if ctx.verbose {
        println!(
            "   seed {}: {} star(s), battle power {}",
            ctx.seed, report.total_stars, report.battle_power
        );
    }
    campaign_is_consistent(&report, max_mission)?;
    if let Some(clear) = report.clears.first() {
        let attempt = optimizer.optimize_for_mission(clear.mission, clear.difficulty)?;
        ensure!(
            attempt.is_won(),
            "mission {} {} cleared in the sweep but not on its own",
            clear.mission,
            clear.difficulty
        );
    }
    crews_are_valid(&report.formation, optimizer.max_slots())
}

fn arena(ctx: &ScenarioCtx) -> Result<()> {
    let optimizer = prepared(&Roster::generate(ctx.seed), settings(5))?;
    let report = optimizer.optimize_for_arena();
    if ctx.verbose {
        println!("   seed {}: arena power {}", ctx.seed, report.arena_power);
    }
    arena_is_consistent(&report)?;
    crews_are_valid(&report.formation, optimizer.max_slots())?;
    ensure!(
        report.formation.len() == optimizer.machines().len().min(5),
        "arena fielded {} of {} machines",
        report.formation.len(),
        optimizer.machines().len()
    );
    Ok(())
}

fn upgrade(ctx: &ScenarioCtx) -> Result<()> {
    let settings = settings(8);
    let optimizer = prepared(&Roster::generate(ctx.seed), settings.clone())?;
    let team = optimizer.build_team(Mode::Campaign);
    let analyzer = UpgradeAnalyzer::new(optimizer.account().clone(), settings.clone())?;
    let report = analyzer.analyze(&team)?;
    if ctx.verbose {
        println!(
            "   seed {}: target {:?}, {} path(s)",
            ctx.seed,
            report.target.as_ref().map(|t| (t.mission, t.difficulty)),
            report.paths.len()
        );
    }
    if let Some(target) = &report.target {
        ensure!(
            target.mission <= settings.max_mission,
            "target mission {} beyond the search limit",
            target.mission
        );
    }
    upgrade_is_consistent(&report, settings.upgrade_budget)
}

fn battle(ctx: &ScenarioCtx) -> Result<()> {
    let optimizer = prepared(&Roster::generate(ctx.seed), settings(10))?;
    let team = optimizer.build_team(Mode::Campaign);
    let engine = hangar_engine::BattleEngine::new(optimizer.settings().max_rounds);
    for mission in [1, 5, 10] {
        for difficulty in Difficulty::ALL {
            let formation: Vec<Machine> = optimizer.arrange_for(&team, mission, difficulty);
            battle_is_deterministic(&engine, &formation, mission, difficulty)?;
        }
    }
    Ok(())
}

fn plateau(ctx: &ScenarioCtx) -> Result<()> {
    let optimizer = prepared(&Roster::hopeless(ctx.seed), settings(30))?;
    let report = optimizer.optimize_campaign_max_stars()?;
    ensure!(report.total_stars == 0, "earned {} star(s)", report.total_stars);
    ensure!(report.formation.is_empty(), "kept a formation");
    ensure!(report.arena_power.is_zero(), "kept arena power");
    campaign_is_consistent(&report, 30)
}

fn roster_sweep(ctx: &ScenarioCtx) -> Result<()> {
    let max_mission = 25;
    let optimizer = prepared(&Roster::generate(ctx.seed), settings(max_mission))?;
    for mode in [Mode::Campaign, Mode::Arena] {
        let team = optimizer.build_team(mode);
        crews_are_valid(&team, optimizer.max_slots()).with_context(|| format!("{mode} team"))?;
    }
    let report = optimizer.optimize_campaign_max_stars()?;
    campaign_is_consistent(&report, max_mission)?;
    crews_are_valid(&report.formation, optimizer.max_slots())?;
    let arena = optimizer.optimize_for_arena();
    arena_is_consistent(&arena)?;
    crews_are_valid(&arena.formation, optimizer.max_slots())
}
