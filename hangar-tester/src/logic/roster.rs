//! Seeded roster generation.
use hangar_engine::{
    Account, ArtifactEntry, Decimal, Hero, Machine, PlannerSettings, Rarity, RiftRank, Role,
    RosterInput, StatKind, StatLine,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

const RIFT_RANKS: [RiftRank; 6] = [
    RiftRank::Unranked,
    RiftRank::Gold,
    RiftRank::Sapphire,
    RiftRank::Ruby,
    RiftRank::Platinum,
    RiftRank::Diamond,
];

/// A roster snapshot the way a player would submit it.
#[derive(Debug, Clone)]
pub struct Roster {
    pub seed: u64,
    pub machines: Vec<Machine>,
    pub heroes: Vec<Hero>,
    pub account: Account,
}

impl Roster {
    /// Generate a mixed roster. Some machines are left untouched and some heroes are
    /// inert so upstream filtering is exercised too.
    pub fn generate(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let machine_count = rng.gen_range(1..=9);
        let machines = (0..machine_count)
            .map(|i| random_machine(&mut rng, i))
            .collect();
        let hero_count = rng.gen_range(0..=20);
        let heroes = (0..hero_count)
            .map(|i| {
                let mut pct = || {
                    if rng.gen_bool(0.2) {
                        0
                    } else {
                        rng.gen_range(0..60)
                    }
                };
                Hero::new(format!("hero-{i}"), StatLine::new(pct(), pct(), pct()))
            })
            .collect();
        let account = Account {
            engineer_level: rng.gen_range(0..100),
            scarab_level: rng.gen_range(0..40),
            rift_rank: RIFT_RANKS[rng.gen_range(0..RIFT_RANKS.len())],
            global_rarity_levels: 0,
            artifacts: random_artifacts(&mut rng),
        };
        Self {
            seed,
            machines,
            heroes,
            account,
        }
    }

    /// A roster too weak for the first mission.
    pub fn hopeless(seed: u64) -> Self {
        let mut scrap = Machine::new(
            "scrap",
            Role::Dps,
            StatLine::new(Decimal::from(1.0), Decimal::from(5.0), Decimal::ZERO),
        );
        scrap.level = 1;
        Self {
            seed,
            machines: vec![scrap],
            heroes: Vec::new(),
            account: Account::default(),
        }
    }

    pub fn request(&self, max_mission: u32) -> RosterInput {
        RosterInput {
            owned_machines: self.machines.clone(),
            owned_heroes: self.heroes.clone(),
            max_mission: Some(max_mission),
            global_rarity_levels: self.account.global_rarity_levels,
            engineer_level: self.account.engineer_level,
            scarab_level: self.account.scarab_level,
            artifact_array: self.account.artifacts.clone(),
            rift_rank: self.account.rift_rank,
            settings: None,
        }
    }
}

pub fn settings(max_mission: u32) -> PlannerSettings {
    PlannerSettings {
        max_mission,
        ..PlannerSettings::default()
    }
}

fn random_machine(rng: &mut ChaCha8Rng, index: usize) -> Machine {
    let role = match index % 4 {
        0 => Role::Tank,
        3 if rng.gen_bool(0.3) => Role::Support,
        _ => Role::Dps,
    };
    let mut machine = Machine::new(
        format!("machine-{index}"),
        role,
        StatLine::new(
            Decimal::from(rng.gen_range(50.0..4_000.0)),
            Decimal::from(rng.gen_range(500.0..60_000.0)),
            Decimal::from(rng.gen_range(0.0..400.0)),
        ),
    );
    if rng.gen_bool(0.15) {
        return machine;
    }
    machine.level = rng.gen_range(1..80);
    machine.rarity = Rarity::ALL[rng.gen_range(0..Rarity::ALL.len())];
    machine.blueprints = StatLine::new(
        rng.gen_range(0..20),
        rng.gen_range(0..20),
        rng.gen_range(0..20),
    );
    machine.inscription_level = rng.gen_range(0..10);
    machine.sacred_level = rng.gen_range(0..10);
    machine
}

fn random_artifacts(rng: &mut ChaCha8Rng) -> Vec<ArtifactEntry> {
    let mut artifacts = Vec::new();
    for stat in StatKind::ALL {
        if rng.gen_bool(0.5) {
            artifacts.push(ArtifactEntry {
                stat,
                values: BTreeMap::from([(30, rng.gen_range(0..4)), (65, rng.gen_range(0..3))]),
            });
        }
    }
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_roster() {
        let a = Roster::generate(99);
        let b = Roster::generate(99);
        assert_eq!(a.machines, b.machines);
        assert_eq!(a.heroes, b.heroes);
        assert_eq!(a.account, b.account);
    }

    #[test]
    fn request_carries_the_account() {
        let roster = Roster::generate(5);
        let request = roster.request(7);
        assert_eq!(request.account(), roster.account);
        assert_eq!(request.settings().max_mission, 7);
    }
}
