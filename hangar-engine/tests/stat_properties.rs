use hangar_engine::calculator::{battle_stats, machine_power, squad_power};
use hangar_engine::{
    Account, ArtifactEntry, CombatStats, Decimal, Hero, Machine, Rarity, Role, StatKind, StatLine,
    max_crew_slots,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

const SAMPLES: usize = 200;

fn random_machine(rng: &mut ChaCha8Rng) -> Machine {
    let mut machine = Machine::new(
        "sample",
        if rng.gen_bool(0.5) { Role::Tank } else { Role::Dps },
        StatLine::new(
            Decimal::from(rng.gen_range(1.0..5_000.0)),
            Decimal::from(rng.gen_range(10.0..50_000.0)),
            Decimal::from(rng.gen_range(0.0..500.0)),
        ),
    );
    machine.level = rng.gen_range(0..60);
    machine.rarity = Rarity::ALL[rng.gen_range(0..Rarity::ALL.len())];
    machine.blueprints = StatLine::new(
        rng.gen_range(0..10),
        rng.gen_range(0..10),
        rng.gen_range(0..10),
    );
    machine.sacred_level = rng.gen_range(0..8);
    machine.inscription_level = rng.gen_range(0..8);
    let percentages = StatLine::new(rng.gen_range(0..40), rng.gen_range(0..40), 0);
    machine.crew.push(Hero::new("crew", percentages));
    machine
}

fn random_account(rng: &mut ChaCha8Rng) -> Account {
    Account {
        engineer_level: rng.gen_range(0..80),
        global_rarity_levels: rng.gen_range(0..20),
        artifacts: vec![ArtifactEntry {
            stat: StatKind::Damage,
            values: BTreeMap::from([(30, rng.gen_range(0..3)), (65, rng.gen_range(0..3))]),
        }],
        ..Account::default()
    }
}

fn assert_not_lower(before: &CombatStats, after: &CombatStats, what: &str) {
    for stat in StatKind::ALL {
        assert!(
            after.get(stat) >= before.get(stat),
            "{what} lowered {stat}: {} -> {}",
            before.get(stat),
            after.get(stat)
        );
    }
}

#[test]
fn every_bonus_input_is_monotonic() {
    let mut rng = ChaCha8Rng::seed_from_u64(1337);
    for _ in 0..SAMPLES {
        let machine = random_machine(&mut rng);
        let account = random_account(&mut rng);
        let base = battle_stats(&machine, &account);

        let mut next = machine.clone();
        next.level += 1;
        assert_not_lower(&base, &battle_stats(&next, &account), "level");

        let mut next = machine.clone();
        next.blueprints.health += 1;
        assert_not_lower(&base, &battle_stats(&next, &account), "blueprint");

        let mut next = machine.clone();
        let rarity = (machine.rarity.ordinal() as usize + 1).min(Rarity::ALL.len() - 1);
        next.rarity = Rarity::ALL[rarity];
        assert_not_lower(&base, &battle_stats(&next, &account), "rarity");

        let mut next = machine.clone();
        next.sacred_level += 1;
        next.inscription_level += 1;
        assert_not_lower(&base, &battle_stats(&next, &account), "card level");

        let mut next = machine.clone();
        next.crew[0].percentages.armor += 5;
        assert_not_lower(&base, &battle_stats(&next, &account), "crew percentage");

        let mut richer = account.clone();
        if let Some(quantity) = richer.artifacts[0].values.get_mut(&30) {
            *quantity += 1;
        }
        assert_not_lower(&base, &battle_stats(&machine, &richer), "artifact quantity");

        let mut senior = account.clone();
        senior.engineer_level += 1;
        assert_not_lower(&base, &battle_stats(&machine, &senior), "engineer level");
    }
}

#[test]
fn crew_slots_are_bounded_and_non_decreasing() {
    let mut previous = 0;
    for level in 0..200 {
        let slots = max_crew_slots(level);
        assert!((4..=6).contains(&slots));
        assert!(slots >= previous);
        previous = slots;
    }
}

/// Machine power computed natively, for stats well inside the `f64` range.
fn native_power([damage, health, armor]: [f64; 3]) -> f64 {
    (damage * 10.0).powf(0.7) + health.powf(0.7) + (armor * 10.0).powf(0.7)
}

#[test]
fn squad_power_matches_native_cumulative_floor() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..SAMPLES {
        // idle members keep an integer total that has to floor to itself
        let raw: Vec<[f64; 3]> = (0..rng.gen_range(2..=5))
            .map(|_| {
                if rng.gen_bool(0.35) {
                    [0.0; 3]
                } else {
                    [
                        rng.gen_range(0.0..50.0),
                        rng.gen_range(0.0..500.0),
                        rng.gen_range(0.0..5.0),
                    ]
                }
            })
            .collect();
        let members: Vec<CombatStats> = raw
            .iter()
            .map(|&[damage, health, armor]| {
                CombatStats::from_line(StatLine::new(
                    Decimal::from(damage),
                    Decimal::from(health),
                    Decimal::from(armor),
                ))
            })
            .collect();
        let expected = raw
            .iter()
            .fold(0.0, |total: f64, &stats| (total + native_power(stats)).floor());
        assert_eq!(squad_power(&members), Decimal::from(expected), "{raw:?}");
    }
}

#[test]
fn astronomic_values_survive_the_whole_pipeline() {
    let mut machine = Machine::new(
        "titan",
        Role::Dps,
        StatLine::new(
            Decimal::from_parts(5.0, 250),
            Decimal::from_parts(2.0, 300),
            Decimal::from_parts(1.0, 120),
        ),
    );
    machine.level = 400;
    let stats = battle_stats(&machine, &Account::default());
    let power = machine_power(&stats);
    assert!(power.is_positive());
    assert!(power.log10() > 100.0);
    assert!(power.log10().is_finite());
    assert!(power.to_f64() > 0.0);
}
