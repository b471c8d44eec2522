//! Crew assignment: heroes onto machine crew slots.
//!
//! Every hero/slot pair gets a score from [`hero_score`]; the matrix is normalized by its
//! largest entry and solved as a minimum-cost perfect matching (Hungarian method with
//! potentials). A pairwise swap pass can then polish the result against real machine power.
use crate::calculator::{machine_power, refresh_stats};
use crate::model::{Account, Hero, Machine, Mode};
use crate::scoring::{HeroScoringWeights, hero_score};

/// One hero placed on one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub hero: usize,
    pub machine: usize,
}

/// Minimum-cost assignment of rows to columns for a square or wide matrix
/// (`rows <= columns`). Returns the column chosen for each row.
#[must_use]
pub fn solve_min_cost(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    let m = cost.first().map_or(0, Vec::len);
    if n == 0 || m < n {
        return Vec::new();
    }

    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        owner[0] = row;
        let mut j0 = 0;
        let mut min_v = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_v[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut result = vec![0; n];
    for (column, &row) in owner.iter().enumerate().skip(1) {
        if row != 0 {
            result[row - 1] = column - 1;
        }
    }
    result
}

/// Pick at most `max_slots` heroes per machine maximizing the total hero score.
/// Heroes scoring zero on every machine stay unassigned.
#[must_use]
pub fn plan_crews(
    machines: &[Machine],
    heroes: &[Hero],
    mode: Mode,
    weights: &HeroScoringWeights,
    max_slots: usize,
) -> Vec<Placement> {
    let columns = machines.len() * max_slots;
    if heroes.is_empty() || columns == 0 {
        return Vec::new();
    }

    let mut scores: Vec<Vec<f64>> = heroes
        .iter()
        .map(|hero| {
            machines
                .iter()
                .map(|machine| {
                    let stats = machine.stats(mode).copied().unwrap_or_default();
                    let score = hero_score(hero, machine.role, &stats, mode, weights);
                    if score.is_finite() { score } else { 0.0 }
                })
                .collect()
        })
        .collect();

    let max_score = scores.iter().flatten().copied().fold(0.0_f64, f64::max);
    if max_score <= 0.0 {
        return Vec::new();
    }
    for row in &mut scores {
        for score in row.iter_mut() {
            *score /= max_score;
        }
    }

    // Dummy rows and columns cost nothing; rows are heroes, columns are machine slots.
    let size = heroes.len().max(columns);
    let cost: Vec<Vec<f64>> = (0..size)
        .map(|row| {
            (0..size)
                .map(|column| {
                    if row < heroes.len() && column < columns {
                        -scores[row][column / max_slots]
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    solve_min_cost(&cost)
        .into_iter()
        .enumerate()
        .filter(|&(hero, column)| hero < heroes.len() && column < columns)
        .map(|(hero, column)| Placement {
            hero,
            machine: column / max_slots,
        })
        .filter(|placement| scores[placement.hero][placement.machine] > 0.0)
        .collect()
}

/// Replace every crew in `machines` with an optimal assignment and refresh stats.
/// Returns the number of heroes placed.
pub fn assign_crews(
    machines: &mut [Machine],
    heroes: &[Hero],
    account: &Account,
    mode: Mode,
    weights: &HeroScoringWeights,
    max_slots: usize,
) -> usize {
    for machine in machines.iter_mut() {
        machine.crew.clear();
        refresh_stats(machine, account);
    }
    let placements = plan_crews(machines, heroes, mode, weights, max_slots);
    for placement in &placements {
        machines[placement.machine]
            .crew
            .push(heroes[placement.hero].clone());
    }
    for machine in machines.iter_mut() {
        refresh_stats(machine, account);
    }
    placements.len()
}

fn power_score(machine: &Machine, mode: Mode) -> f64 {
    let log = machine
        .stats(mode)
        .map_or(f64::NEG_INFINITY, |stats| machine_power(stats).log10());
    if log.is_nan() { f64::NEG_INFINITY } else { log }
}

fn pair_score(a: &Machine, b: &Machine, mode: Mode) -> f64 {
    power_score(a, mode) + power_score(b, mode)
}

/// Swap single crew members between machine pairs while the pair's combined
/// `log10(power)` strictly improves. Returns the number of swaps kept.
pub fn refine_by_swaps(
    machines: &mut [Machine],
    account: &Account,
    mode: Mode,
    max_iterations: u32,
) -> u32 {
    let mut swaps = 0;
    while swaps < max_iterations {
        if !apply_first_improving_swap(machines, account, mode) {
            break;
        }
        swaps += 1;
    }
    if swaps > 0 {
        log::debug!("crew refinement kept {swaps} swap(s) in {mode} mode");
    }
    swaps
}

fn apply_first_improving_swap(machines: &mut [Machine], account: &Account, mode: Mode) -> bool {
    for second in 1..machines.len() {
        let (left, right) = machines.split_at_mut(second);
        let b = &mut right[0];
        for a in left.iter_mut() {
            if try_swaps(a, b, account, mode) {
                return true;
            }
        }
    }
    false
}

fn try_swaps(a: &mut Machine, b: &mut Machine, account: &Account, mode: Mode) -> bool {
    let before = pair_score(a, b, mode);
    for ia in 0..a.crew.len() {
        for ib in 0..b.crew.len() {
            std::mem::swap(&mut a.crew[ia], &mut b.crew[ib]);
            refresh_stats(a, account);
            refresh_stats(b, account);
            if pair_score(a, b, mode) > before {
                return true;
            }
            std::mem::swap(&mut a.crew[ia], &mut b.crew[ib]);
            refresh_stats(a, account);
            refresh_stats(b, account);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, StatLine};
    use crate::numbers::Decimal;
    use std::collections::HashSet;

    fn machine(id: &str, role: Role, damage: f64, health: f64) -> Machine {
        let mut machine = Machine::new(
            id,
            role,
            StatLine::new(Decimal::from(damage), Decimal::from(health), Decimal::from(10.0)),
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

    #[test]
    fn solver_finds_the_cheapest_matching() {
        let cost = vec![
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ];
        let columns = solve_min_cost(&cost);
        let total: f64 = columns
            .iter()
            .enumerate()
            .map(|(row, &column)| cost[row][column])
            .sum();
        assert!((total - 5.0).abs() < 1e-12);
        let unique: HashSet<usize> = columns.iter().copied().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn heroes_are_never_shared_and_slots_are_capped() {
        let account = account();
        let mut machines = vec![
            machine("a", Role::Dps, 500.0, 2000.0),
            machine("b", Role::Tank, 100.0, 9000.0),
        ];
        let heroes: Vec<Hero> = (0..9)
            .map(|i| Hero::new(format!("h{i}"), StatLine::new(10 + i, 5, 0)))
            .collect();
        let placed = assign_crews(
            &mut machines,
            &heroes,
            &account,
            Mode::Campaign,
            &HeroScoringWeights::default(),
            4,
        );
        assert_eq!(placed, 8);

        let mut seen = HashSet::new();
        for machine in &machines {
            assert!(machine.crew.len() <= 4);
            for id in machine.crew_ids() {
                assert!(seen.insert(id.to_string()), "hero {id} assigned twice");
            }
        }
    }

    #[test]
    fn inert_heroes_stay_on_the_bench() {
        let account = account();
        let mut machines = vec![machine("a", Role::Dps, 500.0, 2000.0)];
        let heroes = vec![
            Hero::new("idle", StatLine::new(0, 0, 0)),
            Hero::new("busy", StatLine::new(25, 0, 0)),
        ];
        let placed = assign_crews(
            &mut machines,
            &heroes,
            &account,
            Mode::Campaign,
            &HeroScoringWeights::default(),
            4,
        );
        assert_eq!(placed, 1);
        assert_eq!(machines[0].crew_ids().collect::<Vec<_>>(), vec!["busy"]);
        let stats = machines[0].battle_stats.unwrap();
        assert!((stats.damage.to_f64() - 625.0).abs() < 1e-6);
    }

    #[test]
    fn swap_pass_never_lowers_combined_power() {
        let account = account();
        let mut machines = vec![
            machine("a", Role::Dps, 800.0, 1000.0),
            machine("b", Role::Tank, 50.0, 20_000.0),
        ];
        // Deliberately poor crews: the health hero on the damage machine and vice versa.
        machines[0].crew.push(Hero::new("health", StatLine::new(0, 60, 0)));
        machines[1].crew.push(Hero::new("damage", StatLine::new(60, 0, 0)));
        for machine in &mut machines {
            refresh_stats(machine, &account);
        }
        let before = pair_score(&machines[0], &machines[1], Mode::Campaign);
        let swaps = refine_by_swaps(&mut machines, &account, Mode::Campaign, 10);
        let after = pair_score(&machines[0], &machines[1], Mode::Campaign);
        assert!(after >= before);
        assert!(swaps <= 10);
        assert_eq!(machines[0].crew.len() + machines[1].crew.len(), 2);
    }
}
