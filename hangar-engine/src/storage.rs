//! Persistence boundary and the profile-driven planner facade.
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::PlannerSettings;
use crate::model::{
    Account, Hero, Machine, Mode, global_rarity_levels, owned_heroes, owned_machines,
};
use crate::optimizer::{OptimizeOutcome, Optimizer, optimize};
use crate::scoring::HeroScoringWeights;
use crate::upgrade::{UpgradeAnalyzer, UpgradeReport};

/// Everything saved under one profile name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSnapshot {
    pub machines: Vec<Machine>,
    pub heroes: Vec<Hero>,
    pub account: Account,
    pub settings: PlannerSettings,
}

/// Trait for abstracting profile save/load operations.
/// Platform-specific implementations should provide this.
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    fn save_profile(&self, name: &str, profile: &ProfileSnapshot) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the stored profile cannot be read or decoded.
    fn load_profile(&self, name: &str) -> Result<Option<ProfileSnapshot>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the profile cannot be removed.
    fn delete_profile(&self, name: &str) -> Result<(), Self::Error>;

    /// Hero weights are stored apart from any profile so they survive roster resets.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights cannot be saved.
    fn save_weights(&self, weights: &HeroScoringWeights) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the stored weights cannot be read or decoded.
    fn load_weights(&self) -> Result<Option<HeroScoringWeights>, Self::Error>;
}

/// Runs searches over stored profiles.
pub struct Planner<S>
where
    S: ProfileStorage,
{
    storage: S,
}

/// Owned-only roster, with the stored weights applied and rarity levels derived from it.
struct PreparedProfile {
    machines: Vec<Machine>,
    heroes: Vec<Hero>,
    account: Account,
    settings: PlannerSettings,
}

impl<S> Planner<S>
where
    S: ProfileStorage,
{
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn prepare(&self, name: &str) -> anyhow::Result<Option<PreparedProfile>> {
        let Some(profile) = self
            .storage
            .load_profile(name)
            .with_context(|| format!("loading profile {name}"))?
        else {
            return Ok(None);
        };
        let weights = self
            .storage
            .load_weights()
            .context("loading hero weights")?;

        let machines = owned_machines(&profile.machines);
        let heroes = owned_heroes(&profile.heroes);
        let mut account = profile.account;
        account.global_rarity_levels = global_rarity_levels(&machines);
        let mut settings = profile.settings;
        if let Some(weights) = weights {
            settings.hero_weights = weights;
        }
        Ok(Some(PreparedProfile {
            machines,
            heroes,
            account,
            settings,
        }))
    }

    /// Optimize a stored profile. `Ok(None)` when no such profile exists.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the optimizer rejects the profile.
    pub fn optimize_profile(
        &self,
        name: &str,
        mode: Mode,
    ) -> anyhow::Result<Option<OptimizeOutcome>> {
        let Some(profile) = self.prepare(name)? else {
            return Ok(None);
        };
        let outcome = optimize(
            mode,
            &profile.machines,
            &profile.heroes,
            profile.account,
            profile.settings,
        )
        .with_context(|| format!("optimizing profile {name} for {mode}"))?;
        Ok(Some(outcome))
    }

    /// Search upgrades for a stored profile's campaign team.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the analyzer rejects the profile.
    pub fn upgrade_profile(&self, name: &str) -> anyhow::Result<Option<UpgradeReport>> {
        let Some(profile) = self.prepare(name)? else {
            return Ok(None);
        };
        let optimizer = Optimizer::new(
            &profile.machines,
            &profile.heroes,
            profile.account.clone(),
            profile.settings.clone(),
        )?;
        let team = optimizer.build_team(Mode::Campaign);
        let report = UpgradeAnalyzer::new(profile.account, profile.settings)?
            .analyze(&team)
            .with_context(|| format!("analyzing upgrades for profile {name}"))?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rarity, Role, StatLine};
    use crate::numbers::Decimal;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        profiles: Rc<RefCell<HashMap<String, ProfileSnapshot>>>,
        weights: Rc<RefCell<Option<HeroScoringWeights>>>,
    }

    impl ProfileStorage for MemoryStorage {
        type Error = Infallible;

        fn save_profile(&self, name: &str, profile: &ProfileSnapshot) -> Result<(), Self::Error> {
            self.profiles
                .borrow_mut()
                .insert(name.to_string(), profile.clone());
            Ok(())
        }

        fn load_profile(&self, name: &str) -> Result<Option<ProfileSnapshot>, Self::Error> {
            Ok(self.profiles.borrow().get(name).cloned())
        }

        fn delete_profile(&self, name: &str) -> Result<(), Self::Error> {
            self.profiles.borrow_mut().remove(name);
            Ok(())
        }

        fn save_weights(&self, weights: &HeroScoringWeights) -> Result<(), Self::Error> {
            *self.weights.borrow_mut() = Some(*weights);
            Ok(())
        }

        fn load_weights(&self) -> Result<Option<HeroScoringWeights>, Self::Error> {
            Ok(*self.weights.borrow())
        }
    }

    fn profile() -> ProfileSnapshot {
        let mut owned = Machine::new(
            "bulwark",
            Role::Tank,
            StatLine::new(
                Decimal::from(4_000.0),
                Decimal::from(50_000.0),
                Decimal::from(400.0),
            ),
        );
        owned.level = 1;
        owned.rarity = Rarity::Rare;
        let untouched = Machine::new("spare", Role::Dps, StatLine::default());
        ProfileSnapshot {
            machines: vec![owned, untouched],
            heroes: vec![Hero::new("ada", StatLine::new(0, 20, 0))],
            account: Account {
                engineer_level: 1,
                ..Account::default()
            },
            settings: PlannerSettings {
                max_mission: 4,
                ..PlannerSettings::default()
            },
        }
    }

    #[test]
    fn missing_profile_is_none() {
        let planner = Planner::new(MemoryStorage::default());
        assert!(planner.optimize_profile("nobody", Mode::Arena).unwrap().is_none());
        assert!(planner.upgrade_profile("nobody").unwrap().is_none());
    }

    #[test]
    fn stored_profile_is_filtered_and_optimized() {
        let storage = MemoryStorage::default();
        storage.save_profile("main", &profile()).unwrap();
        let planner = Planner::new(storage);

        let outcome = planner
            .optimize_profile("main", Mode::Arena)
            .unwrap()
            .expect("profile exists");
        let formation = outcome.formation();
        assert_eq!(formation.len(), 1);
        assert_eq!(formation[0].id, "bulwark");
        assert_eq!(formation[0].crew_ids().collect::<Vec<_>>(), vec!["ada"]);
    }

    #[test]
    fn delete_and_weights_roundtrip() {
        let storage = MemoryStorage::default();
        storage.save_profile("main", &profile()).unwrap();
        let mut weights = HeroScoringWeights::default();
        weights.arena_tank.health = 3.0;
        storage.save_weights(&weights).unwrap();
        assert_eq!(storage.load_weights().unwrap(), Some(weights));

        storage.delete_profile("main").unwrap();
        let planner = Planner::new(storage);
        assert!(planner.optimize_profile("main", Mode::Campaign).unwrap().is_none());
    }

    #[test]
    fn snapshot_json_tolerates_missing_sections() {
        let snapshot: ProfileSnapshot = serde_json::from_str(r#"{"heroes": []}"#).unwrap();
        assert!(snapshot.machines.is_empty());
        assert_eq!(snapshot.settings, PlannerSettings::default());
    }
}
