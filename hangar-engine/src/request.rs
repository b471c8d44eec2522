//! The request/response boundary: one JSON payload in, one result or `{ "error" }` out.
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::config::PlannerSettings;
use crate::error::EngineError;
use crate::model::{Account, ArtifactEntry, Hero, Machine, Mode, RiftRank};
use crate::optimizer::{OptimizeOutcome, Optimizer, optimize};
use crate::upgrade::{UpgradeAnalyzer, UpgradeReport};

/// Roster snapshot shared by every request kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterInput {
    #[serde(default)]
    pub owned_machines: Vec<Machine>,
    #[serde(default)]
    pub owned_heroes: Vec<Hero>,
    /// Overrides `settings.maxMission` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mission: Option<u32>,
    #[serde(default)]
    pub global_rarity_levels: u32,
    #[serde(default)]
    pub engineer_level: u32,
    #[serde(default)]
    pub scarab_level: u32,
    #[serde(default)]
    pub artifact_array: Vec<ArtifactEntry>,
    #[serde(default)]
    pub rift_rank: RiftRank,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PlannerSettings>,
}

impl RosterInput {
    #[must_use]
    pub fn account(&self) -> Account {
        Account {
            engineer_level: self.engineer_level,
            scarab_level: self.scarab_level,
            rift_rank: self.rift_rank,
            global_rarity_levels: self.global_rarity_levels,
            artifacts: self.artifact_array.clone(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> PlannerSettings {
        let mut settings = self.settings.clone().unwrap_or_default();
        if let Some(max_mission) = self.max_mission {
            settings.max_mission = max_mission;
        }
        settings
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    #[serde(default)]
    pub mode: Mode,
    #[serde(flatten)]
    pub roster: RosterInput,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    #[serde(flatten)]
    pub roster: RosterInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// Either a result or an error payload. Callers treat `error` as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response<T> {
    Err(ErrorPayload),
    Ok(T),
}

impl<T> Response<T> {
    fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Err(ErrorPayload { error }),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Err(_))
    }
}

/// Run the optimizer for a parsed request.
///
/// # Errors
///
/// Returns an error if the settings are invalid or a battle cannot be simulated.
pub fn run_optimization(request: &OptimizeRequest) -> Result<OptimizeOutcome, EngineError> {
    let roster = &request.roster;
    optimize(
        request.mode,
        &roster.owned_machines,
        &roster.owned_heroes,
        roster.account(),
        roster.settings(),
    )
}

/// Build the campaign team for the roster and search upgrades for it.
///
/// # Errors
///
/// Returns an error if the settings are invalid or a battle cannot be simulated.
pub fn run_upgrade_analysis(request: &UpgradeRequest) -> Result<UpgradeReport, EngineError> {
    let roster = &request.roster;
    let settings = roster.settings();
    let optimizer = Optimizer::new(
        &roster.owned_machines,
        &roster.owned_heroes,
        roster.account(),
        settings.clone(),
    )?;
    let team = optimizer.build_team(Mode::Campaign);
    UpgradeAnalyzer::new(roster.account(), settings)?.analyze(&team)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "optimizer panicked".to_string())
}

/// Turns errors and native panics into an error payload. Targets that abort on
/// panic (`wasm32-unknown-unknown`) never reach the `Err(payload)` arm.
fn guarded<T>(run: impl FnOnce() -> Result<T, EngineError>) -> Response<T> {
    let result = match catch_unwind(AssertUnwindSafe(run)) {
        Ok(result) => result.map_err(|err| err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    };
    if let Err(error) = &result {
        log::warn!("request failed: {error}");
    }
    Response::from_result(result)
}

#[must_use]
pub fn handle_request(request: &OptimizeRequest) -> Response<OptimizeOutcome> {
    guarded(|| run_optimization(request))
}

#[must_use]
pub fn handle_upgrade_request(request: &UpgradeRequest) -> Response<UpgradeReport> {
    guarded(|| run_upgrade_analysis(request))
}

fn to_json<T: Serialize>(response: &Response<T>) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        serde_json::json!({ "error": format!("could not encode response: {err}") }).to_string()
    })
}

fn parse<T: for<'de> Deserialize<'de>>(input: &str) -> Result<T, String> {
    serde_json::from_str(input).map_err(|err| EngineError::from(err).to_string())
}

/// Full JSON round trip for an optimization request.
#[must_use]
pub fn handle_json(input: &str) -> String {
    let response = match parse::<OptimizeRequest>(input) {
        Ok(request) => handle_request(&request),
        Err(error) => Response::Err(ErrorPayload { error }),
    };
    to_json(&response)
}

/// Full JSON round trip for an upgrade request.
#[must_use]
pub fn handle_upgrade_json(input: &str) -> String {
    let response = match parse::<UpgradeRequest>(input) {
        Ok(request) => handle_upgrade_request(&request),
        Err(error) => Response::Err(ErrorPayload { error }),
    };
    to_json(&response)
}
