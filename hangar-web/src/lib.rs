#![forbid(unsafe_code)]
//! Browser boundary for the planner engine.
//!
//! The optimizer is CPU bound, so pages run it inside a dedicated worker: the page posts
//! a task envelope, the worker answers with exactly one result or `{ "error" }` payload.
//! Profiles and hero weights live in `localStorage` on the page side.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod storage;
pub mod worker;

pub use storage::{KeyValueStore, LocalProfileStorage, WebStorageError};
pub use worker::{WorkerTask, handle_worker_message};

/// JSON in, JSON out; the string form of [`optimize`].
#[must_use]
pub fn optimize_json(input: &str) -> String {
    hangar_engine::handle_json(input)
}

/// JSON in, JSON out; the string form of [`analyze_upgrades`].
#[must_use]
pub fn analyze_upgrades_json(input: &str) -> String {
    hangar_engine::handle_upgrade_json(input)
}

#[cfg(target_arch = "wasm32")]
fn through_json(request: &JsValue, run: fn(&str) -> String) -> JsValue {
    let input = js_sys::JSON::stringify(request)
        .ok()
        .and_then(|text| text.as_string())
        .unwrap_or_default();
    js_sys::JSON::parse(&run(&input)).unwrap_or_else(|err| err)
}

/// Run a campaign or arena search for a request object.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
#[must_use]
pub fn optimize(request: JsValue) -> JsValue {
    through_json(&request, optimize_json)
}

/// Search upgrade paths for a request object.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = analyzeUpgrades)]
#[must_use]
pub fn analyze_upgrades(request: JsValue) -> JsValue {
    through_json(&request, analyze_upgrades_json)
}

/// Default planner settings, for pre-filling the settings form.
///
/// # Errors
///
/// Returns an error if the settings cannot be converted to a JS object.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = defaultSettings)]
pub fn default_settings() -> Result<JsValue, JsValue> {
    use serde::Serialize;
    hangar_engine::PlannerSettings::default()
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(Into::into)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
