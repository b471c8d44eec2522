//! Dedicated-worker message handling.
//!
//! Messages are `{ "task": "optimize" | "upgrade", "request": { ... } }`. A new message
//! does not interrupt one in flight; pages that want to cancel terminate the worker.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkerTask {
    #[default]
    Optimize,
    Upgrade,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    task: WorkerTask,
    #[serde(default = "empty_request")]
    request: serde_json::Value,
}

fn empty_request() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Route one worker message and produce its single reply.
#[must_use]
pub fn handle_worker_message(message: &str) -> String {
    let envelope: Envelope = match serde_json::from_str(message) {
        Ok(envelope) => envelope,
        Err(err) => {
            log::warn!("rejected worker message: {err}");
            return serde_json::json!({ "error": format!("malformed worker message: {err}") })
                .to_string();
        }
    };
    let request = envelope.request.to_string();
    match envelope.task {
        WorkerTask::Optimize => crate::optimize_json(&request),
        WorkerTask::Upgrade => crate::analyze_upgrades_json(&request),
    }
}

/// Attach the message handler to the current dedicated worker scope.
///
/// `wasm32-unknown-unknown` aborts on panic, so a panicking request never posts an
/// `{error}` reply. The page owning the worker must treat the worker `error` event
/// as a failed request and start a fresh worker.
///
/// # Errors
///
/// Returns an error when not running inside a dedicated worker.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(js_name = installWorker)]
pub fn install_worker() -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{DedicatedWorkerGlobalScope, MessageEvent};

    let scope: DedicatedWorkerGlobalScope = js_sys::global().dyn_into()?;
    let reply_scope = scope.clone();
    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let message = js_sys::JSON::stringify(&event.data())
            .ok()
            .and_then(|text| text.as_string())
            .unwrap_or_default();
        let reply = handle_worker_message(&message);
        let payload = js_sys::JSON::parse(&reply).unwrap_or_else(|err| err);
        if let Err(err) = reply_scope.post_message(&payload) {
            web_sys::console::error_1(&err);
        }
    });
    scope.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    // The handler lives as long as the worker.
    on_message.forget();
    Ok(())
}
