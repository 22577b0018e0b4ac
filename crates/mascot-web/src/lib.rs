pub mod dom;
pub mod runner;
pub mod surface;

pub use runner::MascotRunner;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<MascotRunner>> = RefCell::new(None);
}

/// Exports are forgiving by design: before `mascot_init` (or after
/// teardown) they no-op instead of panicking.
fn with_runner<R>(f: impl FnOnce(&MascotRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| cell.borrow().as_ref().map(f))
}

#[wasm_bindgen]
pub fn mascot_init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = MascotRunner::new()?;
    RUNNER.with(|cell| {
        // Replacing an existing runner tears the old one down first.
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("mascot: initialized");
    Ok(())
}

#[wasm_bindgen]
pub fn mascot_teardown() {
    RUNNER.with(|cell| {
        cell.borrow_mut().take();
    });
}

// ---- Input ----

#[wasm_bindgen]
pub fn mascot_pointer_down(x: f64, y: f64) {
    with_runner(|r| r.pointer_down(x, y));
}

#[wasm_bindgen]
pub fn mascot_pointer_move(x: f64, y: f64) {
    with_runner(|r| r.pointer_move(x, y));
}

#[wasm_bindgen]
pub fn mascot_pointer_up() {
    with_runner(|r| r.pointer_up());
}

// ---- App notifications ----

#[wasm_bindgen]
pub fn mascot_route_changed(path: &str) {
    with_runner(|r| r.route_changed(path));
}

#[wasm_bindgen]
pub fn mascot_set_visible(visible: bool) {
    with_runner(|r| r.set_visible(visible));
}

#[wasm_bindgen]
pub fn mascot_manual_reset() {
    with_runner(|r| r.manual_reset());
}

/// Called (with no arguments) each time a lost rendering surface is
/// confirmed restored.
#[wasm_bindgen]
pub fn mascot_set_recovery_callback(callback: js_sys::Function) {
    with_runner(|r| r.set_recovery_callback(callback));
}

// ---- Diagnostics accessors ----

#[wasm_bindgen]
pub fn mascot_position_bottom() -> f64 {
    with_runner(|r| r.position().bottom).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn mascot_position_right() -> f64 {
    with_runner(|r| r.position().right).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn mascot_needs_manual_reset() -> bool {
    with_runner(|r| r.needs_manual_reset()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn mascot_health_json() -> String {
    with_runner(|r| r.health_json()).unwrap_or_else(|| "null".to_string())
}

#[wasm_bindgen]
pub fn mascot_sizing_json() -> String {
    with_runner(|r| r.sizing_json()).unwrap_or_else(|| "null".to_string())
}
