// runner.rs
//
// Wires the core's timestamp-driven components to real browser timers,
// listeners and the repaint loop. Every interval, timeout, observer and
// listener handle is retained here and released on drop, so a teardown
// leaves no callback alive.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MutationObserver, MutationObserverInit, Window};

use mascot_engine::glam::DVec2;
use mascot_engine::{
    safe_default, validate, CollisionDetector, ContainerProbe, DragController, HealthMonitor,
    MascotStore, PerformanceGovernor, Position, RenderSurface, StoreChange, SurfaceWatchdog,
    TransitionAnimator, VisibilityMonitor, VisibilityOutcome, WatchdogAction,
    POSITION_SETTLE_DELAY_MS,
};

use crate::dom::{self, DomContainerProbe, DomObstacleView};
use crate::surface::CanvasSurface;

const MAIN_TICK_MS: i32 = 2000;
const GUARD_POLL_MS: i32 = 3000;
const RESILIENCE_POLL_MS: i32 = 5000;
const RESIZE_DEBOUNCE_MS: i32 = 150;
const MUTATION_DEBOUNCE_MS: i32 = 100;
/// Collision/visibility passes after mount, while the page is still settling.
const SETTLE_DELAYS_MS: [i32; 4] = [100, 500, 1000, 2000];

/// All mascot state and logic. Timer callbacks borrow this through an
/// `Rc<RefCell<_>>`; methods take `now_ms` explicitly so the core stays
/// clock-free.
struct Engine {
    store: MascotStore,
    detector: CollisionDetector,
    drag: DragController,
    animator: TransitionAnimator,
    visibility: VisibilityMonitor,
    guard: SurfaceWatchdog,
    resilience: SurfaceWatchdog,
    health: HealthMonitor,
    governor: PerformanceGovernor,
    view: DomObstacleView,
    probe: DomContainerProbe,
    recovery_callback: Option<Function>,
    /// When finite, a visibility check is due at this timestamp (scheduled
    /// by the store listener after every position write).
    settle_due: Rc<Cell<f64>>,
}

impl Engine {
    fn new() -> Self {
        let settle_due = Rc::new(Cell::new(f64::NAN));
        let mut store = MascotStore::new();
        // The listener touches only the DOM and the settle cell, never the
        // engine itself: it runs synchronously inside store writes.
        let due = settle_due.clone();
        store.subscribe(move |change| match change {
            StoreChange::Position(p) => {
                dom::apply_position(p);
                due.set(dom::now_ms() + POSITION_SETTLE_DELAY_MS);
            }
            StoreChange::Visibility(v) => dom::apply_visibility(v),
            StoreChange::Dragging(_) => {}
        });

        Self {
            store,
            detector: CollisionDetector::new(),
            drag: DragController::new(),
            animator: TransitionAnimator::new(dom::now_ms().to_bits() | 1),
            visibility: VisibilityMonitor::new(),
            guard: SurfaceWatchdog::guard(),
            resilience: SurfaceWatchdog::resilience(),
            health: HealthMonitor::new(),
            governor: PerformanceGovernor::new(),
            view: DomObstacleView,
            probe: DomContainerProbe,
            recovery_callback: None,
            settle_due,
        }
    }

    /// Validate the starting position against the live viewport and push it
    /// into the container style.
    fn mount(&mut self) {
        if let Some((vp, size)) = dom::layout() {
            let start = validate(self.store.position(), vp, size);
            self.store.set_position(start);
        }
        dom::apply_position(self.store.position());
    }

    // ---- Periodic work ----

    /// Per-frame callback from requestAnimationFrame.
    fn frame(&mut self, now_ms: f64) {
        self.governor.record_frame(now_ms);
        self.health.record_render(now_ms);
        self.governor.adjust(now_ms);

        if self.animator.is_active() {
            if let Some((vp, size)) = dom::layout() {
                if let Some(p) = self.animator.sample(now_ms, vp, size) {
                    self.store.set_position(p);
                }
                if !self.animator.is_active() {
                    // Flight just landed.
                    self.health.record_position_change();
                }
            }
        }

        let due = self.settle_due.get();
        if due.is_finite() && now_ms >= due {
            self.settle_due.set(f64::NAN);
            self.run_visibility_check(now_ms);
        }
    }

    /// Shared 2s tick. Visibility runs first; a tick that performed a
    /// recovery skips the collision nudge so the two checks cannot fight
    /// over the same write.
    fn watchdog_tick(&mut self, now_ms: f64) {
        if self.run_visibility_check(now_ms) {
            return;
        }
        let Some((vp, size)) = dom::layout() else {
            return;
        };
        let before = self.store.position();
        self.detector
            .sanity_check(now_ms, &self.view, &mut self.store, vp, size);
        if self.store.position() != before {
            self.health.record_collision();
            self.health.record_position_change();
        }
    }

    /// Returns true when a recovery was performed this call.
    fn run_visibility_check(&mut self, now_ms: f64) -> bool {
        match self.visibility.check(self.probe.sample(), now_ms) {
            VisibilityOutcome::Recover => {
                self.animator.cancel();
                if let Some((vp, size)) = dom::layout() {
                    self.store.set_position(safe_default(vp, size));
                }
                self.health.record_recovery_attempt();
                self.health.record_position_change();
                true
            }
            _ => false,
        }
    }

    fn collision_pass(&mut self) {
        let Some((vp, size)) = dom::layout() else {
            return;
        };
        let before = self.store.position();
        self.detector
            .detect_and_resolve(&self.view, &mut self.store, vp, size);
        if self.store.position() != before {
            self.health.record_collision();
            self.health.record_position_change();
        }
    }

    fn poll_guard(&mut self, now_ms: f64) {
        Self::poll_watchdog(&mut self.guard, &mut self.health, now_ms);
    }

    fn poll_resilience(&mut self, now_ms: f64) {
        Self::poll_watchdog(&mut self.resilience, &mut self.health, now_ms);
    }

    fn poll_watchdog(watchdog: &mut SurfaceWatchdog, health: &mut HealthMonitor, now_ms: f64) {
        let Some(canvas) = dom::canvas() else { return };
        let Some(surface) = CanvasSurface::from_canvas(&canvas) else {
            return;
        };
        match watchdog.poll(&surface, now_ms) {
            WatchdogAction::RestoreRequested => {
                health.record_recovery_attempt();
                if !surface.force_restore() {
                    health.record_warning();
                }
            }
            WatchdogAction::GaveUp => health.record_error(),
            WatchdogAction::None => {}
        }
    }

    fn evaluate_health(&mut self, now_ms: f64) {
        self.health.evaluate(now_ms);
    }

    /// Debounced resize: the breakpoint may have flipped, so everything
    /// derived from the viewport is recomputed from scratch.
    fn on_viewport_changed(&mut self) {
        let Some((vp, size)) = dom::layout() else {
            return;
        };
        let current = self.store.position();
        let validated = validate(current, vp, size);
        if validated != current {
            self.store.set_position(validated);
            self.health.record_position_change();
        }
        self.collision_pass();
        if let Some(report) = dom::sizing_report() {
            if !report.pass {
                self.health.record_warning();
            }
        }
    }

    // ---- Input and app notifications ----

    fn pointer_down(&mut self, x: f64, y: f64) {
        self.drag.begin(DVec2::new(x, y), &mut self.store);
    }

    fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some((vp, size)) = dom::layout() {
            self.drag.update(DVec2::new(x, y), vp, size, &mut self.store);
        }
    }

    fn pointer_up(&mut self) {
        if !self.drag.is_active() {
            return;
        }
        if let Some((vp, size)) = dom::layout() {
            self.drag.end(vp, size, &mut self.store);
            self.health.record_position_change();
        }
    }

    fn route_changed(&mut self, path: &str, now_ms: f64) {
        let Some((vp, size)) = dom::layout() else {
            return;
        };
        self.animator.on_route_change(
            path,
            now_ms,
            self.store.visible(),
            self.store.position(),
            vp,
            size,
        );
    }

    fn set_visible(&mut self, visible: bool) {
        self.store.set_visible(visible);
        if !visible {
            self.animator.cancel();
        }
    }

    /// User-driven escape hatch: safe default position, fresh retry budget,
    /// and a surface restore request.
    fn manual_reset(&mut self) {
        self.visibility.manual_reset();
        if let Some((vp, size)) = dom::layout() {
            self.store.set_position(safe_default(vp, size));
        }
        if let Some(canvas) = dom::canvas() {
            if let Some(surface) = CanvasSurface::from_canvas(&canvas) {
                surface.force_restore();
            }
        }
        self.health.record_recovery_attempt();
    }

    // ---- Surface events ----

    fn on_context_lost(&mut self, now_ms: f64) {
        self.guard.on_context_lost(now_ms);
        self.resilience.on_context_lost(now_ms);
        self.health.record_context_loss();
    }

    /// Returns the recovery callback to invoke — the caller fires it after
    /// releasing the engine borrow, in case the callback re-enters.
    fn on_context_restored(&mut self, now_ms: f64) -> Option<Function> {
        let signal = self.guard.on_context_restored(now_ms);
        self.resilience.on_context_restored(now_ms);
        if signal {
            self.recovery_callback.clone()
        } else {
            None
        }
    }

    // ---- Diagnostics ----

    fn health_json(&mut self, now_ms: f64) -> String {
        self.health.evaluate(now_ms);
        serde_json::to_string(&self.health.report()).unwrap_or_default()
    }

    fn sizing_json(&self) -> String {
        match dom::sizing_report() {
            Some(report) => serde_json::to_string(&report).unwrap_or_default(),
            None => "null".to_string(),
        }
    }
}

/// Owns the engine plus every browser-side handle that keeps it running.
pub struct MascotRunner {
    engine: Rc<RefCell<Engine>>,
    intervals: Vec<i32>,
    timeouts: Vec<i32>,
    pending_timeouts: Vec<Rc<Cell<Option<i32>>>>,
    tick_closures: Vec<Closure<dyn FnMut()>>,
    debounce_closures: Vec<Rc<Closure<dyn FnMut()>>>,
    event_closures: Vec<Closure<dyn FnMut(Event)>>,
    listeners: Vec<(EventTarget, &'static str, Function)>,
    observer: Option<MutationObserver>,
    raf_id: Rc<Cell<Option<i32>>>,
    raf_closure: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
}

impl MascotRunner {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let engine = Rc::new(RefCell::new(Engine::new()));
        engine.borrow_mut().mount();

        let mut runner = Self {
            engine,
            intervals: Vec::new(),
            timeouts: Vec::new(),
            pending_timeouts: Vec::new(),
            tick_closures: Vec::new(),
            debounce_closures: Vec::new(),
            event_closures: Vec::new(),
            listeners: Vec::new(),
            observer: None,
            raf_id: Rc::new(Cell::new(None)),
            raf_closure: Rc::new(RefCell::new(None)),
        };

        runner.schedule_settle_passes(&window)?;
        runner.schedule_intervals(&window)?;
        runner.attach_resize(&window)?;
        runner.attach_mutation_observer(&window)?;
        runner.attach_context_listeners();
        runner.start_raf(&window)?;
        Ok(runner)
    }

    // ---- Forwarders for the wasm exports ----

    pub fn pointer_down(&self, x: f64, y: f64) {
        self.engine.borrow_mut().pointer_down(x, y);
    }

    pub fn pointer_move(&self, x: f64, y: f64) {
        self.engine.borrow_mut().pointer_move(x, y);
    }

    pub fn pointer_up(&self) {
        self.engine.borrow_mut().pointer_up();
    }

    pub fn route_changed(&self, path: &str) {
        self.engine.borrow_mut().route_changed(path, dom::now_ms());
    }

    pub fn set_visible(&self, visible: bool) {
        self.engine.borrow_mut().set_visible(visible);
    }

    pub fn manual_reset(&self) {
        self.engine.borrow_mut().manual_reset();
    }

    pub fn set_recovery_callback(&self, callback: Function) {
        self.engine.borrow_mut().recovery_callback = Some(callback);
    }

    pub fn position(&self) -> Position {
        self.engine.borrow().store.position()
    }

    pub fn needs_manual_reset(&self) -> bool {
        self.engine.borrow().visibility.needs_manual_reset()
    }

    pub fn health_json(&self) -> String {
        self.engine.borrow_mut().health_json(dom::now_ms())
    }

    pub fn sizing_json(&self) -> String {
        self.engine.borrow().sizing_json()
    }

    // ---- Wiring ----

    fn add_interval(
        &mut self,
        window: &Window,
        ms: i32,
        f: impl FnMut() + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut()>::new(f);
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            ms,
        )?;
        self.intervals.push(id);
        self.tick_closures.push(closure);
        Ok(())
    }

    fn add_listener(
        &mut self,
        target: EventTarget,
        name: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    ) -> Result<(), JsValue> {
        let function = closure.as_ref().unchecked_ref::<Function>().clone();
        target.add_event_listener_with_callback(name, &function)?;
        self.listeners.push((target, name, function));
        self.event_closures.push(closure);
        Ok(())
    }

    /// One-shot collision/visibility passes while the freshly-mounted page
    /// is still shifting layout under the mascot.
    fn schedule_settle_passes(&mut self, window: &Window) -> Result<(), JsValue> {
        for delay in SETTLE_DELAYS_MS {
            let engine = self.engine.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                let now = dom::now_ms();
                let mut e = engine.borrow_mut();
                e.run_visibility_check(now);
                e.collision_pass();
            });
            let id = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay,
            )?;
            self.timeouts.push(id);
            self.tick_closures.push(closure);
        }
        Ok(())
    }

    fn schedule_intervals(&mut self, window: &Window) -> Result<(), JsValue> {
        let engine = self.engine.clone();
        self.add_interval(window, MAIN_TICK_MS, move || {
            engine.borrow_mut().watchdog_tick(dom::now_ms());
        })?;

        let engine = self.engine.clone();
        self.add_interval(window, GUARD_POLL_MS, move || {
            engine.borrow_mut().poll_guard(dom::now_ms());
        })?;

        let engine = self.engine.clone();
        self.add_interval(window, RESILIENCE_POLL_MS, move || {
            let now = dom::now_ms();
            let mut e = engine.borrow_mut();
            e.poll_resilience(now);
            e.evaluate_health(now);
        })?;
        Ok(())
    }

    /// Debounced handler: `trigger` resets a pending timeout on every event,
    /// `apply` runs once the stream goes quiet.
    fn debounced(
        &mut self,
        delay_ms: i32,
        apply: impl FnMut() + 'static,
    ) -> Closure<dyn FnMut(Event)> {
        let pending = Rc::new(Cell::new(None::<i32>));
        let apply = Rc::new(Closure::<dyn FnMut()>::new({
            let pending = pending.clone();
            let mut apply = apply;
            move || {
                pending.set(None);
                apply();
            }
        }));
        let trigger = Closure::<dyn FnMut(Event)>::new({
            let apply = apply.clone();
            let pending = pending.clone();
            move |_event: Event| {
                let Some(w) = web_sys::window() else { return };
                if let Some(id) = pending.take() {
                    w.clear_timeout_with_handle(id);
                }
                if let Ok(id) = w.set_timeout_with_callback_and_timeout_and_arguments_0(
                    apply.as_ref().as_ref().unchecked_ref(),
                    delay_ms,
                ) {
                    pending.set(Some(id));
                }
            }
        });
        self.pending_timeouts.push(pending);
        self.debounce_closures.push(apply);
        trigger
    }

    fn attach_resize(&mut self, window: &Window) -> Result<(), JsValue> {
        let engine = self.engine.clone();
        let trigger = self.debounced(RESIZE_DEBOUNCE_MS, move || {
            engine.borrow_mut().on_viewport_changed();
        });
        self.add_listener(window.clone().into(), "resize", trigger)
    }

    /// DOM churn (route renders, dynamically-inserted cards) re-runs the
    /// collision pass after a short quiet period.
    fn attach_mutation_observer(&mut self, window: &Window) -> Result<(), JsValue> {
        let engine = self.engine.clone();
        let pending = Rc::new(Cell::new(None::<i32>));
        let apply = Rc::new(Closure::<dyn FnMut()>::new({
            let engine = engine.clone();
            let pending = pending.clone();
            move || {
                pending.set(None);
                engine.borrow_mut().collision_pass();
            }
        }));
        let trigger = Closure::<dyn FnMut()>::new({
            let apply = apply.clone();
            let pending = pending.clone();
            move || {
                let Some(w) = web_sys::window() else { return };
                if let Some(id) = pending.take() {
                    w.clear_timeout_with_handle(id);
                }
                if let Ok(id) = w.set_timeout_with_callback_and_timeout_and_arguments_0(
                    apply.as_ref().as_ref().unchecked_ref(),
                    MUTATION_DEBOUNCE_MS,
                ) {
                    pending.set(Some(id));
                }
            }
        });

        let observer = MutationObserver::new(trigger.as_ref().unchecked_ref())?;
        if let Some(body) = window.document().and_then(|d| d.body()) {
            let init = MutationObserverInit::new();
            init.set_child_list(true);
            init.set_subtree(true);
            observer.observe_with_options(&body, &init)?;
        }
        self.observer = Some(observer);
        self.pending_timeouts.push(pending);
        self.debounce_closures.push(apply);
        self.tick_closures.push(trigger);
        Ok(())
    }

    /// Loss/restore listeners on the rendering canvas. When the canvas is
    /// not mounted yet the periodic probes still catch losses, so a missing
    /// canvas only degrades detection latency.
    fn attach_context_listeners(&mut self) {
        let Some(canvas) = dom::canvas() else {
            log::warn!("mascot: no canvas at init, surface events unavailable (probes active)");
            return;
        };

        let lost = Closure::<dyn FnMut(Event)>::new({
            let engine = self.engine.clone();
            move |event: Event| {
                // Without this the browser will not restore the context.
                event.prevent_default();
                engine.borrow_mut().on_context_lost(dom::now_ms());
            }
        });
        let restored = Closure::<dyn FnMut(Event)>::new({
            let engine = self.engine.clone();
            move |_event: Event| {
                let callback = engine.borrow_mut().on_context_restored(dom::now_ms());
                if let Some(cb) = callback {
                    let _ = cb.call0(&JsValue::NULL);
                }
            }
        });

        let target: EventTarget = canvas.into();
        if self
            .add_listener(target.clone(), "webglcontextlost", lost)
            .is_err()
            || self
                .add_listener(target, "webglcontextrestored", restored)
                .is_err()
        {
            log::warn!("mascot: failed to attach surface event listeners");
        }
    }

    /// Persistent repaint loop driving the transition animator and the
    /// frame/render bookkeeping.
    fn start_raf(&mut self, window: &Window) -> Result<(), JsValue> {
        let engine = self.engine.clone();
        let raf_id = self.raf_id.clone();
        let slot = self.raf_closure.clone();
        *self.raf_closure.borrow_mut() = Some(Closure::new(move |now: f64| {
            engine.borrow_mut().frame(now);
            if raf_id.get().is_none() {
                // Torn down while this frame was pending.
                return;
            }
            let Some(w) = web_sys::window() else { return };
            if let Some(cb) = slot.borrow().as_ref() {
                if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    raf_id.set(Some(id));
                }
            }
        }));

        if let Some(cb) = self.raf_closure.borrow().as_ref() {
            let id = window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            self.raf_id.set(Some(id));
        }
        Ok(())
    }
}

impl Drop for MascotRunner {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        if let Some(window) = web_sys::window() {
            for id in self.intervals.drain(..) {
                window.clear_interval_with_handle(id);
            }
            for id in self.timeouts.drain(..) {
                window.clear_timeout_with_handle(id);
            }
            for pending in &self.pending_timeouts {
                if let Some(id) = pending.take() {
                    window.clear_timeout_with_handle(id);
                }
            }
            if let Some(id) = self.raf_id.take() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        for (target, name, function) in self.listeners.drain(..) {
            let _ = target.remove_event_listener_with_callback(name, &function);
        }
        // The rAF closure holds an Rc back to its own slot; break the cycle.
        self.raf_closure.borrow_mut().take();
        log::info!("mascot: torn down");
    }
}
