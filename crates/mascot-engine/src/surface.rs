// surface.rs
//
// Watchdogs over the GPU rendering surface. Loss/restore events arrive from
// the platform; a periodic liveness probe catches losses that never fired an
// event. Recovery is bounded and backoff-delayed, and both the coarse guard
// and the fine-grained resilience instance converge on the same primitive:
// force-restore the surface.

/// Coarse guard probe cadence.
pub const GUARD_PROBE_INTERVAL_MS: f64 = 3000.0;
/// Fine-grained resilience probe cadence.
pub const RESILIENCE_PROBE_INTERVAL_MS: f64 = 5000.0;
pub const MAX_RESTORE_ATTEMPTS: u32 = 3;
const GUARD_RETRY_BASE_MS: f64 = 1000.0;
const RESILIENCE_RETRY_BASE_MS: f64 = 2000.0;

/// The live rendering surface, implemented by the web crate over WebGL.
pub trait RenderSurface {
    /// The platform explicitly reports the context as lost.
    fn is_lost(&self) -> bool;
    /// Basic context parameters are readable (a failed read is unhealthy).
    fn probe(&self) -> bool;
    /// Request the platform restore primitive. Returns whether the request
    /// could be issued at all.
    fn force_restore(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Live,
    Lost,
}

/// What the caller should do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogAction {
    None,
    /// Call `RenderSurface::force_restore` now.
    RestoreRequested,
    /// Retry budget exhausted; reported, no further attempts.
    GaveUp,
}

pub struct SurfaceWatchdog {
    label: &'static str,
    state: SurfaceState,
    probe_interval_ms: f64,
    retry_base_ms: f64,
    attempts: u32,
    losses: u32,
    last_probe_ms: f64,
    next_attempt_ms: f64,
    gave_up: bool,
    last_loss_ms: Option<f64>,
}

impl SurfaceWatchdog {
    fn new(label: &'static str, probe_interval_ms: f64, retry_base_ms: f64) -> Self {
        Self {
            label,
            state: SurfaceState::Live,
            probe_interval_ms,
            retry_base_ms,
            attempts: 0,
            losses: 0,
            last_probe_ms: f64::NEG_INFINITY,
            next_attempt_ms: f64::NEG_INFINITY,
            gave_up: false,
            last_loss_ms: None,
        }
    }

    /// Coarse-grained watchdog (3s probe).
    pub fn guard() -> Self {
        Self::new("guard", GUARD_PROBE_INTERVAL_MS, GUARD_RETRY_BASE_MS)
    }

    /// Fine-grained watchdog (5s probe).
    pub fn resilience() -> Self {
        Self::new(
            "resilience",
            RESILIENCE_PROBE_INTERVAL_MS,
            RESILIENCE_RETRY_BASE_MS,
        )
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn last_loss_ms(&self) -> Option<f64> {
        self.last_loss_ms
    }

    /// Platform fired a context-lost event.
    pub fn on_context_lost(&mut self, now_ms: f64) {
        if self.state == SurfaceState::Live {
            self.losses += 1;
        }
        self.state = SurfaceState::Lost;
        self.last_loss_ms = Some(now_ms);
        log::warn!("{}: rendering surface lost", self.label);
    }

    /// Platform fired a context-restored event. Returns true exactly once
    /// per loss so the caller can fire its restore callback once.
    pub fn on_context_restored(&mut self, _now_ms: f64) -> bool {
        let was_lost = self.state == SurfaceState::Lost;
        self.state = SurfaceState::Live;
        self.attempts = 0;
        self.next_attempt_ms = f64::NEG_INFINITY;
        self.gave_up = false;
        if was_lost {
            log::info!("{}: rendering surface restored", self.label);
        }
        was_lost
    }

    /// Periodic liveness check. Respects the probe cadence and, once the
    /// surface is lost, the `retry_base × attempt` backoff schedule.
    pub fn poll(&mut self, surface: &dyn RenderSurface, now_ms: f64) -> WatchdogAction {
        if now_ms - self.last_probe_ms < self.probe_interval_ms {
            return WatchdogAction::None;
        }
        self.last_probe_ms = now_ms;

        let healthy = !surface.is_lost() && surface.probe();
        if healthy {
            if self.state == SurfaceState::Lost {
                // Recovered without an explicit restore event.
                self.state = SurfaceState::Live;
                self.attempts = 0;
                self.gave_up = false;
                log::info!("{}: surface healthy again on probe", self.label);
            }
            return WatchdogAction::None;
        }

        if self.state == SurfaceState::Live {
            self.state = SurfaceState::Lost;
            self.losses += 1;
            self.last_loss_ms = Some(now_ms);
            log::warn!("{}: probe failed, surface considered lost", self.label);
        }

        if self.gave_up {
            return WatchdogAction::None;
        }
        if now_ms < self.next_attempt_ms {
            return WatchdogAction::None;
        }
        if self.attempts >= MAX_RESTORE_ATTEMPTS {
            self.gave_up = true;
            log::error!(
                "{}: giving up after {} restore attempts",
                self.label,
                self.attempts
            );
            return WatchdogAction::GaveUp;
        }

        self.attempts += 1;
        self.next_attempt_ms = now_ms + self.retry_base_ms * self.attempts as f64;
        log::warn!(
            "{}: requesting surface restore (attempt {}/{})",
            self.label,
            self.attempts,
            MAX_RESTORE_ATTEMPTS
        );
        WatchdogAction::RestoreRequested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeSurface {
        lost: Cell<bool>,
        restore_calls: Cell<u32>,
    }

    impl FakeSurface {
        fn healthy() -> Self {
            Self {
                lost: Cell::new(false),
                restore_calls: Cell::new(0),
            }
        }
        fn dead() -> Self {
            Self {
                lost: Cell::new(true),
                restore_calls: Cell::new(0),
            }
        }
    }

    impl RenderSurface for FakeSurface {
        fn is_lost(&self) -> bool {
            self.lost.get()
        }
        fn probe(&self) -> bool {
            !self.lost.get()
        }
        fn force_restore(&self) -> bool {
            self.restore_calls.set(self.restore_calls.get() + 1);
            true
        }
    }

    #[test]
    fn restore_event_resets_attempts_and_signals_once() {
        let mut w = SurfaceWatchdog::guard();
        w.on_context_lost(0.0);
        assert_eq!(w.state(), SurfaceState::Lost);
        assert_eq!(w.losses(), 1);

        // Lost then immediately restored: counter back to zero, signal once.
        assert!(w.on_context_restored(10.0));
        assert_eq!(w.attempts(), 0);
        assert_eq!(w.state(), SurfaceState::Live);
        // Duplicate restore event does not signal again.
        assert!(!w.on_context_restored(20.0));
    }

    #[test]
    fn healthy_surface_polls_quietly() {
        let surface = FakeSurface::healthy();
        let mut w = SurfaceWatchdog::guard();
        assert_eq!(w.poll(&surface, 0.0), WatchdogAction::None);
        assert_eq!(w.poll(&surface, 10_000.0), WatchdogAction::None);
        assert_eq!(w.losses(), 0);
    }

    #[test]
    fn probe_respects_cadence() {
        let surface = FakeSurface::dead();
        let mut w = SurfaceWatchdog::guard();
        assert_eq!(w.poll(&surface, 0.0), WatchdogAction::RestoreRequested);
        // Within the 3000ms probe window nothing runs.
        assert_eq!(w.poll(&surface, 1000.0), WatchdogAction::None);
        assert_eq!(w.attempts(), 1);
    }

    #[test]
    fn backoff_grows_with_attempt_number() {
        let surface = FakeSurface::dead();
        let mut w = SurfaceWatchdog::guard();

        // Attempt 1 at t=0; next allowed at 0 + 1000*1.
        assert_eq!(w.poll(&surface, 0.0), WatchdogAction::RestoreRequested);
        // Probe cadence passes but backoff has not: t=3000 is past 1000, so
        // attempt 2 fires; next allowed at 3000 + 1000*2 = 5000.
        assert_eq!(w.poll(&surface, 3000.0), WatchdogAction::RestoreRequested);
        // t=4000: inside backoff window (and probe window) — nothing.
        assert_eq!(w.poll(&surface, 4000.0), WatchdogAction::None);
        // t=6100: attempt 3.
        assert_eq!(w.poll(&surface, 6100.0), WatchdogAction::RestoreRequested);
        assert_eq!(w.attempts(), 3);
        // Budget exhausted: reported once, then silent.
        assert_eq!(w.poll(&surface, 20_000.0), WatchdogAction::GaveUp);
        assert_eq!(w.poll(&surface, 30_000.0), WatchdogAction::None);
    }

    #[test]
    fn probe_detects_silent_loss() {
        let surface = FakeSurface::dead();
        let mut w = SurfaceWatchdog::resilience();
        // No event ever fired, the probe alone flags the loss.
        assert_eq!(w.poll(&surface, 0.0), WatchdogAction::RestoreRequested);
        assert_eq!(w.state(), SurfaceState::Lost);
        assert_eq!(w.losses(), 1);
        assert!(w.last_loss_ms().is_some());
    }

    #[test]
    fn probe_detects_silent_recovery() {
        let surface = FakeSurface::healthy();
        let mut w = SurfaceWatchdog::guard();
        w.on_context_lost(0.0);
        assert_eq!(w.poll(&surface, 5000.0), WatchdogAction::None);
        assert_eq!(w.state(), SurfaceState::Live);
        assert_eq!(w.attempts(), 0);
    }

    #[test]
    fn give_up_clears_after_restore() {
        let surface = FakeSurface::dead();
        let mut w = SurfaceWatchdog::guard();
        let mut now = 0.0;
        loop {
            match w.poll(&surface, now) {
                WatchdogAction::GaveUp => break,
                _ => now += 4000.0,
            }
        }
        assert!(w.on_context_restored(now));
        // Fresh budget after a confirmed restore.
        surface.lost.set(true);
        assert_eq!(
            w.poll(&surface, now + 10_000.0),
            WatchdogAction::RestoreRequested
        );
        assert_eq!(w.attempts(), 1);
    }
}
