// visibility.rs
//
// Watchdog confirming the mascot container is actually rendered, not just
// present in the tree. Visibility is computed from live layout data; on
// sustained invisibility the monitor asks for bounded recovery and finally
// escalates to a manual-reset affordance instead of looping forever.

use serde::Serialize;

/// Periodic check cadence.
pub const VISIBILITY_CHECK_INTERVAL_MS: f64 = 2000.0;
/// Extra check scheduled after every position change.
pub const POSITION_SETTLE_DELAY_MS: f64 = 300.0;
/// One-shot check after mount.
pub const MOUNT_CHECK_DELAY_MS: f64 = 500.0;
/// Invisibility must persist this long before recovery fires.
pub const INVISIBLE_THRESHOLD_MS: f64 = 5000.0;
/// Re-check delay after a recovery attempt.
pub const RECOVERY_RECHECK_DELAY_MS: f64 = 1000.0;
pub const MAX_RECOVERY_ATTEMPTS: u32 = 3;
/// Anything at or below this opacity counts as invisible.
pub const MIN_OPACITY: f64 = 0.1;

/// What the platform probe reports about the live container.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VisibilitySample {
    pub width: f64,
    pub height: f64,
    pub in_viewport: bool,
    pub has_surface: bool,
    pub opacity: f64,
}

impl VisibilitySample {
    /// Rendered and actually visible: positive size, intersecting the
    /// viewport, holding a rendering surface, and not faded out.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.in_viewport
            && self.has_surface
            && self.opacity > MIN_OPACITY
    }
}

/// Live container inspection, implemented by the web crate. `None` means
/// the container is not in the DOM yet.
pub trait ContainerProbe {
    fn sample(&self) -> Option<VisibilitySample>;
}

/// What the caller should do after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityOutcome {
    /// Container confirmed visible; counters reset.
    Visible,
    /// Not visible (or not ready) but no action due yet.
    Pending,
    /// Reset the position to the safe default now.
    Recover,
    /// Automatic attempts exhausted; surface the manual-reset control.
    ManualResetRequired,
}

pub struct VisibilityMonitor {
    last_seen_ms: Option<f64>,
    invisible_since_ms: Option<f64>,
    last_recovery_ms: Option<f64>,
    attempts: u32,
    needs_manual_reset: bool,
}

impl VisibilityMonitor {
    pub fn new() -> Self {
        Self {
            last_seen_ms: None,
            invisible_since_ms: None,
            last_recovery_ms: None,
            attempts: 0,
            needs_manual_reset: false,
        }
    }

    pub fn needs_manual_reset(&self) -> bool {
        self.needs_manual_reset
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Timestamp of the last confirmed-visible check.
    pub fn last_seen_ms(&self) -> Option<f64> {
        self.last_seen_ms
    }

    /// How long the container has been invisible, for diagnostics.
    pub fn invisible_duration_ms(&self, now_ms: f64) -> f64 {
        self.invisible_since_ms
            .map(|since| now_ms - since)
            .unwrap_or(0.0)
    }

    /// Evaluate one visibility sample. The caller performs the recovery
    /// itself (safe-default position reset) when `Recover` is returned, so
    /// this monitor owns nothing but its own retry budget.
    pub fn check(
        &mut self,
        sample: Option<VisibilitySample>,
        now_ms: f64,
    ) -> VisibilityOutcome {
        let Some(sample) = sample else {
            // Container missing from the DOM: not yet ready. Retry on the
            // next scheduled tick without starting the invisibility clock.
            return VisibilityOutcome::Pending;
        };

        if sample.is_visible() {
            self.last_seen_ms = Some(now_ms);
            self.invisible_since_ms = None;
            self.last_recovery_ms = None;
            self.attempts = 0;
            self.needs_manual_reset = false;
            return VisibilityOutcome::Visible;
        }

        let since = *self.invisible_since_ms.get_or_insert(now_ms);
        if now_ms - since < INVISIBLE_THRESHOLD_MS {
            return VisibilityOutcome::Pending;
        }

        if self.needs_manual_reset {
            return VisibilityOutcome::ManualResetRequired;
        }

        // Give a just-performed recovery time to take effect before judging
        // it failed.
        if let Some(last) = self.last_recovery_ms {
            if now_ms - last < RECOVERY_RECHECK_DELAY_MS {
                return VisibilityOutcome::Pending;
            }
        }

        if self.attempts >= MAX_RECOVERY_ATTEMPTS {
            self.needs_manual_reset = true;
            log::error!(
                "visibility: mascot invisible for {:.0}ms, {} recoveries failed — manual reset required",
                now_ms - since,
                self.attempts
            );
            return VisibilityOutcome::ManualResetRequired;
        }

        self.attempts += 1;
        self.last_recovery_ms = Some(now_ms);
        log::warn!(
            "visibility: mascot invisible for {:.0}ms — recovery attempt {}/{}",
            now_ms - since,
            self.attempts,
            MAX_RECOVERY_ATTEMPTS
        );
        VisibilityOutcome::Recover
    }

    /// User-driven escape hatch: clears the retry budget and the latch so
    /// automatic recovery can run again.
    pub fn manual_reset(&mut self) {
        self.attempts = 0;
        self.needs_manual_reset = false;
        self.invisible_since_ms = None;
        self.last_recovery_ms = None;
        log::info!("visibility: manual reset performed");
    }
}

impl Default for VisibilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible() -> VisibilitySample {
        VisibilitySample {
            width: 256.0,
            height: 288.0,
            in_viewport: true,
            has_surface: true,
            opacity: 1.0,
        }
    }

    fn collapsed() -> VisibilitySample {
        VisibilitySample {
            width: 0.0,
            height: 0.0,
            in_viewport: true,
            has_surface: true,
            opacity: 1.0,
        }
    }

    #[test]
    fn visibility_rule_checks_every_condition() {
        assert!(visible().is_visible());
        assert!(!collapsed().is_visible());
        assert!(!VisibilitySample { in_viewport: false, ..visible() }.is_visible());
        assert!(!VisibilitySample { has_surface: false, ..visible() }.is_visible());
        assert!(!VisibilitySample { opacity: 0.05, ..visible() }.is_visible());
        // Boundary: opacity must exceed the threshold, not merely reach it.
        assert!(!VisibilitySample { opacity: MIN_OPACITY, ..visible() }.is_visible());
    }

    #[test]
    fn exactly_one_recovery_after_threshold() {
        let mut m = VisibilityMonitor::new();
        assert_eq!(m.check(Some(collapsed()), 0.0), VisibilityOutcome::Pending);
        assert_eq!(m.check(Some(collapsed()), 2000.0), VisibilityOutcome::Pending);
        assert_eq!(m.check(Some(collapsed()), 4000.0), VisibilityOutcome::Pending);
        // Past the 5000ms threshold: one recovery fires.
        assert_eq!(m.check(Some(collapsed()), 5200.0), VisibilityOutcome::Recover);
        assert_eq!(m.attempts(), 1);
        // An immediate re-check inside the grace window does not double-fire.
        assert_eq!(m.check(Some(collapsed()), 5400.0), VisibilityOutcome::Pending);
    }

    #[test]
    fn manual_reset_required_after_three_failures() {
        let mut m = VisibilityMonitor::new();
        let mut now = 0.0;
        m.check(Some(collapsed()), now);
        now = 5200.0;
        for attempt in 1..=MAX_RECOVERY_ATTEMPTS {
            assert_eq!(m.check(Some(collapsed()), now), VisibilityOutcome::Recover);
            assert_eq!(m.attempts(), attempt);
            now += RECOVERY_RECHECK_DELAY_MS + 100.0;
        }
        assert_eq!(
            m.check(Some(collapsed()), now),
            VisibilityOutcome::ManualResetRequired
        );
        assert!(m.needs_manual_reset());
        // No further automatic attempts.
        assert_eq!(
            m.check(Some(collapsed()), now + 10_000.0),
            VisibilityOutcome::ManualResetRequired
        );
        assert_eq!(m.attempts(), MAX_RECOVERY_ATTEMPTS);
    }

    #[test]
    fn confirmed_visibility_resets_everything() {
        let mut m = VisibilityMonitor::new();
        m.check(Some(collapsed()), 0.0);
        assert_eq!(m.check(Some(collapsed()), 5200.0), VisibilityOutcome::Recover);
        assert_eq!(m.check(Some(visible()), 6300.0), VisibilityOutcome::Visible);
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.invisible_duration_ms(7000.0), 0.0);
        // The invisibility clock starts over from scratch.
        assert_eq!(m.check(Some(collapsed()), 7000.0), VisibilityOutcome::Pending);
    }

    #[test]
    fn missing_container_never_starts_the_clock() {
        let mut m = VisibilityMonitor::new();
        assert_eq!(m.check(None, 0.0), VisibilityOutcome::Pending);
        assert_eq!(m.check(None, 60_000.0), VisibilityOutcome::Pending);
        assert_eq!(m.attempts(), 0);
    }

    #[test]
    fn manual_reset_reopens_automatic_recovery() {
        let mut m = VisibilityMonitor::new();
        m.check(Some(collapsed()), 0.0);
        let mut now = 5200.0;
        for _ in 0..MAX_RECOVERY_ATTEMPTS {
            m.check(Some(collapsed()), now);
            now += RECOVERY_RECHECK_DELAY_MS + 100.0;
        }
        m.check(Some(collapsed()), now);
        assert!(m.needs_manual_reset());

        m.manual_reset();
        assert!(!m.needs_manual_reset());
        assert_eq!(m.attempts(), 0);
        // Invisibility persists: the clock restarts and recovery can run again.
        m.check(Some(collapsed()), now + 100.0);
        assert_eq!(
            m.check(Some(collapsed()), now + 100.0 + INVISIBLE_THRESHOLD_MS + 1.0),
            VisibilityOutcome::Recover
        );
    }
}
