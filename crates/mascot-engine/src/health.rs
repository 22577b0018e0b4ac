// health.rs
//
// Diagnostic health scoring and adaptive quality selection.
// Both run on their own 5s cadence and never influence positioning —
// consumers are the dev monitoring UI and the rendering layer.

use std::collections::VecDeque;

use serde::Serialize;

pub const HEALTH_EVAL_INTERVAL_MS: f64 = 5000.0;
/// Rolling window of inter-render intervals.
pub const RENDER_WINDOW: usize = 100;
/// Render gap beyond which the score takes a -20 penalty.
pub const RENDER_STALL_MS: f64 = 10_000.0;
/// Render gap beyond which a further -30 applies.
pub const RENDER_FROZEN_MS: f64 = 20_000.0;
/// Soft reset fires once the render counter grows past this.
pub const SOFT_RESET_RENDER_COUNT: u64 = 10_000;
/// Error/warning counters are capped (not zeroed) in a soft reset.
pub const FAULT_COUNT_CAP: u32 = 100;

/// Monotonically-accumulating render/fault counters, periodically
/// soft-reset so they cannot grow without bound.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderingHealth {
    pub render_count: u64,
    pub error_count: u32,
    pub warning_count: u32,
    pub last_render_ms: Option<f64>,
    pub average_render_interval_ms: f64,
    pub position_changes: u64,
    pub collision_events: u64,
    pub recovery_attempts: u32,
    pub context_losses: u32,
    pub performance_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub score: f64,
    pub status: HealthStatus,
    #[serde(flatten)]
    pub health: RenderingHealth,
}

pub struct HealthMonitor {
    health: RenderingHealth,
    intervals: VecDeque<f64>,
    status: HealthStatus,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            health: RenderingHealth {
                performance_score: 100.0,
                ..Default::default()
            },
            intervals: VecDeque::with_capacity(RENDER_WINDOW),
            status: HealthStatus::Healthy,
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn score(&self) -> f64 {
        self.health.performance_score
    }

    pub fn record_render(&mut self, now_ms: f64) {
        if let Some(last) = self.health.last_render_ms {
            let interval = now_ms - last;
            if self.intervals.len() == RENDER_WINDOW {
                self.intervals.pop_front();
            }
            self.intervals.push_back(interval);
            let sum: f64 = self.intervals.iter().sum();
            self.health.average_render_interval_ms = sum / self.intervals.len() as f64;
        }
        self.health.last_render_ms = Some(now_ms);
        self.health.render_count += 1;

        if self.health.render_count > SOFT_RESET_RENDER_COUNT {
            self.soft_reset();
        }
    }

    pub fn record_error(&mut self) {
        self.health.error_count = self.health.error_count.saturating_add(1);
    }

    pub fn record_warning(&mut self) {
        self.health.warning_count = self.health.warning_count.saturating_add(1);
    }

    pub fn record_recovery_attempt(&mut self) {
        self.health.recovery_attempts = self.health.recovery_attempts.saturating_add(1);
    }

    pub fn record_context_loss(&mut self) {
        self.health.context_losses = self.health.context_losses.saturating_add(1);
    }

    pub fn record_position_change(&mut self) {
        self.health.position_changes += 1;
    }

    pub fn record_collision(&mut self) {
        self.health.collision_events += 1;
    }

    /// Aggregate the counters into a 0-100 score and a three-level status.
    /// Status transitions are logged for diagnostics.
    pub fn evaluate(&mut self, now_ms: f64) -> HealthStatus {
        let mut score = 100.0;
        score -= 10.0 * self.health.error_count as f64;
        score -= 5.0 * self.health.warning_count as f64;
        score -= 15.0 * self.health.recovery_attempts as f64;
        score -= 20.0 * self.health.context_losses as f64;

        if let Some(last) = self.health.last_render_ms {
            let gap = now_ms - last;
            if gap > RENDER_STALL_MS {
                score -= 20.0;
            }
            if gap > RENDER_FROZEN_MS {
                score -= 30.0;
            }
        }

        self.health.performance_score = score.clamp(0.0, 100.0);

        let status = if self.health.performance_score < 30.0 {
            HealthStatus::Critical
        } else if self.health.performance_score < 70.0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        if status != self.status {
            log::info!(
                "health: {:?} -> {:?} (score {:.0})",
                self.status,
                status,
                self.health.performance_score
            );
            self.status = status;
        }
        status
    }

    /// Read-only snapshot for the diagnostics UI.
    pub fn report(&self) -> HealthReport {
        HealthReport {
            score: self.health.performance_score,
            status: self.status,
            health: self.health.clone(),
        }
    }

    fn soft_reset(&mut self) {
        self.health.render_count = 0;
        self.intervals.clear();
        self.health.average_render_interval_ms = 0.0;
        self.health.error_count = self.health.error_count.min(FAULT_COUNT_CAP);
        self.health.warning_count = self.health.warning_count.min(FAULT_COUNT_CAP);
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Adaptive quality ─────────────────────────────────────────────────────

pub const QUALITY_CHECK_INTERVAL_MS: f64 = 5000.0;
/// Rolling window of per-frame FPS samples.
pub const FPS_WINDOW: usize = 60;
/// Hysteresis thresholds to avoid tier oscillation.
pub const DOWNGRADE_FPS: f64 = 25.0;
pub const UPGRADE_FPS: f64 = 55.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

/// Draw-cost knobs handed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceProfile {
    pub quality: QualityTier,
    pub target_fps: u32,
    pub shadows_enabled: bool,
    pub particles_enabled: bool,
    pub geometry_segments: u32,
    /// Render every Nth animation frame (1 = no throttling).
    pub animation_throttle: u32,
}

impl PerformanceProfile {
    pub fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Low => Self {
                quality: tier,
                target_fps: 30,
                shadows_enabled: false,
                particles_enabled: false,
                geometry_segments: 8,
                animation_throttle: 2,
            },
            QualityTier::Medium => Self {
                quality: tier,
                target_fps: 45,
                shadows_enabled: false,
                particles_enabled: true,
                geometry_segments: 16,
                animation_throttle: 1,
            },
            QualityTier::High => Self {
                quality: tier,
                target_fps: 60,
                shadows_enabled: true,
                particles_enabled: true,
                geometry_segments: 32,
                animation_throttle: 1,
            },
        }
    }
}

/// Adjusts the quality tier from a rolling FPS average, checked on a fixed
/// cadence with hysteresis.
pub struct PerformanceGovernor {
    tier: QualityTier,
    fps_samples: VecDeque<f64>,
    last_frame_ms: Option<f64>,
    last_check_ms: f64,
}

impl PerformanceGovernor {
    pub fn new() -> Self {
        Self {
            tier: QualityTier::High,
            fps_samples: VecDeque::with_capacity(FPS_WINDOW),
            last_frame_ms: None,
            last_check_ms: f64::NEG_INFINITY,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn profile(&self) -> PerformanceProfile {
        PerformanceProfile::for_tier(self.tier)
    }

    /// Sample one frame. Called from the repaint callback.
    pub fn record_frame(&mut self, now_ms: f64) {
        if let Some(last) = self.last_frame_ms {
            let dt = now_ms - last;
            if dt > 0.0 {
                if self.fps_samples.len() == FPS_WINDOW {
                    self.fps_samples.pop_front();
                }
                self.fps_samples.push_back(1000.0 / dt);
            }
        }
        self.last_frame_ms = Some(now_ms);
    }

    pub fn average_fps(&self) -> Option<f64> {
        if self.fps_samples.is_empty() {
            return None;
        }
        Some(self.fps_samples.iter().sum::<f64>() / self.fps_samples.len() as f64)
    }

    /// Periodic tier adjustment. Returns the new tier when it changed.
    pub fn adjust(&mut self, now_ms: f64) -> Option<QualityTier> {
        if now_ms - self.last_check_ms < QUALITY_CHECK_INTERVAL_MS {
            return None;
        }
        self.last_check_ms = now_ms;

        let avg = self.average_fps()?;
        let next = if avg < DOWNGRADE_FPS {
            match self.tier {
                QualityTier::High => QualityTier::Medium,
                _ => QualityTier::Low,
            }
        } else if avg > UPGRADE_FPS {
            match self.tier {
                QualityTier::Low => QualityTier::Medium,
                _ => QualityTier::High,
            }
        } else {
            self.tier
        };

        if next != self.tier {
            log::info!(
                "quality: {:?} -> {:?} (avg {:.1} fps)",
                self.tier,
                next,
                avg
            );
            self.tier = next;
            return Some(next);
        }
        None
    }
}

impl Default for PerformanceGovernor {
    fn default() -> Self {
        Self::new()
    }
}
