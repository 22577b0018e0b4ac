pub use glam;

pub mod bounds;
pub mod collision;
pub mod drag;
pub mod easing;
pub mod geometry;
pub mod health;
pub mod rng;
pub mod sizing;
pub mod store;
pub mod surface;
pub mod transition;
pub mod visibility;

// Re-export key types at crate root for convenience
pub use bounds::{safe_default, validate, PositionBounds};
pub use bounds::{FALLBACK_POSITION, MAX_RIGHT_CAP, MIN_BOTTOM, MIN_RIGHT, SAFE_MARGIN};
pub use collision::{candidate_positions, CollisionDetector, ObstacleView, COLLISION_PAD};
pub use drag::DragController;
pub use easing::{lerp, quad_in_out};
pub use geometry::{mascot_rect, Breakpoint, ContainerSize, Position, Rect, Viewport};
pub use health::{
    HealthMonitor, HealthReport, HealthStatus, PerformanceGovernor, PerformanceProfile,
    QualityTier, RenderingHealth,
};
pub use rng::{Rng, CORNER_COUNT};
pub use sizing::{validate_sizing, SizingBaseline, SizingCheck, SizingReport};
pub use store::{MascotStore, StoreChange, SubscriptionId};
pub use surface::{RenderSurface, SurfaceState, SurfaceWatchdog, WatchdogAction};
pub use transition::{TransitionAnimator, ARC_PEAK_PX, TRANSITION_DURATION_MS};
pub use visibility::{
    ContainerProbe, VisibilityMonitor, VisibilityOutcome, VisibilitySample,
    INVISIBLE_THRESHOLD_MS, MAX_RECOVERY_ATTEMPTS, MOUNT_CHECK_DELAY_MS,
    POSITION_SETTLE_DELAY_MS, VISIBILITY_CHECK_INTERVAL_MS,
};
