// bounds.rs
//
// Position validation: clamps any candidate position into a guaranteed
// on-screen range for the current viewport and container size.
// Every position write in the engine funnels through `validate`.

use crate::geometry::{ContainerSize, Position, Viewport};

/// Buffer kept between the mascot and the viewport edges.
pub const SAFE_MARGIN: f64 = 50.0;
/// Reserved space for the fixed bottom navigation bar.
pub const MIN_BOTTOM: f64 = 180.0;
pub const MIN_RIGHT: f64 = 100.0;
/// The mascot never roams further than this from the right edge.
pub const MAX_RIGHT_CAP: f64 = 300.0;
/// Substituted for any non-finite candidate component.
pub const FALLBACK_POSITION: Position = Position::new(200.0, 100.0);

/// Valid position range for one viewport/container combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionBounds {
    pub min_bottom: f64,
    pub max_bottom: f64,
    pub min_right: f64,
    pub max_right: f64,
}

impl PositionBounds {
    pub fn compute(viewport: Viewport, size: ContainerSize) -> Self {
        let absolute_max_right = viewport.width - size.width - SAFE_MARGIN;
        let max_bottom = (viewport.height - size.height - SAFE_MARGIN).max(MIN_BOTTOM);
        let max_right = absolute_max_right.min(MAX_RIGHT_CAP).max(MIN_RIGHT);
        Self {
            min_bottom: MIN_BOTTOM,
            max_bottom,
            min_right: MIN_RIGHT,
            max_right,
        }
    }

    pub fn clamp(&self, candidate: Position) -> Position {
        Position::new(
            candidate.bottom.clamp(self.min_bottom, self.max_bottom),
            candidate.right.clamp(self.min_right, self.max_right),
        )
    }

    pub fn contains(&self, position: Position) -> bool {
        position.bottom >= self.min_bottom
            && position.bottom <= self.max_bottom
            && position.right >= self.min_right
            && position.right <= self.max_right
    }
}

/// Clamp `candidate` into the on-screen range. Non-finite components are
/// replaced by the fixed fallback before clamping, so the result is always
/// valid even under hostile input.
pub fn validate(candidate: Position, viewport: Viewport, size: ContainerSize) -> Position {
    let bottom = if candidate.bottom.is_finite() {
        candidate.bottom
    } else {
        FALLBACK_POSITION.bottom
    };
    let right = if candidate.right.is_finite() {
        candidate.right
    } else {
        FALLBACK_POSITION.right
    };
    PositionBounds::compute(viewport, size).clamp(Position::new(bottom, right))
}

/// Deterministic safe position for the current viewport.
pub fn safe_default(viewport: Viewport, size: ContainerSize) -> Position {
    validate(FALLBACK_POSITION, viewport, size)
}
