// collision.rs
//
// Collision detection and avoidance against surrounding UI chrome.
// The DOM scan lives behind `ObstacleView` so the resolution logic stays
// pure and unit-testable; the web crate supplies the rects.

use crate::bounds::{self, PositionBounds};
use crate::geometry::{mascot_rect, ContainerSize, Position, Rect, Viewport};
use crate::store::MascotStore;

/// Buffer added around bounding boxes before the overlap test, so
/// near-misses still count as collisions.
pub const COLLISION_PAD: f64 = 20.0;
/// Minimum spacing between sanity-check passes.
pub const SANITY_INTERVAL_MS: f64 = 2000.0;

/// Queryable scene-graph view: where the mascot is and which UI elements
/// could visually overlap it. Returning `None` for the mascot rect means
/// "not yet rendered" and the check no-ops until the next tick.
pub trait ObstacleView {
    fn mascot_rect(&self) -> Option<Rect>;
    fn obstacle_rects(&self) -> Vec<Rect>;
}

/// Candidate escape positions in fixed preference order: near-default first,
/// then the four corners of the roamable region (viewport-derived), then the
/// two mid-edge spots. Each is validated before the overlap test.
pub fn candidate_positions(viewport: Viewport, size: ContainerSize) -> [Position; 7] {
    let b = PositionBounds::compute(viewport, size);
    let mid_bottom = (b.min_bottom + b.max_bottom) / 2.0;
    let mid_right = (b.min_right + b.max_right) / 2.0;
    [
        bounds::FALLBACK_POSITION,
        Position::new(b.min_bottom, b.min_right),
        Position::new(b.min_bottom, b.max_right),
        Position::new(b.max_bottom, b.min_right),
        Position::new(b.max_bottom, b.max_right),
        Position::new(mid_bottom, b.min_right),
        Position::new(b.min_bottom, mid_right),
    ]
}

/// Pure core of the avoidance search. Returns the first validated candidate
/// whose rect clears every colliding obstacle, the safe default when none
/// qualify, or `None` when there is nothing to avoid.
pub fn resolve(
    mascot: Rect,
    obstacles: &[Rect],
    viewport: Viewport,
    size: ContainerSize,
) -> Option<Position> {
    let colliding: Vec<Rect> = obstacles
        .iter()
        .filter(|o| mascot.intersects_padded(o, COLLISION_PAD))
        .copied()
        .collect();
    if colliding.is_empty() {
        return None;
    }

    for candidate in candidate_positions(viewport, size) {
        let validated = bounds::validate(candidate, viewport, size);
        let rect = mascot_rect(validated, viewport, size);
        if colliding
            .iter()
            .all(|o| !rect.intersects_padded(o, COLLISION_PAD))
        {
            return Some(validated);
        }
    }
    Some(bounds::safe_default(viewport, size))
}

/// Timer-driven detector with a re-entrancy guard and a throttled sanity
/// pass that self-corrects silent position drift.
pub struct CollisionDetector {
    in_flight: bool,
    last_sanity_ms: f64,
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self {
            in_flight: false,
            last_sanity_ms: f64::NEG_INFINITY,
        }
    }

    /// Scan for overlaps and, if any exist, move the mascot to the first
    /// collision-free validated candidate. Side effect only.
    pub fn detect_and_resolve(
        &mut self,
        view: &dyn ObstacleView,
        store: &mut MascotStore,
        viewport: Viewport,
        size: ContainerSize,
    ) {
        if self.in_flight {
            return;
        }
        self.in_flight = true;

        if let Some(mascot) = view.mascot_rect() {
            let obstacles = view.obstacle_rects();
            if let Some(escape) = resolve(mascot, &obstacles, viewport, size) {
                log::debug!(
                    "collision: moving mascot to bottom={:.0} right={:.0}",
                    escape.bottom,
                    escape.right
                );
                store.set_position(escape);
            }
        }

        self.in_flight = false;
    }

    /// Throttled periodic pass (at most once per `SANITY_INTERVAL_MS`) that
    /// re-validates the current position even when no collision is found.
    /// Suppressed while a drag gesture is in progress.
    pub fn sanity_check(
        &mut self,
        now_ms: f64,
        view: &dyn ObstacleView,
        store: &mut MascotStore,
        viewport: Viewport,
        size: ContainerSize,
    ) {
        if store.dragging() {
            return;
        }
        if now_ms - self.last_sanity_ms < SANITY_INTERVAL_MS {
            return;
        }
        self.last_sanity_ms = now_ms;

        let current = store.position();
        let revalidated = bounds::validate(current, viewport, size);
        if revalidated != current {
            log::debug!(
                "collision: drift corrected to bottom={:.0} right={:.0}",
                revalidated.bottom,
                revalidated.right
            );
            store.set_position(revalidated);
        }

        self.detect_and_resolve(view, store, viewport, size);
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::validate;

    struct FixtureView {
        mascot: Option<Rect>,
        obstacles: Vec<Rect>,
    }

    impl ObstacleView for FixtureView {
        fn mascot_rect(&self) -> Option<Rect> {
            self.mascot
        }
        fn obstacle_rects(&self) -> Vec<Rect> {
            self.obstacles.clone()
        }
    }

    fn desktop() -> (Viewport, ContainerSize) {
        let vp = Viewport::new(1440.0, 900.0);
        (vp, vp.breakpoint().container_size())
    }

    #[test]
    fn no_obstacles_means_no_move() {
        let (vp, size) = desktop();
        let mascot = mascot_rect(Position::new(200.0, 100.0), vp, size);
        assert_eq!(resolve(mascot, &[], vp, size), None);
    }

    #[test]
    fn resolution_clears_every_colliding_rect() {
        let (vp, size) = desktop();
        let start = validate(Position::new(200.0, 100.0), vp, size);
        let mascot = mascot_rect(start, vp, size);
        // Fixture overlapping the mascot by construction.
        let obstacle = Rect::from_origin_size(mascot.left - 10.0, mascot.top - 10.0, 300.0, 300.0);
        assert!(mascot.intersects_padded(&obstacle, COLLISION_PAD));

        let escape = resolve(mascot, &[obstacle], vp, size).expect("must relocate");
        let escaped_rect = mascot_rect(escape, vp, size);
        assert!(!escaped_rect.intersects_padded(&obstacle, COLLISION_PAD));
        assert!(PositionBounds::compute(vp, size).contains(escape));
    }

    #[test]
    fn falls_back_to_safe_default_when_every_candidate_collides() {
        let (vp, size) = desktop();
        let mascot = mascot_rect(Position::new(200.0, 100.0), vp, size);
        // One obstacle covering the whole viewport defeats every candidate.
        let wall = Rect::from_origin_size(-100.0, -100.0, vp.width + 200.0, vp.height + 200.0);
        let escape = resolve(mascot, &[wall], vp, size).expect("must pick something");
        assert_eq!(escape, bounds::safe_default(vp, size));
    }

    #[test]
    fn detect_and_resolve_writes_through_store() {
        let (vp, size) = desktop();
        let mut store = MascotStore::new();
        store.set_position(validate(Position::new(200.0, 100.0), vp, size));
        let mascot = mascot_rect(store.position(), vp, size);
        let view = FixtureView {
            mascot: Some(mascot),
            obstacles: vec![Rect::from_origin_size(
                mascot.left,
                mascot.top,
                mascot.width,
                mascot.height,
            )],
        };

        let mut detector = CollisionDetector::new();
        detector.detect_and_resolve(&view, &mut store, vp, size);

        let after = mascot_rect(store.position(), vp, size);
        assert!(!after.intersects_padded(&view.obstacles[0], COLLISION_PAD));
    }

    #[test]
    fn missing_mascot_rect_is_a_noop() {
        let (vp, size) = desktop();
        let mut store = MascotStore::new();
        let before = store.position();
        let view = FixtureView {
            mascot: None,
            obstacles: vec![Rect::from_origin_size(0.0, 0.0, 5000.0, 5000.0)],
        };
        CollisionDetector::new().detect_and_resolve(&view, &mut store, vp, size);
        assert_eq!(store.position(), before);
    }

    #[test]
    fn sanity_check_is_throttled() {
        let (vp, size) = desktop();
        let mut store = MascotStore::new();
        // Out-of-bounds position that the sanity pass should correct.
        store.set_position(Position::new(5000.0, 5000.0));
        let view = FixtureView {
            mascot: None,
            obstacles: Vec::new(),
        };

        let mut detector = CollisionDetector::new();
        detector.sanity_check(1000.0, &view, &mut store, vp, size);
        let corrected = store.position();
        assert!(PositionBounds::compute(vp, size).contains(corrected));

        // Drift again within the throttle window: no correction yet.
        store.set_position(Position::new(5000.0, 5000.0));
        detector.sanity_check(1500.0, &view, &mut store, vp, size);
        assert_eq!(store.position(), Position::new(5000.0, 5000.0));

        // Past the window the pass runs again.
        detector.sanity_check(3100.0, &view, &mut store, vp, size);
        assert_eq!(store.position(), corrected);
    }

    #[test]
    fn sanity_check_defers_to_active_drag() {
        let (vp, size) = desktop();
        let mut store = MascotStore::new();
        store.set_dragging(true);
        store.set_position(Position::new(5000.0, 5000.0));
        let view = FixtureView {
            mascot: None,
            obstacles: Vec::new(),
        };

        CollisionDetector::new().sanity_check(10_000.0, &view, &mut store, vp, size);
        assert_eq!(store.position(), Position::new(5000.0, 5000.0));
    }

    #[test]
    fn candidates_are_seven_and_validated_candidates_stay_in_bounds() {
        let (vp, size) = desktop();
        let bounds = PositionBounds::compute(vp, size);
        let candidates = candidate_positions(vp, size);
        assert_eq!(candidates.len(), 7);
        for c in candidates {
            assert!(bounds.contains(validate(c, vp, size)));
        }
    }
}
