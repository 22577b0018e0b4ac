// transition.rs
//
// Page-transition flight: on route change the mascot hops to a random
// corner along a parabolic arc. Per-frame samples bypass the validator;
// the final landing point is validated before it is committed.

use crate::bounds::{validate, PositionBounds};
use crate::easing::{lerp, quad_in_out};
use crate::geometry::{ContainerSize, Position, Viewport};
use crate::rng::Rng;

/// Flight duration. Frame cadence comes from the display's repaint signal,
/// so the number of samples per flight varies with refresh rate.
pub const TRANSITION_DURATION_MS: f64 = 800.0;
/// The arc peaks this far above the higher of the two endpoints.
pub const ARC_PEAK_PX: f64 = 100.0;

/// One in-flight hop from `from` to `to`.
#[derive(Debug, Clone, Copy)]
struct Flight {
    from: Position,
    to: Position,
    start_ms: f64,
}

impl Flight {
    /// Position at `now_ms` plus a completion flag.
    ///
    /// Horizontal: quadratic ease-in-out. Vertical: the eased baseline bent
    /// up to `peak` by a half-sine, so the mid-flight height sits above both
    /// endpoints and the curve lands exactly on `to`.
    fn sample(&self, now_ms: f64) -> (Position, bool) {
        let t = ((now_ms - self.start_ms) / TRANSITION_DURATION_MS).clamp(0.0, 1.0);
        let k = quad_in_out(t);
        let right = lerp(self.from.right, self.to.right, k);
        let base = lerp(self.from.bottom, self.to.bottom, k);
        let peak = self.from.bottom.max(self.to.bottom) + ARC_PEAK_PX;
        let bottom = lerp(base, peak, (std::f64::consts::PI * t).sin());
        (Position::new(bottom, right), t >= 1.0)
    }
}

pub struct TransitionAnimator {
    flight: Option<Flight>,
    last_route: Option<String>,
    rng: Rng,
}

impl TransitionAnimator {
    pub fn new(seed: u64) -> Self {
        Self {
            flight: None,
            last_route: None,
            rng: Rng::new(seed),
        }
    }

    pub fn is_active(&self) -> bool {
        self.flight.is_some()
    }

    /// Cancel any in-flight hop (a newer route change supersedes it).
    pub fn cancel(&mut self) {
        self.flight = None;
    }

    /// Route changed. No-op on the first observed route, on an unchanged
    /// path, or while the mascot is hidden. Returns whether a flight began.
    pub fn on_route_change(
        &mut self,
        path: &str,
        now_ms: f64,
        visible: bool,
        current: Position,
        viewport: Viewport,
        size: ContainerSize,
    ) -> bool {
        let first_observation = self.last_route.is_none();
        let unchanged = self.last_route.as_deref() == Some(path);
        self.last_route = Some(path.to_string());

        if first_observation || unchanged || !visible {
            return false;
        }

        self.cancel();
        let landing = self.pick_landing(viewport, size);
        log::debug!(
            "transition: flying to bottom={:.0} right={:.0} for route {}",
            landing.bottom,
            landing.right,
            path
        );
        self.flight = Some(Flight {
            from: current,
            to: landing,
            start_ms: now_ms,
        });
        true
    }

    /// Per-frame sample. Returns `None` while idle; on the completing frame
    /// the flight is cleared and the validated landing point is returned.
    pub fn sample(
        &mut self,
        now_ms: f64,
        viewport: Viewport,
        size: ContainerSize,
    ) -> Option<Position> {
        let flight = self.flight?;
        let (position, done) = flight.sample(now_ms);
        if done {
            self.flight = None;
            // Viewport may have changed mid-flight; the landing must obey
            // the bounds in force now.
            return Some(validate(flight.to, viewport, size));
        }
        Some(position)
    }

    /// One of the four corners of the roamable region, picked at random.
    fn pick_landing(&mut self, viewport: Viewport, size: ContainerSize) -> Position {
        let b = PositionBounds::compute(viewport, size);
        let corners: [Position; crate::rng::CORNER_COUNT] = [
            Position::new(b.min_bottom, b.min_right),
            Position::new(b.min_bottom, b.max_right),
            Position::new(b.max_bottom, b.min_right),
            Position::new(b.max_bottom, b.max_right),
        ];
        let pick = corners[self.rng.pick_corner()];
        validate(pick, viewport, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> (Viewport, ContainerSize) {
        let vp = Viewport::new(1440.0, 900.0);
        (vp, vp.breakpoint().container_size())
    }

    fn animator_with_route(path: &str) -> TransitionAnimator {
        let mut a = TransitionAnimator::new(42);
        let (vp, size) = desktop();
        // First observation never animates; it only primes the route.
        assert!(!a.on_route_change(path, 0.0, true, Position::new(200.0, 100.0), vp, size));
        a
    }

    #[test]
    fn first_route_observation_does_not_animate() {
        let a = animator_with_route("/home");
        assert!(!a.is_active());
    }

    #[test]
    fn unchanged_route_is_a_noop() {
        let (vp, size) = desktop();
        let mut a = animator_with_route("/home");
        assert!(!a.on_route_change("/home", 100.0, true, Position::new(200.0, 100.0), vp, size));
    }

    #[test]
    fn hidden_mascot_does_not_fly() {
        let (vp, size) = desktop();
        let mut a = animator_with_route("/home");
        assert!(!a.on_route_change("/games", 100.0, false, Position::new(200.0, 100.0), vp, size));
        assert!(!a.is_active());
    }

    #[test]
    fn midpoint_arcs_above_both_endpoints() {
        // Flight 200 -> 250 over 800ms: at t=400ms the vertical value must
        // exceed both endpoints and the horizontal sits at ~50%.
        let flight = Flight {
            from: Position::new(200.0, 100.0),
            to: Position::new(250.0, 150.0),
            start_ms: 0.0,
        };
        let (mid, done) = flight.sample(400.0);
        assert!(!done);
        assert!(mid.bottom > 250.0, "arc peak region, got {}", mid.bottom);
        assert!((mid.right - 125.0).abs() < 1e-6, "ease(0.5)=0.5");
        // Peak is max(start, end) + 100 exactly at the half-sine crest.
        assert!((mid.bottom - 350.0).abs() < 1e-6);
    }

    #[test]
    fn flight_lands_on_target() {
        let flight = Flight {
            from: Position::new(200.0, 100.0),
            to: Position::new(250.0, 150.0),
            start_ms: 1000.0,
        };
        let (end, done) = flight.sample(1800.0);
        assert!(done);
        assert_eq!(end, Position::new(250.0, 150.0));
    }

    #[test]
    fn completing_sample_returns_validated_landing_and_clears() {
        let (vp, size) = desktop();
        let mut a = animator_with_route("/home");
        assert!(a.on_route_change("/games", 0.0, true, Position::new(200.0, 100.0), vp, size));
        assert!(a.is_active());

        let landing = a.sample(900.0, vp, size).expect("final sample");
        assert!(PositionBounds::compute(vp, size).contains(landing));
        assert!(!a.is_active());
        assert_eq!(a.sample(950.0, vp, size), None);
    }

    #[test]
    fn new_route_cancels_in_flight_hop() {
        let (vp, size) = desktop();
        let mut a = animator_with_route("/home");
        assert!(a.on_route_change("/games", 0.0, true, Position::new(200.0, 100.0), vp, size));
        let mid = a.sample(200.0, vp, size).expect("in flight");

        // Second navigation lands before the first flight finishes.
        assert!(a.on_route_change("/stories", 300.0, true, mid, vp, size));
        assert!(a.is_active());
        // The replacement flight starts from the interrupted position.
        let sampled = a.sample(300.0, vp, size).expect("restarted");
        assert!((sampled.bottom - mid.bottom).abs() < 1e-6);
        assert!((sampled.right - mid.right).abs() < 1e-6);
    }

    #[test]
    fn landing_spots_are_valid_corners() {
        let (vp, size) = desktop();
        let bounds = PositionBounds::compute(vp, size);
        let mut a = TransitionAnimator::new(7);
        for _ in 0..20 {
            let p = a.pick_landing(vp, size);
            assert!(bounds.contains(p));
        }
    }
}
