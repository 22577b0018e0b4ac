// drag.rs
//
// Pointer/touch drag gestures translated into validated position updates.
// Validation happens on every move, not just on release, so the mascot can
// never be dragged out of bounds even mid-gesture.

use glam::DVec2;

use crate::bounds::validate;
use crate::geometry::{ContainerSize, Position, Viewport};
use crate::store::MascotStore;

pub struct DragController {
    active: bool,
    grab_pointer: DVec2,
    grab_position: Position,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            active: false,
            grab_pointer: DVec2::ZERO,
            grab_position: Position::new(0.0, 0.0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a gesture at the given pointer location. Marks the shared
    /// dragging flag so periodic checks do not fight the user's hand.
    pub fn begin(&mut self, pointer: DVec2, store: &mut MascotStore) {
        self.active = true;
        self.grab_pointer = pointer;
        self.grab_position = store.position();
        store.set_dragging(true);
    }

    /// Pointer moved. Screen-space deltas map inversely onto the
    /// bottom/right offsets (dragging down shrinks `bottom`).
    pub fn update(
        &mut self,
        pointer: DVec2,
        viewport: Viewport,
        size: ContainerSize,
        store: &mut MascotStore,
    ) {
        if !self.active {
            return;
        }
        let delta = pointer - self.grab_pointer;
        let candidate = Position::new(
            self.grab_position.bottom - delta.y,
            self.grab_position.right - delta.x,
        );
        store.set_position(validate(candidate, viewport, size));
    }

    /// Gesture released. Re-validates the resting position and clears the
    /// dragging flag.
    pub fn end(&mut self, viewport: Viewport, size: ContainerSize, store: &mut MascotStore) {
        if !self.active {
            return;
        }
        self.active = false;
        let settled = validate(store.position(), viewport, size);
        store.set_position(settled);
        store.set_dragging(false);
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{PositionBounds, MIN_RIGHT};

    fn mobile() -> (Viewport, ContainerSize) {
        let vp = Viewport::new(390.0, 844.0);
        (vp, vp.breakpoint().container_size())
    }

    #[test]
    fn drag_moves_with_pointer() {
        let (vp, size) = mobile();
        let mut store = MascotStore::new();
        store.set_position(Position::new(200.0, 120.0));

        let mut drag = DragController::new();
        drag.begin(DVec2::new(100.0, 500.0), &mut store);
        assert!(store.dragging());

        // Pointer moves 10px left and 20px up: right/bottom offsets grow.
        drag.update(DVec2::new(90.0, 480.0), vp, size, &mut store);
        assert_eq!(store.position(), Position::new(220.0, 130.0));

        drag.end(vp, size, &mut store);
        assert!(!store.dragging());
    }

    #[test]
    fn mid_gesture_positions_are_clamped() {
        let (vp, size) = mobile();
        let bounds = PositionBounds::compute(vp, size);
        let mut store = MascotStore::new();
        store.set_position(Position::new(200.0, 120.0));

        let mut drag = DragController::new();
        drag.begin(DVec2::new(100.0, 500.0), &mut store);
        // Fling far off to the right edge — equivalent to right: -999.
        drag.update(DVec2::new(100.0 + 1119.0, 500.0), vp, size, &mut store);
        assert_eq!(store.position().right, MIN_RIGHT);
        assert!(bounds.contains(store.position()));
    }

    #[test]
    fn update_without_begin_is_ignored() {
        let (vp, size) = mobile();
        let mut store = MascotStore::new();
        let before = store.position();
        let mut drag = DragController::new();
        drag.update(DVec2::new(10.0, 10.0), vp, size, &mut store);
        assert_eq!(store.position(), before);
        assert!(!store.dragging());
    }

    #[test]
    fn release_revalidates_resting_position() {
        let (vp, size) = mobile();
        let mut store = MascotStore::new();
        let mut drag = DragController::new();
        drag.begin(DVec2::ZERO, &mut store);
        drag.end(vp, size, &mut store);
        assert!(PositionBounds::compute(vp, size).contains(store.position()));
    }
}
