// store.rs
//
// Observable state container for the shared position/visibility record.
// Single owned mutable record; listeners are notified synchronously on
// write. Last write wins — there is no queuing or merging of candidates.

use crate::bounds::FALLBACK_POSITION;
use crate::geometry::Position;

/// A change that was just committed to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreChange {
    Position(Position),
    Visibility(bool),
    Dragging(bool),
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(StoreChange)>;

pub struct MascotStore {
    position: Position,
    visible: bool,
    dragging: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_sub: u32,
}

impl MascotStore {
    pub fn new() -> Self {
        Self {
            position: FALLBACK_POSITION,
            visible: true,
            dragging: false,
            listeners: Vec::new(),
            next_sub: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn dragging(&self) -> bool {
        self.dragging
    }

    /// Commit a new position. Listeners run synchronously and must not write
    /// back into the store from inside the callback.
    pub fn set_position(&mut self, position: Position) {
        if position == self.position {
            return;
        }
        self.position = position;
        self.notify(StoreChange::Position(position));
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        self.notify(StoreChange::Visibility(visible));
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        if dragging == self.dragging {
            return;
        }
        self.dragging = dragging;
        self.notify(StoreChange::Dragging(dragging));
    }

    pub fn subscribe(&mut self, listener: impl FnMut(StoreChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_sub);
        self.next_sub += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, change: StoreChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(change);
        }
    }
}

impl Default for MascotStore {
    fn default() -> Self {
        Self::new()
    }
}
