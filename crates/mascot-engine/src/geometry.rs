// geometry.rs
//
// Viewport, breakpoint and rectangle primitives.
// Pure math — no DOM, no timers.

use serde::{Deserialize, Serialize};

/// On-screen placement of the mascot, measured as pixel offsets from the
/// viewport's bottom and right edges (the container is anchored bottom-right).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub bottom: f64,
    pub right: f64,
}

impl Position {
    pub const fn new(bottom: f64, right: f64) -> Self {
        Self { bottom, right }
    }

    /// Both components are finite (no NaN/Infinity).
    pub fn is_finite(&self) -> bool {
        self.bottom.is_finite() && self.right.is_finite()
    }
}

/// Current viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn breakpoint(&self) -> Breakpoint {
        Breakpoint::from_width(self.width)
    }
}

/// Responsive breakpoint tier. The mascot container size is a step function
/// of this tier, never an interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    pub fn from_width(width: f64) -> Self {
        if width < 768.0 {
            Breakpoint::Mobile
        } else if width < 1024.0 {
            Breakpoint::Tablet
        } else {
            Breakpoint::Desktop
        }
    }

    /// Rendered container size for this tier. Recomputed on demand so a
    /// resize can never leave a stale size behind.
    pub fn container_size(self) -> ContainerSize {
        match self {
            Breakpoint::Mobile => ContainerSize::new(160.0, 192.0),
            Breakpoint::Tablet => ContainerSize::new(208.0, 240.0),
            Breakpoint::Desktop => ContainerSize::new(256.0, 288.0),
        }
    }
}

/// Pixel dimensions of the mascot container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box in viewport space (top/left origin).
/// Transient — computed per check from live layout data, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            bottom: top + height,
            right: left + width,
            width,
            height,
        }
    }

    /// Overlap test with a padding buffer: boxes that miss each other by less
    /// than `pad` pixels still count as intersecting.
    pub fn intersects_padded(&self, other: &Rect, pad: f64) -> bool {
        !(self.right + pad < other.left
            || self.left - pad > other.right
            || self.bottom + pad < other.top
            || self.top - pad > other.bottom)
    }

    /// Whether any part of the rect lies inside the viewport.
    pub fn intersects_viewport(&self, viewport: &Viewport) -> bool {
        self.right > 0.0
            && self.left < viewport.width
            && self.bottom > 0.0
            && self.top < viewport.height
    }
}

/// Bounding box the mascot occupies for a given position, converted from
/// bottom/right offsets into top/left viewport space.
pub fn mascot_rect(position: Position, viewport: Viewport, size: ContainerSize) -> Rect {
    let left = viewport.width - position.right - size.width;
    let top = viewport.height - position.bottom - size.height;
    Rect::from_origin_size(left, top, size.width, size.height)
}
