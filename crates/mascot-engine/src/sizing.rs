// sizing.rs
//
// Regression check for the mascot's visual footprint. The expected
// dimensions per breakpoint are locked here; live measurements are compared
// against them and the result is reported, never acted on. A sizing drift
// is a styling bug to fix, not something to auto-correct at runtime.

use serde::Serialize;

use crate::geometry::Breakpoint;

/// Measurements within this many pixels of the baseline pass. Sub-pixel
/// layout rounding on fractional device-pixel-ratio screens lands inside it.
pub const SIZE_TOLERANCE_PX: f64 = 1.0;

/// Expected dimensions for one breakpoint. The rendering canvas fills the
/// container, so both share a baseline.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SizingBaseline {
    pub container_width: f64,
    pub container_height: f64,
    pub surface_width: f64,
    pub surface_height: f64,
}

impl SizingBaseline {
    pub fn for_breakpoint(bp: Breakpoint) -> Self {
        let size = bp.container_size();
        Self {
            container_width: size.width,
            container_height: size.height,
            surface_width: size.width,
            surface_height: size.height,
        }
    }
}

/// One measured dimension against its baseline.
#[derive(Debug, Clone, Serialize)]
pub struct SizingCheck {
    pub label: &'static str,
    pub expected: f64,
    pub actual: f64,
    pub pass: bool,
}

impl SizingCheck {
    fn new(label: &'static str, expected: f64, actual: f64) -> Self {
        Self {
            label,
            expected,
            actual,
            pass: (actual - expected).abs() <= SIZE_TOLERANCE_PX,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizingReport {
    pub breakpoint: Breakpoint,
    pub checks: Vec<SizingCheck>,
    pub pass: bool,
}

/// Compare live measurements against the locked baseline for `bp`.
/// `surface` is `None` when the rendering canvas is not mounted; its checks
/// are skipped rather than failed (the visibility monitor owns that case).
pub fn validate_sizing(
    bp: Breakpoint,
    container: (f64, f64),
    surface: Option<(f64, f64)>,
) -> SizingReport {
    let baseline = SizingBaseline::for_breakpoint(bp);
    let mut checks = vec![
        SizingCheck::new("container_width", baseline.container_width, container.0),
        SizingCheck::new("container_height", baseline.container_height, container.1),
    ];
    if let Some((w, h)) = surface {
        checks.push(SizingCheck::new("surface_width", baseline.surface_width, w));
        checks.push(SizingCheck::new("surface_height", baseline.surface_height, h));
    }
    let pass = checks.iter().all(|c| c.pass);
    if !pass {
        for c in checks.iter().filter(|c| !c.pass) {
            log::warn!(
                "sizing: {} is {:.1}px, expected {:.1}px ({:?})",
                c.label,
                c.actual,
                c.expected,
                bp
            );
        }
    }
    SizingReport {
        breakpoint: bp,
        checks,
        pass,
    }
}
