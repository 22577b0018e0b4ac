// easing.rs
//
// Interpolation for the transition flight path. The horizontal track uses
// a quadratic ease-in-out; the vertical arc in transition.rs bends the same
// eased baseline up with a half-sine.

/// Quadratic ease-in-out over normalized time, clamped to [0, 1].
/// The flight math relies on the midpoint mapping exactly to 0.5.
#[inline]
pub fn quad_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (2.0 - 2.0 * t).powi(2) / 2.0
    }
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
