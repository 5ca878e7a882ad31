//! Scalar smoothing helpers shared by the pipeline stages.

/// Linear interpolation from `a` to `b` by `t`.
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp to the unit interval.
pub(crate) fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Where `v` sits between `a` and `b`, clamped to [0, 1].
pub(crate) fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    clamp01((v - a) / (b - a))
}

/// Critically-damped approach of `current` toward `target` over roughly
/// `smooth_time` seconds, carrying momentum in `velocity`.
///
/// Stable for large `dt` (the exponential is approximated by a Padé-style
/// polynomial that never overshoots the asymptote).
pub(crate) fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    target + (change + temp) * exp
}
