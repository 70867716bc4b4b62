//! Linear interpolation for animated values

/// Linearly interpolate between `a` and `b`
///
/// Exact at both ends: `lerp(a, b, 0.0) == a` and `lerp(a, b, 1.0) == b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints_are_exact() {
        for (a, b) in [(0.0, 1.0), (-3.5, 12.25), (1e9, -1e-9), (0.1, 0.2)] {
            assert_eq!(lerp(a, b, 0.0), a);
            assert_eq!(lerp(a, b, 1.0), b);
        }
    }

    #[test]
    fn test_lerp_midpoints() {
        assert!((lerp(0.0, 1.0, 0.5) - 0.5).abs() < 1e-12);
        assert!((lerp(10.0, 20.0, 0.25) - 12.5).abs() < 1e-12);
    }
}
