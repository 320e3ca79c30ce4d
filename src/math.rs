// Math utilities and helper functions

use glam::DVec2;

/// Angle in radians of the ray from `origin` to `target`.
///
/// Measured with `atan2`, so the result is in `(-PI, PI]` with 0 pointing
/// along +x and `PI/2` along +y (down, in screen coordinates).
pub fn angle_from(origin: DVec2, target: DVec2) -> f64 {
    (target.y - origin.y).atan2(target.x - origin.x)
}

/// Unit vector pointing along `angle` radians.
pub fn direction(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Check if two f64 values are approximately equal
pub fn approx_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_angle_from_cardinal_directions() {
        let origin = DVec2::ZERO;
        assert_relative_eq!(angle_from(origin, DVec2::new(1.0, 0.0)), 0.0);
        assert_relative_eq!(angle_from(origin, DVec2::new(0.0, 1.0)), FRAC_PI_2);
        assert_relative_eq!(angle_from(origin, DVec2::new(-1.0, 0.0)), PI);
        assert_relative_eq!(angle_from(origin, DVec2::new(0.0, -1.0)), -FRAC_PI_2);
    }

    #[test]
    fn test_angle_from_coincident_points() {
        // atan2(0, 0) is defined as 0, so coincident centers get +x
        assert_eq!(angle_from(DVec2::new(3.0, 4.0), DVec2::new(3.0, 4.0)), 0.0);
    }

    #[test]
    fn test_direction_round_trip() {
        let angle = 0.37;
        let dir = direction(angle);
        assert_relative_eq!(angle_from(DVec2::ZERO, dir), angle);
        assert_relative_eq!(dir.length(), 1.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(1.0, 1.00001, 0.0001));
        assert!(!approx_equal(1.0, 1.1, 0.01));
    }
}
