//! Virtual trackball for horizontal orbiting.
//!
//! Horizontal cursor positions are lifted onto the unit sphere centred in the
//! viewport; the arc between two lifted points is the rotation angle about
//! the vertical axis.

use glam::{Vec2, Vec3};

use crate::quaternion::{AngleUnit, Quaternion};

/// Angles below this are treated as no motion.
const MIN_ANGLE: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trackball {
    /// Multiplier applied to every angle.
    pub sensitivity: f32,
}

impl Default for Trackball {
    fn default() -> Self {
        Self { sensitivity: 1.0 }
    }
}

impl Trackball {
    pub fn new(sensitivity: f32) -> Self {
        Self { sensitivity }
    }

    /// Lifts a horizontal viewport position onto the unit sphere.
    ///
    /// `x` is normalized to `[-1, 1]` across `width`; the result is
    /// `(nx, 0, sqrt(1 - nx²))`.
    pub fn project(x: f32, width: f32) -> Vec3 {
        let nx = if width > 0.0 {
            (2.0 * x / width - 1.0).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Vec3::new(nx, 0.0, (1.0 - nx * nx).max(0.0).sqrt())
    }

    /// Signed angle in radians swept from `anchor` to `destination`.
    ///
    /// Positive when the cursor moved right.
    pub fn angle(&self, anchor: Vec2, destination: Vec2, width: f32) -> f32 {
        let a = Self::project(anchor.x, width);
        let b = Self::project(destination.x, width);
        let theta = a.dot(b).clamp(-1.0, 1.0).acos();
        let sign = if destination.x < anchor.x { -1.0 } else { 1.0 };
        theta * sign * self.sensitivity
    }

    /// Rotation about `+Y` for the motion, or `None` when there is none.
    pub fn rotation(&self, anchor: Vec2, destination: Vec2, width: f32) -> Option<Quaternion> {
        let angle = self.angle(anchor, destination, width);
        if angle.abs() < MIN_ANGLE {
            return None;
        }
        Quaternion::from_angle_axis(angle, Vec3::Y, AngleUnit::Radians).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_lies_on_unit_sphere() {
        for x in [0.0, 100.0, 400.0, 650.0, 800.0] {
            let p = Trackball::project(x, 800.0);
            assert!((p.length() - 1.0).abs() < 1e-6);
            assert_eq!(p.y, 0.0);
        }
        assert_eq!(Trackball::project(400.0, 800.0), Vec3::Z);
        assert_eq!(Trackball::project(0.0, 800.0), Vec3::NEG_X);
        // Outside the viewport clamps to the rim.
        assert_eq!(Trackball::project(1200.0, 800.0), Vec3::X);
    }

    #[test]
    fn drag_across_half_width_is_quarter_turn() {
        let ball = Trackball::default();
        let angle = ball.angle(Vec2::new(400.0, 0.0), Vec2::new(800.0, 0.0), 800.0);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

        let back = ball.angle(Vec2::new(800.0, 0.0), Vec2::new(400.0, 0.0), 800.0);
        assert!((back + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn sensitivity_scales_angle() {
        let slow = Trackball::new(0.5);
        let angle = slow.angle(Vec2::new(400.0, 0.0), Vec2::new(800.0, 0.0), 800.0);
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn no_horizontal_motion_gives_no_rotation() {
        let ball = Trackball::default();
        assert!(ball.rotation(Vec2::new(300.0, 10.0), Vec2::new(300.0, 90.0), 800.0).is_none());
    }

    #[test]
    fn rotation_turns_about_vertical_axis() {
        let ball = Trackball::default();
        let q = ball
            .rotation(Vec2::new(400.0, 0.0), Vec2::new(800.0, 0.0), 800.0)
            .unwrap();
        let v = q.rotate(Vec3::Z);
        assert!((v - Vec3::X).length() < 1e-5);
    }
}
