//! Time-parameterized rigid-body poses.
//!
//! A [`PoseGenerator`] turns elapsed time into a [`Pose`]: a tumbling
//! orientation built from two constant angular velocities about the world Y
//! and X axes, plus a position that wobbles around a fixed base position along
//! a sum of sinusoids.
//!
//! The generator holds only its base position, its start time and its rates,
//! all fixed at construction. Evaluating it twice with the same elapsed time
//! yields the same pose, bit for bit.
//!
//! # Invocation
//!
//! Poses can be pushed or pulled:
//!
//! - **Push**: attach an [`Animator`](crate::Animator) to an entity and let
//!   [`update_world`](crate::update_world) write poses into transforms once per frame.
//! - **Pull**: read the clock in a render loop and call
//!   [`PoseGenerator::model_matrix`] before each draw.
//!
//! # Example
//!
//! ```
//! use tumble::{PoseGenerator, Vec3};
//!
//! let generator = PoseGenerator::new(Vec3::new(-2.0, 10.0, 0.0), 0.0);
//! let pose = generator.pose_at(1.0);
//!
//! assert!(pose.orientation.is_normalized());
//! ```

use glam::{Mat4, Quat, Vec3};

use crate::mesh::Transform;

/// Angular velocities and wobble speed of a [`PoseGenerator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseRates {
    /// Rotation speed about the world Y axis, in degrees per second.
    pub yaw_deg_per_sec: f64,
    /// Rotation speed about the world X axis, in degrees per second.
    pub pitch_deg_per_sec: f64,
    /// Factor applied to elapsed time before evaluating the wobble sinusoids.
    pub wobble_time_scale: f64,
}

impl PoseRates {
    /// Rates used by the scene demo: 40°/s about Y, 81°/s about X.
    pub const SCENE: Self = Self {
        yaw_deg_per_sec: 40.0,
        pitch_deg_per_sec: 81.0,
        wobble_time_scale: 1.0,
    };

    /// Rates used by the immediate-loop demo: 45°/s about Y, 81°/s about X,
    /// and a wobble running at 0.3× speed.
    pub const IMMEDIATE: Self = Self {
        yaw_deg_per_sec: 45.0,
        pitch_deg_per_sec: 81.0,
        wobble_time_scale: 0.3,
    };
}

impl Default for PoseRates {
    fn default() -> Self {
        Self::SCENE
    }
}

/// Orientation and position of an animated object for one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Unit quaternion, `rotation_y * rotation_x`.
    pub orientation: Quat,
    /// Base position plus the wobble offset.
    pub offset: Vec3,
}

impl Pose {
    /// Rigid transform matrix: rotate, then translate to `offset`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.offset)
    }

    /// Writes this pose into a transform, leaving its scale untouched.
    pub fn apply_to(&self, transform: &mut Transform) {
        transform.position = self.offset;
        transform.rotation = self.orientation;
    }
}

/// Produces the pose of a spinning object as a function of time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseGenerator {
    base_position: Vec3,
    start_time: f64,
    rates: PoseRates,
}

impl PoseGenerator {
    /// Creates a generator with [`PoseRates::SCENE`].
    ///
    /// `start_time` is the clock reading (in seconds) that counts as elapsed
    /// time zero for this object.
    pub fn new(base_position: Vec3, start_time: f64) -> Self {
        Self::with_rates(base_position, start_time, PoseRates::SCENE)
    }

    /// Creates a generator with custom rates.
    pub fn with_rates(base_position: Vec3, start_time: f64, rates: PoseRates) -> Self {
        Self {
            base_position,
            start_time,
            rates,
        }
    }

    /// Seconds elapsed between this generator's start time and `now`.
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.start_time
    }

    /// Pose for a clock reading `now`.
    pub fn pose_at(&self, now: f64) -> Pose {
        self.pose_at_elapsed(self.elapsed(now))
    }

    /// Pose after `elapsed` seconds of animation.
    pub fn pose_at_elapsed(&self, elapsed: f64) -> Pose {
        let yaw = Quat::from_rotation_y(self.yaw_radians(elapsed));
        let pitch = Quat::from_rotation_x(self.pitch_radians(elapsed));

        Pose {
            orientation: (yaw * pitch).normalize(),
            offset: self.base_position + self.wobble(elapsed),
        }
    }

    /// Model matrix for a clock reading `now`, built step by step from identity.
    ///
    /// Composes translate(base) → translate(wobble) → rotate(Y) → rotate(X),
    /// the way an immediate render loop stacks its model-view operations.
    /// The result matches `self.pose_at(now).matrix()`.
    pub fn model_matrix(&self, now: f64) -> Mat4 {
        let elapsed = self.elapsed(now);

        let mut model = Mat4::IDENTITY;
        model *= Mat4::from_translation(self.base_position);
        model *= Mat4::from_translation(self.wobble(elapsed));
        model *= Mat4::from_rotation_y(self.yaw_radians(elapsed));
        model *= Mat4::from_rotation_x(self.pitch_radians(elapsed));
        model
    }

    fn yaw_radians(&self, elapsed: f64) -> f32 {
        wrapped_radians(self.rates.yaw_deg_per_sec * elapsed)
    }

    fn pitch_radians(&self, elapsed: f64) -> f32 {
        wrapped_radians(self.rates.pitch_deg_per_sec * elapsed)
    }

    fn wobble(&self, elapsed: f64) -> Vec3 {
        let t = elapsed * self.rates.wobble_time_scale;
        Vec3::new(
            ((2.1 * t).sin() * 0.5) as f32,
            ((1.7 * t).cos() * 0.5) as f32,
            ((1.3 * t).sin() * (1.5 * t).cos() * 2.0) as f32,
        )
    }
}

/// Reduces an angle to [0, 360) degrees in f64 before narrowing, so long
/// runs keep full f32 precision.
fn wrapped_radians(degrees: f64) -> f32 {
    degrees.rem_euclid(360.0).to_radians() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn samples() -> impl Iterator<Item = f64> {
        (0..=10_000).map(|i| i as f64 * 0.1)
    }

    #[test]
    fn same_elapsed_gives_identical_pose() {
        let generator = PoseGenerator::new(Vec3::new(-2.0, 10.0, 0.0), 3.25);
        for elapsed in [0.0, 0.016, 1.0, 17.3, 999.9] {
            let a = generator.pose_at_elapsed(elapsed);
            let b = generator.pose_at_elapsed(elapsed);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn pose_at_zero_is_identity_with_cosine_lift() {
        let base = Vec3::new(2.0, 15.0, 0.0);
        let pose = PoseGenerator::new(base, 0.0).pose_at_elapsed(0.0);

        assert_abs_diff_eq!(pose.orientation.x, 0.0);
        assert_abs_diff_eq!(pose.orientation.y, 0.0);
        assert_abs_diff_eq!(pose.orientation.z, 0.0);
        assert_abs_diff_eq!(pose.orientation.w, 1.0);

        // y uses cosine, so the cube starts half a unit above its base.
        assert_abs_diff_eq!(pose.offset.x, base.x);
        assert_abs_diff_eq!(pose.offset.y, base.y + 0.5);
        assert_abs_diff_eq!(pose.offset.z, base.z);
    }

    #[test]
    fn orientation_stays_unit_length() {
        let generator = PoseGenerator::new(Vec3::ZERO, 0.0);
        for elapsed in samples() {
            let q = generator.pose_at_elapsed(elapsed).orientation;
            assert_relative_eq!(q.length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn long_runs_keep_angle_precision() {
        let generator = PoseGenerator::new(Vec3::ZERO, 0.0);
        // 40000 deg about Y and 81000 deg about X: 40 deg and 0 deg once wrapped
        let q = generator.pose_at_elapsed(1000.0).orientation;
        let expected = Quat::from_rotation_y(40f32.to_radians());
        assert!(q.abs_diff_eq(expected, 1e-6), "{:?} vs {:?}", q, expected);
    }

    #[test]
    fn negative_angles_wrap_into_range() {
        assert_relative_eq!(wrapped_radians(-90.0), 270f32.to_radians(), epsilon = 1e-6);
        assert_abs_diff_eq!(wrapped_radians(720.0), 0.0);
    }

    #[test]
    fn wobble_stays_in_bounds() {
        let generator = PoseGenerator::new(Vec3::ZERO, 0.0);
        for elapsed in samples() {
            let offset = generator.pose_at_elapsed(elapsed).offset;
            assert!((-0.5..=0.5).contains(&offset.x), "x = {}", offset.x);
            assert!((-0.5..=0.5).contains(&offset.y), "y = {}", offset.y);
            assert!((-2.0..=2.0).contains(&offset.z), "z = {}", offset.z);
        }
    }

    #[test]
    fn shifted_start_time_shifts_phase() {
        let delta = 1.0;
        let plain = PoseGenerator::new(Vec3::new(-2.0, 10.0, 0.0), 0.0);
        let shifted = PoseGenerator::new(Vec3::new(-2.0, 10.0, 0.0), delta);

        for t in [0.0, 0.5, 2.0, 42.0, 600.0] {
            let a = shifted.pose_at(t + delta);
            let b = plain.pose_at(t);
            assert!(a.offset.abs_diff_eq(b.offset, 1e-5), "t = {t}");
            assert!(a.orientation.abs_diff_eq(b.orientation, 1e-5), "t = {t}");
        }
    }

    #[test]
    fn one_second_scenario() {
        let pose = PoseGenerator::new(Vec3::ZERO, 0.0).pose_at_elapsed(1.0);

        assert_relative_eq!(pose.offset.x, 0.431_604_7, epsilon = 1e-5);
        assert_relative_eq!(pose.offset.y, -0.064_422_25, epsilon = 1e-5);
        assert_relative_eq!(pose.offset.z, 0.136_318_8, epsilon = 1e-5);

        // qY(40°) * qX(81°)
        let q = pose.orientation;
        assert_relative_eq!(q.x, 0.610_281_5, epsilon = 1e-5);
        assert_relative_eq!(q.y, 0.260_074_2, epsilon = 1e-5);
        assert_relative_eq!(q.z, -0.222_124_3, epsilon = 1e-5);
        assert_relative_eq!(q.w, 0.714_547_9, epsilon = 1e-5);
    }

    #[test]
    fn yaw_is_applied_before_pitch_in_the_product() {
        let pose = PoseGenerator::new(Vec3::ZERO, 0.0).pose_at_elapsed(1.0);
        let yaw_then_pitch =
            Quat::from_rotation_y(40f32.to_radians()) * Quat::from_rotation_x(81f32.to_radians());
        let pitch_then_yaw =
            Quat::from_rotation_x(81f32.to_radians()) * Quat::from_rotation_y(40f32.to_radians());

        assert!(pose.orientation.abs_diff_eq(yaw_then_pitch, 1e-5));
        assert!(!pose.orientation.abs_diff_eq(pitch_then_yaw, 1e-3));
    }

    #[test]
    fn model_matrix_matches_pose_matrix() {
        for rates in [PoseRates::SCENE, PoseRates::IMMEDIATE] {
            let generator = PoseGenerator::with_rates(Vec3::new(0.0, 0.0, -4.0), 0.5, rates);
            for now in [0.5, 1.0, 3.7, 120.0] {
                let pulled = generator.model_matrix(now);
                let pushed = generator.pose_at(now).matrix();
                assert!(pulled.abs_diff_eq(pushed, 1e-4), "now = {now}");
            }
        }
    }

    #[test]
    fn immediate_rates_slow_the_wobble() {
        let generator = PoseGenerator::with_rates(Vec3::ZERO, 0.0, PoseRates::IMMEDIATE);
        let pose = generator.pose_at_elapsed(10.0);

        // wobble evaluated at 0.3 * 10 = 3 seconds
        assert_relative_eq!(pose.offset.x, (0.5 * (2.1f64 * 3.0).sin()) as f32, epsilon = 1e-5);
        assert_relative_eq!(pose.offset.y, (0.5 * (1.7f64 * 3.0).cos()) as f32, epsilon = 1e-5);
    }

    #[test]
    fn apply_to_keeps_scale() {
        let mut transform = Transform {
            scale: Vec3::splat(3.0),
            ..Transform::new()
        };
        let pose = PoseGenerator::new(Vec3::new(1.0, 2.0, 3.0), 0.0).pose_at_elapsed(0.25);

        pose.apply_to(&mut transform);

        assert_eq!(transform.position, pose.offset);
        assert_eq!(transform.rotation, pose.orientation);
        assert_eq!(transform.scale, Vec3::splat(3.0));
    }

    #[test]
    fn elapsed_is_measured_from_start_time() {
        let generator = PoseGenerator::new(Vec3::ZERO, 2.5);
        assert_eq!(generator.elapsed(4.0), 1.5);
        assert_eq!(generator.pose_at(2.5), generator.pose_at_elapsed(0.0));
    }
}
