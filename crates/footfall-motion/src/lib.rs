//! Body motion provider.
//!
//! - `MotionState` is the per-tick snapshot the foot solvers read: rigid-body velocity,
//!   angular velocity, finite-difference acceleration, grounded flag, and the
//!   "momentary" values measured from the transform itself between ticks.
//! - It is plain serde data so a replication layer can ship it as-is.

use footfall_core::{angle_deg, planar, Vec3};
use serde::{Deserialize, Serialize};

/// One tick of raw body state, as read from the physics body and its transform.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BodySample {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub position: Vec3,
    pub forward: Vec3,
    pub grounded: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Damps the angular term of `predicted_direction` over the horizon.
    pub angular_drag: f32,
}
impl Default for MotionParams {
    fn default() -> Self { Self { angular_drag: 0.05 } }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    initialized: bool,
    velocity: Vec3,
    angular_velocity: Vec3,
    acceleration: Vec3,
    grounded: bool,
    position: Vec3,
    look_dir: Vec3,
    /// Position change since the previous sample.
    momentary_velocity: Vec3,
    /// Angle in degrees between the previous and current forward vectors.
    momentary_angular_velocity: f32,
    #[serde(default)]
    pub params: MotionParams,
}

impl MotionState {
    pub fn new(params: MotionParams) -> Self { Self { params, ..Default::default() } }

    /// Folds in a new sample. The first sample only seeds the state: acceleration
    /// and momentary values stay zero until there is a previous tick to compare to.
    pub fn update(&mut self, s: &BodySample, dt: f32) {
        if self.initialized {
            self.acceleration = if dt > 0.0 { (s.velocity - self.velocity) / dt } else { Vec3::ZERO };
            self.momentary_velocity = s.position - self.position;
            self.momentary_angular_velocity = angle_deg(self.look_dir, s.forward);
        } else {
            self.acceleration = Vec3::ZERO;
            self.momentary_velocity = Vec3::ZERO;
            self.momentary_angular_velocity = 0.0;
        }
        self.velocity = s.velocity;
        self.angular_velocity = s.angular_velocity;
        self.position = s.position;
        self.look_dir = s.forward;
        self.grounded = s.grounded;
        self.initialized = true;
    }

    pub fn set_grounded(&mut self, grounded: bool) { self.grounded = grounded; }

    #[inline] pub fn initialized(&self) -> bool { self.initialized }
    #[inline] pub fn velocity(&self) -> Vec3 { self.velocity }
    #[inline] pub fn planar_velocity(&self) -> Vec3 { planar(self.velocity) }
    #[inline] pub fn angular_velocity(&self) -> Vec3 { self.angular_velocity }
    #[inline] pub fn acceleration(&self) -> Vec3 { self.acceleration }
    #[inline] pub fn grounded(&self) -> bool { self.grounded }
    #[inline] pub fn position(&self) -> Vec3 { self.position }
    #[inline] pub fn look_dir(&self) -> Vec3 { self.look_dir }
    #[inline] pub fn momentary_velocity(&self) -> Vec3 { self.momentary_velocity }
    #[inline] pub fn momentary_angular_velocity(&self) -> f32 { self.momentary_angular_velocity }

    /// `v + dt·a`
    pub fn predicted_velocity(&self, dt: f32) -> Vec3 {
        self.velocity + self.acceleration * dt
    }

    /// `dir + dt·ω·(1 − drag·dt)`
    pub fn predicted_direction(&self, dir: Vec3, dt: f32) -> Vec3 {
        dir + self.angular_velocity * dt * (1.0 - self.params.angular_drag * dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(v: Vec3, p: Vec3, fwd: Vec3) -> BodySample {
        BodySample { velocity: v, angular_velocity: Vec3::ZERO, position: p, forward: fwd, grounded: true }
    }

    #[test]
    fn first_sample_only_seeds() {
        let mut m = MotionState::default();
        m.update(&sample(Vec3::X * 2.0, Vec3::ONE, Vec3::X), 0.1);
        assert!(m.initialized());
        assert_eq!(m.acceleration(), Vec3::ZERO);
        assert_eq!(m.momentary_velocity(), Vec3::ZERO);
        assert_eq!(m.velocity(), Vec3::X * 2.0);
    }

    #[test]
    fn finite_differences() {
        let mut m = MotionState::default();
        m.update(&sample(Vec3::X, Vec3::ZERO, Vec3::X), 0.5);
        m.update(&sample(Vec3::X * 2.0, Vec3::new(0.5, 0.0, 0.0), Vec3::Z), 0.5);
        assert_abs_diff_eq!(m.acceleration().x, 2.0, epsilon = 1e-6);
        assert_eq!(m.momentary_velocity(), Vec3::new(0.5, 0.0, 0.0));
        assert_abs_diff_eq!(m.momentary_angular_velocity(), 90.0, epsilon = 1e-3);
        // v + dt a
        assert_abs_diff_eq!(m.predicted_velocity(0.25).x, 2.5, epsilon = 1e-6);
    }

    #[test]
    fn direction_predictor_applies_drag() {
        let mut m = MotionState::default();
        let mut s = sample(Vec3::ZERO, Vec3::ZERO, Vec3::X);
        s.angular_velocity = Vec3::new(0.0, 2.0, 0.0);
        m.update(&s, 0.1);
        let d = m.predicted_direction(Vec3::X, 0.5);
        // 2 * 0.5 * (1 - 0.05 * 0.5)
        assert_abs_diff_eq!(d.y, 0.975, epsilon = 1e-6);
        assert_eq!(d.x, 1.0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut m = MotionState::default();
        m.update(&sample(Vec3::X, Vec3::ONE, Vec3::X), 0.1);
        let s = serde_json::to_string(&m).unwrap();
        let back: MotionState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, m);
    }
}
