use footfall_core::{Curve, Vec3};
use footfall_terrain::LayerMask;
use serde::{Deserialize, Serialize};

use crate::params::StepParameters;

/// Under-foot ground probe: a short ray, then a sphere-cast fallback whose
/// nearest hit must lie within `eps` of the foot.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundCheck {
    pub radius: f32,
    pub eps: f32,
    pub fallback: f32,
    /// Ray origin height above the foot.
    pub lift: f32,
}

impl Default for GroundCheck {
    fn default() -> Self { Self { radius: 0.25, eps: 0.15, fallback: 0.25, lift: 0.1 } }
}

/// Per-foot tuning. Distances in meters, angles in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootConfig {
    /// +1 for the foot on the body's right (+Z local), -1 for the left.
    pub side: f32,
    /// Resting lateral distance from the body centre line.
    pub spacing: f32,
    /// Closer than this to the centre line (or across it) forces a step.
    pub min_foot_spacing: f32,
    pub leg_length: f32,
    /// Pins the body height instead of measuring it at setup.
    pub body_height: Option<f32>,
    pub max_foot_angle: f32,
    pub max_step_height: f32,
    pub max_step_length: f32,
    /// Body-local offset added to the desired foothold.
    pub foot_offset: Vec3,
    /// Body-local authored foot forward.
    pub foot_forward: Vec3,
    pub ground_check: GroundCheck,
    pub sweep_radius: f32,
    pub graze_distance: f32,
    pub reach_slack: f32,
    pub side_step_radius: f32,
    /// How far a pose-level barrier correction may move a target.
    pub extend_budget: f32,
    pub mask: LayerMask,
    /// Speed-keyed steering of cycled targets toward the velocity.
    pub velocity_contribution: Curve,
    pub step: StepParameters,
}

impl Default for FootConfig {
    fn default() -> Self {
        Self {
            side: 1.0,
            spacing: 0.12,
            min_foot_spacing: 0.05,
            leg_length: 1.0,
            body_height: None,
            max_foot_angle: 40.0,
            max_step_height: 0.3,
            max_step_length: 0.6,
            foot_offset: Vec3::ZERO,
            foot_forward: Vec3::X,
            ground_check: GroundCheck::default(),
            sweep_radius: 0.1,
            graze_distance: 0.1,
            reach_slack: 0.1,
            side_step_radius: 0.2,
            extend_budget: 0.2,
            mask: LayerMask::ALL,
            velocity_contribution: Curve::linear(0.0, 0.0, 4.0, 0.3),
            step: StepParameters::default(),
        }
    }
}

impl FootConfig {
    pub fn left() -> Self { Self { side: -1.0, ..Self::default() } }
    pub fn right() -> Self { Self::default() }

    /// Signed lateral rest offset along the body's right axis.
    #[inline]
    pub fn signed_spacing(&self) -> f32 { self.side.signum() * self.spacing }
}
