use footfall_core::Curve;
use serde::{Deserialize, Serialize};

/// Step geometry for one speed.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GaitSample {
    pub length: f32,
    pub height: f32,
    pub distance: f32,
    /// Seconds per full left/right cycle.
    pub period: f32,
}

/// Speed-keyed step curves plus the walk/run split.
///
/// Running only differs from walking in that both feet may be in the air at
/// once; the curves are expected to be continuous across the threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitProfile {
    pub run_threshold: f32,
    pub step_length: Curve,
    pub step_height: Curve,
    pub step_distance: Curve,
    pub step_period: Curve,
}

impl Default for GaitProfile {
    fn default() -> Self {
        Self {
            run_threshold: 3.0,
            step_length: Curve::linear(0.0, 0.3, 5.0, 0.55),
            step_height: Curve::linear(0.0, 0.1, 5.0, 0.22),
            step_distance: Curve::linear(0.0, 0.35, 5.0, 0.55),
            step_period: Curve::linear(0.0, 0.5, 5.0, 0.25),
        }
    }
}

impl GaitProfile {
    /// Same geometry at every speed.
    pub fn fixed(length: f32, height: f32, distance: f32, period: f32, run_threshold: f32) -> Self {
        Self {
            run_threshold,
            step_length: Curve::constant(length),
            step_height: Curve::constant(height),
            step_distance: Curve::constant(distance),
            step_period: Curve::constant(period),
        }
    }

    #[inline]
    pub fn is_run(&self, speed: f32) -> bool { speed >= self.run_threshold }

    pub fn sample(&self, speed: f32) -> GaitSample {
        GaitSample {
            length: self.step_length.evaluate(speed),
            height: self.step_height.evaluate(speed),
            distance: self.step_distance.evaluate(speed),
            period: self.step_period.evaluate(speed),
        }
    }
}
