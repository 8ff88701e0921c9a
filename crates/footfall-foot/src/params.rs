use serde::{Deserialize, Serialize};

/// Staged values below this difference are treated as unchanged.
pub const STEP_PARAM_EPS: f32 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepValues {
    /// Forward reach of a step from the resting point (m).
    pub length: f32,
    /// Peak lift of the swing arc (m).
    pub height: f32,
    /// Distance from the resting point that triggers a step (m).
    pub distance: f32,
    /// Swing progress per second; one swing takes `1 / speed` seconds.
    pub speed: f32,
}

impl Default for StepValues {
    fn default() -> Self { Self { length: 0.4, height: 0.15, distance: 0.45, speed: 4.0 } }
}

/// Step geometry with deferred writes.
///
/// Setters only stage a value. Staged values become visible on
/// [`try_apply_mutation`](Self::try_apply_mutation), which the solver calls when a
/// swing completes, or on [`force_apply`](Self::force_apply). A swing in flight
/// therefore always sees the geometry it started with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StepValues", into = "StepValues")]
pub struct StepParameters {
    current: StepValues,
    pending: StepValues,
    dirty: bool,
}

impl From<StepValues> for StepParameters {
    fn from(v: StepValues) -> Self { Self::new(v) }
}
impl From<StepParameters> for StepValues {
    fn from(p: StepParameters) -> Self { p.current }
}

#[inline]
fn stage(current: f32, value: f32, slot: &mut f32, dirty: &mut bool) {
    *dirty |= (current - value).abs() > STEP_PARAM_EPS;
    if *dirty { *slot = value; }
}

impl StepParameters {
    pub fn new(values: StepValues) -> Self { Self { current: values, pending: values, dirty: false } }

    #[inline] pub fn values(&self) -> StepValues { self.current }
    #[inline] pub fn pending(&self) -> StepValues { self.pending }
    #[inline] pub fn is_mutated(&self) -> bool { self.dirty }

    #[inline] pub fn step_length(&self) -> f32 { self.current.length }
    #[inline] pub fn step_height(&self) -> f32 { self.current.height }
    #[inline] pub fn step_distance(&self) -> f32 { self.current.distance }
    #[inline] pub fn step_speed(&self) -> f32 { self.current.speed }

    pub fn set_step_length(&mut self, v: f32) { stage(self.current.length, v, &mut self.pending.length, &mut self.dirty); }
    pub fn set_step_height(&mut self, v: f32) { stage(self.current.height, v, &mut self.pending.height, &mut self.dirty); }
    pub fn set_step_distance(&mut self, v: f32) { stage(self.current.distance, v, &mut self.pending.distance, &mut self.dirty); }
    pub fn set_step_speed(&mut self, v: f32) { stage(self.current.speed, v, &mut self.pending.speed, &mut self.dirty); }

    /// Commits staged values if any setter changed something. Returns whether it did.
    pub fn try_apply_mutation(&mut self) -> bool {
        if !self.dirty { return false; }
        self.current = self.pending;
        self.dirty = false;
        true
    }

    pub fn force_apply(&mut self) {
        self.current = self.pending;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_stage_until_commit() {
        let mut p = StepParameters::default();
        p.set_step_length(0.7);
        p.set_step_height(0.2);
        assert!(p.is_mutated());
        assert_eq!(p.step_length(), 0.4);
        assert_eq!(p.pending().length, 0.7);
        assert!(p.try_apply_mutation());
        assert_eq!(p.step_length(), 0.7);
        assert_eq!(p.step_height(), 0.2);
        assert!(!p.try_apply_mutation());
    }

    #[test]
    fn tiny_changes_do_not_dirty() {
        let mut p = StepParameters::default();
        p.set_step_speed(4.0 + 1e-8);
        assert!(!p.is_mutated());
        assert_eq!(p.pending(), p.values());
    }

    #[test]
    fn reverting_while_dirty_restages() {
        let mut p = StepParameters::default();
        p.set_step_distance(0.9);
        p.set_step_distance(0.45);
        p.force_apply();
        assert_eq!(p.step_distance(), 0.45);
        assert!(!p.is_mutated());
    }

    #[test]
    fn serde_carries_committed_values_only() {
        let mut p = StepParameters::default();
        p.set_step_length(1.0);
        let json = serde_json::to_string(&p).unwrap();
        let back: StepParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back.step_length(), 0.4);
        assert!(!back.is_mutated());
    }
}
