/// Normalized cycle time in `[0, 1)`.
#[inline]
pub fn wrap01(x: f32) -> f32 {
    let w = x.rem_euclid(1.0);
    // rem_euclid rounds tiny negatives up to exactly 1.0
    if w >= 1.0 || !w.is_finite() { 0.0 } else { w }
}

/// Anything that walks a looping normalized timeline.
pub trait Cycle {
    fn cycle_position(&self) -> f32;
    fn cycle_speed(&self) -> f32;
    fn set_cycle_speed(&mut self, speed: f32);

    /// Advances one tick without sampling; returns the new position.
    fn skip(&mut self) -> f32;

    /// Jumps to `position`. Moving backwards starts a fresh cycle.
    fn skip_to(&mut self, position: f32);

    /// Adopts `other`'s speed and runs `offset` cycles ahead of it.
    fn sync_with(&mut self, other: &dyn Cycle, offset: f32) {
        self.set_cycle_speed(other.cycle_speed());
        self.skip_to(wrap01(other.cycle_position() + offset));
    }
}
