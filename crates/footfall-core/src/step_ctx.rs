/// Per-tick context handed to every solver step.
#[derive(Copy, Clone, Debug)]
pub struct StepCtx {
    pub dt: f32,
    pub tick: u64,
}

impl StepCtx {
    pub fn new(dt: f32) -> Self { Self { dt, tick: 0 } }

    /// Context for the following tick.
    pub fn next(self) -> Self { Self { dt: self.dt, tick: self.tick + 1 } }
}

impl Default for StepCtx {
    fn default() -> Self { Self::new(crate::TickContract::default_contract().fixed_dt) }
}
