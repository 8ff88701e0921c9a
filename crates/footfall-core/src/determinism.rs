/// Tick contract the solvers are tuned against.
#[derive(Copy, Clone, Debug)]
pub struct TickContract {
    pub fixed_dt: f32,
    pub float: &'static str,
    pub parallel_threshold: usize,
    pub stable_sorts: bool,
}

impl TickContract {
    pub fn default_contract() -> Self {
        Self {
            fixed_dt: 1.0/60.0,
            float: "f32",
            parallel_threshold: crate::fanout::PARALLEL_THRESHOLD,
            stable_sorts: true,
        }
    }
}

impl Default for TickContract {
    fn default() -> Self { Self::default_contract() }
}
