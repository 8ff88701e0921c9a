use footfall_core::{angle_deg, Curve, Isometry, StepCtx, Vec3};
use footfall_cycler::{Cycle, CyclerError, MultiPoseCycler};
use footfall_foot::{FootConfig, FootContext, FootSolver};
use footfall_motion::MotionState;
use footfall_terrain::TerrainProbe;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rig::{digest, RigReport, Side};

/// Walk blends cyclers 0 → 1, run blends 1 → 2.
const WALK_PAIR: (usize, usize) = (0, 1);
const RUN_PAIR: (usize, usize) = (1, 2);
const STALE_LOOK_DEG: f32 = 5.0;
const STALE_POSITION: f32 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycledGait {
    pub run_threshold: f32,
    /// Gait cycles per second, keyed by speed.
    pub cycle_frequency: Curve,
}

impl Default for CycledGait {
    fn default() -> Self {
        Self { run_threshold: 3.0, cycle_frequency: Curve::linear(0.0, 0.5, 5.0, 2.0) }
    }
}

/// Both feet driven by pose cyclers instead of the distance trigger. The right
/// cycler runs half a cycle behind the left one.
#[derive(Clone, Debug)]
pub struct CycledRig {
    gait: CycledGait,
    left: FootSolver,
    right: FootSolver,
    left_cycler: MultiPoseCycler,
    right_cycler: MultiPoseCycler,
}

impl CycledRig {
    /// Each cycler needs at least three members (slow walk, walk/slow run, run).
    pub fn new(
        gait: CycledGait,
        left: FootConfig,
        right: FootConfig,
        mut left_cycler: MultiPoseCycler,
        mut right_cycler: MultiPoseCycler,
    ) -> Result<Self, CyclerError> {
        for c in [&left_cycler, &right_cycler] {
            if c.len() <= RUN_PAIR.1 {
                return Err(CyclerError::IndexOutOfRange { index: RUN_PAIR.1, len: c.len() });
            }
        }
        left_cycler.set_active(WALK_PAIR.0, WALK_PAIR.1)?;
        right_cycler.set_active(WALK_PAIR.0, WALK_PAIR.1)?;
        right_cycler.sync_with(&left_cycler, 0.5);
        right_cycler.reset_cycle_poses()?;
        Ok(Self { gait, left: FootSolver::new(left), right: FootSolver::new(right), left_cycler, right_cycler })
    }

    pub fn setup(&mut self, probe: &dyn TerrainProbe, body: Isometry, left_rest: Vec3, right_rest: Vec3) {
        self.left.setup(probe, body, body.transform_point(left_rest));
        self.right.setup(probe, body, body.transform_point(right_rest));
    }

    pub fn left(&self) -> &FootSolver { &self.left }
    pub fn right(&self) -> &FootSolver { &self.right }
    pub fn left_cycler(&self) -> &MultiPoseCycler { &self.left_cycler }
    pub fn right_cycler(&self) -> &MultiPoseCycler { &self.right_cycler }

    fn is_moving(&self, body: Isometry, motion: &MotionState) -> bool {
        motion.momentary_velocity().length() > 0.01
            || motion.momentary_angular_velocity() > 0.01
            || [&self.left, &self.right].iter().any(|f| {
                angle_deg(f.last_plant_look(), body.forward()) > STALE_LOOK_DEG
                    || f.last_plant_position().distance(body.pos) > STALE_POSITION
            })
    }

    pub fn step(&mut self, ctx: StepCtx, probe: &dyn TerrainProbe, body: Isometry, motion: &MotionState) -> Result<RigReport, CyclerError> {
        let speed = motion.predicted_velocity(ctx.dt).length();
        let run = speed >= self.gait.run_threshold;
        let pair = if run { RUN_PAIR } else { WALK_PAIR };
        if self.left_cycler.active() != Some(pair) {
            debug!(tick = ctx.tick, run, "switching cycler pair");
            self.left_cycler.set_active(pair.0, pair.1)?;
            self.right_cycler.set_active(pair.0, pair.1)?;
        }
        let cycle_speed = self.gait.cycle_frequency.evaluate(speed) * ctx.dt;
        self.left_cycler.adjust_cycle_speed(cycle_speed)?;
        self.right_cycler.adjust_cycle_speed(cycle_speed)?;

        if self.is_moving(body, motion) {
            let offset = if run { self.gait.run_threshold } else { 0.0 };
            let weight = (speed - offset).clamp(0.0, 1.0);
            let other_planted = !self.right.is_swinging();
            let lctx = FootContext { probe, body, motion, other_planted, step: ctx };
            self.left.step_cycled(&lctx, &mut self.left_cycler, weight, false)?;
            let other_planted = !self.left.is_swinging();
            let rctx = FootContext { probe, body, motion, other_planted, step: ctx };
            self.right.step_cycled(&rctx, &mut self.right_cycler, weight, false)?;
        } else {
            self.left_cycler.skip_to(0.0);
            self.right_cycler.skip_to(0.5);
        }

        let (left, right) = (self.left.output(), self.right.output());
        Ok(RigReport { tick: ctx.tick, speed, run, lead: Side::Left, left, right, digest: digest(run, Side::Left, &left, &right) })
    }
}
