use footfall_core::{angle_deg, hash_f32, hash_quat, hash_vec3, Isometry, StepCtx, StepHasher, Vec3};
use footfall_foot::{FootContext, FootOutput, FootSolver};
use footfall_motion::MotionState;
use footfall_terrain::TerrainProbe;
use serde::Serialize;
use tracing::trace;

use crate::config::{RigConfig, RigConfigError};
use crate::gait::GaitProfile;

/// Below these the body counts as standing still.
const MOMENTARY_EPS: f32 = 0.01;
/// A foot whose last plant looked further away than this (degrees) re-steps.
const STALE_LOOK_DEG: f32 = 10.0;
const STALE_POSITION: f32 = 0.1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Side { Left, Right }

impl Side {
    #[inline]
    pub fn other(self) -> Self {
        match self { Side::Left => Side::Right, Side::Right => Side::Left }
    }
}

/// One rig tick, ready for the skeleton and for replay comparison.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct RigReport {
    pub tick: u64,
    pub speed: f32,
    pub run: bool,
    /// Foot stepped first this tick.
    pub lead: Side,
    pub left: FootOutput,
    pub right: FootOutput,
    /// blake3 over both outputs, quantized.
    pub digest: u64,
}

/// Two feet driven by one body: gait parameters from speed, a walk/run split,
/// and an update order that flips whenever the lead foot finishes a step.
#[derive(Clone, Debug)]
pub struct LocomotionRig {
    gait: GaitProfile,
    left: FootSolver,
    right: FootSolver,
    left_rest: Vec3,
    right_rest: Vec3,
    lead: Side,
}

impl LocomotionRig {
    pub fn new(cfg: RigConfig) -> Result<Self, RigConfigError> {
        cfg.validate()?;
        Ok(Self {
            left: FootSolver::new(cfg.left),
            right: FootSolver::new(cfg.right),
            gait: cfg.gait,
            left_rest: cfg.left_rest,
            right_rest: cfg.right_rest,
            lead: Side::Left,
        })
    }

    /// Snaps both feet under their rest points.
    pub fn setup(&mut self, probe: &dyn TerrainProbe, body: Isometry) {
        self.left.setup(probe, body, body.transform_point(self.left_rest));
        self.right.setup(probe, body, body.transform_point(self.right_rest));
        self.lead = Side::Left;
    }

    pub fn gait(&self) -> &GaitProfile { &self.gait }
    pub fn set_gait(&mut self, gait: GaitProfile) { self.gait = gait; }
    #[inline] pub fn lead(&self) -> Side { self.lead }
    pub fn left(&self) -> &FootSolver { &self.left }
    pub fn right(&self) -> &FootSolver { &self.right }

    pub fn foot(&self, side: Side) -> &FootSolver {
        match side { Side::Left => &self.left, Side::Right => &self.right }
    }

    pub fn foot_mut(&mut self, side: Side) -> &mut FootSolver {
        match side { Side::Left => &mut self.left, Side::Right => &mut self.right }
    }

    fn is_moving(&self, body: Isometry, motion: &MotionState) -> bool {
        if motion.momentary_velocity().length() > MOMENTARY_EPS || motion.momentary_angular_velocity() > MOMENTARY_EPS {
            return true;
        }
        [&self.left, &self.right].iter().any(|f| {
            angle_deg(f.last_plant_look(), body.forward()) > STALE_LOOK_DEG
                || f.last_plant_position().distance(body.pos) > STALE_POSITION
        })
    }

    fn step_foot(&mut self, side: Side, ctx: StepCtx, probe: &dyn TerrainProbe, body: Isometry, motion: &MotionState, run: bool) {
        let other_planted = !self.foot(side.other()).is_swinging();
        let fctx = FootContext { probe, body, motion, other_planted, step: ctx };
        self.foot_mut(side).step(&fctx, run);
    }

    /// One fixed tick. `motion` must already hold this tick's body sample.
    pub fn step(&mut self, ctx: StepCtx, probe: &dyn TerrainProbe, body: Isometry, motion: &MotionState) -> RigReport {
        let speed = motion.predicted_velocity(ctx.dt).length();
        let run = self.gait.is_run(speed);
        let g = self.gait.sample(speed);
        self.left.update_step_parameters(g.length, g.height, g.distance, g.period);
        self.right.update_step_parameters(g.length, g.height, g.distance, g.period);

        let lead = self.lead;
        let moving = self.is_moving(body, motion);
        if moving || self.left.is_swinging() || self.right.is_swinging() {
            let was_swinging = self.foot(lead).is_swinging();
            let run = run && moving;
            self.step_foot(lead, ctx, probe, body, motion, run);
            self.step_foot(lead.other(), ctx, probe, body, motion, run);
            if was_swinging && !self.foot(lead).is_swinging() {
                self.lead = lead.other();
                trace!(tick = ctx.tick, lead = ?self.lead, "lead foot switched");
            }
        }

        let (left, right) = (self.left.output(), self.right.output());
        RigReport { tick: ctx.tick, speed, run, lead, left, right, digest: digest(run, lead, &left, &right) }
    }
}

pub(crate) fn digest(run: bool, lead: Side, left: &FootOutput, right: &FootOutput) -> u64 {
    let mut h = StepHasher::new();
    h.update_bytes(b"RIGTICKv1\0");
    h.update_bytes(&[run as u8, lead as u8]);
    for out in [left, right] {
        hash_vec3(&mut h, &out.effector.pos);
        hash_quat(&mut h, &out.effector.rot);
        hash_vec3(&mut h, &out.target_position);
        hash_vec3(&mut h, &out.target_normal);
        hash_f32(&mut h, if out.swinging { 1.0 } else { 0.0 });
    }
    h.finalize_u64()
}
