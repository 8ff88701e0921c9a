use footfall_core::{angle_deg, look_rotation, planar, slerp_dir, Isometry, StepCtx, Vec3};
use footfall_motion::MotionState;
use footfall_terrain::{Hit, TerrainProbe};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FootConfig;
use crate::diag::{Diagnostic, DiagnosticLedger};
use crate::params::StepParameters;
use crate::search::{SearchError, SearchFrame};
use crate::swing::splice_origin;

/// Foot rotation only follows the target once it has moved this far (degrees).
pub const ROTATION_UPDATE_DEG: f32 = 5.0;
/// Body turn since the last plant that forces a rotation update mid-swing (degrees).
pub const TURN_FORCE_DEG: f32 = 15.0;
/// Corrective candidates closer than this to the foot are ignored.
const MIN_CORRECTION: f32 = 0.1;
/// One corrective search per failed plant.
const MAX_ATTEMPTS: u32 = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FootPhase {
    Planted,
    Swinging,
    /// Planted in time but not on anything; hangs until a ground check succeeds.
    Unsupported,
}

/// What the skeleton reads each tick.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct FootOutput {
    pub effector: Isometry,
    pub effector_normal: Vec3,
    pub target_position: Vec3,
    pub target_normal: Vec3,
    pub swinging: bool,
}

pub struct FootContext<'a> {
    pub probe: &'a dyn TerrainProbe,
    pub body: Isometry,
    pub motion: &'a MotionState,
    /// The opposite foot is not mid-swing.
    pub other_planted: bool,
    pub step: StepCtx,
}

/// Last-tick intermediates, kept for debug drawing.
#[derive(Clone, Debug, Default)]
pub struct FootDebug {
    pub initial: Option<Vec3>,
    pub desired: Option<Vec3>,
    pub barrier_hit: Option<Vec3>,
    pub barrier_top: Option<Vec3>,
    pub search_points: Vec<Hit>,
}

#[derive(Clone, Debug)]
pub struct FootSolver {
    pub(crate) cfg: FootConfig,
    pub(crate) params: StepParameters,
    pub(crate) body_height: f32,
    pub(crate) lerp: f32,
    pub(crate) old_pos: Vec3,
    pub(crate) cur_pos: Vec3,
    pub(crate) new_pos: Vec3,
    pub(crate) old_normal: Vec3,
    pub(crate) cur_normal: Vec3,
    pub(crate) new_normal: Vec3,
    pub(crate) cur_forward: Vec3,
    /// Body-local authored forward and offset; see [`FootSolver::update_pose`].
    pub(crate) foot_forward: Vec3,
    pub(crate) foot_offset: Vec3,
    pub(crate) grounded: bool,
    pub(crate) attempts: u32,
    unsupported: bool,
    pub(crate) last_plant_pos: Vec3,
    pub(crate) last_plant_look: Vec3,
    pub(crate) debug: FootDebug,
    pub(crate) ledger: DiagnosticLedger,
}

impl FootSolver {
    pub fn new(cfg: FootConfig) -> Self {
        Self {
            params: cfg.step,
            body_height: cfg.body_height.unwrap_or(cfg.leg_length),
            lerp: 1.0,
            old_pos: Vec3::ZERO,
            cur_pos: Vec3::ZERO,
            new_pos: Vec3::ZERO,
            old_normal: Vec3::Y,
            cur_normal: Vec3::Y,
            new_normal: Vec3::Y,
            cur_forward: Vec3::X,
            foot_forward: cfg.foot_forward,
            foot_offset: cfg.foot_offset,
            grounded: false,
            attempts: 0,
            unsupported: false,
            last_plant_pos: Vec3::ZERO,
            last_plant_look: Vec3::X,
            debug: FootDebug::default(),
            ledger: DiagnosticLedger::default(),
            cfg,
        }
    }

    /// Snaps the foot to the ground under `foot_position` and measures the body
    /// height unless the config pins it. Missing ground is recorded, not fatal.
    pub fn setup(&mut self, probe: &dyn TerrainProbe, body: Isometry, foot_position: Vec3) {
        let mask = self.cfg.mask;
        let (pos, normal, grounded) = match probe.raycast(foot_position, Vec3::NEG_Y, 10.0, mask) {
            Some(h) => (h.point, h.normal, true),
            None => {
                warn!(?foot_position, "no ground under foot at setup");
                self.ledger.push(0, Diagnostic::SetupMissedGround { at: foot_position });
                (foot_position, Vec3::Y, false)
            }
        };
        self.grounded = grounded;
        self.old_pos = pos;
        self.cur_pos = pos;
        self.new_pos = pos;
        self.old_normal = normal;
        self.cur_normal = normal;
        self.new_normal = normal;

        self.body_height = match self.cfg.body_height {
            Some(h) => h,
            None => match probe.raycast(body.pos, Vec3::NEG_Y, 10.0, mask) {
                Some(h) => h.distance,
                None => {
                    self.ledger.push(0, Diagnostic::SetupMissedGround { at: body.pos });
                    self.cfg.leg_length
                }
            },
        };

        self.cur_forward = body.forward();
        self.lerp = 1.0;
        self.attempts = 0;
        self.unsupported = false;
        self.last_plant_pos = body.pos;
        self.last_plant_look = body.forward();
        debug!(foot = ?pos, body_height = self.body_height, "foot setup");
    }

    /// Authored pose input: body-local foothold offset and foot forward.
    pub fn update_pose(&mut self, offset: Vec3, look_dir: Vec3) {
        self.foot_offset = offset;
        self.foot_forward = look_dir;
    }

    pub(crate) fn frame<'a>(&'a self, probe: &'a dyn TerrainProbe, body: Isometry) -> SearchFrame<'a> {
        SearchFrame::new(probe, body, &self.cfg, self.body_height)
    }

    /// One fixed tick. `ignore_other_foot` lets this foot lift while the other
    /// is still swinging (running gaits).
    pub fn step(&mut self, ctx: &FootContext, ignore_other_foot: bool) -> FootOutput {
        if !ctx.motion.grounded() {
            return self.output();
        }
        if self.lerp >= 1.0 {
            let body = ctx.body;
            let initial = body.pos + body.right() * self.cfg.signed_spacing() - Vec3::Y * self.body_height;
            self.debug.initial = Some(initial);
            let foot = self.effector_position();
            let drift = initial.distance(foot);
            let lateral = self.cfg.side.signum() * (foot - body.pos).dot(body.right());
            let wants = drift >= self.params.step_distance() || lateral <= self.cfg.min_foot_spacing;
            if wants && (ctx.other_planted || ignore_other_foot) {
                self.start_step(ctx, initial);
            }
        } else if angle_deg(self.last_plant_look, ctx.body.forward()) >= TURN_FORCE_DEG {
            self.adjust_foot_rotation(ctx, true);
        }
        self.swing_iteration(ctx);
        self.output()
    }

    fn start_step(&mut self, ctx: &FootContext, initial: Vec3) {
        let heading = ctx.motion.planar_velocity().normalize_or_zero();
        let desired = initial + heading * self.params.step_length() + ctx.body.rot * self.foot_offset;
        self.debug.desired = Some(desired);
        let under_body = ctx.body.pos - Vec3::Y * self.body_height;
        match self.find_foothold(ctx, desired, self.cfg.leg_length + 1.0, under_body) {
            Ok(hit) => {
                debug!(tick = ctx.step.tick, target = ?hit.point, "step start");
                self.begin_step(hit.point, hit.normal);
            }
            Err(e) => {
                debug!(tick = ctx.step.tick, error = %e, "foot keeps its target");
                self.ledger.push(ctx.step.tick, Diagnostic::NoFootholdFound { around: desired });
            }
        }
    }

    /// Target tiers: verified ray under `desired`, best fit around `desired`,
    /// best fit around `under_body`.
    pub(crate) fn find_foothold(&mut self, ctx: &FootContext, desired: Vec3, ray_reach: f32, under_body: Vec3) -> Result<Hit, SearchError> {
        let frame = SearchFrame::new(ctx.probe, ctx.body, &self.cfg, self.body_height);
        if let Some(h) = frame.ray_down(desired, ctx.body.pos.y, ray_reach) {
            if frame.verify(h.point, h.normal) {
                return Ok(h);
            }
        }
        let radius = self.cfg.max_step_length;
        match frame.best_fit(desired, radius, &mut self.debug.search_points) {
            Ok(h) => Ok(h),
            Err(_) => frame.best_fit(under_body, radius, &mut self.debug.search_points),
        }
    }

    pub(crate) fn begin_step(&mut self, target: Vec3, normal: Vec3) {
        self.old_pos = self.effector_position();
        self.old_normal = self.effector_normal();
        self.cur_pos = self.old_pos;
        self.cur_normal = self.old_normal;
        self.new_pos = target;
        self.new_normal = normal;
        self.lerp = 0.0;
        self.attempts = 0;
        self.debug.barrier_hit = None;
        self.debug.barrier_top = None;
    }

    /// Ground check at the end of a swing; a miss runs the corrective search.
    pub(crate) fn plant(&mut self, ctx: &FootContext) {
        if self.frame(ctx.probe, ctx.body).ground_check(self.new_pos).is_some() {
            self.grounded = true;
            self.attempts = 0;
            self.unsupported = false;
            return;
        }
        self.grounded = false;
        if self.attempts < MAX_ATTEMPTS {
            self.ledger.push(ctx.step.tick, Diagnostic::GroundLost { at: self.new_pos });
        }
        self.corrective_search(ctx);
    }

    /// Idle planted foot: keep checking the ground, re-search once if it is gone.
    pub(crate) fn idle_ground_check(&mut self, ctx: &FootContext) {
        if self.frame(ctx.probe, ctx.body).ground_check(self.new_pos).is_some() {
            self.grounded = true;
            self.attempts = 0;
            self.unsupported = false;
            return;
        }
        self.grounded = false;
        if self.attempts < MAX_ATTEMPTS {
            self.ledger.push(ctx.step.tick, Diagnostic::GroundLost { at: self.new_pos });
            self.old_pos = self.new_pos;
            self.cur_pos = self.new_pos;
        }
        self.corrective_search(ctx);
    }

    /// Local search centred between the body and the target at ground height.
    /// Success winds `lerp` back by the correction relative to the distance
    /// already covered, keeping the swing continuous through the current point.
    fn corrective_search(&mut self, ctx: &FootContext) {
        if self.attempts >= MAX_ATTEMPTS {
            self.mark_unsupported(ctx.step.tick);
            return;
        }
        self.attempts += 1;

        let mut center = 0.5 * (ctx.body.pos + self.new_pos);
        center.y = ctx.body.pos.y - self.body_height;
        let foot = self.cur_pos;
        let frame = SearchFrame::new(ctx.probe, ctx.body, &self.cfg, self.body_height);
        let points = frame.local_search(center, self.cfg.max_step_length);
        let found = points.iter().copied()
            .find(|h| h.point.distance(foot) > MIN_CORRECTION && frame.verify(h.point, h.normal));
        self.debug.search_points = points;

        let Some(hit) = found else {
            debug!(tick = ctx.step.tick, ?center, "corrective search found nothing");
            self.ledger.push(ctx.step.tick, Diagnostic::NoFootholdFound { around: center });
            self.mark_unsupported(ctx.step.tick);
            return;
        };

        let span = self.old_pos.distance(self.cur_pos);
        let correction = self.cur_pos.distance(hit.point);
        let lerp = if span > 1e-6 { (self.lerp - correction / span).max(0.0) } else { 0.0 };
        self.ledger.push(ctx.step.tick, Diagnostic::Corrected { from: self.new_pos, to: hit.point });
        debug!(tick = ctx.step.tick, to = ?hit.point, lerp, "foot target corrected");

        let base = self.cur_pos - Vec3::Y * crate::swing::arc_lift(lerp, self.params.step_height());
        self.old_pos = splice_origin(base, hit.point, lerp);
        self.new_pos = hit.point;
        self.new_normal = hit.normal;
        self.lerp = lerp;
    }

    fn mark_unsupported(&mut self, tick: u64) {
        self.grounded = false;
        if !self.unsupported {
            warn!(tick, at = ?self.new_pos, "foot unsupported");
            self.ledger.push(tick, Diagnostic::Unsupported { at: self.new_pos });
            self.unsupported = true;
        }
    }

    /// Turns the foot toward the predicted velocity when it points forward and
    /// outward on this foot's side, otherwise toward the body forward.
    pub fn adjust_foot_rotation(&mut self, ctx: &FootContext, force: bool) -> Vec3 {
        let authored = ctx.body.rot * self.foot_forward;
        self.track_rotation(ctx, authored, force)
    }

    pub(crate) fn track_rotation(&mut self, ctx: &FootContext, authored: Vec3, force: bool) -> Vec3 {
        let dt = ctx.step.dt;
        let fwd = ctx.body.forward();
        let predicted_v = planar(ctx.motion.predicted_velocity(dt));
        let predicted_fwd = ctx.motion.predicted_direction(fwd, dt).normalize_or_zero();
        let outward = ctx.body.right() * self.cfg.side.signum();

        let target = if predicted_v.length() > 0.1 && predicted_v.dot(fwd) > 0.0 && predicted_v.dot(outward) > 0.0 {
            let v = predicted_v.normalize();
            slerp_dir(authored, v, predicted_fwd.dot(v))
        } else {
            slerp_dir(authored, fwd, predicted_fwd.dot(fwd).abs())
        };
        if force || angle_deg(self.cur_forward, target) >= ROTATION_UPDATE_DEG {
            self.cur_forward = target;
        }
        self.cur_forward
    }

    /// Stages new step geometry; `step_speed = 2 / period`. Takes effect now
    /// only if the foot is not swinging, otherwise when the swing completes.
    pub fn update_step_parameters(&mut self, length: f32, height: f32, distance: f32, period: f32) {
        self.params.set_step_length(length);
        self.params.set_step_height(height);
        self.params.set_step_distance(distance);
        if period > 0.0 {
            self.params.set_step_speed(2.0 / period);
        }
        if self.lerp >= 1.0 {
            self.params.try_apply_mutation();
        }
    }

    pub fn output(&self) -> FootOutput {
        let pos = self.effector_position();
        let normal = self.effector_normal();
        FootOutput {
            effector: Isometry { pos, rot: look_rotation(self.cur_forward, normal) },
            effector_normal: normal,
            target_position: self.new_pos,
            target_normal: self.new_normal,
            swinging: self.is_swinging(),
        }
    }

    pub fn phase(&self) -> FootPhase {
        if self.lerp < 1.0 { FootPhase::Swinging }
        else if self.grounded { FootPhase::Planted }
        else { FootPhase::Unsupported }
    }

    #[inline] pub fn is_swinging(&self) -> bool { self.lerp < 1.0 }
    #[inline] pub fn lerp(&self) -> f32 { self.lerp }
    #[inline] pub fn grounded(&self) -> bool { self.grounded }
    #[inline] pub fn attempts(&self) -> u32 { self.attempts }
    #[inline] pub fn body_height(&self) -> f32 { self.body_height }
    #[inline] pub fn config(&self) -> &FootConfig { &self.cfg }
    #[inline] pub fn params(&self) -> &StepParameters { &self.params }
    pub fn params_mut(&mut self) -> &mut StepParameters { &mut self.params }

    pub fn effector_position(&self) -> Vec3 { if self.lerp >= 1.0 { self.new_pos } else { self.cur_pos } }
    pub fn effector_normal(&self) -> Vec3 { if self.lerp >= 1.0 { self.new_normal } else { self.cur_normal } }
    #[inline] pub fn target_position(&self) -> Vec3 { self.new_pos }
    #[inline] pub fn target_normal(&self) -> Vec3 { self.new_normal }
    #[inline] pub fn current_forward(&self) -> Vec3 { self.cur_forward }
    #[inline] pub fn last_plant_position(&self) -> Vec3 { self.last_plant_pos }
    #[inline] pub fn last_plant_look(&self) -> Vec3 { self.last_plant_look }

    pub fn debug(&self) -> &FootDebug { &self.debug }
    pub fn ledger(&self) -> &DiagnosticLedger { &self.ledger }
    pub fn ledger_mut(&mut self) -> &mut DiagnosticLedger { &mut self.ledger }
}
