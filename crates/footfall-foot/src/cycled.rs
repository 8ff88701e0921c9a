use footfall_core::{look_rotation, Quat, Vec3};
use footfall_cycler::{CyclerError, MultiPoseCycler};
use footfall_pose::{AdjustmentType, Pose, Space};
use footfall_terrain::Hit;
use tracing::debug;

use crate::diag::Diagnostic;
use crate::search::SearchFrame;
use crate::solver::{FootContext, FootOutput, FootSolver};
use crate::swing::CREST_NUDGE;

/// Hover above a barrier top for poses that should not touch it.
const HOVER: f32 = 0.1;
/// Lift off a side-stepped surface.
const SKIN: f32 = 0.01;

/// `rot` tilted so its up axis lies along `normal`, yaw kept.
fn tilt_to(rot: Quat, normal: Vec3) -> Quat {
    let up = (rot * Vec3::Y).normalize_or(Vec3::Y);
    Quat::from_rotation_arc(up, normal.normalize_or(Vec3::Y)) * rot
}

/// Where a pose should go given the top of a barrier in its way.
///
/// `Attract` and `Stick` poses look for a foothold past the barrier within the
/// extension budget, then settle for the top itself. Anything else hovers.
fn barrier_pose(frame: &SearchFrame, desired: Pose, top: Hit, dir: Vec3) -> Option<Pose> {
    let mut out = desired;
    match desired.adjustment {
        AdjustmentType::Attract | AdjustmentType::Stick => {
            let len = dir.length();
            let mut hits = frame.probe.spherecast(
                top.point + top.normal * HOVER, frame.cfg.side_step_radius,
                dir.normalize_or_zero(), len, frame.cfg.mask,
            );
            frame.rank_hits(desired.position, &mut hits);
            let near = hits.iter().find(|h| {
                frame.verify(h.point, h.normal) && h.point.distance(desired.position) <= frame.cfg.extend_budget
            });
            if let Some(h) = near {
                out.position = h.point + h.normal * SKIN;
                out.set_rotation(tilt_to(desired.rotation(), h.normal));
                return Some(out);
            }
            if frame.verify(top.point, top.normal) {
                out.position = top.point;
                out.set_rotation(tilt_to(desired.rotation(), top.normal));
                return Some(out);
            }
            None
        }
        _ => {
            out.position = top.point + top.normal * HOVER;
            out.set_rotation(tilt_to(desired.rotation(), top.normal));
            Some(out)
        }
    }
}

impl FootSolver {
    /// Cycler-driven stepping: the gait comes from `cycler` (anchors in body
    /// space) instead of the distance trigger.
    ///
    /// The active pair's upcoming targets are planted on the terrain when they
    /// are `Stick` (or always with `force`), steered toward the velocity, and
    /// written back for this cycle. The sampled pose is then tracked for
    /// rotation and, while the foot is off the ground, moved around barriers.
    pub fn step_cycled(&mut self, ctx: &FootContext, cycler: &mut MultiPoseCycler, weight: f32, force: bool) -> Result<FootOutput, CyclerError> {
        let body = ctx.body;
        cycler.set_space_anchor(Some(body));
        let previous = self.cur_pos;

        let mut pose = cycler.next_pose_in(Space::World, weight)?;
        let (first, second) = cycler.current_target_poses_in(Space::World)?;
        let center = body.pos - Vec3::Y * self.body_height;
        let mut targets = [first, second];
        for t in targets.iter_mut() {
            if t.adjustment == AdjustmentType::Stick || force {
                let desired = self.steer(ctx, t.position, center);
                if let Some(planted) = self.plant_target(ctx, desired, t.rotation(), t.adjustment) {
                    *t = planted;
                }
            }
        }
        self.new_pos = targets[1].position;
        self.new_normal = targets[1].rotation() * Vec3::Y;
        cycler.adjust_cycle_target_poses(targets[0].to_local(Some(&body))?, targets[1].to_local(Some(&body))?)?;

        let normal = pose.rotation() * Vec3::Y;
        let forward = self.track_rotation(ctx, pose.rotation() * Vec3::X, false);
        pose.set_rotation(look_rotation(forward, normal));
        if !self.grounded {
            pose = self.adjust_target_position(ctx, previous, pose);
            if pose.adjustment == AdjustmentType::Stick && ctx.motion.grounded() {
                if let Some(p) = self.plant_target(ctx, pose.position, pose.rotation(), pose.adjustment) {
                    pose = p;
                }
            }
        }

        self.cur_pos = pose.position;
        self.cur_normal = pose.rotation() * Vec3::Y;
        self.grounded = self.frame(ctx.probe, body).ground_check(self.cur_pos).is_some();
        self.lerp = cycler.position();
        self.last_plant_pos = body.pos;
        self.last_plant_look = body.forward();
        Ok(self.output())
    }

    /// Bends a target around the body's ground point toward the velocity,
    /// keeping its distance from that point.
    fn steer(&self, ctx: &FootContext, target: Vec3, center: Vec3) -> Vec3 {
        let v = ctx.motion.velocity();
        let speed = v.length();
        if speed <= 0.01 {
            return target;
        }
        let rel = target - center;
        let bent = rel + v / speed * self.cfg.velocity_contribution.evaluate(speed);
        bent.normalize_or_zero() * rel.length() + center
    }

    /// World pose on a verified foothold near `desired`, or `None` after
    /// recording the failure.
    pub fn plant_target(&mut self, ctx: &FootContext, desired: Vec3, rotation: Quat, adjustment: AdjustmentType) -> Option<Pose> {
        let reach = self.cfg.leg_length + 0.2;
        match self.find_foothold(ctx, desired, reach, ctx.body.pos - Vec3::Y * reach) {
            Ok(h) => {
                let position = h.point + ctx.body.rot * self.foot_offset;
                Some(Pose::world(position, tilt_to(rotation, h.normal)).with_adjustment(adjustment))
            }
            Err(e) => {
                debug!(tick = ctx.step.tick, error = %e, "cycled target left as authored");
                self.ledger.push(ctx.step.tick, Diagnostic::NoFootholdFound { around: desired });
                None
            }
        }
    }

    /// Pose-level obstacle avoidance between `from` and the pose.
    ///
    /// A contact right at the goal only pulls the pose back. Otherwise the top
    /// of the barrier is probed (straight down, then a ranked sphere-cast) and
    /// [`barrier_pose`] decides by adjustment type. With nothing usable the
    /// pose is pulled back in front of the contact.
    pub fn adjust_target_position(&mut self, ctx: &FootContext, from: Vec3, desired: Pose) -> Pose {
        let goal = desired.position;
        let dir = goal - from;
        let len = dir.length();
        if len < 1e-6 {
            return desired;
        }
        let dir_n = dir / len;
        let cfg = &self.cfg;
        let Some(hit) = ctx.probe.capsulecast(from, goal, cfg.sweep_radius, dir, len, cfg.mask) else {
            return desired;
        };
        let mut pulled = desired;
        pulled.position = hit.point - dir_n * cfg.graze_distance;
        if hit.point.distance(goal) < cfg.graze_distance {
            return pulled;
        }

        let crest = Vec3::new(
            hit.point.x + dir_n.x * CREST_NUDGE,
            ctx.body.pos.y - cfg.leg_length + cfg.max_step_height,
            hit.point.z + dir_n.z * CREST_NUDGE,
        );
        let frame = SearchFrame::new(ctx.probe, ctx.body, cfg, self.body_height);
        let (result, top) = match frame.ray_down(crest, crest.y, cfg.max_step_height) {
            Some(top) => (barrier_pose(&frame, desired, top, dir), Some(top.point)),
            None => {
                let mut tops = ctx.probe.spherecast(crest, cfg.side_step_radius, Vec3::NEG_Y, cfg.max_step_height, cfg.mask);
                frame.rank_hits(goal, &mut tops);
                tops.iter()
                    .find_map(|t| barrier_pose(&frame, desired, *t, dir).map(|p| (p, t.point)))
                    .map_or((None, None), |(p, t)| (Some(p), Some(t)))
            }
        };
        self.debug.barrier_hit = Some(hit.point);
        self.debug.barrier_top = top;
        result.unwrap_or(pulled)
    }
}
