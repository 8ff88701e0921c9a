use std::f32::consts::PI;

use footfall_core::Vec3;
use footfall_terrain::Hit;
use tracing::{debug, trace};

use crate::diag::Diagnostic;
use crate::search::SearchFrame;
use crate::solver::{FootContext, FootSolver};

/// Horizontal push past the barrier contact before probing for its top.
pub(crate) const CREST_NUDGE: f32 = 0.1;

#[inline]
pub(crate) fn arc_lift(lerp: f32, height: f32) -> f32 { (lerp * PI).sin() * height }

/// Swing position at `lerp`: straight line plus a half-sine lift.
#[inline]
pub fn arc_point(old: Vec3, new: Vec3, lerp: f32, height: f32) -> Vec3 {
    old.lerp(new, lerp) + Vec3::Y * arc_lift(lerp, height)
}

/// Start point of a line that passes through `base` at `lerp` and ends at `top`.
pub fn splice_origin(base: Vec3, top: Vec3, lerp: f32) -> Vec3 {
    let rest = 1.0 - lerp;
    if rest < 1e-3 { return top; }
    (base - top * lerp) / rest
}

impl FootSolver {
    pub(crate) fn swing_iteration(&mut self, ctx: &FootContext) {
        if self.lerp >= 1.0 {
            self.idle_ground_check(ctx);
            return;
        }
        self.adjust_foot_rotation(ctx, false);
        self.grounded = false;

        let height = self.params.step_height();
        let temp = arc_point(self.old_pos, self.new_pos, self.lerp, height);
        let dir = temp - self.cur_pos;
        let len = dir.length();
        let mut advance = true;
        if len > 1e-6 {
            if let Some(hit) = ctx.probe.capsulecast(self.cur_pos, temp, self.cfg.sweep_radius, dir, len, self.cfg.mask) {
                let dir_n = dir / len;
                let graze = self.cfg.graze_distance;
                let floor = self.old_pos.lerp(self.new_pos, self.lerp).y;
                if hit.point.y <= floor + 0.5 * graze {
                    // the ground the arc is coming down onto
                } else if hit.point.distance(self.new_pos) < graze || hit.point.distance(temp) < graze {
                    trace!(tick = ctx.step.tick, at = ?hit.point, "grazing contact");
                    self.cur_pos = hit.point - dir_n * graze;
                    advance = false;
                } else if self.handle_barrier(ctx, hit, dir_n) {
                    advance = false;
                }
            }
        }
        if advance {
            self.cur_pos = temp;
        }
        self.cur_normal = self.old_normal.lerp(self.new_normal, self.lerp).normalize_or(Vec3::Y);
        self.lerp += ctx.step.dt * self.params.step_speed();

        if self.lerp >= 1.0 {
            self.lerp = 1.0;
            if self.params.try_apply_mutation() {
                debug!(tick = ctx.step.tick, values = ?self.params.values(), "step parameters committed");
            }
            self.plant(ctx);
            self.last_plant_pos = ctx.body.pos;
            self.last_plant_look = ctx.body.forward();
        }
    }

    /// Probes down from just past the contact at `max_step_height` above the
    /// leg's reach, then sphere-casts around that crest. A verified top becomes
    /// the new target and the remaining swing is re-spliced through the
    /// current point. Returns whether it spliced.
    fn handle_barrier(&mut self, ctx: &FootContext, hit: Hit, dir_n: Vec3) -> bool {
        self.debug.barrier_hit = Some(hit.point);
        let crest = Vec3::new(
            hit.point.x + dir_n.x * CREST_NUDGE,
            ctx.body.pos.y - self.cfg.leg_length + self.cfg.max_step_height,
            hit.point.z + dir_n.z * CREST_NUDGE,
        );
        let frame = SearchFrame::new(ctx.probe, ctx.body, &self.cfg, self.body_height);
        let top = match frame.ray_down(crest, crest.y, self.cfg.max_step_height) {
            Some(h) if frame.verify(h.point, h.normal) => Some(h),
            _ => frame.barrier_fallback(crest, self.new_pos, &mut self.debug.search_points),
        };

        let Some(top) = top else {
            debug!(tick = ctx.step.tick, at = ?hit.point, "barrier without a foothold");
            self.ledger.push(ctx.step.tick, Diagnostic::BarrierUnresolved { hit: hit.point });
            return false;
        };

        let base = self.cur_pos - Vec3::Y * arc_lift(self.lerp, self.params.step_height());
        self.old_pos = splice_origin(base, top.point, self.lerp);
        self.new_pos = top.point;
        self.new_normal = top.normal;
        self.debug.barrier_top = Some(top.point);
        self.ledger.push(ctx.step.tick, Diagnostic::BarrierSpliced { hit: hit.point, top: top.point });
        debug!(tick = ctx.step.tick, hit = ?hit.point, top = ?top.point, "stepping onto barrier");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use footfall_core::{vec3, Isometry, StepCtx};
    use footfall_motion::MotionState;
    use footfall_terrain::{Aabb, LayerMask, TerrainProbe, TerrainScene};

    use crate::config::FootConfig;
    use crate::solver::FootPhase;

    #[test]
    fn spliced_line_passes_through_base() {
        let (base, top) = (vec3(0.1, 0.05, 0.12), vec3(0.4, 0.15, 0.1));
        for lerp in [0.0, 0.2, 0.5, 0.9] {
            let old = splice_origin(base, top, lerp);
            assert_abs_diff_eq!((old.lerp(top, lerp) - base).length(), 0.0, epsilon = 1e-5);
        }
        assert_eq!(splice_origin(base, top, 0.9999), top);
    }

    #[test]
    fn arc_peaks_mid_swing() {
        let p = arc_point(Vec3::ZERO, vec3(1.0, 0.0, 0.0), 0.5, 0.2);
        assert_abs_diff_eq!(p.y, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(arc_point(Vec3::ZERO, Vec3::X, 1.0, 0.2).y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn swing_steps_onto_a_barrier() {
        let scene = TerrainScene::flat(0.0)
            .with_box(Aabb::new(vec3(0.3, 0.0, -1.0), vec3(0.5, 0.15, 1.0)), LayerMask::layer(0));
        let body = Isometry::from_translation(vec3(0.6, 0.9, 0.0));
        let mut motion = MotionState::default();
        motion.set_grounded(true);

        let mut foot = FootSolver::new(FootConfig::right());
        foot.setup(&scene, body, vec3(0.0, 0.5, 0.12));
        foot.begin_step(vec3(0.85, 0.0, 0.12), Vec3::Y);

        let mut spliced_at = None;
        for tick in 1..60u64 {
            let ctx = FootContext { probe: &scene, body, motion: &motion, other_planted: true, step: StepCtx { dt: 1.0 / 60.0, tick } };
            let before = foot.cur_pos;
            let lerp = foot.lerp;
            foot.step(&ctx, false);
            if spliced_at.is_none() && foot.debug().barrier_top.is_some() {
                spliced_at = Some(lerp);
                // the foot holds still on the splice tick
                assert_eq!(foot.cur_pos, before);
                let resumed = arc_point(foot.old_pos, foot.new_pos, lerp, foot.params.step_height());
                assert_abs_diff_eq!((resumed - before).length(), 0.0, epsilon = 1e-4);
            }
            if !foot.is_swinging() { break; }
        }

        assert!(spliced_at.is_some());
        assert!(foot.ledger().count(|d| matches!(d, Diagnostic::BarrierSpliced { .. })) >= 1);
        let t = foot.target_position();
        assert_abs_diff_eq!(t.y, 0.15, epsilon = 1e-4);
        assert!(t.x >= 0.3 && t.x <= 0.5);
        assert_eq!(foot.phase(), FootPhase::Planted);
    }

    /// Flat ground at y = 0 with a solid wall over `wall` (x range) that rays
    /// cannot start in. Only the first sweep of a swing, the one leaving x = 0,
    /// reports `sweep`.
    struct ScriptedProbe { sweep: Hit, wall: Option<(f32, f32)> }

    impl TerrainProbe for ScriptedProbe {
        fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, _: LayerMask) -> Option<Hit> {
            if dir.y >= 0.0 || origin.y < 0.0 || origin.y > max_distance { return None; }
            if self.wall.is_some_and(|(lo, hi)| origin.x >= lo && origin.x <= hi) { return None; }
            Some(Hit { point: vec3(origin.x, 0.0, origin.z), normal: Vec3::Y, distance: origin.y })
        }
        fn spherecast(&self, _: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Vec<Hit> { Vec::new() }
        fn capsulecast(&self, p0: Vec3, p1: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Option<Hit> {
            (p0.x < 0.01 && p1.x > 0.01).then_some(self.sweep)
        }
    }

    fn ctx<'a>(probe: &'a ScriptedProbe, body: Isometry, motion: &'a MotionState, tick: u64) -> FootContext<'a> {
        FootContext { probe, body, motion, other_planted: true, step: StepCtx { dt: 1.0 / 60.0, tick } }
    }

    fn swinging_foot(probe: &ScriptedProbe, body: Isometry) -> FootSolver {
        let mut foot = FootSolver::new(FootConfig::right());
        foot.setup(probe, body, vec3(0.0, 0.5, 0.12));
        foot.begin_step(vec3(0.4, 0.0, 0.12), Vec3::Y);
        foot
    }

    #[test]
    fn grazing_contact_pulls_back_and_keeps_going() {
        let sweep = Hit { point: vec3(0.36, 0.06, 0.12), normal: Vec3::NEG_X, distance: 0.3 };
        let probe = ScriptedProbe { sweep, wall: None };
        let body = Isometry::from_translation(vec3(0.0, 0.9, 0.0));
        let mut motion = MotionState::default();
        motion.set_grounded(true);
        let mut foot = swinging_foot(&probe, body);

        // the first tick starts at lerp 0 and does not move
        foot.step(&ctx(&probe, body, &motion, 1), false);
        let (before, lerp) = (foot.cur_pos, foot.lerp);
        let temp = arc_point(foot.old_pos, foot.new_pos, lerp, foot.params.step_height());
        let dir_n = (temp - before).normalize();

        foot.step(&ctx(&probe, body, &motion, 2), false);
        let pulled = sweep.point - dir_n * foot.config().graze_distance;
        assert_abs_diff_eq!((foot.cur_pos - pulled).length(), 0.0, epsilon = 1e-5);
        assert!(foot.lerp > lerp);
        assert_eq!(foot.target_position(), vec3(0.4, 0.0, 0.12));

        for tick in 3..60u64 {
            foot.step(&ctx(&probe, body, &motion, tick), false);
            if !foot.is_swinging() { break; }
        }
        assert_eq!(foot.phase(), FootPhase::Planted);
        assert_eq!(foot.target_position(), vec3(0.4, 0.0, 0.12));
        assert!(foot.debug().barrier_top.is_none());
        assert_eq!(foot.ledger().count(|d| matches!(d, Diagnostic::BarrierSpliced { .. })), 0);
        assert!(foot.ledger().is_empty());
    }

    #[test]
    fn wall_taller_than_a_step_is_swung_through() {
        let sweep = Hit { point: vec3(0.2, 0.1, 0.12), normal: Vec3::NEG_X, distance: 0.2 };
        let probe = ScriptedProbe { sweep, wall: Some((0.2, 0.3)) };
        let body = Isometry::from_translation(vec3(0.0, 0.9, 0.0));
        let mut motion = MotionState::default();
        motion.set_grounded(true);
        let mut foot = swinging_foot(&probe, body);

        for tick in 1..60u64 {
            foot.step(&ctx(&probe, body, &motion, tick), false);
            if !foot.is_swinging() { break; }
        }

        assert_eq!(foot.ledger().count(|d| matches!(d, Diagnostic::BarrierUnresolved { .. })), 1);
        assert_eq!(foot.ledger().count(|d| matches!(d, Diagnostic::BarrierSpliced { .. })), 0);
        assert_eq!(foot.debug().barrier_hit, Some(sweep.point));
        assert!(foot.debug().barrier_top.is_none());
        assert_eq!(foot.phase(), FootPhase::Planted);
        assert_eq!(foot.target_position(), vec3(0.4, 0.0, 0.12));
    }
}
