use footfall_core::{for_each_mut, Isometry};
use footfall_pose::{Pose, PoseBlender, PoseError, Space, SpaceConvert};

use crate::cycle::{wrap01, Cycle};
use crate::error::CyclerError;
use crate::pose_cycler::PoseCycler;

/// Blends the output of two pose cyclers (e.g. walk and run) that share one clock.
///
/// The multi-cycler owns the canonical cycle position; the active pair is forced
/// onto it before every sample so the two gaits never drift out of phase.
#[derive(Clone, Debug)]
pub struct MultiPoseCycler {
    pub(crate) cyclers: Vec<PoseCycler>,
    pub(crate) blender: PoseBlender,
    pub(crate) position: f32,
    pub(crate) speed: f32,
    active: Option<(usize, usize)>,
    pub(crate) space_anchor: Option<Isometry>,
}

impl MultiPoseCycler {
    pub fn new(cyclers: Vec<PoseCycler>, blender: PoseBlender, speed: f32) -> Self {
        Self { cyclers, blender, position: 0.0, speed, active: None, space_anchor: None }
    }

    #[inline] pub fn len(&self) -> usize { self.cyclers.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.cyclers.is_empty() }
    pub fn cycler(&self, index: usize) -> Option<&PoseCycler> { self.cyclers.get(index) }
    pub fn cycler_mut(&mut self, index: usize) -> Option<&mut PoseCycler> { self.cyclers.get_mut(index) }
    pub fn cyclers(&self) -> &[PoseCycler] { &self.cyclers }
    pub fn blender(&self) -> &PoseBlender { &self.blender }
    pub fn set_blender(&mut self, blender: PoseBlender) { self.blender = blender; }

    #[inline] pub fn position(&self) -> f32 { self.position }
    #[inline] pub fn speed(&self) -> f32 { self.speed }

    pub fn active(&self) -> Option<(usize, usize)> { self.active }

    pub(crate) fn check(&self, index: usize) -> Result<usize, CyclerError> {
        if index < self.cyclers.len() { Ok(index) } else { Err(CyclerError::IndexOutOfRange { index, len: self.cyclers.len() }) }
    }

    fn active_pair(&self) -> Result<(usize, usize), CyclerError> {
        self.active.ok_or(CyclerError::NotActive)
    }

    /// Moves cycler `index` onto the shared clock.
    pub(crate) fn synchronise(&mut self, index: usize) {
        let c = &mut self.cyclers[index];
        if (c.position() - self.position).abs() > f32::EPSILON {
            c.skip_to(self.position);
        }
        c.set_speed(self.speed);
    }

    /// Makes `first`/`second` the driving pair, synchronised and with fresh anchors.
    pub fn set_active(&mut self, first: usize, second: usize) -> Result<(), CyclerError> {
        self.check(first)?;
        self.check(second)?;
        self.active = Some((first, second));
        for i in [first, second] {
            self.synchronise(i);
            self.cyclers[i].reset_cycle_poses();
        }
        tracing::trace!(first, second, position = self.position, "cycler pair activated");
        Ok(())
    }

    pub fn set_inactive(&mut self) { self.active = None; }

    pub fn swap_active(&mut self) -> Result<(), CyclerError> {
        let (a, b) = self.active_pair()?;
        self.active = Some((b, a));
        self.synchronise(a);
        self.synchronise(b);
        Ok(())
    }

    /// Advances the active pair one tick and blends `first → second` by `weight`.
    pub fn next_pose(&mut self, weight: f32) -> Result<Pose, CyclerError> {
        let (a, b) = self.active_pair()?;
        self.next_pose_pair(a, b, weight)
    }

    /// Same as [`next_pose`](Self::next_pose) for an explicit pair.
    pub fn next_pose_pair(&mut self, first: usize, second: usize, weight: f32) -> Result<Pose, CyclerError> {
        self.check(first)?;
        self.check(second)?;
        self.synchronise(first);
        self.synchronise(second);
        let pa = self.cyclers[first].next_pose()?;
        let pb = if second == first { pa } else { self.cyclers[second].next_pose()? };
        let pose = self.blender.blend(&pa, &pb, weight, self.space_anchor.as_ref())?;
        self.position = self.cyclers[first].position();
        Ok(pose)
    }

    pub fn next_pose_in(&mut self, space: Space, weight: f32) -> Result<Pose, CyclerError> {
        let pose = self.next_pose(weight)?;
        Ok(pose.to_space(space, self.space_anchor.as_ref())?)
    }

    pub fn current_target_poses(&self) -> Result<(Pose, Pose), CyclerError> {
        let (a, b) = self.active_pair()?;
        Ok((self.cyclers[a].current_target(), self.cyclers[b].current_target()))
    }

    pub fn current_target_poses_in(&self, space: Space) -> Result<(Pose, Pose), CyclerError> {
        let (a, b) = self.current_target_poses()?;
        let anchor = self.space_anchor.as_ref();
        Ok((a.to_space(space, anchor)?, b.to_space(space, anchor)?))
    }

    /// Adjusts the second active cycler's upcoming anchor.
    pub fn adjust_cycle_target_pose(&mut self, pose: Pose) -> Result<(), CyclerError> {
        let (_, b) = self.active_pair()?;
        self.cyclers[b].adjust_cycle_target_pose(pose);
        Ok(())
    }

    pub fn adjust_cycle_target_poses(&mut self, first: Pose, second: Pose) -> Result<(), CyclerError> {
        let (a, b) = self.active_pair()?;
        self.cyclers[a].adjust_cycle_target_pose(first);
        self.cyclers[b].adjust_cycle_target_pose(second);
        Ok(())
    }

    pub fn adjust_cycle_target_pose_at(&mut self, index: usize, pose: Pose) -> Result<(), CyclerError> {
        self.check(index)?;
        self.cyclers[index].adjust_cycle_target_pose(pose);
        Ok(())
    }

    pub fn adjust_cycle_speed(&mut self, speed: f32) -> Result<(), CyclerError> {
        let (a, b) = self.active_pair()?;
        self.speed = speed;
        self.cyclers[a].set_speed(speed);
        self.cyclers[b].set_speed(speed);
        Ok(())
    }

    /// Pushes the shared speed to every cycler, active or not.
    pub fn sync_cycle_speeds(&mut self) -> Result<(), CyclerError> {
        self.active_pair()?;
        let speed = self.speed;
        for_each_mut(&mut self.cyclers, |c| c.set_speed(speed));
        Ok(())
    }

    pub fn reset_cycle_poses(&mut self) -> Result<(), CyclerError> {
        let (a, b) = self.active_pair()?;
        self.cyclers[a].reset_cycle_poses();
        self.cyclers[b].reset_cycle_poses();
        Ok(())
    }

    pub fn reset_cycle_poses_at(&mut self, index: usize) -> Result<(), CyclerError> {
        self.check(index)?;
        self.cyclers[index].reset_cycle_poses();
        Ok(())
    }

    /// Frame local anchors are resolved against, for this and every child cycler.
    pub fn set_space_anchor(&mut self, anchor: Option<Isometry>) {
        self.space_anchor = anchor;
        for_each_mut(&mut self.cyclers, |c| c.set_space_anchor(anchor));
    }
}

impl Cycle for MultiPoseCycler {
    fn cycle_position(&self) -> f32 { self.position }
    fn cycle_speed(&self) -> f32 { self.speed }

    fn set_cycle_speed(&mut self, speed: f32) {
        self.speed = speed;
        if let Some((a, b)) = self.active {
            self.cyclers[a].set_speed(speed);
            self.cyclers[b].set_speed(speed);
        }
    }

    /// Without an active pair every cycler advances and the first one sets the clock.
    fn skip(&mut self) -> f32 {
        match self.active {
            Some((a, b)) => {
                self.cyclers[a].skip();
                if b != a { self.cyclers[b].skip(); }
                self.position = self.cyclers[a].position();
            }
            None => {
                for_each_mut(&mut self.cyclers, |c| { c.skip(); });
                self.position = match self.cyclers.first() {
                    Some(c) => c.position(),
                    None => wrap01(self.position + self.speed),
                };
            }
        }
        self.position
    }

    fn skip_to(&mut self, position: f32) {
        let position = wrap01(position);
        match self.active {
            Some((a, b)) => {
                self.cyclers[a].skip_to(position);
                self.cyclers[b].skip_to(position);
            }
            None => for_each_mut(&mut self.cyclers, |c| c.skip_to(position)),
        }
        self.position = position;
    }
}

impl SpaceConvert for MultiPoseCycler {
    fn convert_to(&mut self, space: Space, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        for c in &mut self.cyclers {
            c.convert_to(space, anchor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use footfall_core::vec3;
    use glam::Quat;

    fn line(x: f32, speed: f32) -> PoseCycler {
        let anchors = vec![
            Pose::world(vec3(x, 0.0, 0.0), Quat::IDENTITY),
            Pose::world(vec3(x, 1.0, 0.0), Quat::IDENTITY),
        ];
        PoseCycler::uniform(anchors, PoseBlender::default(), speed).unwrap()
    }

    fn rig() -> MultiPoseCycler {
        MultiPoseCycler::new(vec![line(0.0, 0.3), line(2.0, 0.01), line(4.0, 0.2)], PoseBlender::default(), 0.05)
    }

    #[test]
    fn inactive_operations_fail() {
        let mut m = rig();
        assert_eq!(m.next_pose(0.5), Err(CyclerError::NotActive));
        assert_eq!(m.adjust_cycle_speed(0.1), Err(CyclerError::NotActive));
        assert_eq!(m.current_target_poses().unwrap_err(), CyclerError::NotActive);
        assert_eq!(m.adjust_cycle_target_pose(Pose::default()), Err(CyclerError::NotActive));
        m.set_active(0, 1).unwrap();
        m.set_inactive();
        assert_eq!(m.next_pose(0.5), Err(CyclerError::NotActive));
    }

    #[test]
    fn bad_index_rejected() {
        let mut m = rig();
        assert_eq!(m.set_active(0, 7), Err(CyclerError::IndexOutOfRange { index: 7, len: 3 }));
        assert_eq!(m.active(), None);
    }

    #[test]
    fn blend_follows_weight_and_clock_is_shared() {
        let mut m = rig();
        m.set_active(0, 1).unwrap();
        let p = m.next_pose(0.5).unwrap();
        assert_abs_diff_eq!(p.position.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.position(), 0.05, epsilon = 1e-6);
        assert_abs_diff_eq!(m.cyclers()[1].position(), 0.05, epsilon = 1e-6);
        let p = m.next_pose(0.0).unwrap();
        assert_abs_diff_eq!(p.position.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn switching_pairs_keeps_new_pair_in_phase() {
        let mut m = rig();
        m.set_active(0, 1).unwrap();
        for _ in 0..7 { m.next_pose(0.3).unwrap(); }
        m.set_active(1, 2).unwrap();
        let (a, b) = (m.cyclers()[1].position(), m.cyclers()[2].position());
        assert_eq!(a, b);
        assert_abs_diff_eq!(a, m.position(), epsilon = 1e-6);
        assert_eq!(m.cyclers()[2].speed(), m.speed());
    }

    #[test]
    fn adjustment_targets_second_cycler() {
        let mut m = rig();
        m.set_active(0, 2).unwrap();
        let moved = Pose::world(vec3(7.0, 7.0, 7.0), Quat::IDENTITY);
        m.adjust_cycle_target_pose(moved).unwrap();
        let (t0, t1) = m.current_target_poses().unwrap();
        assert_eq!(t1, moved);
        assert_ne!(t0, moved);
    }

    #[test]
    fn sync_with_wraps_offset() {
        let mut leader = rig();
        leader.set_active(0, 1).unwrap();
        for _ in 0..14 { leader.next_pose(0.0).unwrap(); } // 0.7
        let mut follower = rig();
        follower.set_active(0, 1).unwrap();
        follower.set_cycle_speed(0.2);
        follower.sync_with(&leader, 0.5);
        assert_abs_diff_eq!(follower.position(), 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(follower.speed(), 0.05, epsilon = 1e-7);
        assert_abs_diff_eq!(follower.cyclers()[1].position(), 0.2, epsilon = 1e-5);
    }

    #[test]
    fn inactive_skip_moves_everything() {
        let mut m = rig();
        m.skip_to(0.4);
        assert!(m.cyclers().iter().all(|c| (c.position() - 0.4).abs() < 1e-6));
        m.skip();
        // each cycler runs at its own speed when nothing is active
        assert_abs_diff_eq!(m.position(), 0.7, epsilon = 1e-5);
        assert_abs_diff_eq!(m.cyclers()[1].position(), 0.41, epsilon = 1e-5);
    }
}
