use footfall_core::Isometry;
use footfall_pose::{Pose, PoseBlender, PoseError, Space, SpaceConvert};

use crate::cycle::Cycle;
use crate::error::CyclerError;
use crate::multi::MultiPoseCycler;
use crate::pose_cycler::PoseCycler;

/// N-ary generalisation of [`MultiPoseCycler`]: any subset of cyclers, folded left
/// to right as `blend(blend(c0, c1, w0), c2, w1)…`.
///
/// The fold is order dependent and always runs on the calling thread.
#[derive(Clone, Debug)]
pub struct CyclerMeld {
    base: MultiPoseCycler,
    active: Vec<usize>,
}

impl CyclerMeld {
    pub fn new(cyclers: Vec<PoseCycler>, blender: PoseBlender, speed: f32) -> Self {
        Self { base: MultiPoseCycler::new(cyclers, blender, speed), active: Vec::new() }
    }

    #[inline] pub fn len(&self) -> usize { self.base.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.base.is_empty() }
    pub fn cyclers(&self) -> &[PoseCycler] { self.base.cyclers() }
    pub fn cycler_mut(&mut self, index: usize) -> Option<&mut PoseCycler> { self.base.cycler_mut(index) }
    #[inline] pub fn position(&self) -> f32 { self.base.position }
    #[inline] pub fn speed(&self) -> f32 { self.base.speed }
    pub fn active(&self) -> &[usize] { &self.active }

    pub fn set_active(&mut self, indices: &[usize]) -> Result<(), CyclerError> {
        if indices.is_empty() { return Err(CyclerError::NotActive); }
        for &i in indices { self.base.check(i)?; }
        self.active = indices.to_vec();
        for &i in indices {
            self.base.synchronise(i);
            self.base.cyclers[i].reset_cycle_poses();
        }
        Ok(())
    }

    pub fn set_inactive(&mut self) { self.active.clear(); }

    /// Folds the active set with the same weight at every step.
    pub fn next_pose(&mut self, weight: f32) -> Result<Pose, CyclerError> {
        if self.active.is_empty() { return Err(CyclerError::NotActive); }
        let weights = vec![weight; self.active.len() - 1];
        self.next_pose_weighted(&weights)
    }

    /// `weights[k]` blends the running result with the `k + 1`-th active cycler.
    pub fn next_pose_weighted(&mut self, weights: &[f32]) -> Result<Pose, CyclerError> {
        if self.active.is_empty() { return Err(CyclerError::NotActive); }
        let indices = self.active.clone();
        self.fold(&indices, weights)
    }

    /// Folds an explicit subset; with `set_active` the subset becomes the active set first.
    pub fn next_pose_with(&mut self, indices: &[usize], weights: &[f32], set_active: bool) -> Result<Pose, CyclerError> {
        if indices.is_empty() { return Err(CyclerError::NotActive); }
        if set_active {
            self.set_active(indices)?;
        } else {
            for &i in indices { self.base.check(i)?; }
        }
        self.fold(indices, weights)
    }

    fn fold(&mut self, indices: &[usize], weights: &[f32]) -> Result<Pose, CyclerError> {
        let expected = indices.len() - 1;
        if weights.len() != expected {
            return Err(CyclerError::BlendArity { cyclers: indices.len(), expected, got: weights.len() });
        }
        for &i in indices { self.base.synchronise(i); }

        let anchor = self.base.space_anchor;
        let mut acc = self.base.cyclers[indices[0]].next_pose()?;
        for (&i, &w) in indices[1..].iter().zip(weights) {
            let next = self.base.cyclers[i].next_pose()?;
            acc = self.base.blender.blend(&acc, &next, w, anchor.as_ref())?;
        }
        self.base.position = self.base.cyclers[indices[0]].position();
        Ok(acc)
    }

    pub fn next_pose_in(&mut self, space: Space, weight: f32) -> Result<Pose, CyclerError> {
        let pose = self.next_pose(weight)?;
        Ok(pose.to_space(space, self.base.space_anchor.as_ref())?)
    }

    pub fn current_target_poses(&self) -> Result<Vec<Pose>, CyclerError> {
        if self.active.is_empty() { return Err(CyclerError::NotActive); }
        Ok(self.active.iter().map(|&i| self.base.cyclers[i].current_target()).collect())
    }

    /// Pairs targets with the active set in order; surplus poses are ignored.
    pub fn adjust_cycle_target_poses(&mut self, poses: &[Pose]) -> Result<(), CyclerError> {
        if self.active.is_empty() { return Err(CyclerError::NotActive); }
        for (&i, &p) in self.active.iter().zip(poses) {
            self.base.cyclers[i].adjust_cycle_target_pose(p);
        }
        Ok(())
    }

    pub fn reset_cycle_poses(&mut self) -> Result<(), CyclerError> {
        if self.active.is_empty() { return Err(CyclerError::NotActive); }
        for &i in &self.active { self.base.cyclers[i].reset_cycle_poses(); }
        Ok(())
    }

    pub fn set_space_anchor(&mut self, anchor: Option<Isometry>) { self.base.set_space_anchor(anchor); }
}

impl Cycle for CyclerMeld {
    fn cycle_position(&self) -> f32 { self.base.position }
    fn cycle_speed(&self) -> f32 { self.base.speed }

    fn set_cycle_speed(&mut self, speed: f32) {
        self.base.speed = speed;
        for &i in &self.active { self.base.cyclers[i].set_speed(speed); }
    }

    fn skip(&mut self) -> f32 {
        if self.active.is_empty() { return self.base.skip(); }
        for &i in &self.active { self.base.cyclers[i].skip(); }
        self.base.position = self.base.cyclers[self.active[0]].position();
        self.base.position
    }

    fn skip_to(&mut self, position: f32) {
        if self.active.is_empty() { return self.base.skip_to(position); }
        let position = crate::wrap01(position);
        for &i in &self.active { self.base.cyclers[i].skip_to(position); }
        self.base.position = position;
    }
}

impl SpaceConvert for CyclerMeld {
    fn convert_to(&mut self, space: Space, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        self.base.convert_to(space, anchor)
    }
}
