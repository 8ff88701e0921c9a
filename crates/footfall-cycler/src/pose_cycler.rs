use footfall_core::Isometry;
use footfall_pose::{Pose, PoseBlender, PoseError, Space, SpaceConvert};
use serde::{Deserialize, Serialize};

use crate::cycle::{wrap01, Cycle};
use crate::error::CyclerError;

/// Authored form of a [`PoseCycler`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoseCyclerDesc {
    pub anchors: Vec<Pose>,
    pub blenders: Vec<PoseBlender>,
    pub speed: f32,
}

impl TryFrom<PoseCyclerDesc> for PoseCycler {
    type Error = CyclerError;
    fn try_from(d: PoseCyclerDesc) -> Result<Self, CyclerError> { PoseCycler::new(d.anchors, d.blenders, d.speed) }
}

/// Loops through anchor poses, blending consecutive pairs.
///
/// Segment `i` blends anchor `i` into anchor `i + 1` with `blenders[i]`; the last
/// segment closes the loop back to anchor 0. Runtime adjustments go into a working
/// copy of the anchors which is restored from the authored set at every wrap.
#[derive(Clone, Debug)]
pub struct PoseCycler {
    anchors: Vec<Pose>,
    working: Vec<Pose>,
    blenders: Vec<PoseBlender>,
    position: f32,
    speed: f32,
    space_anchor: Option<Isometry>,
}

impl PoseCycler {
    pub fn new(anchors: Vec<Pose>, blenders: Vec<PoseBlender>, speed: f32) -> Result<Self, CyclerError> {
        if anchors.is_empty() || anchors.len() != blenders.len() {
            return Err(CyclerError::ConfigurationMismatch { anchors: anchors.len(), blenders: blenders.len() });
        }
        Ok(Self { working: anchors.clone(), anchors, blenders, position: 0.0, speed, space_anchor: None })
    }

    /// Same blender for every segment.
    pub fn uniform(anchors: Vec<Pose>, blender: PoseBlender, speed: f32) -> Result<Self, CyclerError> {
        let blenders = vec![blender; anchors.len()];
        Self::new(anchors, blenders, speed)
    }

    #[inline] pub fn len(&self) -> usize { self.anchors.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.anchors.is_empty() }
    pub fn anchors(&self) -> &[Pose] { &self.anchors }
    pub fn working_anchors(&self) -> &[Pose] { &self.working }
    pub fn blenders(&self) -> &[PoseBlender] { &self.blenders }

    #[inline] pub fn position(&self) -> f32 { self.position }
    #[inline] pub fn speed(&self) -> f32 { self.speed }
    pub fn set_speed(&mut self, speed: f32) { self.speed = speed; }

    /// At least `subdivisions` ticks between consecutive anchors.
    pub fn adjust_relative_speed(&mut self, subdivisions: u32) {
        self.speed = 1.0 / (self.len() as f32 * subdivisions.max(1) as f32);
    }

    pub fn space_anchor(&self) -> Option<&Isometry> { self.space_anchor.as_ref() }
    pub fn set_space_anchor(&mut self, anchor: Option<Isometry>) { self.space_anchor = anchor; }

    /// Segment index and segment-local factor for the current position.
    pub fn segment(&self) -> (usize, f32) {
        let n = self.len();
        if n <= 1 { return (0, 0.0); }
        let x = n as f32 * self.position;
        let i = (x.floor() as usize).min(n - 1);
        (i, (x - i as f32).clamp(0.0, 1.0))
    }

    #[inline]
    fn target_index(&self) -> usize { (self.segment().0 + 1) % self.len() }

    /// Pose at the current position without advancing.
    pub fn sample(&self) -> Result<Pose, PoseError> {
        let n = self.len();
        if n == 1 { return Ok(self.working[0]); }
        let (i, u) = self.segment();
        let j = (i + 1) % n;
        self.blenders[i].blend(&self.working[i], &self.working[j], u, self.space_anchor.as_ref())
    }

    /// Samples at the current position, then advances by `speed`.
    pub fn next_pose(&mut self) -> Result<Pose, PoseError> {
        let pose = self.sample()?;
        self.advance();
        Ok(pose)
    }

    pub fn next_pose_in(&mut self, space: Space) -> Result<Pose, PoseError> {
        let pose = self.next_pose()?;
        pose.to_space(space, self.space_anchor.as_ref())
    }

    /// The upcoming anchor of the current segment.
    pub fn current_target(&self) -> Pose { self.working[self.target_index()] }

    pub fn current_target_in(&self, space: Space) -> Result<Pose, PoseError> {
        self.current_target().to_space(space, self.space_anchor.as_ref())
    }

    /// Replaces the upcoming anchor until the next wrap.
    pub fn adjust_cycle_target_pose(&mut self, pose: Pose) {
        let j = self.target_index();
        self.working[j] = pose;
    }

    pub fn reset_cycle_poses(&mut self) {
        self.working.clone_from(&self.anchors);
    }

    fn advance(&mut self) {
        let next = self.position + self.speed;
        if (0.0..1.0).contains(&next) {
            self.position = next;
        } else {
            self.position = wrap01(next);
            self.reset_cycle_poses();
        }
    }
}

impl Cycle for PoseCycler {
    fn cycle_position(&self) -> f32 { self.position }
    fn cycle_speed(&self) -> f32 { self.speed }
    fn set_cycle_speed(&mut self, speed: f32) { self.speed = speed; }

    fn skip(&mut self) -> f32 {
        self.advance();
        self.position
    }

    fn skip_to(&mut self, position: f32) {
        let position = wrap01(position);
        if self.position - position > f32::EPSILON {
            self.reset_cycle_poses();
        }
        self.position = position;
    }
}

impl SpaceConvert for PoseCycler {
    fn convert_to(&mut self, space: Space, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        if anchor.is_none() {
            if let Some(p) = self.anchors.iter().chain(self.working.iter()).find(|p| p.space != space) {
                return Err(PoseError::NoSpaceAnchor { from: p.space, to: space });
            }
        }
        self.anchors.as_mut_slice().convert_to(space, anchor)?;
        self.working.as_mut_slice().convert_to(space, anchor)
    }
}
