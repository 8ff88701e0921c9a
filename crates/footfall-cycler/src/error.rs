use footfall_pose::PoseError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CyclerError {
    #[error("a cycler needs one blender per anchor pose and at least one anchor (got {anchors} anchors, {blenders} blenders)")]
    ConfigurationMismatch { anchors: usize, blenders: usize },
    #[error("no active cyclers; call set_active first")]
    NotActive,
    #[error("cycler index {index} out of range ({len} cyclers)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("blending {cyclers} cyclers takes {expected} weights, got {got}")]
    BlendArity { cyclers: usize, expected: usize, got: usize },
    #[error(transparent)]
    Pose(#[from] PoseError),
}
