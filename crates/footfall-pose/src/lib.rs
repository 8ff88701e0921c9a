//! Poses: a position and orientation tagged with the coordinate space they live in
//! and the adjustment policy the foot solver applies to them.
//!
//! Local poses are relative to a parent frame (the *space anchor*). The anchor is
//! never stored in the pose; every conversion or cross-space blend takes it as an
//! explicit `Option<&Isometry>` and fails when it is needed but missing.

pub mod error;
pub mod pose;
pub mod blender;
pub mod space;

pub use error::PoseError;
pub use pose::{Pose, Space, AdjustmentType};
pub use blender::PoseBlender;
pub use space::SpaceConvert;
