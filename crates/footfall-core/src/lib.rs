pub mod types;
pub mod math;
pub mod curve;
pub mod hash;
pub mod fanout;
pub mod determinism;
pub mod step_ctx;

pub use types::{Vec3, Isometry, Transform, vec3, iso};
pub use math::{planar, project_on_plane, angle_deg, slerp_dir, look_rotation, q6};
pub use curve::{Curve, Keyframe, hermite};
pub use hash::{StepHasher, hash_vec3, hash_quat, hash_f32};
pub use fanout::{for_each_mut, PARALLEL_THRESHOLD};
pub use determinism::TickContract;
pub use step_ctx::StepCtx;
pub use glam::Quat;
