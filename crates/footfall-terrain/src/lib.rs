pub mod probe;
pub mod aabb;
pub mod heightfield;
pub mod sweep;
pub mod scene;

pub use probe::{TerrainProbe, Hit, LayerMask, EmptyProbe};
pub use aabb::Aabb;
pub use heightfield::HeightField;
pub use sweep::{ray_aabb_slab, sweep_sphere_vs_aabb, sweep_capsule_vs_aabbs, SweepHit};
pub use scene::{TerrainScene, Obstacle};
