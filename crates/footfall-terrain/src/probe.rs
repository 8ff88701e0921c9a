use footfall_core::Vec3;
use serde::{Deserialize, Serialize};

/// Surface contact returned by a terrain query. `distance` is measured along the cast direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Bit set of collision layers a query is allowed to see.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self { LayerMask::ALL }
}

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    #[inline] pub fn layer(index: u8) -> LayerMask { LayerMask(1u32 << (index as u32 & 31)) }
    #[inline] pub fn intersects(self, other: LayerMask) -> bool { self.0 & other.0 != 0 }
    #[inline] pub fn with(self, index: u8) -> LayerMask { LayerMask(self.0 | LayerMask::layer(index).0) }
}

/// Synchronous geometric queries against static terrain.
///
/// Colliders the cast starts inside of are not reported. Directions need not be unit.
pub trait TerrainProbe {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<Hit>;

    /// Every contact of a sphere swept along `dir`, nearest first.
    fn spherecast(&self, origin: Vec3, radius: f32, dir: Vec3, max_distance: f32, mask: LayerMask) -> Vec<Hit>;

    /// First contact of the capsule `p0..p1` swept along `dir`.
    fn capsulecast(&self, p0: Vec3, p1: Vec3, radius: f32, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<Hit>;
}

/// Terrain with nothing in it.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyProbe;

impl TerrainProbe for EmptyProbe {
    fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<Hit> { None }
    fn spherecast(&self, _: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Vec<Hit> { Vec::new() }
    fn capsulecast(&self, _: Vec3, _: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Option<Hit> { None }
}

impl<T: TerrainProbe + ?Sized> TerrainProbe for &T {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<Hit> {
        (**self).raycast(origin, dir, max_distance, mask)
    }
    fn spherecast(&self, origin: Vec3, radius: f32, dir: Vec3, max_distance: f32, mask: LayerMask) -> Vec<Hit> {
        (**self).spherecast(origin, radius, dir, max_distance, mask)
    }
    fn capsulecast(&self, p0: Vec3, p1: Vec3, radius: f32, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<Hit> {
        (**self).capsulecast(p0, p1, radius, dir, max_distance, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bits() {
        let m = LayerMask::layer(3).with(5);
        assert!(m.intersects(LayerMask::layer(5)));
        assert!(!m.intersects(LayerMask::layer(0)));
        assert!(LayerMask::ALL.intersects(m));
        assert!(!LayerMask::NONE.intersects(m));
    }
}
