use footfall_core::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb { pub min: Vec3, pub max: Vec3 }

impl Aabb {
    #[inline] pub fn new(min: Vec3, max: Vec3) -> Self { Self { min: min.min(max), max: min.max(max) } }
    #[inline] pub fn expanded(&self, r: f32) -> Aabb {
        let e = Vec3::splat(r);
        Aabb { min: self.min - e, max: self.max + e }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_orders_corners() {
        let a = Aabb::new(Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(a.min, Vec3::ZERO);
        assert_eq!(a.max, Vec3::ONE);
        let g = a.expanded(0.5);
        assert_eq!(g.min, Vec3::splat(-0.5));
        assert_eq!(g.max, Vec3::splat(1.5));
    }
}
