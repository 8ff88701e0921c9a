use glam::Quat;
use serde::{Deserialize, Serialize};

pub type Vec3 = glam::Vec3;

#[inline] pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 { Vec3::new(x, y, z) }
#[inline] pub fn iso(pos: Vec3, rot: Quat) -> Isometry { Isometry { pos, rot } }

/// Rigid frame. Y is up, the frame's forward axis is local +X and its right axis local +Z.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Isometry { pub pos: Vec3, pub rot: Quat }

impl Default for Isometry {
    fn default() -> Self { Self { pos: Vec3::ZERO, rot: Quat::IDENTITY } }
}

impl Isometry {
    pub const IDENTITY: Self = Self { pos: Vec3::ZERO, rot: Quat::IDENTITY };

    #[inline] pub fn from_translation(pos: Vec3) -> Self { Self { pos, rot: Quat::IDENTITY } }

    #[inline] pub fn transform_point(&self, p: Vec3) -> Vec3 { self.rot * p + self.pos }
    #[inline] pub fn transform_vector(&self, v: Vec3) -> Vec3 { self.rot * v }
    #[inline] pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 { self.rot.inverse() * (p - self.pos) }

    pub fn inverse(&self) -> Self {
        let inv = self.rot.inverse();
        Self { pos: inv * -self.pos, rot: inv }
    }

    /// `self ∘ rhs`: rhs expressed in self's frame, lifted to self's parent frame.
    pub fn mul_iso(&self, rhs: &Isometry) -> Self {
        Self { pos: self.transform_point(rhs.pos), rot: (self.rot * rhs.rot).normalize() }
    }

    #[inline] pub fn forward(&self) -> Vec3 { self.rot * Vec3::X }
    #[inline] pub fn right(&self) -> Vec3 { self.rot * Vec3::Z }
    #[inline] pub fn up(&self) -> Vec3 { self.rot * Vec3::Y }
}

/// Scene-graph slot a pose is applied to: a local isometry under an optional parent frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Transform {
    pub parent: Option<Isometry>,
    pub local: Isometry,
}

impl Transform {
    pub fn new(parent: Option<Isometry>, local: Isometry) -> Self { Self { parent, local } }

    pub fn world(&self) -> Isometry {
        match &self.parent {
            Some(p) => p.mul_iso(&self.local),
            None => self.local,
        }
    }

    /// Stores `world` as the local isometry relative to the parent.
    pub fn set_world(&mut self, world: Isometry) {
        self.local = match &self.parent {
            Some(p) => p.inverse().mul_iso(&world),
            None => world,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn inverse_undoes_transform() {
        let a = iso(vec3(1.0, 2.0, -3.0), Quat::from_rotation_y(0.7));
        let p = vec3(0.3, -0.4, 2.0);
        let back = a.inverse().transform_point(a.transform_point(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-5);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-5);
        assert_abs_diff_eq!(back.z, p.z, epsilon = 1e-5);
    }

    #[test]
    fn axes_follow_rotation() {
        let a = iso(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // +X rotated 90° about Y points to -Z
        assert!((a.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((a.right() - Vec3::X).length() < 1e-5);
        assert!((a.up() - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn set_world_round_trips_through_parent() {
        let parent = iso(vec3(5.0, 0.0, 0.0), Quat::from_rotation_y(1.1));
        let mut t = Transform::new(Some(parent), Isometry::IDENTITY);
        let w = iso(vec3(1.0, 1.0, 1.0), Quat::from_rotation_x(0.4));
        t.set_world(w);
        let got = t.world();
        assert!((got.pos - w.pos).length() < 1e-5);
        assert!(got.rot.dot(w.rot).abs() > 1.0 - 1e-5);
    }
}
