use footfall_core::{Isometry, Transform, Vec3};
use glam::Quat;
use serde::{Deserialize, Serialize};

use crate::error::PoseError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Space {
    #[default]
    Local,
    World,
}

/// How the foot solver may move a pose when terrain gets in the way.
///
/// Strength only ever decreases through blending: `Any` absorbs everything, `Stick`
/// gives way to any other goal, and `Attract` against `Repel` has no winner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentType {
    #[default]
    Any,
    Stick,
    Attract,
    Repel,
}

impl AdjustmentType {
    /// Adjustment of `lhs.blend(rhs, position_factor, rotation_factor)`.
    pub fn derive(lhs: Self, rhs: Self, position_factor: f32, rotation_factor: f32) -> Self {
        use AdjustmentType::*;
        if position_factor <= f32::EPSILON && rotation_factor <= f32::EPSILON { return lhs; }
        if position_factor >= 1.0 - f32::EPSILON && rotation_factor >= 1.0 - f32::EPSILON { return rhs; }
        match (lhs, rhs) {
            (Any, _) | (_, Any) => Any,
            (a, b) if a == b => a,
            (Stick, other) | (other, Stick) => other,
            _ => Any,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPose", into = "RawPose")]
pub struct Pose {
    pub position: Vec3,
    rotation: Quat,
    pub space: Space,
    pub adjustment: AdjustmentType,
}

#[derive(Copy, Clone, Serialize, Deserialize)]
struct RawPose {
    position: Vec3,
    #[serde(default = "identity")]
    rotation: Quat,
    #[serde(default)]
    space: Space,
    #[serde(default)]
    adjustment: AdjustmentType,
}

fn identity() -> Quat { Quat::IDENTITY }

impl From<RawPose> for Pose {
    fn from(r: RawPose) -> Self { Pose::new(r.position, r.rotation, r.space, r.adjustment) }
}

impl From<Pose> for RawPose {
    fn from(p: Pose) -> Self {
        RawPose { position: p.position, rotation: p.rotation, space: p.space, adjustment: p.adjustment }
    }
}

impl Default for Pose {
    fn default() -> Self { Pose::local(Vec3::ZERO, Quat::IDENTITY) }
}

/// Unit quaternion, or identity when `q` is degenerate.
fn canonical(q: Quat) -> Quat {
    let tiny = q.x.abs() <= f32::EPSILON && q.y.abs() <= f32::EPSILON
        && q.z.abs() <= f32::EPSILON && q.w.abs() <= f32::EPSILON;
    if tiny || !q.is_finite() { return Quat::IDENTITY; }
    q.normalize()
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat, space: Space, adjustment: AdjustmentType) -> Self {
        Self { position, rotation: canonical(rotation), space, adjustment }
    }
    pub fn local(position: Vec3, rotation: Quat) -> Self {
        Self::new(position, rotation, Space::Local, AdjustmentType::Any)
    }
    pub fn world(position: Vec3, rotation: Quat) -> Self {
        Self::new(position, rotation, Space::World, AdjustmentType::Any)
    }
    pub fn with_adjustment(mut self, adjustment: AdjustmentType) -> Self {
        self.adjustment = adjustment;
        self
    }

    #[inline] pub fn rotation(&self) -> Quat { self.rotation }
    #[inline] pub fn set_rotation(&mut self, q: Quat) { self.rotation = canonical(q); }
    #[inline] pub fn is_local(&self) -> bool { self.space == Space::Local }
    #[inline] pub fn isometry(&self) -> Isometry { Isometry { pos: self.position, rot: self.rotation } }

    pub fn to_world(&self, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        match (self.space, anchor) {
            (Space::World, _) => Ok(*self),
            (Space::Local, Some(a)) => Ok(Pose {
                position: a.transform_point(self.position),
                rotation: canonical(a.rot * self.rotation),
                space: Space::World,
                adjustment: self.adjustment,
            }),
            (Space::Local, None) => Err(PoseError::NoSpaceAnchor { from: Space::Local, to: Space::World }),
        }
    }

    pub fn to_local(&self, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        match (self.space, anchor) {
            (Space::Local, _) => Ok(*self),
            (Space::World, Some(a)) => Ok(Pose {
                position: a.inverse_transform_point(self.position),
                rotation: canonical(a.rot.inverse() * self.rotation),
                space: Space::Local,
                adjustment: self.adjustment,
            }),
            (Space::World, None) => Err(PoseError::NoSpaceAnchor { from: Space::World, to: Space::Local }),
        }
    }

    pub fn to_space(&self, space: Space, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        match space {
            Space::World => self.to_world(anchor),
            Space::Local => self.to_local(anchor),
        }
    }

    pub fn world_position(&self, anchor: Option<&Isometry>) -> Result<Vec3, PoseError> {
        Ok(self.to_world(anchor)?.position)
    }

    pub fn local_position(&self, anchor: Option<&Isometry>) -> Result<Vec3, PoseError> {
        Ok(self.to_local(anchor)?.position)
    }

    /// Blends toward `other`. The result keeps this pose's space; `other` is
    /// converted into it through `anchor` when the spaces differ.
    pub fn blend(&self, other: &Pose, position_factor: f32, rotation_factor: f32, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        if self.space != other.space && anchor.is_none() {
            return Err(PoseError::IncompatibleSpaces { lhs: self.space, rhs: other.space });
        }
        let rhs = other.to_space(self.space, anchor)?;
        Ok(self.mix(&rhs, position_factor, rotation_factor, self.space, other.adjustment))
    }

    #[inline]
    pub fn blend_factor(&self, other: &Pose, factor: f32, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        self.blend(other, factor, factor, anchor)
    }

    /// Blends with the result forced into `space`, converting both operands as needed.
    pub fn blend_in(&self, space: Space, other: &Pose, position_factor: f32, rotation_factor: f32, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        let lhs = self.to_space(space, anchor)?;
        let rhs = other.to_space(space, anchor)?;
        Ok(lhs.mix(&rhs, position_factor, rotation_factor, space, other.adjustment))
    }

    fn mix(&self, rhs: &Pose, pf: f32, rf: f32, space: Space, rhs_adjustment: AdjustmentType) -> Pose {
        let pf_c = pf.clamp(0.0, 1.0);
        let rf_c = rf.clamp(0.0, 1.0);
        Pose {
            position: self.position.lerp(rhs.position, pf_c),
            rotation: canonical(self.rotation.slerp(rhs.rotation, rf_c)),
            space,
            adjustment: AdjustmentType::derive(self.adjustment, rhs_adjustment, pf, rf),
        }
    }

    /// Local poses write the transform's local slot, world poses its world pose.
    pub fn apply(&self, target: &mut Transform) {
        match self.space {
            Space::Local => target.local = self.isometry(),
            Space::World => target.set_world(self.isometry()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AdjustmentType::*;
    use approx::assert_abs_diff_eq;
    use footfall_core::{iso, vec3};

    fn anchor() -> Isometry { iso(vec3(2.0, 1.0, -3.0), Quat::from_rotation_y(0.8) * Quat::from_rotation_x(0.2)) }

    fn same_rot(a: Quat, b: Quat) -> bool { a.dot(b).abs() > 1.0 - 1e-5 }

    #[test]
    fn world_local_round_trip() {
        let a = anchor();
        let p = Pose::local(vec3(0.3, -0.2, 1.5), Quat::from_rotation_z(0.6));
        let back = p.to_world(Some(&a)).unwrap().to_local(Some(&a)).unwrap();
        assert_eq!(back.space, Space::Local);
        assert_abs_diff_eq!((back.position - p.position).length(), 0.0, epsilon = 1e-5);
        assert!(same_rot(back.rotation(), p.rotation()));
    }

    #[test]
    fn conversion_needs_anchor_only_across_spaces() {
        let p = Pose::local(Vec3::ONE, Quat::IDENTITY);
        assert_eq!(p.to_local(None).unwrap(), p);
        assert_eq!(
            p.to_world(None),
            Err(PoseError::NoSpaceAnchor { from: Space::Local, to: Space::World })
        );
        let w = Pose::world(Vec3::ONE, Quat::IDENTITY);
        assert!(matches!(w.to_local(None), Err(PoseError::NoSpaceAnchor { .. })));
    }

    #[test]
    fn degenerate_rotation_becomes_identity() {
        let p = Pose::local(Vec3::ZERO, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(p.rotation(), Quat::IDENTITY);
        let q = Pose::local(Vec3::ZERO, Quat::from_xyzw(0.0, 2.0, 0.0, 0.0));
        assert_abs_diff_eq!(q.rotation().length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn blend_endpoints() {
        let a = Pose::world(vec3(0.0, 0.0, 0.0), Quat::IDENTITY);
        let b = Pose::world(vec3(1.0, 2.0, 3.0), Quat::from_rotation_y(1.0));
        let at0 = a.blend_factor(&b, 0.0, None).unwrap();
        let at1 = a.blend_factor(&b, 1.0, None).unwrap();
        assert_eq!(at0.position, a.position);
        assert!(same_rot(at0.rotation(), a.rotation()));
        assert_abs_diff_eq!((at1.position - b.position).length(), 0.0, epsilon = 1e-6);
        assert!(same_rot(at1.rotation(), b.rotation()));
    }

    #[test]
    fn cross_space_blend_keeps_first_space() {
        let a = anchor();
        let local = Pose::local(vec3(1.0, 0.0, 0.0), Quat::IDENTITY);
        let world = local.to_world(Some(&a)).unwrap();
        let mid = local.blend_factor(&world, 0.5, Some(&a)).unwrap();
        assert_eq!(mid.space, Space::Local);
        assert_abs_diff_eq!((mid.position - local.position).length(), 0.0, epsilon = 1e-5);

        let mid_w = world.blend_factor(&local, 0.5, Some(&a)).unwrap();
        assert_eq!(mid_w.space, Space::World);
        assert_abs_diff_eq!((mid_w.position - world.position).length(), 0.0, epsilon = 1e-5);

        assert_eq!(
            local.blend_factor(&world, 0.5, None),
            Err(PoseError::IncompatibleSpaces { lhs: Space::Local, rhs: Space::World })
        );
    }

    #[test]
    fn blend_in_forces_space() {
        let a = anchor();
        let l = Pose::local(vec3(0.0, 1.0, 0.0), Quat::IDENTITY);
        let r = Pose::local(vec3(0.0, 3.0, 0.0), Quat::IDENTITY);
        let w = l.blend_in(Space::World, &r, 0.5, 0.5, Some(&a)).unwrap();
        assert_eq!(w.space, Space::World);
        let expect = a.transform_point(vec3(0.0, 2.0, 0.0));
        assert_abs_diff_eq!((w.position - expect).length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn adjustment_table() {
        let all = [Any, Stick, Attract, Repel];
        for &l in &all {
            for &r in &all {
                assert_eq!(AdjustmentType::derive(l, r, 0.0, 0.0), l);
                assert_eq!(AdjustmentType::derive(l, r, 1.0, 1.0), r);
            }
            // same type survives any factor
            for f in [0.0, 0.25, 0.5, 1.0] {
                assert_eq!(AdjustmentType::derive(l, l, f, f), l);
            }
        }
        assert_eq!(AdjustmentType::derive(Stick, Attract, 0.5, 0.5), Attract);
        assert_eq!(AdjustmentType::derive(Repel, Stick, 0.5, 0.5), Repel);
        assert_eq!(AdjustmentType::derive(Any, Stick, 0.5, 0.5), Any);
        assert_eq!(AdjustmentType::derive(Attract, Any, 0.3, 0.3), Any);
        for f in [0.1, 0.5, 0.9] {
            assert_eq!(AdjustmentType::derive(Attract, Repel, f, f), Any);
            assert_eq!(AdjustmentType::derive(Repel, Attract, f, f), Any);
        }
        // mixed factors count as interior
        assert_eq!(AdjustmentType::derive(Stick, Repel, 0.0, 1.0), Repel);
    }

    #[test]
    fn blend_carries_derived_adjustment() {
        let a = Pose::world(Vec3::ZERO, Quat::IDENTITY).with_adjustment(Stick);
        let b = Pose::world(Vec3::X, Quat::IDENTITY).with_adjustment(Attract);
        assert_eq!(a.blend_factor(&b, 0.5, None).unwrap().adjustment, Attract);
    }

    #[test]
    fn apply_writes_matching_slot() {
        let parent = anchor();
        let mut t = Transform::new(Some(parent), Isometry::IDENTITY);
        let w = Pose::world(vec3(4.0, 0.5, 1.0), Quat::from_rotation_y(0.3));
        w.apply(&mut t);
        assert_abs_diff_eq!((t.world().pos - w.position).length(), 0.0, epsilon = 1e-5);

        let l = Pose::local(vec3(0.1, 0.2, 0.3), Quat::IDENTITY);
        l.apply(&mut t);
        assert_eq!(t.local.pos, l.position);
    }

    #[test]
    fn json_defaults_and_canonicalizes() {
        let p: Pose = serde_json::from_str(r#"{"position":[1.0,2.0,3.0],"rotation":[0.0,0.0,0.0,0.0]}"#).unwrap();
        assert_eq!(p.space, Space::Local);
        assert_eq!(p.adjustment, Any);
        assert_eq!(p.rotation(), Quat::IDENTITY);
    }
}
