use crate::types::Vec3;
use glam::{Mat3, Quat};

/// Drops the vertical component.
#[inline]
pub fn planar(v: Vec3) -> Vec3 { Vec3::new(v.x, 0.0, v.z) }

/// Removes the component of `v` along `n` (n need not be unit).
#[inline]
pub fn project_on_plane(v: Vec3, n: Vec3) -> Vec3 {
    let len2 = n.length_squared();
    if len2 < 1e-12 { return v; }
    v - n * (v.dot(n) / len2)
}

/// Unsigned angle between two vectors in degrees; 0 when either is degenerate.
#[inline]
pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() < 1e-12 || b.length_squared() < 1e-12 { return 0.0; }
    a.angle_between(b).to_degrees()
}

/// Rotates direction `a` toward `b` by fraction `t` of the angle between them.
/// Keeps the length of `a`.
pub fn slerp_dir(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let (an, bn) = (a.normalize_or_zero(), b.normalize_or_zero());
    if an == Vec3::ZERO || bn == Vec3::ZERO { return a; }
    let q = Quat::from_rotation_arc(an, bn);
    Quat::IDENTITY.slerp(q, t.clamp(0.0, 1.0)) * a
}

/// Rotation whose +X points along `forward` and +Y along `up` (forward is
/// re-orthogonalised against up). Falls back to tilting +Y onto `up`.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let up = up.normalize_or_zero();
    if up == Vec3::ZERO { return Quat::IDENTITY; }
    let f = project_on_plane(forward, up).normalize_or_zero();
    if f == Vec3::ZERO { return Quat::from_rotation_arc(Vec3::Y, up); }
    let right = f.cross(up);
    Quat::from_mat3(&Mat3::from_cols(f, up, right)).normalize()
}

#[inline]
pub fn q6(x: f32) -> f32 {
    // quantize to 1e-6 in f32
    (x * 1.0e6_f32).round() * 1.0e-6_f32
}
