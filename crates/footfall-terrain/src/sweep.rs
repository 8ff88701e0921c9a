use footfall_core::Vec3;

use crate::aabb::Aabb;

/// Segment `origin .. origin + delta` against a box. Returns the entry fraction in
/// `[0,1]` and the entered face normal; segments starting inside report nothing.
pub fn ray_aabb_slab(origin: Vec3, delta: Vec3, aabb: &Aabb) -> Option<(f32, Vec3)> {
    let inv = Vec3::new(
        if delta.x.abs() > 1e-9 { 1.0 / delta.x } else { 1.0e9 },
        if delta.y.abs() > 1e-9 { 1.0 / delta.y } else { 1.0e9 },
        if delta.z.abs() > 1e-9 { 1.0 / delta.z } else { 1.0e9 },
    );
    let t1 = (aabb.min - origin) * inv;
    let t2 = (aabb.max - origin) * inv;
    let tmin = t1.min(t2);
    let tmax = t1.max(t2);
    let mut t_enter = tmin.x; let mut n = Vec3::new(if t1.x > t2.x { 1.0 } else { -1.0 },0.0,0.0);
    if tmin.y > t_enter { t_enter = tmin.y; n = Vec3::new(0.0, if t1.y > t2.y { 1.0 } else { -1.0 },0.0); }
    if tmin.z > t_enter { t_enter = tmin.z; n = Vec3::new(0.0,0.0, if t1.z > t2.z { 1.0 } else { -1.0 }); }
    let t_exit = tmax.x.min(tmax.y).min(tmax.z);
    if t_enter <= t_exit && t_exit >= 0.0 && (0.0..=1.0).contains(&t_enter) { Some((t_enter, n)) } else { None }
}

/// Sphere of radius `r` swept by `delta`: a segment test against the box grown by `r`.
pub fn sweep_sphere_vs_aabb(p0: Vec3, delta: Vec3, r: f32, aabb: &Aabb) -> Option<(f32, Vec3)> {
    if delta.length_squared() < 1e-12 { return None; }
    ray_aabb_slab(p0, delta, &aabb.expanded(r))
}

#[derive(Copy, Clone, Debug)]
pub struct SweepHit { pub toi: f32, pub normal: Vec3, pub target_index: usize, pub sample_kind: u8 }

/// Earliest hit; ties go to the lower box index, then the lower sample kind.
fn pick_better(cur: Option<SweepHit>, cand: SweepHit) -> Option<SweepHit> {
    match cur {
        None => Some(cand),
        Some(b) => {
            if cand.toi < b.toi - 1e-9 { return Some(cand); }
            if (cand.toi - b.toi).abs() <= 1e-9 {
                if cand.target_index < b.target_index { return Some(cand); }
                if cand.target_index == b.target_index && cand.sample_kind < b.sample_kind { return Some(cand); }
            }
            Some(b)
        }
    }
}

/// Capsule swept by `delta`, approximated by its two end spheres (kind 0 = `p0`, 1 = `p1`).
pub fn sweep_capsule_vs_aabbs<'a>(
    p0: Vec3, p1: Vec3, delta: Vec3, radius: f32,
    aabbs: impl IntoIterator<Item = (usize, &'a Aabb)>,
) -> Option<SweepHit> {
    let mut best = None;
    for (i, a) in aabbs {
        if let Some((t, n)) = sweep_sphere_vs_aabb(p0, delta, radius, a) {
            best = pick_better(best, SweepHit { toi: t, normal: n, target_index: i, sample_kind: 0 });
        }
        if let Some((t, n)) = sweep_sphere_vs_aabb(p1, delta, radius, a) {
            best = pick_better(best, SweepHit { toi: t, normal: n, target_index: i, sample_kind: 1 });
        }
    }
    best
}
