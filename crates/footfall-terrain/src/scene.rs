use footfall_core::Vec3;
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::heightfield::HeightField;
use crate::probe::{Hit, LayerMask, TerrainProbe};
use crate::sweep::{ray_aabb_slab, sweep_capsule_vs_aabbs};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub bounds: Aabb,
    pub layers: LayerMask,
}

/// Optional heightfield ground plus axis-aligned box obstacles.
///
/// Sphere casts are sampled: a disc of parallel rays across the sphere's cross
/// section, one hit per ray. That is coarse, but every hit lies on real geometry,
/// which is what the foothold search needs.
#[derive(Clone, Debug, Default)]
pub struct TerrainScene {
    ground: Option<HeightField>,
    ground_layers: LayerMask,
    obstacles: Vec<Obstacle>,
}

const RING_SAMPLES: [(f32, usize); 3] = [(0.0, 1), (0.5, 6), (1.0, 12)];

impl TerrainScene {
    pub fn new() -> Self { Self::default() }

    pub fn with_ground(mut self, ground: HeightField, layers: LayerMask) -> Self {
        self.ground = Some(ground);
        self.ground_layers = layers;
        self
    }

    pub fn flat(y: f32) -> Self { Self::new().with_ground(HeightField::flat(y), LayerMask::layer(0)) }

    pub fn add_box(&mut self, bounds: Aabb, layers: LayerMask) -> usize {
        self.obstacles.push(Obstacle { bounds, layers });
        self.obstacles.len() - 1
    }

    pub fn with_box(mut self, bounds: Aabb, layers: LayerMask) -> Self {
        self.add_box(bounds, layers);
        self
    }

    pub fn ground(&self) -> Option<&HeightField> { self.ground.as_ref() }
    pub fn obstacles(&self) -> &[Obstacle] { &self.obstacles }

    fn visible(&self, mask: LayerMask) -> impl Iterator<Item = (usize, &Aabb)> + '_ {
        self.obstacles.iter().enumerate()
            .filter(move |(_, o)| o.layers.intersects(mask))
            .map(|(i, o)| (i, &o.bounds))
    }

    fn ground_visible(&self, mask: LayerMask) -> Option<&HeightField> {
        self.ground.as_ref().filter(|_| self.ground_layers.intersects(mask))
    }
}

impl TerrainProbe for TerrainScene {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<Hit> {
        let d = dir.normalize_or_zero();
        if d == Vec3::ZERO || max_distance <= 0.0 { return None; }

        let mut best: Option<Hit> = self.ground_visible(mask)
            .and_then(|g| g.raycast(origin, d, max_distance))
            .map(|(t, n)| Hit { point: origin + d * t, normal: n, distance: t });

        let delta = d * max_distance;
        for (_, b) in self.visible(mask) {
            if let Some((f, n)) = ray_aabb_slab(origin, delta, b) {
                let t = f * max_distance;
                // ties keep the earlier candidate
                if best.map_or(true, |h| t < h.distance) {
                    best = Some(Hit { point: origin + delta * f, normal: n, distance: t });
                }
            }
        }
        best
    }

    fn spherecast(&self, origin: Vec3, radius: f32, dir: Vec3, max_distance: f32, mask: LayerMask) -> Vec<Hit> {
        let d = dir.normalize_or_zero();
        if d == Vec3::ZERO { return Vec::new(); }
        let helper = if d.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
        let u = d.cross(helper).normalize();
        let v = d.cross(u);

        let mut hits: Vec<Hit> = Vec::new();
        for (frac, count) in RING_SAMPLES {
            for k in 0..count {
                let a = std::f32::consts::TAU * k as f32 / count as f32;
                let o = origin + (u * a.cos() + v * a.sin()) * radius * frac;
                if let Some(h) = self.raycast(o, d, max_distance, mask) {
                    if !hits.iter().any(|e| e.point.distance_squared(h.point) < 1e-8) {
                        hits.push(h);
                    }
                }
            }
        }
        hits.sort_by(|a, b| {
            a.distance.total_cmp(&b.distance)
                .then(a.point.x.total_cmp(&b.point.x))
                .then(a.point.z.total_cmp(&b.point.z))
        });
        hits
    }

    fn capsulecast(&self, p0: Vec3, p1: Vec3, radius: f32, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<Hit> {
        let d = dir.normalize_or_zero();
        if d == Vec3::ZERO || max_distance <= 0.0 { return None; }
        let delta = d * max_distance;

        let mut best: Option<Hit> = sweep_capsule_vs_aabbs(p0, p1, delta, radius, self.visible(mask))
            .map(|s| {
                let center = if s.sample_kind == 0 { p0 } else { p1 };
                Hit { point: center + delta * s.toi - s.normal * radius, normal: s.normal, distance: s.toi * max_distance }
            });

        // ground: lowest points of the end spheres
        if let Some(g) = self.ground_visible(mask) {
            for c in [p0, p1] {
                if let Some((t, n)) = g.raycast(c - Vec3::Y * radius, d, max_distance) {
                    if best.map_or(true, |h| t < h.distance) {
                        best = Some(Hit { point: c - Vec3::Y * radius + d * t, normal: n, distance: t });
                    }
                }
            }
        }
        best
    }
}
