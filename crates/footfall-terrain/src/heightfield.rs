use footfall_core::Vec3;
use glam::{UVec2, Vec2};

/// Regular grid heightfield. Sample (0,0) sits at `origin`; heights are added to `origin.y`.
/// Outside the grid the border heights extend indefinitely.
#[derive(Clone, Debug)]
pub struct HeightField {
    pub dims: UVec2,     // nx, nz (columns in x, rows in z)
    pub cell: Vec2,      // sx, sz (world units per cell)
    pub heights: Vec<f32>,
    pub origin: Vec3,
    pub min_y: f32,
    pub max_y: f32,
}

impl HeightField {
    /// `None` unless `heights` has `dims.x * dims.y` entries and both dims are at least 2.
    pub fn from_heights(dims: UVec2, cell: Vec2, heights: Vec<f32>, origin: Vec3) -> Option<Self> {
        if dims.x < 2 || dims.y < 2 || (dims.x as usize) * (dims.y as usize) != heights.len() {
            return None;
        }
        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for &h in &heights { min_y = min_y.min(h); max_y = max_y.max(h); }
        let cell = cell.max(Vec2::splat(1e-4));
        Some(Self { dims, cell, heights, origin, min_y, max_y })
    }

    /// Flat plane at height `y`.
    pub fn flat(y: f32) -> Self {
        Self {
            dims: UVec2::new(2, 2),
            cell: Vec2::ONE,
            heights: vec![0.0; 4],
            origin: Vec3::new(0.0, y, 0.0),
            min_y: 0.0,
            max_y: 0.0,
        }
    }

    /// Builds a grid by sampling `f(x, z)` at world coordinates.
    pub fn from_fn(dims: UVec2, cell: Vec2, origin: Vec3, f: impl Fn(f32, f32) -> f32) -> Option<Self> {
        let mut heights = Vec::with_capacity((dims.x * dims.y) as usize);
        for z in 0..dims.y {
            for x in 0..dims.x {
                heights.push(f(origin.x + x as f32 * cell.x, origin.z + z as f32 * cell.y));
            }
        }
        Self::from_heights(dims, cell, heights, origin)
    }

    #[inline] fn idx(&self, x: i32, z: i32) -> usize {
        (x as usize) + (z as usize) * (self.dims.x as usize)
    }
    #[inline] fn h(&self, x: i32, z: i32) -> f32 { self.heights[self.idx(x, z)] }

    /// Bilinear height at grid-local (x,z) in meters.
    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let nx = self.dims.x as i32; let nz = self.dims.y as i32;
        let sx = self.cell.x;        let sz = self.cell.y;
        let fx = (x / sx).clamp(0.0, (nx - 1) as f32 - 1e-5);
        let fz = (z / sz).clamp(0.0, (nz - 1) as f32 - 1e-5);
        let x0 = fx.floor() as i32; let x1 = (x0 + 1).min(nx - 1);
        let z0 = fz.floor() as i32; let z1 = (z0 + 1).min(nz - 1);
        let tx = fx - x0 as f32;    let tz = fz - z0 as f32;

        let h00 = self.h(x0, z0);
        let h10 = self.h(x1, z0);
        let h01 = self.h(x0, z1);
        let h11 = self.h(x1, z1);
        let a = h00 * (1.0 - tx) + h10 * tx;
        let b = h01 * (1.0 - tx) + h11 * tx;
        a * (1.0 - tz) + b * tz
    }

    /// Central-diff normal (unit) at grid-local (x,z).
    pub fn sample_normal(&self, x: f32, z: f32) -> Vec3 {
        let hx0 = self.sample_height(x - self.cell.x, z);
        let hx1 = self.sample_height(x + self.cell.x, z);
        let hz0 = self.sample_height(x, z - self.cell.y);
        let hz1 = self.sample_height(x, z + self.cell.y);

        let ddx = (hx1 - hx0) / (2.0 * self.cell.x);
        let ddz = (hz1 - hz0) / (2.0 * self.cell.y);

        let n = Vec3::new(-ddx, 1.0, -ddz);
        n.normalize_or_zero()
    }

    #[inline]
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.origin.y + self.sample_height(x - self.origin.x, z - self.origin.z)
    }

    #[inline]
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        self.sample_normal(x - self.origin.x, z - self.origin.z)
    }

    /// First downward crossing of the surface along the ray. Rays starting below
    /// the surface report nothing.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        let d = dir.normalize_or_zero();
        if d == Vec3::ZERO || max_distance <= 0.0 { return None; }
        let above = |p: Vec3| p.y - self.height_at(p.x, p.z);
        if above(origin) < 0.0 { return None; }

        // vertical rays: exact
        if d.x.abs() < 1e-6 && d.z.abs() < 1e-6 {
            if d.y >= 0.0 { return None; }
            let t = above(origin) / -d.y;
            if t > max_distance { return None; }
            return Some((t, self.normal_at(origin.x, origin.z)));
        }

        let step = (self.cell.x.min(self.cell.y) * 0.25).max(1e-3);
        let mut t0 = 0.0f32;
        loop {
            let t1 = (t0 + step).min(max_distance);
            if above(origin + d * t1) < 0.0 {
                let (mut lo, mut hi) = (t0, t1);
                for _ in 0..20 {
                    let mid = 0.5 * (lo + hi);
                    if above(origin + d * mid) >= 0.0 { lo = mid; } else { hi = mid; }
                }
                let p = origin + d * hi;
                return Some((hi, self.normal_at(p.x, p.z)));
            }
            if t1 >= max_distance { return None; }
            t0 = t1;
        }
    }
}
