use blake3::Hasher;
use crate::types::Vec3;
use crate::math::q6;
use glam::Quat;

pub struct StepHasher(Hasher);

impl Default for StepHasher {
    fn default() -> Self { Self::new() }
}

impl StepHasher {
    pub fn new() -> Self { StepHasher(Hasher::new()) }
    pub fn update_bytes(&mut self, bytes: &[u8]) { self.0.update(bytes); }
    pub fn finalize(self) -> [u8; 32] { *self.0.finalize().as_bytes() }

    /// First 8 bytes of the digest, little-endian.
    pub fn finalize_u64(self) -> u64 {
        let b = self.finalize();
        u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
    }
}

/// Values are quantized to 1e-6 first so ulp jitter does not change the digest.
#[inline]
pub fn hash_f32(h: &mut StepHasher, x: f32) {
    h.update_bytes(&q6(x).to_le_bytes());
}

#[inline]
pub fn hash_vec3(h: &mut StepHasher, v: &Vec3) {
    for c in [v.x, v.y, v.z] { hash_f32(h, c); }
}

#[inline]
pub fn hash_quat(h: &mut StepHasher, q: &Quat) {
    for c in [q.x, q.y, q.z, q.w] { hash_f32(h, c); }
}
