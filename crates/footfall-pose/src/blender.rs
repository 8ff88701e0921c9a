use footfall_core::{Curve, Isometry};
use serde::{Deserialize, Serialize};

use crate::{Pose, PoseError};

/// Maps a segment-local blend factor through separate position and rotation curves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseBlender {
    pub position: Curve,
    pub rotation: Curve,
}

impl Default for PoseBlender {
    fn default() -> Self { Self::uniform(Curve::default()) }
}

impl PoseBlender {
    pub fn new(position: Curve, rotation: Curve) -> Self { Self { position, rotation } }

    pub fn uniform(curve: Curve) -> Self { Self { position: curve.clone(), rotation: curve } }

    pub fn blend(&self, from: &Pose, to: &Pose, factor: f32, anchor: Option<&Isometry>) -> Result<Pose, PoseError> {
        from.blend(to, self.position.evaluate(factor), self.rotation.evaluate(factor), anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use footfall_core::vec3;
    use glam::Quat;

    #[test]
    fn curves_shape_each_channel() {
        // position snaps late, rotation follows linearly
        let b = PoseBlender::new(Curve::ease_in_out(0.0, 0.0, 1.0, 1.0), Curve::linear(0.0, 0.0, 1.0, 1.0));
        let a = Pose::world(vec3(0.0, 0.0, 0.0), Quat::IDENTITY);
        let c = Pose::world(vec3(0.0, 0.0, 4.0), Quat::from_rotation_y(1.0));
        let q = b.blend(&a, &c, 0.25, None).unwrap();
        // smoothstep(0.25) = 0.15625
        assert_abs_diff_eq!(q.position.z, 0.625, epsilon = 1e-5);
        assert_abs_diff_eq!(q.rotation().angle_between(Quat::IDENTITY), 0.25, epsilon = 1e-4);
    }
}
