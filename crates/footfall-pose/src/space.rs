use footfall_core::Isometry;

use crate::{Pose, PoseError, Space};

/// In-place coordinate-space conversion.
pub trait SpaceConvert {
    fn convert_to(&mut self, space: Space, anchor: Option<&Isometry>) -> Result<(), PoseError>;

    fn convert_to_world(&mut self, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        self.convert_to(Space::World, anchor)
    }
    fn convert_to_local(&mut self, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        self.convert_to(Space::Local, anchor)
    }
}

impl SpaceConvert for Pose {
    fn convert_to(&mut self, space: Space, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        *self = self.to_space(space, anchor)?;
        Ok(())
    }
}

impl SpaceConvert for [Pose] {
    /// All-or-nothing: on error no pose has been converted.
    fn convert_to(&mut self, space: Space, anchor: Option<&Isometry>) -> Result<(), PoseError> {
        if anchor.is_none() {
            if let Some(p) = self.iter().find(|p| p.space != space) {
                return Err(PoseError::NoSpaceAnchor { from: p.space, to: space });
            }
            return Ok(());
        }
        let anchor = anchor.copied();
        footfall_core::for_each_mut(self, |p| {
            // anchor is present, so the conversion cannot fail
            if let Ok(c) = p.to_space(space, anchor.as_ref()) { *p = c; }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footfall_core::vec3;
    use glam::Quat;

    #[test]
    fn slice_conversion_is_all_or_nothing() {
        let mut poses = vec![
            Pose::world(vec3(1.0, 0.0, 0.0), Quat::IDENTITY),
            Pose::local(vec3(2.0, 0.0, 0.0), Quat::IDENTITY),
        ];
        assert!(poses.as_mut_slice().convert_to_world(None).is_err());
        assert_eq!(poses[1].space, Space::Local);

        let a = Isometry::from_translation(vec3(0.0, 5.0, 0.0));
        let mut many: Vec<Pose> = (0..20).map(|i| Pose::local(vec3(i as f32, 0.0, 0.0), Quat::IDENTITY)).collect();
        many.as_mut_slice().convert_to_world(Some(&a)).unwrap();
        assert!(many.iter().enumerate().all(|(i, p)| p.space == Space::World && p.position == vec3(i as f32, 5.0, 0.0)));
    }
}
