use glam::{Quat, Vec3};
use log::debug;

use crate::config::PresentationConfig;
use crate::math::AABB;
use crate::model::{ModelNode, Transform};

/// Placement computed for a freshly loaded model
///
/// `translation` recentres the model in its own space; `rotation` and `scale`
/// are the fixed presentation applied after centring, so the bounding-box
/// center always lands on the world origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Placement {
    /// Equivalent node transform: rotate/scale about the recentred origin
    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.rotation * (self.scale * self.translation),
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// Centres a model on the origin and applies the fixed presentation
#[derive(Debug, Clone, Copy)]
pub struct ModelNormalizer {
    rotation: Quat,
    scale: Vec3,
}

impl ModelNormalizer {
    pub fn new(config: &PresentationConfig) -> Self {
        Self {
            rotation: Quat::from_rotation_y(config.rotation_y),
            scale: Vec3::from_array(config.scale),
        }
    }

    /// Computes the placement for a model with the given bounds
    ///
    /// A box with no finite center (nothing was loaded into it) yields a zero
    /// translation; zero-volume boxes are still centred normally.
    pub fn normalize(&self, bounds: &AABB) -> Placement {
        let center = bounds.center();
        let translation = if center.is_finite() { -center } else { Vec3::ZERO };

        if bounds.is_degenerate() {
            debug!("Normalizing degenerate bounds {:?}", bounds);
        }

        Placement {
            translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Normalizes and writes the result onto the node
    pub fn apply(&self, node: &mut ModelNode, bounds: &AABB) -> Placement {
        let placement = self.normalize(bounds);
        node.transform = placement.transform();
        placement
    }
}

impl Default for ModelNormalizer {
    fn default() -> Self {
        Self::new(&PresentationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-4;

    fn identity_presentation() -> ModelNormalizer {
        ModelNormalizer::new(&PresentationConfig {
            rotation_y: 0.0,
            scale: [1.0, 1.0, 1.0],
        })
    }

    #[test]
    fn degenerate_box_is_translated_to_origin() {
        let bounds = AABB::from_points([Vec3::new(10.0, 5.0, 5.0)]);
        let placement = identity_presentation().normalize(&bounds);

        assert_eq!(placement.translation, Vec3::new(-10.0, -5.0, -5.0));
        assert_eq!(placement.rotation, Quat::IDENTITY);
        assert_eq!(placement.scale, Vec3::ONE);
    }

    #[test]
    fn empty_box_gives_zero_translation() {
        let placement = ModelNormalizer::default().normalize(&AABB::empty());
        assert_eq!(placement.translation, Vec3::ZERO);
        assert!(placement.transform().matrix().is_finite());
    }

    #[test]
    fn center_lands_on_origin_with_presentation() {
        let bounds = AABB::new(Vec3::new(2.0, -1.0, 4.0), Vec3::new(6.0, 3.0, 10.0));
        let normalizer = ModelNormalizer::new(&PresentationConfig {
            rotation_y: FRAC_PI_2,
            scale: [30.0, 15.0, 15.0],
        });

        let placement = normalizer.normalize(&bounds);
        let world_center = placement.transform().matrix().transform_point3(bounds.center());

        assert!(world_center.length() < EPS, "center ended at {world_center:?}");
    }

    #[test]
    fn presentation_scale_is_applied_per_axis() {
        let bounds = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let normalizer = ModelNormalizer::new(&PresentationConfig {
            rotation_y: 0.0,
            scale: [30.0, 15.0, 15.0],
        });

        let world = bounds.transformed(&normalizer.normalize(&bounds).transform().matrix());
        assert!((world.size() - Vec3::new(60.0, 30.0, 30.0)).length() < EPS);
    }

    #[test]
    fn quarter_turn_swaps_horizontal_extents() {
        let bounds = AABB::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let normalizer = ModelNormalizer::new(&PresentationConfig {
            rotation_y: FRAC_PI_2,
            scale: [1.0, 1.0, 1.0],
        });

        let world = bounds.transformed(&normalizer.normalize(&bounds).transform().matrix());
        assert!((world.size().x - 2.0).abs() < EPS);
        assert!((world.size().z - 4.0).abs() < EPS);
    }

    #[test]
    fn apply_writes_node_transform() {
        let mut node = ModelNode::default();
        let bounds = AABB::new(Vec3::ZERO, Vec3::splat(2.0));
        let placement = identity_presentation().apply(&mut node, &bounds);

        assert_eq!(node.transform, placement.transform());
        assert_eq!(node.transform.translation, Vec3::splat(-1.0));
    }
}
