use glam::Vec3;
use log::debug;

use crate::camera::PerspectiveCamera;
use crate::config::{LightsConfig, ViewerConfig};
use crate::error::{Result, ViewerError};
use crate::model::ModelNode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector the light travels along (towards the origin)
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

/// Static lighting rig
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Lights {
    pub fn new(config: &LightsConfig) -> Self {
        Self {
            ambient: AmbientLight {
                color: Vec3::from_array(config.ambient_color),
                intensity: config.ambient_intensity,
            },
            directional: DirectionalLight {
                color: Vec3::from_array(config.directional_color),
                intensity: config.directional_intensity,
                position: Vec3::from_array(config.directional_position),
            },
        }
    }
}

/// Scene root, camera and lights for one viewer session
///
/// The root has a single model slot. Lights never change after construction.
#[derive(Debug)]
pub struct SceneRig {
    model: Option<ModelNode>,
    camera: PerspectiveCamera,
    lights: Lights,
    clear_color: [f32; 4],
}

impl SceneRig {
    pub fn create(config: &ViewerConfig) -> Self {
        Self {
            model: None,
            camera: PerspectiveCamera::new(&config.camera, config.viewport.aspect()),
            lights: Lights::new(&config.lights),
            clear_color: config.clear_color,
        }
    }

    /// Places a model in the scene; the slot must be empty
    pub fn attach_model(&mut self, node: ModelNode) -> Result<()> {
        if self.model.is_some() {
            return Err(ViewerError::AlreadyAttached);
        }
        debug!("Attaching model {:?}", node.name);
        self.model = Some(node);
        Ok(())
    }

    /// Empties the model slot, returning what was there
    pub fn detach_model(&mut self) -> Option<ModelNode> {
        self.model.take()
    }

    pub fn model(&self) -> Option<&ModelNode> {
        self.model.as_ref()
    }

    pub fn model_count(&self) -> usize {
        usize::from(self.model.is_some())
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_rig_from_defaults() {
        let rig = SceneRig::create(&ViewerConfig::default());

        assert_eq!(rig.model_count(), 0);
        assert_eq!(rig.camera().position, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(rig.lights().ambient.intensity, 1.0);
        assert_eq!(rig.lights().directional.intensity, 0.5);
        assert_eq!(rig.lights().directional.position, Vec3::splat(5.0));
        assert_eq!(rig.clear_color(), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn directional_light_points_at_origin() {
        let rig = SceneRig::create(&ViewerConfig::default());
        let dir = rig.lights().directional.direction();
        assert!((dir - Vec3::splat(-1.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn second_attach_is_rejected() {
        let mut rig = SceneRig::create(&ViewerConfig::default());

        rig.attach_model(ModelNode::default()).unwrap();
        let err = rig.attach_model(ModelNode::default()).unwrap_err();

        assert_eq!(err, ViewerError::AlreadyAttached);
        assert_eq!(rig.model_count(), 1);
    }

    #[test]
    fn detach_frees_the_slot() {
        let mut rig = SceneRig::create(&ViewerConfig::default());
        rig.attach_model(ModelNode::default()).unwrap();

        assert!(rig.detach_model().is_some());
        assert!(rig.detach_model().is_none());
        assert!(rig.attach_model(ModelNode::default()).is_ok());
    }

    #[test]
    fn camera_aspect_follows_viewport() {
        let mut config = ViewerConfig::default();
        config.viewport.width = 800;
        config.viewport.height = 400;

        let rig = SceneRig::create(&config);
        assert_eq!(rig.camera().aspect(), 2.0);
    }
}
