use crate::config::ViewportConfig;
use crate::error::Result;
use crate::model::ModelNode;
use crate::scene::SceneRig;

/// GPU-backed drawing region owned by one viewer session
///
/// `acquire` and `release` bracket the lifetime of the drawing context and all
/// GPU resources created through it. `release` must be safe to call repeatedly
/// and on a surface that was never acquired.
pub trait DisplaySurface {
    /// Create the drawing context sized to the viewport
    fn acquire(&mut self, viewport: &ViewportConfig) -> Result<()>;

    /// Upload geometry and textures for the model about to be shown
    fn upload_model(&mut self, model: &ModelNode) -> Result<()>;

    /// Draw one frame of the scene
    fn draw(&mut self, rig: &SceneRig) -> Result<()>;

    /// Free the context and every buffer/texture created through it
    fn release(&mut self);

    fn is_acquired(&self) -> bool;
}
