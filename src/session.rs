use log::{debug, error, info, warn};

use crate::config::ViewerConfig;
use crate::controller::{CameraController, PointerEvent, Region};
use crate::display::DisplaySurface;
use crate::error::{Result, ViewerError};
use crate::frame::FrameInfo;
use crate::input::InputSource;
use crate::loader::{AssetLoader, LoadOutcome, PendingLoad};
use crate::model::LoadedAsset;
use crate::normalizer::ModelNormalizer;
use crate::render_loop::{FrameScheduler, LoopHandle, RenderLoop};
use crate::scene::SceneRig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    /// Scene built, waiting for the asset
    Opening,
    /// Interactive; the scene may be empty if loading failed
    Ready,
    /// Teardown in progress
    Closing,
}

/// One open/close lifetime of the viewer
///
/// Owns the scene, camera controls and render loop while open, and the
/// display surface / input source across sessions. Every path out of an open
/// session goes through `close`, which releases all of them.
pub struct ViewerSession<D, I, S>
where
    D: DisplaySurface,
    I: InputSource,
    S: FrameScheduler + Clone,
{
    config: ViewerConfig,
    loader: AssetLoader,
    normalizer: ModelNormalizer,
    surface: D,
    input: I,
    scheduler: S,
    state: SessionState,
    rig: Option<SceneRig>,
    controller: Option<CameraController>,
    pending: Option<PendingLoad>,
    render_loop: Option<RenderLoop<S>>,
    load_error: Option<ViewerError>,
}

impl<D, I, S> ViewerSession<D, I, S>
where
    D: DisplaySurface,
    I: InputSource,
    S: FrameScheduler + Clone,
{
    pub fn new(
        config: ViewerConfig,
        loader: AssetLoader,
        surface: D,
        input: I,
        scheduler: S,
    ) -> Result<Self> {
        config.validate()?;
        let normalizer = ModelNormalizer::new(&config.presentation);

        Ok(Self {
            config,
            loader,
            normalizer,
            surface,
            input,
            scheduler,
            state: SessionState::Closed,
            rig: None,
            controller: None,
            pending: None,
            render_loop: None,
            load_error: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Opening | SessionState::Ready)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&SceneRig> {
        self.rig.as_ref()
    }

    /// Mutable scene access; refused once the session is closed
    pub fn scene_mut(&mut self) -> Result<&mut SceneRig> {
        self.rig.as_mut().ok_or(ViewerError::TeardownAfterClose)
    }

    pub fn controller(&self) -> Option<&CameraController> {
        self.controller.as_ref()
    }

    pub fn render_loop_handle(&self) -> Option<LoopHandle> {
        self.render_loop.as_ref().map(RenderLoop::handle)
    }

    pub fn load_error(&self) -> Option<&ViewerError> {
        self.load_error.as_ref()
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending.is_some()
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Viewer region in surface pixels
    pub fn region(&self) -> Region {
        let viewport = &self.config.viewport;
        Region::new(0.0, 0.0, viewport.width as f32, viewport.height as f32)
    }

    /// Closed -> Opening: build the scene, acquire the surface, start loading
    ///
    /// Calling this on a session that is already open does nothing. If the
    /// surface cannot be acquired the session stays closed.
    pub fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Closed {
            debug!("open() ignored in state {:?}", self.state);
            return Ok(());
        }

        self.state = SessionState::Opening;
        self.load_error = None;
        self.rig = Some(SceneRig::create(&self.config));

        if let Err(e) = self.surface.acquire(&self.config.viewport) {
            error!("Could not acquire display surface: {}", e);
            self.close();
            return Err(e);
        }

        info!("Viewer opening, loading {}", self.config.model_url);
        self.pending = Some(self.loader.load(&self.config.model_url));
        self.poll_load();
        Ok(())
    }

    /// Applies the asset load result if it has arrived; returns true when it did
    pub fn poll_load(&mut self) -> bool {
        if self.state != SessionState::Opening {
            return false;
        }

        let Some(outcome) = self.pending.as_mut().and_then(PendingLoad::try_resolve) else {
            return false;
        };
        self.pending = None;

        match outcome {
            LoadOutcome::Loaded(asset) => self.attach_asset(asset),
            LoadOutcome::Failed(e) => {
                error!("Error loading the model: {}", e);
                self.load_error = Some(e);
            }
        }

        self.start_interaction();
        true
    }

    /// Normalizes the asset and places it in the scene, then uploads it
    ///
    /// # Panics
    ///
    /// If the scene already holds a model: only one load is ever issued per
    /// session, so a second attach means the lifecycle itself is broken.
    fn attach_asset(&mut self, asset: LoadedAsset) {
        let Some(rig) = self.rig.as_mut() else {
            return;
        };
        let LoadedAsset { mut node, bounds } = asset;

        let placement = self.normalizer.apply(&mut node, &bounds);
        debug!(
            "Model bounds {:?}..{:?}, translation {:?}",
            bounds.min, bounds.max, placement.translation
        );

        let triangles = node.triangle_count();
        if let Err(e) = rig.attach_model(node) {
            error!("Session lifecycle bug: {}", e);
            panic!("model attached twice in one viewer session");
        }
        info!("Model attached ({} triangles)", triangles);

        if let Some(model) = rig.model() {
            if let Err(e) = self.surface.upload_model(model) {
                warn!("Model geometry could not be uploaded: {}", e);
            }
        }
    }

    /// Opening -> Ready: bind camera controls and start drawing
    fn start_interaction(&mut self) {
        let region = self.region();
        let Some(rig) = self.rig.as_mut() else {
            return;
        };

        let mut controller = CameraController::new(&self.config.controls, rig.camera(), region);
        controller.bind(&mut self.input);
        controller.update(0.0, rig.camera_mut());
        self.controller = Some(controller);

        if self.render_loop.is_none() {
            self.render_loop = Some(RenderLoop::start(self.scheduler.clone()));
        }

        self.state = SessionState::Ready;
        info!(
            "Viewer ready ({})",
            if self.load_error.is_some() { "empty scene" } else { "model shown" }
        );
    }

    /// Host display refresh: advance the camera, then redraw
    pub fn run_frame(&mut self, delta: f32) -> Option<FrameInfo> {
        if self.state != SessionState::Ready {
            return None;
        }

        let Self {
            render_loop,
            controller,
            rig,
            surface,
            ..
        } = self;
        let (Some(render_loop), Some(rig)) = (render_loop.as_mut(), rig.as_mut()) else {
            return None;
        };

        render_loop.run_frame(delta, |frame| {
            if let Some(controller) = controller.as_mut() {
                controller.update(frame.delta, rig.camera_mut());
            }
            if let Err(e) = surface.draw(rig) {
                warn!("Frame {} failed to draw: {}", frame.number, e);
            }
        })
    }

    /// Routes pointer input to the camera controls while interactive
    pub fn dispatch_input(&mut self, event: &PointerEvent) -> bool {
        if self.state != SessionState::Ready {
            return false;
        }
        self.controller
            .as_mut()
            .is_some_and(|controller| controller.handle_event(event))
    }

    /// Any state -> Closed, releasing everything; repeated calls do nothing
    pub fn close(&mut self) {
        if matches!(self.state, SessionState::Closed | SessionState::Closing) {
            return;
        }
        self.state = SessionState::Closing;

        if let Some(pending) = self.pending.take() {
            debug!("Abandoning in-flight load of {}", pending.url());
        }
        if let Some(render_loop) = self.render_loop.take() {
            render_loop.cancel();
        }
        if let Some(mut controller) = self.controller.take() {
            controller.unbind(&mut self.input);
        }
        if let Some(mut rig) = self.rig.take() {
            rig.detach_model();
        }
        self.surface.release();

        self.state = SessionState::Closed;
        info!("Viewer closed");
    }
}

impl<D, I, S> Drop for ViewerSession<D, I, S>
where
    D: DisplaySurface,
    I: InputSource,
    S: FrameScheduler + Clone,
{
    fn drop(&mut self) {
        self.close();
    }
}
