use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use product_viewer::cli::Cli;
use product_viewer::clock::Clock;
use product_viewer::frame::FpsCounter;
use product_viewer::gpu::{WgpuSurface, WindowScheduler};
use product_viewer::input::WinitInput;
use product_viewer::loader::AssetLoader;
use product_viewer::{ViewerConfig, ViewerSession};

type Session = ViewerSession<WgpuSurface, WinitInput, WindowScheduler>;

/// Sent from the loader thread so a waiting event loop picks up the result
#[derive(Debug, Clone, Copy)]
enum ViewerEvent {
    AssetLoaded,
}

struct App {
    config: ViewerConfig,
    proxy: EventLoopProxy<ViewerEvent>,
    start_closed: bool,
    session: Option<Session>,
    clock: Clock,
    fps: FpsCounter,
}

impl App {
    fn new(config: ViewerConfig, proxy: EventLoopProxy<ViewerEvent>, start_closed: bool) -> Self {
        Self {
            config,
            proxy,
            start_closed,
            session: None,
            clock: Clock::new(),
            fps: FpsCounter::default(),
        }
    }

    fn create_session(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let viewport = self.config.viewport;
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title("3D Product Viewer")
                    .with_resizable(false)
                    .with_inner_size(winit::dpi::PhysicalSize::new(
                        viewport.width,
                        viewport.height,
                    )),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let proxy = self.proxy.clone();
        let loader = AssetLoader::gltf_with_waker(move || {
            if proxy.send_event(ViewerEvent::AssetLoaded).is_err() {
                debug!("Event loop gone, load result not delivered");
            }
        });

        let session = ViewerSession::new(
            self.config.clone(),
            loader,
            WgpuSurface::new(window.clone()),
            WinitInput::new(),
            WindowScheduler::new(window),
        )?;

        Ok(session)
    }

    fn open_viewer(&mut self) {
        if let Some(session) = &mut self.session {
            self.clock.reset();
            if let Err(e) = session.open() {
                error!("Viewer failed to open: {}", e);
            }
        }
    }

    fn close_viewer(&mut self) {
        if let Some(session) = &mut self.session {
            session.close();
        }
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => self.session = Some(session),
            Err(e) => {
                error!("Failed to initialize viewer: {:#}", e);
                event_loop.exit();
                return;
            }
        }

        if !self.start_closed {
            self.open_viewer();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(session) = &mut self.session {
            if let Some(pointer) = session.input_mut().translate(&event) {
                session.dispatch_input(&pointer);
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.close_viewer();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => self.close_viewer(),
                KeyCode::Enter | KeyCode::KeyO => self.open_viewer(),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                let delta = self.clock.tick();
                if let Some(session) = &mut self.session {
                    if session.run_frame(delta).is_some() {
                        if let Some(fps) = self.fps.tick(delta) {
                            debug!("FPS: {:.1}", fps);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::AssetLoaded => {
                if let Some(session) = &mut self.session {
                    session.poll_load();
                }
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &mut self.session {
            session.poll_load();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.resolve_config().context("Invalid viewer configuration")?;

    let event_loop = EventLoop::<ViewerEvent>::with_user_event().build()?;
    let mut app = App::new(config, event_loop.create_proxy(), cli.start_closed);

    info!("Product Viewer - drag to orbit, scroll to zoom, Escape closes, Enter reopens");
    event_loop.run_app(&mut app)?;

    Ok(())
}
