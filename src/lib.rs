pub mod camera;
pub mod cli;
pub mod clock;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod input;
pub mod loader;
pub mod loaders;
pub mod math;
pub mod model;
pub mod normalizer;
pub mod render_loop;
pub mod scene;
pub mod session;

pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use session::{SessionState, ViewerSession};
