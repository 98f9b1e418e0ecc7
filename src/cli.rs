// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::ViewerConfig;
use crate::error::Result;

#[derive(Parser, Debug, Clone)]
#[command(name = "product-viewer")]
#[command(about = "Interactive 3D product viewer", long_about = None)]
pub struct Cli {
    /// glTF model to show (overrides the config file)
    #[arg(long)]
    pub model: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Camera damping factor in (0, 1]
    #[arg(long)]
    pub damping: Option<f32>,

    /// Start with the viewer closed (Enter or O opens it)
    #[arg(long = "closed", default_value = "false")]
    pub start_closed: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::from_json_file(path)?,
            None => ViewerConfig::default(),
        };

        if let Some(model) = &self.model {
            config.model_url = model.clone();
        }
        if let Some(width) = self.width {
            config.viewport.width = width;
        }
        if let Some(height) = self.height {
            config.viewport.height = height;
        }
        if let Some(damping) = self.damping {
            config.controls.damping_factor = damping;
        }

        config.validate()?;
        Ok(config)
    }
}
