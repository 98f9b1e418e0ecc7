use thiserror::Error;

/// Errors produced by the viewer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// Model file could not be read (missing file, network, permissions)
    #[error("failed to fetch asset {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    /// Model file was read but its content is malformed
    #[error("failed to parse asset {url}: {reason}")]
    AssetParse { url: String, reason: String },

    /// A second model was attached while one is already in the scene
    #[error("a model is already attached to the scene")]
    AlreadyAttached,

    /// Mutation attempted on a session that has been closed
    #[error("viewer session is closed")]
    TeardownAfterClose,

    #[error("display surface error: {0}")]
    Surface(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ViewerError {
    /// True for the two asset-load failure kinds
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::AssetFetch { .. } | Self::AssetParse { .. })
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ViewerError>;

impl From<wgpu::SurfaceError> for ViewerError {
    fn from(e: wgpu::SurfaceError) -> Self {
        ViewerError::Surface(e.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for ViewerError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        ViewerError::Surface(e.to_string())
    }
}
