use std::path::PathBuf;

/// Failure to turn an image file into a [`crate::PixelBuffer`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read image at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image at {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image at {path} has zero extent ({width}x{height})")]
    Empty {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// The backend could not produce a window-bound surface.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceCreationError {
    #[error("window client area is {width}x{height}; cannot create a surface")]
    ZeroSize { width: u32, height: u32 },
    #[error("surface manager has been disposed")]
    Disposed,
    #[error("graphics backend failed to create surface: {0}")]
    Backend(String),
}

/// The decoded image could not be bound to the current surface.
#[derive(Debug, thiserror::Error)]
pub enum BitmapUploadError {
    #[error("no surface available to upload the bitmap to")]
    NoSurface,
    #[error("graphics backend rejected the bitmap: {0}")]
    Rejected(String),
}

/// Draw failure that is not the recoverable "recreate surface" signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendFailure(pub String);

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unrecoverable draw failure: {0}")]
    Backend(#[from] BackendFailure),
}

/// Anything that can abort start-up before the first frame is drawn.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Surface(#[from] SurfaceCreationError),
    #[error(transparent)]
    Upload(#[from] BitmapUploadError),
}
