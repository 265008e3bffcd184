use thiserror::Error;

/// Errors raised while setting up rendering state or running a frame.
///
/// Per-triangle problems (zero area, culled, off screen) are not errors, they are
/// reported through [`crate::raster::Coverage`] and [`crate::render::RenderStats`].
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("invalid viewport size {width}x{height}")]
    InvalidViewport { width: i32, height: i32 },

    #[error("renderer needs at least one worker thread")]
    InvalidWorkerCount,

    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("texture of size {width}x{height} needs {} colors, got {len}", .width * .height)]
    InvalidTexture {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("{failed} render job(s) panicked")]
    WorkerPanicked { failed: usize },
}

pub type Result<T> = std::result::Result<T, RasterError>;
