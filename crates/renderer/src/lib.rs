//! Renderer crate for the breathing overlay.
//!
//! A decoded image is centered in a window and shifted up and down by a
//! sinusoidal "breathing" offset. The interesting part is the resource
//! lifecycle around it: when the graphics device reports that its surface is
//! gone, everything bound to that surface is dropped and rebuilt on the next
//! tick, including a fresh decode of the image from disk.
//!
//! ```text
//!   CLI / breathe
//!          │ RendererConfig + PixelBuffer
//!          ▼
//!   Renderer::run ──▶ winit event loop ──(idle)──▶ TickDriver::tick
//!                                                    │
//!          ┌─────────────────────────────────────────┘
//!          ▼
//!   BreathingMotion::update ─▶ [recover if Invalidated] ─▶ FrameRenderer::draw_frame
//!                                                             │
//!                                            SurfaceManager ─▶ GraphicsBackend (wgpu)
//! ```
//!
//! [`SurfaceManager`] is generic over [`GraphicsBackend`], so everything above
//! the wgpu layer can be driven by a recording backend in tests.

pub mod error;
pub mod frame;
pub mod gpu;
pub mod image_source;
pub mod motion;
pub mod runtime;
pub mod surface;
pub mod tick;
pub mod types;
mod window;

#[cfg(test)]
mod testing;

use anyhow::Result;

pub use error::{
    BackendFailure, BitmapUploadError, DecodeError, RenderError, StartupError,
    SurfaceCreationError,
};
pub use frame::{centered_rect, DrawRect, FramePlan, FrameRenderer, FrameStatus, SkipReason};
pub use image_source::{decode, ImageSource, PixelBuffer, PixelFormat};
pub use motion::BreathingMotion;
pub use runtime::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use surface::{DrawOutcome, GraphicsBackend, SurfaceManager, SurfaceStatus};
pub use tick::{Recovery, TickDriver, TickReport};
pub use types::{GpuPowerPreference, MotionParams, RendererConfig, SurfaceSize, WindowOptions};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and animates `pixels` until the window is closed.
    ///
    /// `pixels` must already be decoded from `config.image_path`; the path is
    /// only read again when the surface has to be rebuilt. Surface creation
    /// and the initial upload are fatal; later surface losses are recovered.
    pub fn run(&mut self, pixels: PixelBuffer) -> Result<()> {
        window::run(&self.config, pixels)
    }
}
