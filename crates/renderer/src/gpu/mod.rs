//! wgpu realisation of the [`GraphicsBackend`](crate::surface::GraphicsBackend)
//! collaborator.
//!
//! - `context` owns adapter/device/swapchain wiring for one window surface and
//!   watches for device loss.
//! - `pipeline` holds the textured-quad pipeline, bitmap uploads and the
//!   per-frame pass encoding.
//! - `backend` maps the lifecycle calls onto the two and translates wgpu
//!   surface errors into [`DrawOutcome`](crate::surface::DrawOutcome)s.

mod backend;
mod context;
mod pipeline;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::types::SurfaceSize;

pub use backend::{WgpuBackend, WgpuBitmap, WgpuSurface};

/// A native window a wgpu surface can be bound to.
pub trait WindowTarget: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static {
    /// Current client-area size in physical pixels.
    fn client_size(&self) -> SurfaceSize;
}

impl WindowTarget for winit::window::Window {
    fn client_size(&self) -> SurfaceSize {
        self.inner_size().into()
    }
}
