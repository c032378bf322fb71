//! Ownership of the window-bound surface and the bitmap uploaded onto it.
//!
//! ```text
//!   Uninitialized ──create──▶ Ready ──invalidate──▶ Invalidated
//!                              ▲                        │
//!                              └───────create───────────┘
//!   any state ──dispose──▶ Disposed
//! ```
//!
//! The bitmap lives inside the surface's resource record, so dropping the
//! surface always drops the bitmap with it. Each surface also carries an
//! epoch; a bitmap stamped with another epoch is never handed to the backend.

use tracing::{debug, info, warn};

use crate::error::{BackendFailure, BitmapUploadError, SurfaceCreationError};
use crate::frame::FramePlan;
use crate::image_source::PixelBuffer;
use crate::types::SurfaceSize;

/// Result of one draw pass as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The frame reached the window.
    Presented,
    /// Nothing was drawn but the surface is healthy (e.g. acquisition timed out).
    Skipped,
    /// The surface or device is gone and must be rebuilt from scratch.
    RecreateSurface,
    /// Any other failure. Never retried.
    Failed(BackendFailure),
}

/// Graphics backend collaborator: creates window-bound surfaces, uploads
/// bitmaps onto them, and runs draw passes.
pub trait GraphicsBackend {
    /// Native window handle surfaces are bound to.
    type Window;
    type Surface;
    /// Bitmap resident on one particular surface.
    type Bitmap;

    /// Current client-area size of `window`.
    fn client_size(&self, window: &Self::Window) -> SurfaceSize;

    fn create_surface(
        &mut self,
        window: &Self::Window,
        size: SurfaceSize,
    ) -> Result<Self::Surface, SurfaceCreationError>;

    /// Resizes in place. Zero sizes must be accepted and simply deferred.
    fn resize_surface(&mut self, surface: &mut Self::Surface, size: SurfaceSize);

    fn upload_bitmap(
        &mut self,
        surface: &Self::Surface,
        pixels: &PixelBuffer,
    ) -> Result<Self::Bitmap, BitmapUploadError>;

    /// Begins a pass, clears, draws `bitmap` per `plan`, ends the pass and
    /// presents.
    fn draw(
        &mut self,
        surface: &mut Self::Surface,
        bitmap: &Self::Bitmap,
        plan: &FramePlan,
    ) -> DrawOutcome;
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Uninitialized,
    Ready,
    Invalidated,
    Disposed,
}

struct BoundBitmap<I> {
    bitmap: I,
    width: u32,
    height: u32,
    epoch: u64,
}

struct SurfaceResources<S, I> {
    surface: S,
    size: SurfaceSize,
    epoch: u64,
    bitmap: Option<BoundBitmap<I>>,
}

enum SurfaceState<S, I> {
    Uninitialized,
    Ready(SurfaceResources<S, I>),
    Invalidated,
    Disposed,
}

/// Owns the backend, the window handle, and whatever surface is currently
/// bound to that window.
pub struct SurfaceManager<B: GraphicsBackend> {
    backend: B,
    window: B::Window,
    state: SurfaceState<B::Surface, B::Bitmap>,
    epoch: u64,
}

impl<B: GraphicsBackend> SurfaceManager<B> {
    pub fn new(backend: B, window: B::Window) -> Self {
        Self {
            backend,
            window,
            state: SurfaceState::Uninitialized,
            epoch: 0,
        }
    }

    pub fn status(&self) -> SurfaceStatus {
        match self.state {
            SurfaceState::Uninitialized => SurfaceStatus::Uninitialized,
            SurfaceState::Ready(_) => SurfaceStatus::Ready,
            SurfaceState::Invalidated => SurfaceStatus::Invalidated,
            SurfaceState::Disposed => SurfaceStatus::Disposed,
        }
    }

    /// Number of surfaces created so far; also the epoch of the live surface.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn window(&self) -> &B::Window {
        &self.window
    }

    /// Creates a surface at the window's current client size. A no-op when a
    /// surface already exists.
    pub fn create_resources(&mut self) -> Result<(), SurfaceCreationError> {
        match self.state {
            SurfaceState::Ready(_) => return Ok(()),
            SurfaceState::Disposed => return Err(SurfaceCreationError::Disposed),
            SurfaceState::Uninitialized | SurfaceState::Invalidated => {}
        }

        let size = self.backend.client_size(&self.window);
        if size.is_empty() {
            return Err(SurfaceCreationError::ZeroSize {
                width: size.width,
                height: size.height,
            });
        }

        let surface = self.backend.create_surface(&self.window, size)?;
        self.epoch += 1;
        info!(
            width = size.width,
            height = size.height,
            epoch = self.epoch,
            "created window surface"
        );
        self.state = SurfaceState::Ready(SurfaceResources {
            surface,
            size,
            epoch: self.epoch,
            bitmap: None,
        });
        Ok(())
    }

    /// Resizes the live surface; the bitmap stays bound.
    pub fn resize(&mut self, size: SurfaceSize) {
        let SurfaceState::Ready(resources) = &mut self.state else {
            return;
        };
        if resources.size == size {
            return;
        }
        self.backend.resize_surface(&mut resources.surface, size);
        resources.size = size;
        debug!(width = size.width, height = size.height, "resized surface");
    }

    /// Uploads `pixels` onto the live surface, replacing any earlier bitmap.
    pub fn load_image(&mut self, pixels: &PixelBuffer) -> Result<(), BitmapUploadError> {
        let SurfaceState::Ready(resources) = &mut self.state else {
            return Err(BitmapUploadError::NoSurface);
        };
        let bitmap = self.backend.upload_bitmap(&resources.surface, pixels)?;
        resources.bitmap = Some(BoundBitmap {
            bitmap,
            width: pixels.width(),
            height: pixels.height(),
            epoch: resources.epoch,
        });
        info!(
            width = pixels.width(),
            height = pixels.height(),
            epoch = resources.epoch,
            "bound image to surface"
        );
        Ok(())
    }

    /// Drops the surface and its bitmap after the backend asked for the
    /// surface to be recreated. Only meaningful from `Ready`.
    pub fn invalidate(&mut self) {
        if let SurfaceState::Ready(resources) = &self.state {
            warn!(epoch = resources.epoch, "surface lost; discarding surface and bitmap");
            self.state = SurfaceState::Invalidated;
        }
    }

    /// Releases everything. The manager cannot create surfaces afterwards.
    pub fn dispose(&mut self) {
        if !matches!(self.state, SurfaceState::Disposed) {
            debug!(epoch = self.epoch, "disposing surface manager");
            self.state = SurfaceState::Disposed;
        }
    }

    /// Rolls back a half-finished recovery: a freshly created surface that
    /// never received its bitmap goes back to `Invalidated`.
    pub(crate) fn abort_recovery(&mut self) {
        if let SurfaceState::Ready(resources) = &self.state {
            if resources.bitmap.is_none() {
                self.state = SurfaceState::Invalidated;
            }
        }
    }

    pub fn surface_size(&self) -> Option<SurfaceSize> {
        match &self.state {
            SurfaceState::Ready(resources) => Some(resources.size),
            _ => None,
        }
    }

    /// Dimensions of the bitmap bound to the live surface.
    pub fn image_size(&self) -> Option<(u32, u32)> {
        match &self.state {
            SurfaceState::Ready(SurfaceResources {
                bitmap: Some(bound),
                epoch,
                ..
            }) if bound.epoch == *epoch => Some((bound.width, bound.height)),
            _ => None,
        }
    }

    /// Runs one draw pass, or returns `None` when there is no surface with a
    /// current bitmap to draw.
    pub(crate) fn present(&mut self, plan: &FramePlan) -> Option<DrawOutcome> {
        let SurfaceState::Ready(resources) = &mut self.state else {
            return None;
        };
        let bound = resources.bitmap.as_ref()?;
        if bound.epoch != resources.epoch {
            return None;
        }
        Some(
            self.backend
                .draw(&mut resources.surface, &bound.bitmap, plan),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{solid_pixels, BackendCall, FakeBackend};

    fn manager(width: u32, height: u32) -> SurfaceManager<FakeBackend> {
        SurfaceManager::new(FakeBackend::new(SurfaceSize::new(width, height)), ())
    }

    #[test]
    fn starts_uninitialized() {
        let surfaces = manager(100, 100);
        assert_eq!(surfaces.status(), SurfaceStatus::Uninitialized);
        assert_eq!(surfaces.surface_size(), None);
        assert_eq!(surfaces.epoch(), 0);
    }

    #[test]
    fn create_resources_twice_allocates_once() {
        let mut surfaces = manager(100, 80);
        surfaces.create_resources().unwrap();
        surfaces.create_resources().unwrap();

        assert_eq!(surfaces.status(), SurfaceStatus::Ready);
        assert_eq!(surfaces.epoch(), 1);
        assert_eq!(surfaces.backend().surfaces_created(), 1);
        assert_eq!(surfaces.surface_size(), Some(SurfaceSize::new(100, 80)));
    }

    #[test]
    fn zero_client_area_is_rejected() {
        let mut surfaces = manager(0, 0);
        let err = surfaces.create_resources().unwrap_err();
        assert!(matches!(err, SurfaceCreationError::ZeroSize { .. }));
        assert_eq!(surfaces.status(), SurfaceStatus::Uninitialized);
        assert_eq!(surfaces.backend().surfaces_created(), 0);
    }

    #[test]
    fn backend_creation_failure_is_reported() {
        let mut surfaces = manager(64, 64);
        surfaces.backend_mut().fail_next_create = true;
        let err = surfaces.create_resources().unwrap_err();
        assert!(matches!(err, SurfaceCreationError::Backend(_)));
        assert_eq!(surfaces.status(), SurfaceStatus::Uninitialized);

        surfaces.create_resources().unwrap();
        assert_eq!(surfaces.status(), SurfaceStatus::Ready);
    }

    #[test]
    fn load_image_requires_a_surface() {
        let mut surfaces = manager(100, 100);
        let err = surfaces.load_image(&solid_pixels(4, 4)).unwrap_err();
        assert!(matches!(err, BitmapUploadError::NoSurface));
    }

    #[test]
    fn load_image_replaces_previous_bitmap() {
        let mut surfaces = manager(100, 100);
        surfaces.create_resources().unwrap();
        surfaces.load_image(&solid_pixels(4, 4)).unwrap();
        surfaces.load_image(&solid_pixels(20, 10)).unwrap();
        assert_eq!(surfaces.image_size(), Some((20, 10)));
    }

    #[test]
    fn rejected_upload_keeps_surface_ready() {
        let mut surfaces = manager(100, 100);
        surfaces.create_resources().unwrap();
        surfaces.backend_mut().fail_next_upload = true;
        let err = surfaces.load_image(&solid_pixels(4, 4)).unwrap_err();
        assert!(matches!(err, BitmapUploadError::Rejected(_)));
        assert_eq!(surfaces.status(), SurfaceStatus::Ready);
        assert_eq!(surfaces.image_size(), None);
    }

    #[test]
    fn resize_is_ignored_without_surface() {
        let mut surfaces = manager(100, 100);
        surfaces.resize(SurfaceSize::new(300, 200));
        assert!(surfaces.backend().calls().is_empty());
    }

    #[test]
    fn resize_keeps_bitmap_bound() {
        let mut surfaces = manager(100, 100);
        surfaces.create_resources().unwrap();
        surfaces.load_image(&solid_pixels(8, 8)).unwrap();
        surfaces.resize(SurfaceSize::new(300, 200));
        surfaces.resize(SurfaceSize::new(0, 0));

        assert_eq!(surfaces.surface_size(), Some(SurfaceSize::new(0, 0)));
        assert_eq!(surfaces.image_size(), Some((8, 8)));
        assert_eq!(surfaces.backend().uploads(), 1);
        assert_eq!(surfaces.epoch(), 1);
    }

    #[test]
    fn invalidate_drops_surface_and_bitmap() {
        let mut surfaces = manager(100, 100);
        surfaces.create_resources().unwrap();
        surfaces.load_image(&solid_pixels(8, 8)).unwrap();
        surfaces.invalidate();

        assert_eq!(surfaces.status(), SurfaceStatus::Invalidated);
        assert_eq!(surfaces.surface_size(), None);
        assert_eq!(surfaces.image_size(), None);

        surfaces.create_resources().unwrap();
        assert_eq!(surfaces.epoch(), 2);
        assert_eq!(surfaces.image_size(), None, "new surface starts without a bitmap");
    }

    #[test]
    fn invalidate_is_ignored_unless_ready() {
        let mut surfaces = manager(100, 100);
        surfaces.invalidate();
        assert_eq!(surfaces.status(), SurfaceStatus::Uninitialized);
    }

    #[test]
    fn abort_recovery_only_discards_bitmapless_surface() {
        let mut surfaces = manager(100, 100);
        surfaces.create_resources().unwrap();
        surfaces.load_image(&solid_pixels(8, 8)).unwrap();
        surfaces.abort_recovery();
        assert_eq!(surfaces.status(), SurfaceStatus::Ready);

        surfaces.invalidate();
        surfaces.create_resources().unwrap();
        surfaces.abort_recovery();
        assert_eq!(surfaces.status(), SurfaceStatus::Invalidated);
    }

    #[test]
    fn disposed_manager_refuses_new_surfaces() {
        let mut surfaces = manager(100, 100);
        surfaces.create_resources().unwrap();
        surfaces.dispose();
        assert_eq!(surfaces.status(), SurfaceStatus::Disposed);
        assert!(matches!(
            surfaces.create_resources(),
            Err(SurfaceCreationError::Disposed)
        ));
        assert!(matches!(
            surfaces.backend().calls().last(),
            Some(BackendCall::CreateSurface { .. })
        ));
    }
}
