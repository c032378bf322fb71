use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::RenderError;
use crate::surface::{DrawOutcome, GraphicsBackend, SurfaceManager};
use crate::types::SurfaceSize;

/// Integer destination rectangle in surface pixels. `x`/`y` may be negative
/// when the image is larger than the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl DrawRect {
    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }
}

/// Everything the backend needs for one draw pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub surface: SurfaceSize,
    /// Premultiplied RGBA clear colour.
    pub clear: [f64; 4],
    pub dest: DrawRect,
}

/// Fully transparent black.
pub const CLEAR_TRANSPARENT: [f64; 4] = [0.0, 0.0, 0.0, 0.0];

/// Centers an image on the surface and shifts it down by `offset_px`.
pub fn centered_rect(surface: SurfaceSize, image: (u32, u32), offset_px: i32) -> DrawRect {
    let (image_width, image_height) = image;
    let base_x = (surface.width as f64 - image_width as f64) / 2.0;
    let base_y = (surface.height as f64 - image_height as f64) / 2.0;
    DrawRect {
        x: base_x.round() as i32,
        y: (base_y.round() as i32).saturating_add(offset_px),
        width: image_width,
        height: image_height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No surface, or the surface has no bitmap bound yet.
    NotReady,
    /// The window is minimised.
    ZeroSize,
    /// The backend declined to present this frame.
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented(DrawRect),
    Skipped(SkipReason),
    /// The backend asked for the surface to be rebuilt; the surface manager
    /// has already been invalidated.
    SurfaceLost,
}

/// Composes the motion offset with the bound bitmap and issues the draw.
///
/// The renderer owns neither the surface nor the motion state; it only keeps
/// frame counters for the periodic stats log.
#[derive(Debug)]
pub struct FrameRenderer {
    presented: u64,
    skipped: u64,
    lost: u64,
    last_stats: Instant,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self {
            presented: 0,
            skipped: 0,
            lost: 0,
            last_stats: Instant::now(),
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    pub fn frames_skipped(&self) -> u64 {
        self.skipped
    }

    pub fn surfaces_lost(&self) -> u64 {
        self.lost
    }

    pub fn draw_frame<B: GraphicsBackend>(
        &mut self,
        surfaces: &mut SurfaceManager<B>,
        offset_px: i32,
    ) -> Result<FrameStatus, RenderError> {
        let status = self.draw_inner(surfaces, offset_px)?;
        match status {
            FrameStatus::Presented(rect) => {
                self.presented += 1;
                trace!(x = rect.x, y = rect.y, offset_px, "presented frame");
            }
            FrameStatus::Skipped(_) => self.skipped += 1,
            FrameStatus::SurfaceLost => self.lost += 1,
        }

        let now = Instant::now();
        if now.saturating_duration_since(self.last_stats) >= Duration::from_secs(1) {
            self.last_stats = now;
            debug!(
                presented = self.presented,
                skipped = self.skipped,
                lost = self.lost,
                offset_px,
                "render stats"
            );
        }
        Ok(status)
    }

    fn draw_inner<B: GraphicsBackend>(
        &self,
        surfaces: &mut SurfaceManager<B>,
        offset_px: i32,
    ) -> Result<FrameStatus, RenderError> {
        let (Some(surface), Some(image)) = (surfaces.surface_size(), surfaces.image_size()) else {
            return Ok(FrameStatus::Skipped(SkipReason::NotReady));
        };
        if surface.is_empty() {
            return Ok(FrameStatus::Skipped(SkipReason::ZeroSize));
        }

        let plan = FramePlan {
            surface,
            clear: CLEAR_TRANSPARENT,
            dest: centered_rect(surface, image, offset_px),
        };

        match surfaces.present(&plan) {
            None => Ok(FrameStatus::Skipped(SkipReason::NotReady)),
            Some(DrawOutcome::Presented) => Ok(FrameStatus::Presented(plan.dest)),
            Some(DrawOutcome::Skipped) => Ok(FrameStatus::Skipped(SkipReason::Backend)),
            Some(DrawOutcome::RecreateSurface) => {
                surfaces.invalidate();
                Ok(FrameStatus::SurfaceLost)
            }
            Some(DrawOutcome::Failed(failure)) => Err(RenderError::Backend(failure)),
        }
    }
}
