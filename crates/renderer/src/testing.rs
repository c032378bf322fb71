//! Recording backend used by the lifecycle tests.

use std::collections::VecDeque;

use crate::error::{BackendFailure, BitmapUploadError, SurfaceCreationError};
use crate::frame::{DrawRect, FramePlan};
use crate::image_source::PixelBuffer;
use crate::surface::{DrawOutcome, GraphicsBackend};
use crate::types::SurfaceSize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BackendCall {
    CreateSurface { id: u32, size: SurfaceSize },
    Resize { id: u32, size: SurfaceSize },
    Upload { surface: u32, width: u32, height: u32 },
    Draw { surface: u32, dest: DrawRect },
}

#[derive(Debug)]
pub(crate) struct FakeSurface {
    id: u32,
}

#[derive(Debug)]
pub(crate) struct FakeBitmap {
    surface: u32,
}

/// Records every call and answers draws from a scripted queue
/// (`Presented` once the queue is empty).
#[derive(Debug)]
pub(crate) struct FakeBackend {
    pub client_size: SurfaceSize,
    pub fail_next_create: bool,
    pub fail_next_upload: bool,
    pub outcomes: VecDeque<DrawOutcome>,
    calls: Vec<BackendCall>,
    next_id: u32,
}

impl FakeBackend {
    pub fn new(client_size: SurfaceSize) -> Self {
        Self {
            client_size,
            fail_next_create: false,
            fail_next_upload: false,
            outcomes: VecDeque::new(),
            calls: Vec::new(),
            next_id: 0,
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn surfaces_created(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::CreateSurface { .. }))
    }

    pub fn uploads(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Upload { .. }))
    }

    pub fn draws(&self) -> Vec<DrawRect> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw { dest, .. } => Some(*dest),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

impl GraphicsBackend for FakeBackend {
    type Window = ();
    type Surface = FakeSurface;
    type Bitmap = FakeBitmap;

    fn client_size(&self, _window: &()) -> SurfaceSize {
        self.client_size
    }

    fn create_surface(
        &mut self,
        _window: &(),
        size: SurfaceSize,
    ) -> Result<FakeSurface, SurfaceCreationError> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(SurfaceCreationError::Backend("adapter unavailable".into()));
        }
        self.next_id += 1;
        self.calls.push(BackendCall::CreateSurface {
            id: self.next_id,
            size,
        });
        Ok(FakeSurface { id: self.next_id })
    }

    fn resize_surface(&mut self, surface: &mut FakeSurface, size: SurfaceSize) {
        self.calls.push(BackendCall::Resize {
            id: surface.id,
            size,
        });
    }

    fn upload_bitmap(
        &mut self,
        surface: &FakeSurface,
        pixels: &PixelBuffer,
    ) -> Result<FakeBitmap, BitmapUploadError> {
        if std::mem::take(&mut self.fail_next_upload) {
            return Err(BitmapUploadError::Rejected("unsupported format".into()));
        }
        self.calls.push(BackendCall::Upload {
            surface: surface.id,
            width: pixels.width(),
            height: pixels.height(),
        });
        Ok(FakeBitmap {
            surface: surface.id,
        })
    }

    fn draw(
        &mut self,
        surface: &mut FakeSurface,
        bitmap: &FakeBitmap,
        plan: &FramePlan,
    ) -> DrawOutcome {
        assert_eq!(
            bitmap.surface, surface.id,
            "bitmap from surface {} drawn on surface {}",
            bitmap.surface, surface.id
        );
        self.calls.push(BackendCall::Draw {
            surface: surface.id,
            dest: plan.dest,
        });
        self.outcomes.pop_front().unwrap_or(DrawOutcome::Presented)
    }
}

pub(crate) fn solid_pixels(width: u32, height: u32) -> PixelBuffer {
    let data = [0x20, 0x40, 0x80, 0xff].repeat((width * height) as usize);
    PixelBuffer::from_bgra_premultiplied(width, height, data).expect("pixel buffer")
}

pub(crate) fn device_failure() -> DrawOutcome {
    DrawOutcome::Failed(BackendFailure::new("out of memory"))
}
