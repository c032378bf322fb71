use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{BackendFailure, BitmapUploadError, SurfaceCreationError};
use crate::frame::FramePlan;
use crate::image_source::PixelBuffer;
use crate::surface::{DrawOutcome, GraphicsBackend};
use crate::types::{GpuPowerPreference, SurfaceSize};

use super::context::GpuContext;
use super::pipeline::{BitmapTexture, QuadPipeline};
use super::WindowTarget;

/// Everything bound to one window surface. Dropped and rebuilt as a unit.
pub struct WgpuSurface {
    context: GpuContext,
    pipeline: QuadPipeline,
}

pub struct WgpuBitmap(BitmapTexture);

/// Graphics backend built on a single long-lived `wgpu::Instance`.
pub struct WgpuBackend<W> {
    instance: wgpu::Instance,
    gpu_power: GpuPowerPreference,
    _window: PhantomData<fn(Arc<W>)>,
}

impl<W: WindowTarget> WgpuBackend<W> {
    pub fn new(gpu_power: GpuPowerPreference) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });
        Self {
            instance,
            gpu_power,
            _window: PhantomData,
        }
    }
}

impl<W: WindowTarget> GraphicsBackend for WgpuBackend<W> {
    type Window = Arc<W>;
    type Surface = WgpuSurface;
    type Bitmap = WgpuBitmap;

    fn client_size(&self, window: &Arc<W>) -> SurfaceSize {
        window.client_size()
    }

    fn create_surface(
        &mut self,
        window: &Arc<W>,
        size: SurfaceSize,
    ) -> Result<WgpuSurface, SurfaceCreationError> {
        if size.is_empty() {
            return Err(SurfaceCreationError::ZeroSize {
                width: size.width,
                height: size.height,
            });
        }
        let context = GpuContext::new(&self.instance, Arc::clone(window), size, self.gpu_power)
            .map_err(|err| SurfaceCreationError::Backend(format!("{err:#}")))?;
        let pipeline = QuadPipeline::new(&context.device, context.config.format);
        Ok(WgpuSurface { context, pipeline })
    }

    fn resize_surface(&mut self, surface: &mut WgpuSurface, size: SurfaceSize) {
        surface.context.resize(size);
    }

    fn upload_bitmap(
        &mut self,
        surface: &WgpuSurface,
        pixels: &PixelBuffer,
    ) -> Result<WgpuBitmap, BitmapUploadError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(BitmapUploadError::Rejected(format!(
                "bitmap has zero extent ({width}x{height})"
            )));
        }
        let max = surface.context.max_texture_dimension;
        if width > max || height > max {
            return Err(BitmapUploadError::Rejected(format!(
                "bitmap is {width}x{height} but the device supports at most {max}x{max}"
            )));
        }
        let expected = pixels.stride() as usize * height as usize;
        if pixels.as_bytes().len() != expected {
            return Err(BitmapUploadError::Rejected(format!(
                "bitmap holds {} bytes, expected {expected}",
                pixels.as_bytes().len()
            )));
        }
        if surface.context.is_device_lost() {
            return Err(BitmapUploadError::Rejected("GPU device lost".into()));
        }

        let texture =
            surface
                .pipeline
                .upload(&surface.context.device, &surface.context.queue, pixels);
        Ok(WgpuBitmap(texture))
    }

    fn draw(
        &mut self,
        surface: &mut WgpuSurface,
        bitmap: &WgpuBitmap,
        plan: &FramePlan,
    ) -> DrawOutcome {
        if surface.context.is_device_lost() {
            return DrawOutcome::RecreateSurface;
        }
        if surface.context.size.is_empty() || plan.surface.is_empty() {
            return DrawOutcome::Skipped;
        }

        let frame = match surface.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return DrawOutcome::RecreateSurface;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout; skipping frame");
                return DrawOutcome::Skipped;
            }
            Err(err) => {
                return DrawOutcome::Failed(BackendFailure::new(format!(
                    "failed to acquire frame: {err}"
                )));
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            surface
                .context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });
        surface
            .pipeline
            .encode(&surface.context.queue, &mut encoder, &view, &bitmap.0, plan);
        surface.context.queue.submit(Some(encoder.finish()));
        frame.present();

        if surface.context.is_device_lost() {
            DrawOutcome::RecreateSurface
        } else {
            DrawOutcome::Presented
        }
    }
}
