use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder, WindowLevel};

use crate::error::{RenderError, StartupError};
use crate::gpu::WgpuBackend;
use crate::image_source::{ImageSource, PixelBuffer};
use crate::motion::BreathingMotion;
use crate::surface::{GraphicsBackend, SurfaceManager};
use crate::tick::TickDriver;
use crate::types::{RendererConfig, WindowOptions};

/// Opens the window, binds `pixels` to a fresh surface and pumps events until
/// the window closes or a draw fails for good.
pub(crate) fn run(config: &RendererConfig, pixels: PixelBuffer) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window = Arc::new(
        window_builder(&config.window)
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let mut surfaces: SurfaceManager<WgpuBackend<Window>> =
        SurfaceManager::new(WgpuBackend::new(config.gpu_power), Arc::clone(&window));
    startup(&mut surfaces, &pixels).context("failed to prepare window surface")?;
    drop(pixels);

    let motion = BreathingMotion::new(
        config.motion.amplitude_px,
        config.motion.period.as_secs_f64(),
    );
    let mut driver = TickDriver::new(motion, ImageSource::new(&config.image_path));
    let poll_interval = config.poll_interval;
    let mut next_tick = Instant::now();
    let mut failure: Option<RenderError> = None;

    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
            }
            WindowEvent::Resized(new_size) => {
                surfaces.resize(new_size.into());
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if now >= next_tick {
                if let Err(err) = driver.tick(&mut surfaces) {
                    error!(error = %err, "rendering stopped");
                    failure = Some(err);
                    elwt.exit();
                    return;
                }
                next_tick = now + poll_interval;
            }
            elwt.set_control_flow(ControlFlow::WaitUntil(next_tick));
        }
        _ => {}
    });

    surfaces.dispose();
    info!(
        presented = driver.frames().frames_presented(),
        surfaces = surfaces.epoch(),
        "window closed"
    );

    run_result.map_err(|err| anyhow!("event loop error: {err}"))?;
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn window_builder(options: &WindowOptions) -> WindowBuilder {
    let (width, height) = options.size;
    let mut builder = WindowBuilder::new()
        .with_title(options.title.clone())
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        .with_transparent(options.transparent)
        .with_decorations(options.decorations);
    if options.always_on_top {
        builder = builder.with_window_level(WindowLevel::AlwaysOnTop);
    }
    builder
}

/// First surface and bitmap. Unlike recovery, failure here is fatal.
fn startup<B: GraphicsBackend>(
    surfaces: &mut SurfaceManager<B>,
    pixels: &PixelBuffer,
) -> Result<(), StartupError> {
    surfaces.create_resources()?;
    surfaces.load_image(pixels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceCreationError;
    use crate::surface::SurfaceStatus;
    use crate::testing::{solid_pixels, FakeBackend};
    use crate::types::SurfaceSize;

    #[test]
    fn startup_binds_image_to_new_surface() {
        let mut surfaces = SurfaceManager::new(FakeBackend::new(SurfaceSize::new(64, 48)), ());
        startup(&mut surfaces, &solid_pixels(8, 8)).unwrap();
        assert_eq!(surfaces.status(), SurfaceStatus::Ready);
        assert_eq!(surfaces.image_size(), Some((8, 8)));
    }

    #[test]
    fn startup_fails_for_minimised_window() {
        let mut surfaces = SurfaceManager::new(FakeBackend::new(SurfaceSize::new(0, 48)), ());
        let err = startup(&mut surfaces, &solid_pixels(8, 8)).unwrap_err();
        assert!(matches!(
            err,
            StartupError::Surface(SurfaceCreationError::ZeroSize { .. })
        ));
    }

    #[test]
    fn startup_reports_rejected_upload() {
        let mut backend = FakeBackend::new(SurfaceSize::new(64, 48));
        backend.fail_next_upload = true;
        let mut surfaces = SurfaceManager::new(backend, ());
        let err = startup(&mut surfaces, &solid_pixels(8, 8)).unwrap_err();
        assert!(matches!(err, StartupError::Upload(_)));
    }

    #[test]
    fn builder_carries_window_options() {
        let options = WindowOptions {
            title: "sprite".into(),
            size: (0, 0),
            transparent: true,
            decorations: false,
            always_on_top: true,
        };
        let builder = window_builder(&options);
        let attrs = builder.window_attributes();
        assert_eq!(attrs.title, "sprite");
        assert!(attrs.transparent);
        assert!(!attrs.decorations);
        assert_eq!(attrs.window_level, WindowLevel::AlwaysOnTop);
    }
}
