use std::time::Duration;

use tracing::{info, warn};

use crate::error::{RenderError, StartupError};
use crate::frame::{FrameRenderer, FrameStatus};
use crate::image_source::ImageSource;
use crate::motion::BreathingMotion;
use crate::runtime::{delta_seconds, SystemTimeSource, TimeSource};
use crate::surface::{GraphicsBackend, SurfaceManager, SurfaceStatus};

/// Log the first failed recovery and then only every this many attempts.
const RECOVERY_LOG_EVERY: u64 = 100;

/// What happened to an invalidated surface during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Restored,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub delta_sec: f64,
    pub offset_px: i32,
    pub recovery: Option<Recovery>,
    pub frame: FrameStatus,
}

/// Turns wall-clock time into motion and sequences recovery and drawing.
///
/// Called from the idle branch of the message pump; it never sleeps or
/// blocks itself.
pub struct TickDriver<T: TimeSource = SystemTimeSource> {
    clock: T,
    previous: Duration,
    motion: BreathingMotion,
    source: ImageSource,
    frames: FrameRenderer,
    failed_recoveries: u64,
}

impl TickDriver<SystemTimeSource> {
    pub fn new(motion: BreathingMotion, source: ImageSource) -> Self {
        Self::with_time_source(motion, source, SystemTimeSource::new())
    }
}

impl<T: TimeSource> TickDriver<T> {
    pub fn with_time_source(motion: BreathingMotion, source: ImageSource, mut clock: T) -> Self {
        let previous = clock.now();
        Self {
            clock,
            previous,
            motion,
            source,
            frames: FrameRenderer::new(),
            failed_recoveries: 0,
        }
    }

    pub fn motion(&self) -> &BreathingMotion {
        &self.motion
    }

    pub fn frames(&self) -> &FrameRenderer {
        &self.frames
    }

    pub fn time_source_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    pub fn image_source(&self) -> &ImageSource {
        &self.source
    }

    pub fn tick<B: GraphicsBackend>(
        &mut self,
        surfaces: &mut SurfaceManager<B>,
    ) -> Result<TickReport, RenderError> {
        let now = self.clock.now();
        let delta_sec = delta_seconds(self.previous, now);
        self.previous = now;
        self.motion.update(delta_sec);

        let recovery = (surfaces.status() == SurfaceStatus::Invalidated)
            .then(|| self.recover(surfaces));

        let offset_px = self.motion.offset_px();
        let frame = self.frames.draw_frame(surfaces, offset_px)?;
        Ok(TickReport {
            delta_sec,
            offset_px,
            recovery,
            frame,
        })
    }

    /// Rebuilds the surface and re-binds a freshly decoded image. On failure
    /// the manager is left `Invalidated` so the next tick tries again.
    fn recover<B: GraphicsBackend>(&mut self, surfaces: &mut SurfaceManager<B>) -> Recovery {
        match self.try_recover(surfaces) {
            Ok(()) => {
                info!(
                    epoch = surfaces.epoch(),
                    attempts = self.failed_recoveries + 1,
                    "surface recovered"
                );
                self.failed_recoveries = 0;
                Recovery::Restored
            }
            Err(err) => {
                surfaces.abort_recovery();
                if self.failed_recoveries % RECOVERY_LOG_EVERY == 0 {
                    warn!(
                        error = %err,
                        attempts = self.failed_recoveries + 1,
                        "surface recovery failed; retrying next tick"
                    );
                }
                self.failed_recoveries += 1;
                Recovery::Failed
            }
        }
    }

    fn try_recover<B: GraphicsBackend>(
        &self,
        surfaces: &mut SurfaceManager<B>,
    ) -> Result<(), StartupError> {
        surfaces.create_resources()?;
        let pixels = self.source.decode()?;
        surfaces.load_image(&pixels)?;
        Ok(())
    }
}
