use std::path::PathBuf;
use std::time::Duration;

/// Client-area size in physical pixels. Either side may be zero while the
/// window is minimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Adapter selection hint forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Breathing motion parameters, fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Peak vertical displacement in pixels.
    pub amplitude_px: f64,
    /// Length of one full breath.
    pub period: Duration,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            amplitude_px: 2.0,
            period: Duration::from_secs(3),
        }
    }
}

/// Native window appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    /// Initial inner size in physical pixels.
    pub size: (u32, u32),
    /// Request a compositor-transparent window so the cleared background shows through.
    pub transparent: bool,
    pub decorations: bool,
    pub always_on_top: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Breathing Motion Preview".to_string(),
            size: (800, 600),
            transparent: false,
            decorations: true,
            always_on_top: false,
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the merged CLI flags and config file: which image
/// to animate, how the window looks, and how often the idle loop ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Image re-decoded from disk whenever the surface has to be rebuilt.
    pub image_path: PathBuf,
    pub window: WindowOptions,
    pub motion: MotionParams,
    /// Sleep between ticks while the message pump is idle.
    pub poll_interval: Duration,
    pub gpu_power: GpuPowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::new(),
            window: WindowOptions::default(),
            motion: MotionParams::default(),
            poll_interval: Duration::from_millis(10),
            gpu_power: GpuPowerPreference::default(),
        }
    }
}
