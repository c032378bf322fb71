//! TOML settings file and the merge with CLI flags.
//!
//! Precedence is CLI flag, then config file, then built-in default. Every key
//! in the file is optional:
//!
//! ```toml
//! image = "~/pictures/cat.png"
//! poll_interval = "10ms"
//!
//! [motion]
//! amplitude_px = 2.0
//! period = "3s"
//!
//! [window]
//! title = "Breathing Motion Preview"
//! width = 800
//! height = 600
//! transparent = false
//! decorations = true
//! always_on_top = false
//!
//! [gpu]
//! power = "low"
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use renderer::{GpuPowerPreference, MotionParams, RendererConfig, WindowOptions};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::cli::RunArgs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub image: Option<PathBuf>,
    #[serde(deserialize_with = "deserialize_duration_opt")]
    pub poll_interval: Option<Duration>,
    pub motion: MotionSection,
    pub window: WindowSection,
    pub gpu: GpuSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionSection {
    pub amplitude_px: Option<f64>,
    #[serde(deserialize_with = "deserialize_duration_opt")]
    pub period: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub transparent: Option<bool>,
    pub decorations: Option<bool>,
    pub always_on_top: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpuSection {
    pub power: Option<PowerSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    High,
}

impl From<PowerSetting> for GpuPowerPreference {
    fn from(value: PowerSetting) -> Self {
        match value {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        }
    }
}

impl FileConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Reads `path`; a missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`FileConfig::load`] but a missing file yields the defaults.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

/// Merges CLI flags over the file and defaults. `default_image` is only
/// consulted when neither names an image.
pub fn resolve(
    args: &RunArgs,
    file: &FileConfig,
    default_image: impl FnOnce() -> PathBuf,
) -> Result<RendererConfig, ConfigError> {
    let defaults = RendererConfig::default();
    let default_window = WindowOptions::default();
    let default_motion = MotionParams::default();

    let image_path = args
        .image
        .clone()
        .or_else(|| file.image.clone())
        .unwrap_or_else(default_image);

    let motion = MotionParams {
        amplitude_px: args
            .amplitude
            .or(file.motion.amplitude_px)
            .unwrap_or(default_motion.amplitude_px),
        period: args
            .period
            .or(file.motion.period)
            .unwrap_or(default_motion.period),
    };

    let size = args.size.unwrap_or((
        file.window.width.unwrap_or(default_window.size.0),
        file.window.height.unwrap_or(default_window.size.1),
    ));
    let window = WindowOptions {
        title: file
            .window
            .title
            .clone()
            .unwrap_or(default_window.title),
        size,
        transparent: args.transparent
            || file.window.transparent.unwrap_or(default_window.transparent),
        decorations: !args.no_decorations
            && file.window.decorations.unwrap_or(default_window.decorations),
        always_on_top: args.always_on_top
            || file
                .window
                .always_on_top
                .unwrap_or(default_window.always_on_top),
    };

    let config = RendererConfig {
        image_path,
        window,
        motion,
        poll_interval: args
            .poll_interval
            .or(file.poll_interval)
            .unwrap_or(defaults.poll_interval),
        gpu_power: args
            .gpu_power
            .or(file.gpu.power.map(Into::into))
            .unwrap_or(defaults.gpu_power),
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &RendererConfig) -> Result<(), ConfigError> {
    let amplitude = config.motion.amplitude_px;
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "motion.amplitude_px must be a finite, non-negative number (got {amplitude})"
        )));
    }
    if config.motion.period.is_zero() {
        return Err(ConfigError::Invalid(
            "motion.period must be greater than zero".into(),
        ));
    }
    if config.poll_interval.is_zero() {
        return Err(ConfigError::Invalid(
            "poll_interval must be greater than zero".into(),
        ));
    }
    let (width, height) = config.window.size;
    if width == 0 || height == 0 {
        return Err(ConfigError::Invalid(format!(
            "window size must be greater than zero (got {width}x{height})"
        )));
    }
    if config.image_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("image path must not be empty".into()));
    }
    Ok(())
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("duration {v} is out of range: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}
