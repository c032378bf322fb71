use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::GpuPowerPreference;

#[derive(Parser, Debug)]
#[command(
    name = "breathe",
    author,
    version,
    about = "Show an image with a gentle breathing motion",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Image to animate. Defaults to `source/01_cat.png` near the working
    /// directory or the executable.
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// Read settings from this TOML file instead of the default config location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Peak vertical displacement in pixels.
    #[arg(long, value_name = "PX", value_parser = parse_amplitude)]
    pub amplitude: Option<f64>,

    /// Length of one full breath, in seconds (`3`, `2.5`) or as a duration (`1500ms`).
    #[arg(long, value_name = "SECONDS", value_parser = parse_period)]
    pub period: Option<Duration>,

    /// Idle sleep between ticks in milliseconds.
    #[arg(long = "poll-ms", value_name = "MILLISECONDS", value_parser = parse_poll_ms)]
    pub poll_interval: Option<Duration>,

    /// Initial window size in physical pixels.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Request a transparent window so only the image is visible.
    #[arg(long)]
    pub transparent: bool,

    /// Keep the window above other windows.
    #[arg(long)]
    pub always_on_top: bool,

    /// Hide the title bar and borders.
    #[arg(long)]
    pub no_decorations: bool,

    /// GPU adapter preference: `low` (integrated) or `high` (discrete).
    #[arg(long, value_name = "POWER", value_parser = parse_gpu_power)]
    pub gpu_power: Option<GpuPowerPreference>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the config file location and the image search order.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_amplitude(value: &str) -> Result<f64, String> {
    let amplitude: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid amplitude '{value}'; expected a number of pixels"))?;
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err("amplitude must be a finite, non-negative number".into());
    }
    Ok(amplitude)
}

pub fn parse_period(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("period must not be empty".into());
    }
    let period = match trimmed.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Duration::try_from_secs_f64(seconds)
            .map_err(|err| format!("period '{trimmed}' is out of range: {err}"))?,
        Ok(_) => return Err("period must be a positive number of seconds".into()),
        Err(_) => humantime::parse_duration(trimmed)
            .map_err(|err| format!("invalid period '{trimmed}': {err}"))?,
    };
    if period.is_zero() {
        return Err("period must be greater than zero".into());
    }
    Ok(period)
}

pub fn parse_poll_ms(value: &str) -> Result<Duration, String> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid poll interval '{value}'; expected milliseconds"))?;
    if millis == 0 {
        return Err("poll interval must be at least 1ms".into());
    }
    Ok(Duration::from_millis(millis))
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in window size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in window size".to_string())?;
    if width == 0 || height == 0 {
        return Err("window size must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!("unknown GPU power '{other}'; expected low or high")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_sizes() {
        assert_eq!(parse_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_size(" 1920X1080 ").unwrap(), (1920, 1080));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn period_accepts_seconds_and_durations() {
        assert_eq!(parse_period("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_period("2.5").unwrap(), Duration::from_millis(2500));
        assert_eq!(parse_period("1500ms").unwrap(), Duration::from_millis(1500));
        assert!(parse_period("0").is_err());
        assert!(parse_period("-1").is_err());
        assert!(parse_period("soon").is_err());
    }

    #[test]
    fn period_rejects_out_of_range_seconds() {
        let err = parse_period("1e30").unwrap_err();
        assert!(err.contains("out of range"), "{err}");
    }

    #[test]
    fn amplitude_rejects_negative_and_nan() {
        assert_eq!(parse_amplitude("4.5").unwrap(), 4.5);
        assert_eq!(parse_amplitude("0").unwrap(), 0.0);
        assert!(parse_amplitude("-1").is_err());
        assert!(parse_amplitude("NaN").is_err());
    }

    #[test]
    fn gpu_power_is_case_insensitive() {
        assert_eq!(parse_gpu_power("HIGH").unwrap(), GpuPowerPreference::High);
        assert_eq!(parse_gpu_power("low").unwrap(), GpuPowerPreference::Low);
        assert!(parse_gpu_power("medium").is_err());
    }

    #[test]
    fn cli_parses_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "breathe",
            "cat.png",
            "--amplitude",
            "3",
            "--poll-ms",
            "16",
            "--size",
            "320x240",
            "--transparent",
            "--no-decorations",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.image, Some(PathBuf::from("cat.png")));
        assert_eq!(cli.run.amplitude, Some(3.0));
        assert_eq!(cli.run.poll_interval, Some(Duration::from_millis(16)));
        assert_eq!(cli.run.size, Some((320, 240)));
        assert!(cli.run.transparent);
        assert!(cli.run.no_decorations);
        assert!(!cli.run.always_on_top);

        let cli = Cli::try_parse_from(["breathe", "where"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Where)));
    }
}
