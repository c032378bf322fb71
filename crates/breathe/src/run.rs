use std::path::PathBuf;

use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::{self, FileConfig};
use crate::paths::{self, AppPaths};

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(&args, &paths)?;
    tracing::info!(
        image = %config.image_path.display(),
        amplitude_px = config.motion.amplitude_px,
        period = ?config.motion.period,
        poll_interval = ?config.poll_interval,
        "starting breathing overlay"
    );

    let pixels = renderer::decode(&config.image_path).context("failed to load image")?;
    let mut renderer = Renderer::new(config);
    renderer.run(pixels)
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn config_file(args: &RunArgs, paths: &AppPaths) -> (PathBuf, bool) {
    match &args.config {
        Some(path) => (path.clone(), true),
        None => (paths.config_file(), false),
    }
}

fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<RendererConfig> {
    let (path, explicit) = config_file(args, paths);
    let file = if explicit {
        FileConfig::load(&path)?
    } else {
        FileConfig::load_optional(&path)?
    };
    tracing::debug!(path = %path.display(), explicit, "loaded configuration");
    Ok(config::resolve(args, &file, paths::default_asset)?)
}

pub fn print_where(args: &RunArgs) -> Result<()> {
    let app_paths = AppPaths::discover()?;
    let (config_path, _) = config_file(args, &app_paths);
    println!("Configuration:");
    println!("  config dir:  {}", app_paths.config_dir().display());
    println!(
        "  config file: {} ({})",
        config_path.display(),
        if config_path.is_file() {
            "present"
        } else {
            "absent"
        }
    );

    let candidates = paths::asset_candidates(paths::executable_dir().as_deref());
    println!("Default image search order:");
    for candidate in &candidates {
        println!(
            "  {:<8} {}",
            if candidate.is_file() { "found" } else { "missing" },
            candidate.display()
        );
    }
    println!(
        "Default image: {}",
        paths::resolve_asset(&candidates).display()
    );
    Ok(())
}
