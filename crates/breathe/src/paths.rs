//! Config directory discovery and default image lookup.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "BREATHE_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "breathe";
const APPLICATION: &str = "breathe";
const CONFIG_FILE: &str = "config.toml";

/// Image shown when neither the CLI nor the config file names one.
pub const DEFAULT_ASSET: &str = "source/01_cat.png";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Default image locations in search order: the working directory, its
/// parent, then the same two relative to the executable.
pub fn asset_candidates(exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let relative = Path::new(DEFAULT_ASSET);
    let mut candidates = vec![relative.to_path_buf(), Path::new("..").join(relative)];
    if let Some(exe_dir) = exe_dir {
        candidates.push(exe_dir.join(relative));
        candidates.push(exe_dir.join("..").join(relative));
    }
    candidates
}

/// First candidate that is an existing file, or the first candidate so the
/// decode error names a sensible path.
pub fn resolve_asset(candidates: &[PathBuf]) -> PathBuf {
    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET))
}

pub fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

pub fn default_asset() -> PathBuf {
    resolve_asset(&asset_candidates(executable_dir().as_deref()))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
