use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::selection::SelectionCriteria;

/// Where and how to rip, fixed for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RipConfig {
    /// The DVD device to scan and rip from.
    pub device: PathBuf,
    /// Pass `--no-dvdnav` so HandBrake reads the disc without libdvdnav.
    pub no_dvdnav: bool,
    /// Directory output filenames are placed in.
    pub output_dir: Option<PathBuf>,
    /// An explicit `HandBrakeCLI`; searched for in `PATH` when unset.
    pub executable: Option<PathBuf>,
    pub criteria: SelectionCriteria,
}

impl Default for RipConfig {
    fn default() -> Self {
        RipConfig {
            device: PathBuf::from("/dev/dvd"),
            no_dvdnav: false,
            output_dir: None,
            executable: None,
            criteria: SelectionCriteria::default(),
        }
    }
}

impl RipConfig {
    /// Loads a TOML configuration file. Missing keys keep their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            reason: format!("Failed to read '{}': {}", path.display(), e),
        })?;
        let config: RipConfig = toml::from_str(&content).map_err(|e| Error::Config {
            reason: format!("Failed to parse '{}': {}", path.display(), e),
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Fails with `Error::InvalidOutputPath` unless `output_dir` is unset or an existing directory.
    pub fn check_output_dir(&self) -> Result<(), Error> {
        match &self.output_dir {
            Some(dir) if !dir.is_dir() => Err(Error::InvalidOutputPath { path: dir.clone() }),
            _ => Ok(()),
        }
    }

    /// Joins `filename` onto the output directory, if there is one.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        }
    }
}
