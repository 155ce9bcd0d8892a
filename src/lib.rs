use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub mod config;
mod error;
pub mod lookup;
pub mod plan;
pub mod rip;
pub mod scan;
pub mod script;
pub mod selection;
pub mod track;

/// Validates that the given path points to a runnable HandBrakeCLI executable.
/// Runs `HandBrakeCLI --version` and checks the exit code.
async fn validate_executable(path: &PathBuf) -> Result<String, Error> {
    let mut command = Command::new(path);
    let output = command
        .arg("--version")
        .output()
        .await
        .map_err(|e| Error::InvalidExecutable {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::InvalidExecutable {
            path: path.clone(),
            reason: format!(
                "'--version' command failed with exit code: {:?}",
                output.status.code()
            ),
        });
    }

    let version_string = String::from_utf8(output.stdout)
        .map_err(|e| Error::InvalidExecutable {
            path: path.clone(),
            reason: format!("Failed to parse version output as UTF-8: {}", e),
        })?
        .trim()
        .to_string();

    if version_string.is_empty() {
        return Err(Error::InvalidExecutable {
            path: path.clone(),
            reason: "HandBrakeCLI --version returned empty output".to_string(),
        });
    }

    Ok(version_string)
}

/// Searches the given PATH string for the HandBrake executable.
fn find_executable_in_path(path_env: &std::ffi::OsStr) -> Result<PathBuf, Error> {
    let paths = env::split_paths(path_env).collect::<Vec<_>>();
    for path in &paths {
        let executable_path = path.join("HandBrakeCLI");
        if executable_path.is_file() {
            return Ok(executable_path);
        }
    }

    Err(Error::ExecutableNotFound {
        searched_paths: paths,
    })
}

pub use config::RipConfig;
pub use error::Error;
pub use plan::{PlannedRip, RipPlan};
pub use rip::{OptionKey, RipCommand, RipOptions};
pub use scan::{ScanLine, ScanParser, ScanResult};
pub use script::RipScript;
pub use selection::{Selection, SelectionCriteria, Warning};
pub use track::{AudioTrack, SubtitleTrack, Title};

/// Represents the HandBrake executable.
pub struct HandBrake {
    executable_path: PathBuf,
    version: String,
}

impl HandBrake {
    /// Discovers the HandBrake executable in the system PATH.
    pub async fn new() -> Result<Self, Error> {
        let path_var = env::var_os("PATH").unwrap_or_default();
        let executable_path = find_executable_in_path(&path_var)?;
        let version = validate_executable(&executable_path).await?;
        Ok(Self {
            executable_path,
            version,
        })
    }

    /// Creates a new HandBrake instance with a specific executable path.
    pub async fn new_with_path(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let executable_path = path.into();
        let version = validate_executable(&executable_path).await?;
        Ok(Self {
            executable_path,
            version,
        })
    }

    /// Uses the configured executable if there is one, otherwise searches `PATH`.
    pub async fn from_config(config: &RipConfig) -> Result<Self, Error> {
        match &config.executable {
            Some(path) => Self::new_with_path(path).await,
            None => Self::new().await,
        }
    }

    /// Returns the version string of the HandBrakeCLI executable.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    /// Arguments for listing every title on the configured device.
    pub fn scan_args(config: &RipConfig) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-i".into(),
            config.device.display().to_string(),
            "-t".into(),
            "0".into(),
        ];
        if config.no_dvdnav {
            args.push("--no-dvdnav".into());
        }
        args
    }

    /// Scans every title on the configured device.
    ///
    /// HandBrake reports titles on `stderr`, which is parsed as it arrives.
    /// An empty result means the disc had no readable titles; deciding
    /// whether that is fatal is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns an `Error` if the process could not be spawned or its output could not be read.
    pub async fn scan(&self, config: &RipConfig) -> Result<ScanResult, Error> {
        let mut child = Command::new(&self.executable_path)
            .args(Self::scan_args(config))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProcessSpawnFailed { source: e })?;

        let stderr = child.stderr.take().ok_or_else(|| Error::ScanFailed {
            source: std::io::Error::other("stderr was not captured"),
        })?;
        let result = ScanResult::from_reader(stderr).await?;

        // HandBrake exits non-zero after a title-0 scan on some versions, so the status is informational.
        match child.wait().await {
            Ok(status) => tracing::debug!(?status, "Scan process exited"),
            Err(e) => return Err(Error::ScanFailed { source: e }),
        }
        tracing::info!(
            device = %config.device.display(),
            titles = result.titles.len(),
            "Scan complete"
        );
        Ok(result)
    }

    /// Scans the device and runs the selection heuristic over the result.
    pub async fn select(&self, config: &RipConfig) -> Result<Selection, Error> {
        let scan = self.scan(config).await?;
        Ok(Selection::new(scan, &config.criteria))
    }

    /// Builds the rip command for `options`, defaulting title and audio from `selection`.
    pub fn rip_command(
        &self,
        config: &RipConfig,
        options: RipOptions,
        selection: Option<&Selection>,
    ) -> Result<RipCommand, Error> {
        let options = match selection {
            Some(selection) => options.with_defaults_from(selection),
            None => options,
        };
        RipCommand::new(&self.executable_path, config, options)
    }
}
