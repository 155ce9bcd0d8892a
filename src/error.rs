use std::path::PathBuf;

use thiserror::Error;

use crate::rip::OptionKey;

fn join_keys(keys: &[OptionKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("HandBrake executable not found in system PATH. Searched paths: {searched_paths:?}")]
    ExecutableNotFound { searched_paths: Vec<PathBuf> },
    #[error("Invalid HandBrake executable at '{path}': {reason}")]
    InvalidExecutable { path: PathBuf, reason: String },
    #[error("Failed to spawn HandBrake process: {source}")]
    ProcessSpawnFailed { source: std::io::Error },
    #[error("Failed to read scan output: {source}")]
    ScanFailed { source: std::io::Error },
    #[error("Missing required rip options: {}", join_keys(.keys))]
    MissingOption { keys: Vec<OptionKey> },
    #[error("No titles found on the disc")]
    NoTitlesFound,
    #[error("Could not pick a title and audio track automatically")]
    NotReady,
    #[error("Mismatch between number of titles ({titles}) and number of filenames ({filenames})")]
    FilenameCountMismatch { titles: usize, filenames: usize },
    #[error("Auto mode takes a single output filename")]
    AutoWithMultipleFilenames,
    #[error("Output path '{path}' is not a directory")]
    InvalidOutputPath { path: PathBuf },
    #[error("Can't find file to rename: '{path}'")]
    RenameSourceMissing { path: PathBuf },
    #[error("Failed to {action}: {source}")]
    Io {
        action: &'static str,
        source: std::io::Error,
    },
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}
