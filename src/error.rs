use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid file pattern '{spec}': {source}")]
    Pattern {
        spec: String,
        source: glob::PatternError,
    },

    #[error("Primary archive directory does not exist: {0}")]
    MissingPrimaryDirectory(PathBuf),

    #[error("Version index of {directory} lists '{file_name}' but no scanned record matches it")]
    VersionIndexInconsistency {
        directory: PathBuf,
        file_name: String,
    },

    #[error("Version numbers exhausted for '{0}': 9999 reached, the archive set must be renumbered")]
    VersionNumbersExhausted(String),
}
