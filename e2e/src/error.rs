use std::{path::PathBuf, process::ExitStatus};

use crate::client::ClientError;

/// Harness-level errors. None of these are recovered automatically: they
/// either abort test setup or fail the individual scenario.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} environment variable not set")]
    MissingEnvVar(String),
    #[error("environment file {} not found", .0.display())]
    EnvFileNotFound(PathBuf),
    #[error("environment path {0} not found")]
    PathNotFound(String),
    #[error("multiple keystore files found: {0:?}")]
    AmbiguousKeystore(Vec<PathBuf>),
    #[error("command `{command}` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },
    #[error("service node did not start in time")]
    ReadinessTimeout,
    #[error("transfer was not confirmed within {0} seconds")]
    ConfirmationTimeout(u64),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
    #[error(transparent)]
    Dotenv(#[from] dotenvy::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
