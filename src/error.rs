//! Unified error type for taskdeck.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskdeckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("no task or tag matches '{0}'")]
    UnknownTarget(String),

    #[error("unable to find dependency '{dependency}'. Please ensure that {dependency} is installed before setting up the repo at {path}")]
    MissingDependency { dependency: String, path: PathBuf },

    #[error("command `{command}` exited with code {code}: {output}")]
    StepFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("invalid path '{value}': {reason}")]
    InvalidPath { value: String, reason: String },

    #[error("cannot parse version bump from release tool output: {0:?}")]
    BumpParse(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TaskdeckError>;
