//! Error types.
//!
//! `AppError` is what the binary ultimately reports: a message plus a process
//! exit code. The domain modules return typed errors (`CatalogError`,
//! `PrepareError`, ...) which convert into `AppError` at the pipeline boundary.
//!
//! Exit codes:
//! - `2`: input/config problems (missing file, bad row, bad flag)
//! - `3`: not enough data (empty catalog, no aftershocks)
//! - `4`: output/rendering failures

use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures while reading the event catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file not found or unreadable: '{}' ({reason})", path.display())]
    FileAccess { path: PathBuf, reason: String },

    #[error("Failed to read catalog header: {0}")]
    Header(String),

    #[error("Missing required column: `{0}`")]
    MissingColumn(&'static str),

    #[error("Line {line}: {message}")]
    InvalidRow { line: usize, message: String },
}

impl CatalogError {
    pub fn exit_code(&self) -> u8 {
        2
    }
}

/// Failures while turning a catalog into a daily count series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrepareError {
    #[error("Catalog contains no events; cannot identify a mainshock.")]
    EmptyCatalog,

    #[error("No aftershocks with magnitude >= {min_magnitude} after the mainshock; nothing to fit.")]
    NoAftershocks { min_magnitude: f64 },
}

impl PrepareError {
    pub fn exit_code(&self) -> u8 {
        3
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl From<PrepareError> for AppError {
    fn from(err: PrepareError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
