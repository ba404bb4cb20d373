//! ThinkInk command-line shell.
//!
//! Exports saved boards to PNG or SVG and moves boards in and out of the
//! local autosave slot.

mod cli;
mod commands;

pub use cli::{Cli, Command, USAGE};
pub use commands::{BoardInfo, run};

use std::path::PathBuf;
use thinkink_core::DocumentError;
use thinkink_core::storage::StorageError;
use thinkink_render::{ExportError, RendererError};
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("No saved board found")]
    NothingSaved,
}
