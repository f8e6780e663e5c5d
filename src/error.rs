//! Crate-wide error type.
//!
//! Core modules return `crate::error::Result`; the command layer wraps
//! everything in `anyhow` at the CLI boundary.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-404 failure from the contents API. Listing errors are fatal to
    /// analysis: a partial listing would misclassify absent subtrees as
    /// deleted.
    #[error("failed to list remote directory '{path}': HTTP {status}")]
    RemoteListing { path: String, status: u16 },

    #[error("unexpected payload from remote listing of '{0}'")]
    MalformedListing(String),

    #[error("failed to download '{path}': HTTP {status}")]
    Download { path: String, status: u16 },

    #[error("settings file {0} is not valid JSON")]
    InvalidSettings(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),
}
