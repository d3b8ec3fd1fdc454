//! Error types for grandlivre-store

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Snapshot not found: {path}")]
    NotFound { path: String },

    #[error("Invalid snapshot {path}: {message}")]
    InvalidSnapshot { path: String, message: String },

    #[error("IO error")]
    IoError(#[from] io::Error),
}

/// Result type with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
