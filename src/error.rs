use std::path::PathBuf;
use thiserror::Error;

/// Errors detected before the conversion starts. Any of these aborts the run
/// before the dataset directory is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    SplitOutOfRange { name: &'static str, value: f64 },

    #[error("val_split ({val}) + test_split ({test}) must sum to 1.0")]
    SplitSumNotOne { val: f64, test: f64 },

    #[error("val_split ({val}) + test_split ({test}) must not exceed 1.0")]
    SplitSumExceedsOne { val: f64, test: f64 },

    #[error("The specified labelme_dir does not exist: {0}")]
    MissingRoot(PathBuf),
}

/// Failure to convert a single annotation file. The batch keeps going.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid annotation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported shape '{label}': expected 2 points, got {got}")]
    UnsupportedShape { label: String, got: usize },

    #[error("decoded image has zero width or height")]
    EmptyImage,

    #[error("cannot derive a record name from {0:?}")]
    InvalidFileName(PathBuf),
}
