//! Error Handling Module
//!
//! Defines the crate error type using thiserror. All failures are fatal to
//! the run: there is no retry or partial-failure skip logic anywhere in the
//! pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for fine-tuning pipeline operations
#[derive(Error, Debug)]
pub enum TuneError {
    /// A required split directory is missing under the dataset root
    #[error("missing '{split}' split directory under {root}")]
    MissingSplit { split: &'static str, root: PathBuf },

    /// Error loading or decoding an image
    #[error("failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Error with model construction or checkpointing
    #[error("model error: {0}")]
    Model(String),

    /// Error during training
    #[error("training error: {0}")]
    Training(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for pipeline operations
pub type Result<T> = std::result::Result<T, TuneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_split_display() {
        let err = TuneError::MissingSplit {
            split: "val",
            root: PathBuf::from("/data/set"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("val"));
        assert!(msg.contains("/data/set"));
    }

    #[test]
    fn test_image_load_error() {
        let err = TuneError::ImageLoad(PathBuf::from("/img/a.jpg"), "truncated".to_string());
        assert!(format!("{}", err).contains("a.jpg"));
    }
}
