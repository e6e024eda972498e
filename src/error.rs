use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading the model or serving a prediction.
///
/// Every variant renders to a human-readable message, which is what ends up in
/// the `error` field of a failed `/predict` response.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body or its data URL is malformed.
    #[error("invalid payload: {0}")]
    Payload(String),

    /// The payload bytes are not an image that fits the model input.
    #[error("cannot decode image: {0}")]
    Decode(String),

    /// The forward pass could not run or produced an unusable output.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model artifact could not be loaded at startup.
    #[error("cannot load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The configuration file could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
