use std::path::PathBuf;

/// Errors raised by the detection pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input path does not resolve to a decodable image.
    #[error("cannot read image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The classifier model is missing, corrupt or has an unexpected signature.
    #[error("cannot load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// The inference runtime failed during a forward pass.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The detector configuration could not be read.
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Debug images could not be written.
    #[error("debug output: {0}")]
    DebugOutput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
