//! Error types for the Posewatch system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid landmark count: expected {expected}, got {actual}")]
    InvalidLandmarkCount { expected: usize, actual: usize },

    #[error("malformed landmark packet: {0}")]
    MalformedPacket(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("model loading error: {0}")]
    ModelLoad(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
