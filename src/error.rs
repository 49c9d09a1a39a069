use crate::models::descriptor::DatasetId;
use serde::Serialize;
use std::fmt;

/// Crate-wide error type. Each variant marks the stage a request failed at,
/// which is what the session layer surfaces to the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ClassifyError {
    /// The submitted bytes could not be interpreted as pixel data.
    Decode(String),
    /// Fetching or deserializing a model failed. Carries the dataset so the
    /// banner can name what failed to load.
    ModelLoad { dataset: DatasetId, message: String },
    /// The forward pass was rejected or the backend faulted.
    Inference(String),
    /// An image was submitted while no model was ready.
    ModelNotReady,
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Decode(msg) => write!(f, "failed to decode image: {}", msg),
            ClassifyError::ModelLoad { dataset, message } => {
                write!(f, "failed to load model {}: {}", dataset, message)
            }
            ClassifyError::Inference(msg) => write!(f, "inference failed: {}", msg),
            ClassifyError::ModelNotReady => write!(f, "model not loaded yet"),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<image::ImageError> for ClassifyError {
    fn from(err: image::ImageError) -> Self {
        ClassifyError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ClassifyError {
    fn from(err: base64::DecodeError) -> Self {
        ClassifyError::Decode(err.to_string())
    }
}
