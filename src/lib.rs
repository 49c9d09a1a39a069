//! Classification core for an image-recognition demo: three benchmark
//! datasets (MNIST, Fashion-MNIST, CIFAR-10), each backed by a pre-trained
//! CNN executed through ONNX Runtime. Hand-drawn or uploaded images are
//! normalized to the active model's input shape, classified, and surfaced
//! as ranked per-class confidences through a session state machine.

pub mod error;
pub mod models;
pub mod services;

pub use error::ClassifyError;
pub use models::classify_types::{NormalizedTensor, Prediction, SessionPhase, SessionSnapshot};
pub use models::descriptor::{ColorMode, DatasetExample, DatasetId, ModelDescriptor};
pub use models::pixel_types::{PixelBuffer, PixelSource};
pub use services::classifier::model_cache::ModelCache;
pub use services::classifier::runtime::{ExecutableModel, ModelRuntime, OnnxRuntime, RuntimeConfig};
pub use services::registry::{describe, examples, ALL_DATASETS};
pub use services::session::ClassifySession;
