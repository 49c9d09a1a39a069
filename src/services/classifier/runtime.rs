//! The executable-model seam and its ONNX Runtime implementation.
//!
//! The rest of the crate only needs two capabilities from a model backend:
//! fetch-and-deserialize a descriptor into an executable handle, and run a
//! forward pass over a normalized tensor.

use crate::error::ClassifyError;
use crate::models::classify_types::NormalizedTensor;
use crate::models::descriptor::ModelDescriptor;
use async_trait::async_trait;
use futures::StreamExt;
use ort::session::Session;
use ort::value::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A loaded model bound to one dataset. `predict` consumes the input tensor
/// so its buffer is released on every exit path, including backend faults.
pub trait ExecutableModel: Send + Sync {
    fn predict(&self, input: NormalizedTensor) -> Result<Vec<f32>, ClassifyError>;

    /// Human-readable lines describing the model's interface.
    fn summary(&self) -> Vec<String>;
}

/// Fetches and deserializes models. The session layer never talks to a
/// concrete runtime directly, which keeps the state machine testable.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn ExecutableModel>, ClassifyError>;
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Deadline for fetching a serialized model. `None` lets a fetch run
    /// for as long as the transport allows.
    pub fetch_timeout: Option<Duration>,
    /// ONNX Runtime intra-op thread count.
    pub intra_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Some(Duration::from_secs(120)),
            intra_threads: 4,
        }
    }
}

/// Production runtime backed by `ort`. Model paths may be local files or
/// http(s) URLs; remote models are streamed down with progress logged.
pub struct OnnxRuntime {
    client: reqwest::Client,
    fetch_timeout: Option<Duration>,
    intra_threads: usize,
}

impl OnnxRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            fetch_timeout: config.fetch_timeout,
            intra_threads: config.intra_threads,
        }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            self.fetch_http(path).await
        } else {
            tokio::fs::read(path)
                .await
                .map_err(|e| format!("failed to read {}: {}", path, e))
        }
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, String> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.fetch_timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {} fetching {}", response.status(), url));
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        let mut last_logged = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| format!("download interrupted: {}", e))?;
            bytes.extend_from_slice(&chunk);

            if total_size > 0 {
                let progress = (bytes.len() as u64 * 100) / total_size;
                if progress >= last_logged + 10 {
                    log::debug!("downloading {}: {}%", url, progress);
                    last_logged = progress;
                }
            }
        }

        Ok(bytes)
    }
}

impl Default for OnnxRuntime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[async_trait]
impl ModelRuntime for OnnxRuntime {
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn ExecutableModel>, ClassifyError> {
        let dataset = descriptor.id;
        let bytes = self
            .fetch(descriptor.model_path)
            .await
            .map_err(|message| ClassifyError::ModelLoad { dataset, message })?;
        let byte_count = bytes.len();

        let intra_threads = self.intra_threads;
        let (session, input_name, output_name) =
            tokio::task::spawn_blocking(move || build_session(&bytes, intra_threads))
                .await
                .map_err(|e| ClassifyError::ModelLoad {
                    dataset,
                    message: format!("model load task failed: {}", e),
                })?
                .map_err(|message| ClassifyError::ModelLoad { dataset, message })?;

        let summary = vec![
            format!(
                "input '{}': [1, {}, {}, {}]",
                input_name,
                descriptor.height(),
                descriptor.width(),
                descriptor.color.channels()
            ),
            format!("output '{}': {} classes", output_name, descriptor.classes.len()),
        ];

        log::info!("model {} ready ({} bytes)", dataset, byte_count);

        Ok(Arc::new(OnnxModel {
            session: Mutex::new(session),
            input_name,
            summary,
        }))
    }
}

fn build_session(
    bytes: &[u8],
    intra_threads: usize,
) -> Result<(Session, String, String), String> {
    let _ = ort::init().with_name("draw-classify").commit();

    let session = Session::builder()
        .map_err(|e| format!("failed to create session builder: {}", e))?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
        .map_err(|e| format!("failed to set optimization level: {}", e))?
        .with_intra_threads(intra_threads)
        .map_err(|e| format!("failed to set intra threads: {}", e))?
        .with_execution_providers([
            ort::execution_providers::CPUExecutionProvider::default().build(),
        ])
        .map_err(|e| format!("failed to register execution provider: {}", e))?
        .commit_from_memory(bytes)
        .map_err(|e| format!("failed to deserialize model: {}", e))?;

    let input_name = session
        .inputs()
        .first()
        .map(|i| i.name().to_string())
        .ok_or_else(|| "model has no inputs".to_string())?;
    let output_name = session
        .outputs()
        .first()
        .map(|o| o.name().to_string())
        .unwrap_or_else(|| "output".to_string());

    Ok((session, input_name, output_name))
}

/// An `ort` session plus the bookkeeping needed to feed it.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
    summary: Vec<String>,
}

impl ExecutableModel for OnnxModel {
    fn predict(&self, input: NormalizedTensor) -> Result<Vec<f32>, ClassifyError> {
        let array = input.into_array();
        let input_value = Value::from_array(array)
            .map_err(|e| ClassifyError::Inference(format!("failed to create tensor value: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifyError::Inference("model lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let output_value = outputs
            .values()
            .next()
            .ok_or_else(|| ClassifyError::Inference("model produced no outputs".to_string()))?;

        let (_, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::Inference(format!("failed to extract output: {}", e)))?;

        // Copy out before `outputs` drops; the transient ONNX values are
        // released with it whether or not extraction succeeded.
        Ok(data.to_vec())
    }

    fn summary(&self) -> Vec<String> {
        self.summary.clone()
    }
}
