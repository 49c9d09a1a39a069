//! The per-session state machine tying dataset selection, model loading,
//! and classification together.

use crate::error::ClassifyError;
use crate::models::classify_types::{Prediction, SessionSnapshot};
use crate::models::descriptor::{DatasetId, ModelDescriptor};
use crate::models::pixel_types::PixelSource;
use crate::services::classifier::inference;
use crate::services::classifier::model_cache::ModelCache;
use crate::services::classifier::runtime::{ExecutableModel, OnnxRuntime, RuntimeConfig};
use crate::services::{normalizer, registry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct SessionState {
    descriptor: &'static ModelDescriptor,
    model: Option<Arc<dyn ExecutableModel>>,
    model_loading: bool,
    classifying: bool,
    model_load_error: Option<String>,
    classification_error: Option<String>,
    results: Vec<Prediction>,
    model_summary: Vec<String>,
}

impl SessionState {
    fn ready(&self) -> bool {
        self.model.is_some() && !self.model_loading && !self.classifying
    }
}

/// One browser-tab-equivalent classification session.
///
/// Every async operation is tagged with the generation current when it
/// started; a completion whose generation is stale is discarded, so the
/// visible state always tracks the most recent request rather than the
/// slowest one.
pub struct ClassifySession {
    cache: Arc<ModelCache>,
    state: Mutex<SessionState>,
    generation: AtomicU64,
}

impl ClassifySession {
    /// Session starting idle on the MNIST dataset; no model is loaded until
    /// the first `select_dataset`.
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self {
            cache,
            state: Mutex::new(SessionState {
                descriptor: registry::describe(DatasetId::Mnist),
                model: None,
                model_loading: false,
                classifying: false,
                model_load_error: None,
                classification_error: None,
                results: Vec::new(),
                model_summary: Vec::new(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Session with its own cache over the production ONNX runtime.
    pub fn onnx(config: RuntimeConfig) -> Self {
        Self::new(Arc::new(ModelCache::new(Arc::new(OnnxRuntime::new(config)))))
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Switch the active dataset and load its model. Prior results, summary,
    /// and errors are cleared immediately, before the load resolves. Load
    /// failures land in the snapshot's `model_load_error`, not the return
    /// path; reselecting the dataset retries the fetch.
    pub async fn select_dataset(&self, id: DatasetId) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let descriptor = registry::describe(id);

        {
            let mut state = self.lock_state();
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            state.descriptor = descriptor;
            state.model = None;
            state.model_loading = true;
            state.classifying = false;
            state.model_load_error = None;
            state.classification_error = None;
            state.results.clear();
            state.model_summary.clear();
        }

        let outcome = self.cache.load(descriptor).await;

        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("discarding stale load completion for {}", id);
            return;
        }
        state.model_loading = false;
        match outcome {
            Ok(model) => {
                state.model_summary = model.summary();
                state.model = Some(model);
            }
            Err(e) => {
                state.model_load_error = Some(e.to_string());
            }
        }
    }

    /// Classify one image against the active model. Rejected synchronously
    /// with `ModelNotReady` (no state change) unless the session is Ready;
    /// decode and inference failures are converted into the snapshot's
    /// `classification_error` and clear the results.
    pub async fn submit_image(&self, source: PixelSource) -> Result<(), ClassifyError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (model, descriptor) = {
            let mut state = self.lock_state();
            if !state.ready() {
                return Err(ClassifyError::ModelNotReady);
            }
            let model = state.model.clone().ok_or(ClassifyError::ModelNotReady)?;
            state.classifying = true;
            state.classification_error = None;
            (model, state.descriptor)
        };

        // Decode, resample, and the forward pass are all CPU-bound; keep
        // them off the cooperative thread.
        let joined = tokio::task::spawn_blocking(move || {
            let tensor = normalizer::normalize(source, descriptor)?;
            inference::run_inference(model.as_ref(), tensor, descriptor)
        })
        .await;

        let outcome = match joined {
            Ok(result) => result,
            Err(e) => Err(ClassifyError::Inference(format!(
                "classification task failed: {}",
                e
            ))),
        };

        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("discarding stale classification for {}", descriptor.id);
            return Ok(());
        }
        state.classifying = false;
        match outcome {
            Ok(results) => {
                state.results = results;
            }
            Err(e) => {
                state.classification_error = Some(e.to_string());
                state.results.clear();
            }
        }
        Ok(())
    }

    /// Read-only copy of the fields the UI renders.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            dataset: state.descriptor.id,
            model_loading: state.model_loading,
            classifying: state.classifying,
            ready: state.ready(),
            model_load_error: state.model_load_error.clone(),
            classification_error: state.classification_error.clone(),
            results: state.results.clone(),
            model_summary: state.model_summary.clone(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
