//! Process-wide model cache: load once, keep for the process lifetime.

use crate::error::ClassifyError;
use crate::models::descriptor::{DatasetId, ModelDescriptor};
use crate::services::classifier::runtime::{ExecutableModel, ModelRuntime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

type ModelCell = Arc<OnceCell<Arc<dyn ExecutableModel>>>;

/// Memoizes loaded models by dataset id. Concurrent misses for the same id
/// share one underlying load; a failed load leaves its slot empty so a
/// later call retries. There is no eviction: the registry is three entries
/// and the models are assumed small enough to hold together.
pub struct ModelCache {
    runtime: Arc<dyn ModelRuntime>,
    cells: Mutex<HashMap<DatasetId, ModelCell>>,
}

impl ModelCache {
    pub fn new(runtime: Arc<dyn ModelRuntime>) -> Self {
        Self {
            runtime,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached model for `descriptor`, loading it on first use.
    pub async fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn ExecutableModel>, ClassifyError> {
        let cell = self.cell_for(descriptor.id)?;

        if let Some(model) = cell.get() {
            log::debug!("model {} served from cache", descriptor.id);
            return Ok(model.clone());
        }

        let model = cell
            .get_or_try_init(|| self.runtime.load(descriptor))
            .await?;
        Ok(model.clone())
    }

    pub fn is_cached(&self, id: DatasetId) -> bool {
        self.cells
            .lock()
            .map(|cells| cells.get(&id).is_some_and(|cell| cell.get().is_some()))
            .unwrap_or(false)
    }

    /// Drop every cached model. Mainly for tests; live sessions keep their
    /// own handles, so in-flight classifications are unaffected.
    pub fn reset(&self) {
        match self.cells.lock() {
            Ok(mut cells) => cells.clear(),
            Err(_) => log::warn!("model cache lock poisoned during reset"),
        }
    }

    fn cell_for(&self, id: DatasetId) -> Result<ModelCell, ClassifyError> {
        let mut cells = self.cells.lock().map_err(|_| ClassifyError::ModelLoad {
            dataset: id,
            message: "model cache lock poisoned".to_string(),
        })?;
        Ok(cells.entry(id).or_default().clone())
    }
}
