use crate::models::descriptor::DatasetId;
use ndarray::Array4;
use serde::Serialize;

/// One class's score from a classification run.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    /// Index of the class in the model's output order, kept through sorting.
    pub index: usize,
}

/// A dense `[1, height, width, channels]` buffer scaled to [0,1], ready for
/// a model's forward pass. Created per request and consumed by it; dropping
/// the tensor releases the buffer on every exit path.
#[derive(Debug)]
pub struct NormalizedTensor {
    array: Array4<f32>,
}

impl NormalizedTensor {
    pub fn new(array: Array4<f32>) -> Self {
        Self { array }
    }

    pub fn shape(&self) -> [usize; 4] {
        let s = self.array.shape();
        [s[0], s[1], s[2], s[3]]
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.array
    }

    pub fn into_array(self) -> Array4<f32> {
        self.array
    }
}

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    ModelLoading,
    Ready,
    ModelLoadFailed,
    Classifying,
}

/// Read-only copy of the session fields a UI renders. Produced fresh by
/// `ClassifySession::snapshot`; mutating it has no effect on the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub dataset: DatasetId,
    pub model_loading: bool,
    pub classifying: bool,
    pub ready: bool,
    pub model_load_error: Option<String>,
    pub classification_error: Option<String>,
    /// Ranked results of the last classification, best first.
    pub results: Vec<Prediction>,
    /// Human-readable lines describing the loaded model's interface.
    pub model_summary: Vec<String>,
}

impl SessionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        if self.model_loading {
            SessionPhase::ModelLoading
        } else if self.classifying {
            SessionPhase::Classifying
        } else if self.ready {
            SessionPhase::Ready
        } else if self.model_load_error.is_some() {
            SessionPhase::ModelLoadFailed
        } else {
            SessionPhase::Idle
        }
    }
}
