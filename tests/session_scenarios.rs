//! End-to-end session behavior against a scriptable model runtime.

use async_trait::async_trait;
use draw_classify::{
    ClassifyError, ClassifySession, DatasetId, ExecutableModel, ModelCache, ModelDescriptor,
    ModelRuntime, NormalizedTensor, PixelBuffer, PixelSource, SessionPhase,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Model that always answers with the same confidence vector.
struct FixedModel {
    output: Vec<f32>,
}

impl ExecutableModel for FixedModel {
    fn predict(&self, _input: NormalizedTensor) -> Result<Vec<f32>, ClassifyError> {
        Ok(self.output.clone())
    }

    fn summary(&self) -> Vec<String> {
        vec!["fixed test model".to_string()]
    }
}

/// Runtime whose loads can be gated per dataset and told to fail N times.
struct ScriptedRuntime {
    loads: AtomicUsize,
    failures_left: Mutex<usize>,
    gates: Mutex<HashMap<DatasetId, Arc<Notify>>>,
    output: Vec<f32>,
}

impl ScriptedRuntime {
    fn new(output: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            failures_left: Mutex::new(0),
            gates: Mutex::new(HashMap::new()),
            output,
        })
    }

    fn uniform() -> Arc<Self> {
        Self::new(vec![0.1; 10])
    }

    fn fail_next(&self, count: usize) {
        *self.failures_left.lock().unwrap() = count;
    }

    fn gate(&self, id: DatasetId) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(id)
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelRuntime for ScriptedRuntime {
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn ExecutableModel>, ClassifyError> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(&descriptor.id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        {
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ClassifyError::ModelLoad {
                    dataset: descriptor.id,
                    message: "scripted 404".to_string(),
                });
            }
        }

        Ok(Arc::new(FixedModel {
            output: self.output.clone(),
        }))
    }
}

fn session_over(runtime: Arc<ScriptedRuntime>) -> Arc<ClassifySession> {
    Arc::new(ClassifySession::new(Arc::new(ModelCache::new(runtime))))
}

fn blank_canvas() -> PixelSource {
    PixelSource::Raw(PixelBuffer::new(28, 28, vec![255; 28 * 28 * 4]))
}

#[tokio::test]
async fn blank_canvas_yields_ten_ranked_results() {
    let session = session_over(ScriptedRuntime::uniform());
    session.select_dataset(DatasetId::Mnist).await;
    assert_eq!(session.snapshot().phase(), SessionPhase::Ready);

    session.submit_image(blank_canvas()).await.unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.results.len(), 10);
    assert!(snapshot.classification_error.is_none());
    for pair in snapshot.results.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[tokio::test]
async fn softmax_confidences_sum_to_one() {
    let output = vec![0.05, 0.1, 0.4, 0.05, 0.05, 0.05, 0.1, 0.05, 0.1, 0.05];
    let session = session_over(ScriptedRuntime::new(output));
    session.select_dataset(DatasetId::Mnist).await;
    session.submit_image(blank_canvas()).await.unwrap();

    let snapshot = session.snapshot();
    let sum: f32 = snapshot.results.iter().map(|p| p.confidence).sum();
    assert!((sum - 1.0).abs() < 1e-3);
    // Highest scripted confidence sits at class index 2.
    assert_eq!(snapshot.results[0].index, 2);
    assert_eq!(snapshot.results[0].label, "2");
}

#[tokio::test]
async fn switching_datasets_mid_load_lands_on_the_last_request() {
    let runtime = ScriptedRuntime::uniform();
    let cifar_gate = runtime.gate(DatasetId::Cifar10);
    let fashion_gate = runtime.gate(DatasetId::FashionMnist);
    let session = session_over(runtime);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.select_dataset(DatasetId::Cifar10).await }
    });
    tokio::task::yield_now().await;
    assert_eq!(session.snapshot().phase(), SessionPhase::ModelLoading);

    let second = tokio::spawn({
        let session = session.clone();
        async move { session.select_dataset(DatasetId::FashionMnist).await }
    });
    tokio::task::yield_now().await;

    // The newer request resolves first, then the stale one limps in.
    fashion_gate.notify_one();
    second.await.unwrap();
    assert_eq!(session.snapshot().dataset, DatasetId::FashionMnist);
    assert_eq!(session.snapshot().phase(), SessionPhase::Ready);

    cifar_gate.notify_one();
    first.await.unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.dataset, DatasetId::FashionMnist);
    assert_eq!(snapshot.phase(), SessionPhase::Ready);
    assert!(snapshot.model_load_error.is_none());
}

#[tokio::test]
async fn non_image_submission_sets_decode_error_and_keeps_model() {
    let session = session_over(ScriptedRuntime::uniform());
    session.select_dataset(DatasetId::Mnist).await;

    session
        .submit_image(PixelSource::Encoded(b"definitely not pixels".to_vec()))
        .await
        .unwrap();

    let snapshot = session.snapshot();
    assert!(snapshot
        .classification_error
        .as_deref()
        .unwrap()
        .contains("decode"));
    assert!(snapshot.results.is_empty());
    // The loaded model survives a bad submission.
    assert_eq!(snapshot.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn failed_load_names_the_dataset_and_reselect_retries() {
    let runtime = ScriptedRuntime::uniform();
    runtime.fail_next(1);
    let session = session_over(runtime.clone());

    session.select_dataset(DatasetId::Mnist).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase(), SessionPhase::ModelLoadFailed);
    assert!(snapshot.model_load_error.as_deref().unwrap().contains("mnist"));

    // The failure is not cached; the same selection fetches again.
    session.select_dataset(DatasetId::Mnist).await;
    assert_eq!(session.snapshot().phase(), SessionPhase::Ready);
    assert_eq!(runtime.load_count(), 2);
}

#[tokio::test]
async fn submission_before_any_model_is_rejected_without_state_change() {
    let session = session_over(ScriptedRuntime::uniform());
    let before = session.snapshot();

    let err = session.submit_image(blank_canvas()).await.unwrap_err();
    assert!(matches!(err, ClassifyError::ModelNotReady));

    let after = session.snapshot();
    assert_eq!(after.phase(), SessionPhase::Idle);
    assert!(after.results.is_empty());
    assert_eq!(before.classification_error, after.classification_error);
}

#[tokio::test]
async fn submission_while_loading_is_rejected() {
    let runtime = ScriptedRuntime::uniform();
    let gate = runtime.gate(DatasetId::Mnist);
    let session = session_over(runtime);

    let load = tokio::spawn({
        let session = session.clone();
        async move { session.select_dataset(DatasetId::Mnist).await }
    });
    tokio::task::yield_now().await;

    let err = session.submit_image(blank_canvas()).await.unwrap_err();
    assert!(matches!(err, ClassifyError::ModelNotReady));

    gate.notify_one();
    load.await.unwrap();
    assert_eq!(session.snapshot().phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn cache_returns_the_same_handle_without_refetching() {
    let runtime = ScriptedRuntime::uniform();
    let cache = ModelCache::new(runtime.clone());
    let descriptor = draw_classify::describe(DatasetId::Mnist);

    let first = cache.load(descriptor).await.unwrap();
    let second = cache.load(descriptor).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(runtime.load_count(), 1);
    assert!(cache.is_cached(DatasetId::Mnist));
    assert!(!cache.is_cached(DatasetId::Cifar10));
}

#[tokio::test]
async fn concurrent_misses_share_a_single_load() {
    let runtime = ScriptedRuntime::uniform();
    let gate = runtime.gate(DatasetId::Mnist);
    let cache = Arc::new(ModelCache::new(runtime.clone()));
    let descriptor = draw_classify::describe(DatasetId::Mnist);

    let a = tokio::spawn({
        let cache = cache.clone();
        async move { cache.load(descriptor).await }
    });
    let b = tokio::spawn({
        let cache = cache.clone();
        async move { cache.load(descriptor).await }
    });
    tokio::task::yield_now().await;

    gate.notify_one();
    let first = a.await.unwrap().unwrap();
    let second = b.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(runtime.load_count(), 1);
}

#[tokio::test]
async fn reset_clears_cached_models() {
    let runtime = ScriptedRuntime::uniform();
    let cache = ModelCache::new(runtime.clone());
    let descriptor = draw_classify::describe(DatasetId::Mnist);

    cache.load(descriptor).await.unwrap();
    assert!(cache.is_cached(DatasetId::Mnist));

    cache.reset();
    assert!(!cache.is_cached(DatasetId::Mnist));

    cache.load(descriptor).await.unwrap();
    assert_eq!(runtime.load_count(), 2);
}

#[tokio::test]
async fn snapshot_serializes_for_the_ui_boundary() {
    let session = session_over(ScriptedRuntime::uniform());
    session.select_dataset(DatasetId::Mnist).await;
    session.submit_image(blank_canvas()).await.unwrap();

    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["dataset"], "mnist");
    assert_eq!(json["results"].as_array().unwrap().len(), 10);
    assert_eq!(json["model_summary"][0], "fixed test model");
}
