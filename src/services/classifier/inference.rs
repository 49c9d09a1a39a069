//! Runs a model over a normalized tensor and ranks the class confidences.

use crate::error::ClassifyError;
use crate::models::classify_types::{NormalizedTensor, Prediction};
use crate::models::descriptor::ModelDescriptor;
use crate::services::classifier::runtime::ExecutableModel;

/// Execute `model` on `tensor` and return one prediction per class, sorted
/// by descending confidence. No softmax is applied: the shipped models end
/// in a softmax layer, so the raw output values are the confidences.
///
/// The tensor is consumed here and released on every path, shape-mismatch
/// rejections included.
pub fn run_inference(
    model: &dyn ExecutableModel,
    tensor: NormalizedTensor,
    descriptor: &ModelDescriptor,
) -> Result<Vec<Prediction>, ClassifyError> {
    let expected = descriptor.input_shape();
    if tensor.shape() != expected {
        return Err(ClassifyError::Inference(format!(
            "input shape {:?} does not match model shape {:?}",
            tensor.shape(),
            expected
        )));
    }

    let values = model.predict(tensor)?;

    if values.len() != descriptor.classes.len() {
        return Err(ClassifyError::Inference(format!(
            "model produced {} values for {} classes",
            values.len(),
            descriptor.classes.len()
        )));
    }

    Ok(rank(&values, descriptor.classes))
}

/// Zip confidences with their class labels and sort best-first. The sort is
/// stable, so equal confidences keep ascending class-index order.
pub fn rank(values: &[f32], classes: &[&str]) -> Vec<Prediction> {
    let mut predictions: Vec<Prediction> = values
        .iter()
        .enumerate()
        .map(|(index, &confidence)| Prediction {
            label: classes
                .get(index)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("class_{}", index)),
            confidence,
            index,
        })
        .collect();

    predictions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    predictions
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSES: [&str; 4] = ["a", "b", "c", "d"];

    #[test]
    fn ranks_descending_by_confidence() {
        let ranked = rank(&[0.1, 0.6, 0.05, 0.25], &CLASSES);
        let labels: Vec<&str> = ranked.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["b", "d", "a", "c"]);
        for pair in ranked.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn ties_keep_ascending_class_index() {
        let ranked = rank(&[0.25, 0.25, 0.3, 0.2], &CLASSES);
        assert_eq!(ranked[0].index, 2);
        assert_eq!(ranked[1].index, 0);
        assert_eq!(ranked[2].index, 1);
        assert_eq!(ranked[3].index, 3);
    }

    #[test]
    fn original_indices_survive_sorting() {
        let ranked = rank(&[0.9, 0.05, 0.05], &["x", "y", "z"]);
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[0].label, "x");
        assert_eq!(ranked.len(), 3);
    }
}
