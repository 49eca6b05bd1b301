use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::info;
use ndarray::{Array2, ArrayView2};
use ort::session::Session;
use ort::value::Tensor;

use super::error::PredictorError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// The pre-trained classifier the predictor delegates to.
///
/// The production implementation is [`OnnxClassifier`]; tests inject a fixed
/// probability table through the same seam so the predictor can be exercised
/// without model artifacts.
pub trait Classifier: Send + Sync {
    /// The classifier's class ids, in the order its probability columns are
    /// laid out.
    fn classes(&self) -> &[i64];

    /// Returns the top-1 class id for each input row.
    fn predict(&self, rows: ArrayView2<'_, f32>) -> Result<Vec<i64>, PredictorError>;

    /// Returns the full class-probability distribution, one row per input,
    /// one column per class in `classes()` order.
    fn predict_probabilities(
        &self,
        rows: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>, PredictorError>;
}

/// An ONNX-exported classifier (the original random forest converted with
/// zipmap disabled): input `float_input` of shape [n, 4], outputs `label`
/// (i64, [n]) and `probabilities` (f32, [n, classes]).
pub struct OnnxClassifier {
    session: Arc<Session>,
    classes: Vec<i64>,
}

impl OnnxClassifier {
    /// Loads the model file into an ONNX Runtime session.
    ///
    /// `classes` is the native class-id ordering recorded by the training
    /// job alongside the model; it must match the model's probability
    /// columns.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        config: &RuntimeConfig,
        classes: Vec<i64>,
    ) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PredictorError::Build(format!(
                "Model file not found: {}",
                path.display()
            )));
        }
        if classes.is_empty() {
            return Err(PredictorError::Build(
                "Classifier must have at least one class".to_string(),
            ));
        }

        let session = create_session_builder(config)?.commit_from_file(path)?;
        Self::validate_model(&session)?;
        info!("Model loaded from {:?} ({} classes)", path, classes.len());

        Ok(Self {
            session: Arc::new(session),
            classes,
        })
    }

    /// Checks that the session exposes the expected input and outputs.
    fn validate_model(session: &Session) -> Result<(), PredictorError> {
        if !session.inputs.iter().any(|i| i.name == "float_input") {
            return Err(PredictorError::Build(
                "Model is missing the 'float_input' input; was it exported with the expected schema?"
                    .to_string(),
            ));
        }
        for name in ["label", "probabilities"] {
            if !session.outputs.iter().any(|o| o.name == name) {
                return Err(PredictorError::Build(format!(
                    "Model is missing the '{}' output; export it with zipmap disabled",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Classifier for OnnxClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, rows: ArrayView2<'_, f32>) -> Result<Vec<i64>, PredictorError> {
        let input_dyn = rows.to_owned().into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "float_input",
            Tensor::from_array(&input)
                .map_err(|e| PredictorError::Model(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| PredictorError::Model(format!("Failed to run model: {}", e)))?;
        let labels = outputs["label"]
            .try_extract_tensor::<i64>()
            .map_err(|e| PredictorError::Model(format!("Failed to extract label output: {}", e)))?;
        Ok(labels.iter().copied().collect())
    }

    fn predict_probabilities(
        &self,
        rows: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>, PredictorError> {
        let n_rows = rows.nrows();
        let input_dyn = rows.to_owned().into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "float_input",
            Tensor::from_array(&input)
                .map_err(|e| PredictorError::Model(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| PredictorError::Model(format!("Failed to run model: {}", e)))?;
        let probabilities = outputs["probabilities"].try_extract_tensor::<f32>().map_err(|e| {
            PredictorError::Model(format!("Failed to extract probabilities output: {}", e))
        })?;

        let flat: Vec<f32> = probabilities.iter().copied().collect();
        Array2::from_shape_vec((n_rows, self.classes.len()), flat).map_err(|e| {
            PredictorError::Model(format!(
                "Probability matrix shape does not match class count: {}",
                e
            ))
        })
    }
}
