use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use super::codec::CodecSet;
use super::error::PredictorError;
use super::model::{Classifier, OnnxClassifier};
use super::predictor::Predictor;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a Predictor with a fluent interface.
///
/// Artifacts can come from disk (`with_model_file` + `with_encoders_file`)
/// or be injected directly (`with_classifier` + `with_codecs`), which keeps
/// the predictor testable with mock collaborators.
#[derive(Default)]
pub struct PredictorBuilder {
    model_path: Option<PathBuf>,
    encoders_path: Option<PathBuf>,
    classifier: Option<Arc<dyn Classifier>>,
    codecs: Option<CodecSet>,
    runtime_config: RuntimeConfig,
}

impl PredictorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the path to the serialized classifier (ONNX model file).
    ///
    /// The file is loaded during `build()`, once the encoders artifact has
    /// supplied the native class ordering.
    pub fn with_model_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, PredictorError> {
        if self.classifier.is_some() {
            return Err(PredictorError::Build(
                "A classifier was already injected".to_string(),
            ));
        }
        if self.model_path.is_some() {
            return Err(PredictorError::Build("Model path already set".to_string()));
        }
        let path = path.as_ref();
        if !path.exists() {
            return Err(PredictorError::Build(format!(
                "Model file not found: {}",
                path.display()
            )));
        }
        self.model_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Sets the path to the encoders artifact (label codecs + class order)
    /// and loads it.
    pub fn with_encoders_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, PredictorError> {
        if self.codecs.is_some() {
            return Err(PredictorError::Build("Codecs already set".to_string()));
        }
        let path = path.as_ref();
        let codecs = CodecSet::from_json_file(path)?;
        self.encoders_path = Some(path.to_path_buf());
        self.codecs = Some(codecs);
        Ok(self)
    }

    /// Injects an already-constructed classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Result<Self, PredictorError> {
        if self.model_path.is_some() {
            return Err(PredictorError::Build("Model path already set".to_string()));
        }
        if self.classifier.is_some() {
            return Err(PredictorError::Build("Classifier already set".to_string()));
        }
        self.classifier = Some(classifier);
        Ok(self)
    }

    /// Injects an already-constructed codec set.
    pub fn with_codecs(mut self, codecs: CodecSet) -> Result<Self, PredictorError> {
        if self.codecs.is_some() {
            return Err(PredictorError::Build("Codecs already set".to_string()));
        }
        self.codecs = Some(codecs);
        Ok(self)
    }

    /// Builds the Predictor, loading the model if a file path was given.
    ///
    /// Fails if either collaborator is missing, an artifact cannot be
    /// loaded, or the classifier's class ids do not all decode through the
    /// target codec. There is no partial-availability mode.
    pub fn build(self) -> Result<Predictor, PredictorError> {
        let codecs = self
            .codecs
            .ok_or_else(|| PredictorError::Build("No encoders artifact provided".to_string()))?;
        if codecs.target_category.is_empty() {
            return Err(PredictorError::Build(
                "Target category codec has an empty vocabulary".to_string(),
            ));
        }

        let classifier: Arc<dyn Classifier> = match (self.classifier, self.model_path) {
            (Some(classifier), None) => classifier,
            (None, Some(path)) => Arc::new(OnnxClassifier::from_file(
                &path,
                &self.runtime_config,
                codecs.classes().to_vec(),
            )?),
            (None, None) => {
                return Err(PredictorError::Build(
                    "No classifier provided; call with_model_file() or with_classifier()".to_string(),
                ))
            }
            (Some(_), Some(_)) => unreachable!("with_* methods reject the double-set case"),
        };

        for &class in classifier.classes() {
            if codecs.target_category.decode(class).is_none() {
                return Err(PredictorError::Build(format!(
                    "Classifier class id {} has no label in the target codec",
                    class
                )));
            }
        }

        info!(
            "Predictor ready: {} classes, {} known last-view categories, {} known most-freq categories",
            classifier.classes().len(),
            codecs.last_view_cat.len(),
            codecs.most_freq_cat.len()
        );

        Ok(Predictor {
            classifier,
            codecs: Arc::new(codecs),
        })
    }
}
