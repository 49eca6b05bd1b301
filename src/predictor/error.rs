use ort::Error as OrtError;

/// Errors produced while building the predictor or serving a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// A categorical input value was never seen during training, so the
    /// codec has no integer code for it. Terminal for the request; no
    /// fallback category is substituted.
    #[error("unknown category '{value}' for feature '{feature}'")]
    UnknownCategory {
        feature: &'static str,
        value: String,
    },
    /// The classifier returned a class id with no entry in the target codec,
    /// or a codec artifact is internally inconsistent.
    #[error("codec error: {0}")]
    Codec(String),
    /// Loading or running the ONNX model failed.
    #[error("model error: {0}")]
    Model(String),
    /// A required collaborator was missing or an artifact failed to load
    /// during construction.
    #[error("build error: {0}")]
    Build(String),
}

impl From<OrtError> for PredictorError {
    fn from(err: OrtError) -> Self {
        PredictorError::Model(err.to_string())
    }
}
