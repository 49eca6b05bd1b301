use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::PredictorError;

/// Bidirectional mapping between a category label and the dense integer code
/// the classifier was trained on.
///
/// Codes follow sklearn `LabelEncoder` semantics: each label's code is its
/// index in the fitted class list, so `decode` is a plain index lookup. The
/// codec is built once from the training vocabulary and never mutated at
/// inference time.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    classes: Vec<String>,
    index: HashMap<String, i64>,
}

impl LabelCodec {
    /// Builds a codec from the ordered class list produced by training.
    pub fn new(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code as i64))
            .collect();
        Self { classes, index }
    }

    /// Returns the integer code for a label, or `None` if the label was not
    /// in the training vocabulary.
    pub fn encode(&self, label: &str) -> Option<i64> {
        self.index.get(label).copied()
    }

    /// Returns the label for an integer code, or `None` if the code is out
    /// of range.
    pub fn decode(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The training vocabulary in code order.
    pub fn labels(&self) -> &[String] {
        &self.classes
    }
}

/// On-disk shape of the encoders artifact exported by the training job.
#[derive(Debug, Deserialize)]
struct CodecSetData {
    last_view_cat: Vec<String>,
    most_freq_cat: Vec<String>,
    target_category: Vec<String>,
    /// The classifier's native class ids, in the order its probability
    /// columns are laid out.
    classes: Vec<i64>,
}

/// The three label codecs the predictor needs, plus the classifier's native
/// class ordering.
///
/// The key set is fixed at design time, so the codecs live in named fields
/// rather than a keyed map; a missing codec is a deserialization error, not
/// a runtime lookup failure.
#[derive(Debug, Clone)]
pub struct CodecSet {
    pub last_view_cat: LabelCodec,
    pub most_freq_cat: LabelCodec,
    pub target_category: LabelCodec,
    classes: Vec<i64>,
}

impl CodecSet {
    pub fn new(
        last_view_cat: LabelCodec,
        most_freq_cat: LabelCodec,
        target_category: LabelCodec,
        classes: Vec<i64>,
    ) -> Self {
        Self {
            last_view_cat,
            most_freq_cat,
            target_category,
            classes,
        }
    }

    /// Parses the encoders artifact from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, PredictorError> {
        let data: CodecSetData = serde_json::from_str(json)
            .map_err(|e| PredictorError::Codec(format!("invalid encoders artifact: {}", e)))?;
        Ok(Self {
            last_view_cat: LabelCodec::new(data.last_view_cat),
            most_freq_cat: LabelCodec::new(data.most_freq_cat),
            target_category: LabelCodec::new(data.target_category),
            classes: data.classes,
        })
    }

    /// Loads the encoders artifact from disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        log::info!("Loading encoders artifact from {:?}", path);
        let json = fs::read_to_string(path).map_err(|e| {
            PredictorError::Build(format!("failed to read encoders file {:?}: {}", path, e))
        })?;
        Self::from_json(&json)
    }

    /// The classifier's class ids in its native (probability-column) order.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}
