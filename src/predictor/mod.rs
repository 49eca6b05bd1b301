mod builder;
mod codec;
mod error;
mod features;
mod model;
#[allow(clippy::module_inception)]
mod predictor;

pub use builder::PredictorBuilder;
pub use codec::{CodecSet, LabelCodec};
pub use error::PredictorError;
pub use features::{FeatureVector, FEATURE_COLUMNS};
pub use model::{Classifier, OnnxClassifier};
pub use predictor::{Predictor, PredictorInfo, RankedPrediction};
