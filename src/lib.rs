//! Predicts which product category a user will most likely add to cart,
//! from four browsing-behavior features, using a pre-trained classifier
//! exported to ONNX and the label codecs fitted alongside it.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cartcast::Predictor;
//!
//! let predictor = Predictor::builder()
//!     .with_encoders_file("artifacts/rf-small/encoders.json")?
//!     .with_model_file("artifacts/rf-small/model.onnx")?
//!     .build()?;
//!
//! let (category, top3) = predictor.predict("5", "5", 3, 5)?;
//! println!("Predicted category: {}", category);
//! for (label, probability) in top3 {
//!     println!("  {}: {}", label, probability);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The predictor holds its classifier and codecs as read-only shared state,
//! so it can be wrapped in an `Arc` and used from any number of threads
//! without coordination:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cartcast::Predictor;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let predictor = Arc::new(
//!     Predictor::builder()
//!         .with_encoders_file("artifacts/rf-small/encoders.json")?
//!         .with_model_file("artifacts/rf-small/model.onnx")?
//!         .build()?,
//! );
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let predictor = Arc::clone(&predictor);
//!     handles.push(thread::spawn(move || {
//!         predictor.predict("5", "9", 3, 5).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod predictor;
mod runtime;

pub use artifacts::{ArtifactError, ArtifactSpec, ArtifactStore};
pub use predictor::{
    Classifier, CodecSet, FeatureVector, LabelCodec, OnnxClassifier, Predictor, PredictorBuilder,
    PredictorError, PredictorInfo, RankedPrediction, FEATURE_COLUMNS,
};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
