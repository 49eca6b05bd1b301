use std::sync::Arc;

use super::codec::CodecSet;
use super::error::PredictorError;
use super::features::{FeatureVector, FEATURE_COLUMNS};
use super::model::Classifier;

/// A ranked (label, percentage) entry of the top-3 list, e.g.
/// `("electronics", "87.50%")`.
pub type RankedPrediction = (String, String);

/// The prediction adapter: encodes raw category identifiers, assembles the
/// feature row, runs the classifier, and decodes the result back to labels.
///
/// # Thread Safety
///
/// This type is `Send + Sync`: the classifier and codecs are shared read-only
/// behind `Arc` and never mutated after construction, so any number of
/// threads may predict concurrently without coordination.
pub struct Predictor {
    pub(crate) classifier: Arc<dyn Classifier>,
    pub(crate) codecs: Arc<CodecSet>,
}

// `dyn Classifier` is not `Debug`, so derive is unavailable.
impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor").finish_non_exhaustive()
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

/// Summary of the loaded artifacts, for display surfaces.
#[derive(Debug, Clone)]
pub struct PredictorInfo {
    pub num_classes: usize,
    pub target_labels: Vec<String>,
    pub feature_columns: [&'static str; 4],
}

impl Predictor {
    /// Creates a new PredictorBuilder for fluent construction
    pub fn builder() -> super::builder::PredictorBuilder {
        super::builder::PredictorBuilder::new()
    }

    /// Returns information about the predictor's loaded artifacts
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            num_classes: self.classifier.classes().len(),
            target_labels: self.codecs.target_category.labels().to_vec(),
            feature_columns: FEATURE_COLUMNS,
        }
    }

    /// Predicts the product category the user is most likely to add to cart.
    ///
    /// # Arguments
    /// * `last_view_cat` - Category id of the last viewed item
    /// * `most_freq_cat` - Most frequently viewed category id
    /// * `unique_cats_viewed` - Number of unique categories viewed
    /// * `total_views_before_cart` - Total views before the add-to-cart event
    ///
    /// # Returns
    /// A tuple containing:
    /// * The predicted category label
    /// * The top-3 (label, percentage) pairs, sorted descending by
    ///   probability; ties keep the classifier's native class order
    ///
    /// # Errors
    /// `UnknownCategory` if either category id was not in the training
    /// vocabulary; no default category is ever substituted.
    pub fn predict(
        &self,
        last_view_cat: &str,
        most_freq_cat: &str,
        unique_cats_viewed: u32,
        total_views_before_cart: u32,
    ) -> Result<(String, Vec<RankedPrediction>), PredictorError> {
        let features = self.encode_features(
            last_view_cat,
            most_freq_cat,
            unique_cats_viewed,
            total_views_before_cart,
        )?;
        let row = features.to_row();

        let predicted = self
            .classifier
            .predict(row.view())?
            .first()
            .copied()
            .ok_or_else(|| PredictorError::Model("Classifier returned no prediction".into()))?;
        let predicted_label = self.decode_class(predicted)?;

        let probabilities = self.classifier.predict_probabilities(row.view())?;
        let distribution = probabilities.row(0);
        if distribution.len() != self.classifier.classes().len() {
            return Err(PredictorError::Model(format!(
                "Probability row has {} entries for {} classes",
                distribution.len(),
                self.classifier.classes().len()
            )));
        }

        let mut ranked: Vec<(i64, f32)> = self
            .classifier
            .classes()
            .iter()
            .copied()
            .zip(distribution.iter().copied())
            .collect();
        // Stable sort keeps the classifier's native class order on ties.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(3);

        let top3 = ranked
            .into_iter()
            .map(|(class, prob)| {
                self.decode_class(class)
                    .map(|label| (label, format!("{:.2}%", prob * 100.0)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((predicted_label, top3))
    }

    fn encode_features(
        &self,
        last_view_cat: &str,
        most_freq_cat: &str,
        unique_cats_viewed: u32,
        total_views_before_cart: u32,
    ) -> Result<FeatureVector, PredictorError> {
        let last_view = self.codecs.last_view_cat.encode(last_view_cat).ok_or_else(|| {
            PredictorError::UnknownCategory {
                feature: FEATURE_COLUMNS[0],
                value: last_view_cat.to_string(),
            }
        })?;
        let most_freq = self.codecs.most_freq_cat.encode(most_freq_cat).ok_or_else(|| {
            PredictorError::UnknownCategory {
                feature: FEATURE_COLUMNS[1],
                value: most_freq_cat.to_string(),
            }
        })?;
        Ok(FeatureVector {
            last_view_cat: last_view,
            most_freq_cat: most_freq,
            unique_cats_viewed,
            total_views_before_cart,
        })
    }

    fn decode_class(&self, class: i64) -> Result<String, PredictorError> {
        self.codecs
            .target_category
            .decode(class)
            .map(str::to_string)
            .ok_or_else(|| {
                PredictorError::Codec(format!("Class id {} has no label in target codec", class))
            })
    }
}
