use std::sync::Arc;
use std::thread;

use cartcast::{Classifier, CodecSet, LabelCodec, Predictor, PredictorError};
use ndarray::{Array2, ArrayView2};

/// Stand-in for the ONNX classifier: a fixed probability table over its
/// classes, with predict defined as the argmax of that table.
struct TableClassifier {
    classes: Vec<i64>,
    probabilities: Vec<f32>,
}

impl Classifier for TableClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, _rows: ArrayView2<'_, f32>) -> Result<Vec<i64>, PredictorError> {
        let argmax = self
            .probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| self.classes[i])
            .expect("table is never empty");
        Ok(vec![argmax])
    }

    fn predict_probabilities(
        &self,
        rows: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>, PredictorError> {
        Array2::from_shape_vec((rows.nrows(), self.classes.len()), self.probabilities.clone())
            .map_err(|e| PredictorError::Model(e.to_string()))
    }
}

fn category_codec() -> LabelCodec {
    LabelCodec::new(vec!["5".into(), "9".into(), "12".into()])
}

fn setup_test_predictor(probabilities: Vec<f32>) -> Predictor {
    let n = probabilities.len();
    let targets: Vec<String> = (0..n).map(|i| format!("category-{}", i)).collect();
    let classes: Vec<i64> = (0..n as i64).collect();

    let codecs = CodecSet::new(
        category_codec(),
        category_codec(),
        LabelCodec::new(targets),
        classes.clone(),
    );

    Predictor::builder()
        .with_classifier(Arc::new(TableClassifier {
            classes,
            probabilities,
        }))
        .expect("classifier not yet set")
        .with_codecs(codecs)
        .expect("codecs not yet set")
        .build()
        .expect("Failed to build predictor")
}

fn assert_percentage_format(s: &str) {
    // Shape \d+\.\d{2}%
    let body = s.strip_suffix('%').unwrap_or_else(|| panic!("'{}' does not end with %", s));
    let (whole, frac) = body
        .split_once('.')
        .unwrap_or_else(|| panic!("'{}' has no decimal point", s));
    assert!(!whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()), "bad whole part in '{}'", s);
    assert_eq!(frac.len(), 2, "'{}' does not carry 2 decimal digits", s);
    assert!(frac.chars().all(|c| c.is_ascii_digit()), "bad fraction in '{}'", s);
}

#[test]
fn test_end_to_end_prediction() -> Result<(), Box<dyn std::error::Error>> {
    let predictor = setup_test_predictor(vec![0.05, 0.875, 0.025, 0.05]);

    // The reference inputs: both category ids present in the training
    // vocabulary, counters at their form defaults.
    let (category, top3) = predictor.predict("5", "5", 3, 5)?;

    assert_eq!(category, "category-1");
    assert_eq!(top3.len(), 3);
    assert_eq!(top3[0].0, category);
    assert_eq!(top3[0].1, "87.50%");
    Ok(())
}

#[test]
fn test_top1_is_in_target_vocabulary() {
    let predictor = setup_test_predictor(vec![0.2, 0.5, 0.3]);
    let (category, _) = predictor.predict("9", "12", 4, 10).unwrap();
    assert!(predictor
        .info()
        .target_labels
        .iter()
        .any(|label| label == &category));
}

#[test]
fn test_top3_sorted_descending() {
    let predictor = setup_test_predictor(vec![0.15, 0.05, 0.45, 0.35]);
    let (_, top3) = predictor.predict("5", "9", 3, 5).unwrap();

    let percentages: Vec<f64> = top3
        .iter()
        .map(|(_, p)| p.trim_end_matches('%').parse::<f64>().unwrap())
        .collect();
    assert!(percentages.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(top3.len(), 3);
}

#[test]
fn test_top3_shorter_when_fewer_classes() {
    let predictor = setup_test_predictor(vec![0.6, 0.4]);
    let (_, top3) = predictor.predict("5", "5", 3, 5).unwrap();
    assert_eq!(top3.len(), 2);
}

#[test]
fn test_percentage_strings_carry_two_decimals() {
    let predictor = setup_test_predictor(vec![0.123, 0.456, 0.421]);
    let (_, top3) = predictor.predict("5", "5", 3, 5).unwrap();
    for (_, percentage) in &top3 {
        assert_percentage_format(percentage);
    }
}

#[test]
fn test_distribution_is_a_probability_simplex() {
    let probabilities = vec![0.05, 0.875, 0.025, 0.05];
    let predictor = setup_test_predictor(probabilities.clone());

    // The full distribution, not just the top3, must sum to 1.
    let sum: f32 = probabilities.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    assert!(probabilities.iter().all(|&p| (0.0..=1.0).contains(&p)));

    let (_, top3) = predictor.predict("5", "5", 3, 5).unwrap();
    let top3_sum: f64 = top3
        .iter()
        .map(|(_, p)| p.trim_end_matches('%').parse::<f64>().unwrap())
        .sum();
    assert!(top3_sum <= 100.0 + 1e-6);
}

#[test]
fn test_unknown_category_is_an_error_not_a_default() {
    let predictor = setup_test_predictor(vec![0.5, 0.5]);
    let result = predictor.predict("never-seen", "5", 3, 5);
    assert!(matches!(
        result,
        Err(PredictorError::UnknownCategory { feature: "last_view_cat", .. })
    ));
}

#[test]
fn test_identical_inputs_yield_identical_outputs() {
    let predictor = setup_test_predictor(vec![0.1, 0.2, 0.3, 0.4]);
    let first = predictor.predict("9", "9", 7, 21).unwrap();
    let second = predictor.predict("9", "9", 7, 21).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_prediction() {
    let predictor = Arc::new(setup_test_predictor(vec![0.25, 0.5, 0.25]));

    let mut handles = vec![];
    for _ in 0..3 {
        let predictor = Arc::clone(&predictor);
        handles.push(thread::spawn(move || {
            predictor.predict("5", "9", 3, 5).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_encoders_artifact_from_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("cartcast-encoders-test");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("encoders.json");
    std::fs::write(
        &path,
        r#"{
            "last_view_cat": ["5", "9"],
            "most_freq_cat": ["5", "9"],
            "target_category": ["books", "electronics"],
            "classes": [0, 1]
        }"#,
    )?;

    let predictor = Predictor::builder()
        .with_encoders_file(&path)?
        .with_classifier(Arc::new(TableClassifier {
            classes: vec![0, 1],
            probabilities: vec![0.3, 0.7],
        }))?
        .build()?;

    let (category, top3) = predictor.predict("5", "9", 3, 5)?;
    assert_eq!(category, "electronics");
    assert_eq!(top3[0], ("electronics".to_string(), "70.00%".to_string()));
    Ok(())
}

#[test]
fn test_build_rejects_class_outside_target_codec() {
    let codecs = CodecSet::new(
        category_codec(),
        category_codec(),
        LabelCodec::new(vec!["books".into()]),
        vec![0, 1],
    );
    let result = Predictor::builder()
        .with_classifier(Arc::new(TableClassifier {
            classes: vec![0, 1],
            probabilities: vec![0.5, 0.5],
        }))
        .unwrap()
        .with_codecs(codecs)
        .unwrap()
        .build();
    assert!(matches!(result, Err(PredictorError::Build(_))));
}
