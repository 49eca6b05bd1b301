use ndarray::Array2;

/// Feature column names in the exact order the classifier was fit against.
/// Swapping this order silently corrupts predictions, so it is part of the
/// public contract.
pub const FEATURE_COLUMNS: [&str; 4] = [
    "last_view_cat",
    "most_freq_cat",
    "unique_cats_viewed",
    "total_views_before_cart",
];

/// A single already-encoded input row for the classifier.
///
/// The two categorical fields hold the integer codes produced by the label
/// codecs; the two counters are passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub last_view_cat: i64,
    pub most_freq_cat: i64,
    pub unique_cats_viewed: u32,
    pub total_views_before_cart: u32,
}

impl FeatureVector {
    /// Lays the vector out as a 1x4 row in `FEATURE_COLUMNS` order, in the
    /// f32 dtype the exported model expects.
    pub fn to_row(&self) -> Array2<f32> {
        Array2::from_shape_vec(
            (1, FEATURE_COLUMNS.len()),
            vec![
                self.last_view_cat as f32,
                self.most_freq_cat as f32,
                self.unique_cats_viewed as f32,
                self.total_views_before_cart as f32,
            ],
        )
        .expect("shape (1, 4) always matches a 4-element vec")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_follows_column_order() {
        let features = FeatureVector {
            last_view_cat: 2,
            most_freq_cat: 7,
            unique_cats_viewed: 3,
            total_views_before_cart: 5,
        };
        let row = features.to_row();
        assert_eq!(row.shape(), &[1, 4]);
        assert_eq!(row[[0, 0]], 2.0);
        assert_eq!(row[[0, 1]], 7.0);
        assert_eq!(row[[0, 2]], 3.0);
        assert_eq!(row[[0, 3]], 5.0);
    }
}
