//! Joint class/objectness probabilities.

use crate::prediction::RawPrediction;

/// Flat `anchors x num_classes` table of joint probabilities.
///
/// Each entry is `class_score * confidence`: the probability that an object
/// is present and belongs to that class. Rows are not renormalized.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityTable {
    num_classes: usize,
    values: Vec<f64>,
}

impl ProbabilityTable {
    /// Computes the table for every anchor of `prediction`.
    pub fn from_prediction(prediction: &RawPrediction<'_>) -> Self {
        let num_classes = prediction.num_classes();
        let mut values = Vec::with_capacity(prediction.anchors() * num_classes);
        for (class_row, confidence) in prediction.scores() {
            let confidence = f64::from(confidence);
            values.extend(class_row.iter().map(|&p| f64::from(p) * confidence));
        }
        Self {
            num_classes,
            values,
        }
    }

    /// Returns the number of classes per row.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns the number of anchor rows.
    pub fn anchors(&self) -> usize {
        self.values.len() / self.num_classes.max(1)
    }

    /// Returns the probabilities of `anchor`.
    pub fn row(&self, anchor: usize) -> Option<&[f64]> {
        let start = anchor.checked_mul(self.num_classes)?;
        self.values.get(start..start + self.num_classes)
    }

    /// Iterates rows in anchor order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.num_classes.max(1))
    }

    /// Returns the whole table, row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
