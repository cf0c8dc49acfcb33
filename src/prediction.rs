//! Borrowed views over raw model outputs.
//!
//! `RawPrediction` wraps the three flat tensors a single-shot detector emits
//! for one image without copying them. Tensors are anchor-major:
//! - `delta_bbox[anchor * 4 + c]` with `c` in `{dx, dy, dw, dh}`,
//! - `class_scores[anchor * num_classes + class]`,
//! - `conf_scores[anchor]`.

use crate::util::{InferBboxError, InferBboxResult};

/// Number of offsets predicted per anchor.
pub const DELTA_LEN: usize = 4;

/// Per-anchor relative box offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delta {
    /// Center x offset, in units of anchor width.
    pub dx: f64,
    /// Center y offset, in units of anchor height.
    pub dy: f64,
    /// Log-scale width offset.
    pub dw: f64,
    /// Log-scale height offset.
    pub dh: f64,
}

/// Zero-copy view over one image's model outputs.
#[derive(Clone, Copy, Debug)]
pub struct RawPrediction<'a> {
    delta_bbox: &'a [f32],
    class_scores: &'a [f32],
    conf_scores: &'a [f32],
    num_classes: usize,
}

impl<'a> RawPrediction<'a> {
    /// Wraps the tensors after checking them against `anchors` and `num_classes`.
    pub fn new(
        delta_bbox: &'a [f32],
        class_scores: &'a [f32],
        conf_scores: &'a [f32],
        anchors: usize,
        num_classes: usize,
    ) -> InferBboxResult<Self> {
        if num_classes == 0 {
            return Err(InferBboxError::EmptyLabelTable);
        }
        check_len("delta_bbox", delta_bbox.len(), anchors.checked_mul(DELTA_LEN))?;
        check_len(
            "class_scores",
            class_scores.len(),
            anchors.checked_mul(num_classes),
        )?;
        check_len("conf_scores", conf_scores.len(), Some(anchors))?;
        Ok(Self {
            delta_bbox,
            class_scores,
            conf_scores,
            num_classes,
        })
    }

    /// Returns the number of anchors covered by the view.
    pub fn anchors(&self) -> usize {
        self.conf_scores.len()
    }

    /// Returns the number of classes per anchor.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns the offsets predicted for `anchor`.
    pub fn delta(&self, anchor: usize) -> Option<Delta> {
        let start = anchor.checked_mul(DELTA_LEN)?;
        let row = self.delta_bbox.get(start..start + DELTA_LEN)?;
        Some(Delta {
            dx: f64::from(row[0]),
            dy: f64::from(row[1]),
            dw: f64::from(row[2]),
            dh: f64::from(row[3]),
        })
    }

    /// Returns the class score row for `anchor`.
    pub fn class_row(&self, anchor: usize) -> Option<&'a [f32]> {
        let start = anchor.checked_mul(self.num_classes)?;
        self.class_scores.get(start..start + self.num_classes)
    }

    /// Returns the object confidence for `anchor`.
    pub fn confidence(&self, anchor: usize) -> Option<f32> {
        self.conf_scores.get(anchor).copied()
    }

    /// Iterates offsets for all anchors in order.
    pub fn deltas(&self) -> impl Iterator<Item = Delta> + 'a {
        self.delta_bbox.chunks_exact(DELTA_LEN).map(|row| Delta {
            dx: f64::from(row[0]),
            dy: f64::from(row[1]),
            dw: f64::from(row[2]),
            dh: f64::from(row[3]),
        })
    }

    /// Iterates `(class_row, confidence)` pairs for all anchors in order.
    pub fn scores(&self) -> impl Iterator<Item = (&'a [f32], f32)> + 'a {
        self.class_scores
            .chunks_exact(self.num_classes)
            .zip(self.conf_scores.iter().copied())
    }
}

fn check_len(tensor: &'static str, got: usize, expected: Option<usize>) -> InferBboxResult<()> {
    let expected = expected.ok_or(InferBboxError::InvalidConfig {
        reason: "tensor size overflows usize",
    })?;
    if got != expected {
        return Err(InferBboxError::TensorSizeMismatch {
            tensor,
            expected,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::RawPrediction;
    use crate::util::InferBboxError;

    #[test]
    fn accessors_follow_anchor_major_layout() {
        let delta = [0.0f32, 0.1, 0.2, 0.3, 1.0, 1.1, 1.2, 1.3];
        let class_scores = [0.25f32, 0.75, 0.5, 0.5];
        let conf = [0.9f32, 0.4];
        let pred = RawPrediction::new(&delta, &class_scores, &conf, 2, 2).unwrap();

        assert_eq!(pred.anchors(), 2);
        let d = pred.delta(1).unwrap();
        assert_eq!(d.dx, f64::from(1.0f32));
        assert_eq!(d.dh, f64::from(1.3f32));
        assert_eq!(pred.class_row(0).unwrap(), &[0.25, 0.75]);
        assert_eq!(pred.confidence(1), Some(0.4));
        assert!(pred.delta(2).is_none());
        assert_eq!(pred.deltas().count(), 2);
        assert_eq!(pred.scores().count(), 2);
    }

    #[test]
    fn rejects_mismatched_tensors() {
        let delta = [0.0f32; 8];
        let class_scores = [0.0f32; 4];
        let conf = [0.0f32; 2];

        let err = RawPrediction::new(&delta[..7], &class_scores, &conf, 2, 2).unwrap_err();
        assert_eq!(
            err,
            InferBboxError::TensorSizeMismatch {
                tensor: "delta_bbox",
                expected: 8,
                got: 7,
            }
        );
        let err = RawPrediction::new(&delta, &class_scores, &conf, 2, 3).unwrap_err();
        assert!(matches!(
            err,
            InferBboxError::TensorSizeMismatch {
                tensor: "class_scores",
                ..
            }
        ));
        let err = RawPrediction::new(&delta, &class_scores, &conf[..1], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            InferBboxError::TensorSizeMismatch {
                tensor: "conf_scores",
                ..
            }
        ));
    }
}
