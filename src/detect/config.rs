//! Detector configuration.

use crate::anchor::shapes::DEFAULT_ANCHOR_SHAPES;
use crate::anchor::{anchor_count, AnchorShape};
use crate::detect::labels::VOC_LABELS;
use crate::util::{InferBboxError, InferBboxResult};

/// Default detection probability floor.
pub const DEFAULT_THRESH: f64 = 0.8;

/// Fixed geometry and filtering knobs of a detector instance.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Input image width in pixels.
    pub image_width: usize,
    /// Input image height in pixels.
    pub image_height: usize,
    /// Number of grid columns `W`.
    pub grid_width: usize,
    /// Number of grid rows `H`.
    pub grid_height: usize,
    /// Anchor shapes placed in every cell; its length is `anchors_per_grid`.
    pub anchor_shapes: Vec<AnchorShape>,
    /// Class names; its length is `num_classes`.
    pub labels: Vec<String>,
    /// Detection probability floor used by `InferBbox::filter_default`.
    pub intersection_thresh: f64,
    /// IOU above which NMS suppresses a box.
    pub nms_intersection_thresh: f64,
    /// Candidate pool size before NMS.
    pub n_top_detections: usize,
    /// Denominator guard for IOU.
    pub epsilon: f64,
    /// Run per-class NMS in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            image_width: 416,
            image_height: 416,
            grid_width: 23,
            grid_height: 23,
            anchor_shapes: DEFAULT_ANCHOR_SHAPES.to_vec(),
            labels: VOC_LABELS.iter().map(|s| s.to_string()).collect(),
            intersection_thresh: DEFAULT_THRESH,
            nms_intersection_thresh: 0.1,
            n_top_detections: 64,
            epsilon: 1e-7,
            parallel: false,
        }
    }
}

impl DetectorConfig {
    /// Returns the number of classes.
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// Returns the number of anchors per grid cell.
    pub fn anchors_per_grid(&self) -> usize {
        self.anchor_shapes.len()
    }

    /// Returns the total anchor count `W * H * anchors_per_grid`.
    ///
    /// Saturates at `usize::MAX`; `validate` rejects such configs.
    pub fn anchors(&self) -> usize {
        anchor_count(self.grid_width, self.grid_height, self.anchors_per_grid())
            .unwrap_or(usize::MAX)
    }

    /// Validates scalar parameters and table sizes.
    ///
    /// Anchor shapes and dimensions are checked again when the anchor grid is
    /// built.
    pub fn validate(&self) -> InferBboxResult<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(InferBboxError::InvalidDimensions {
                width: self.image_width,
                height: self.image_height,
                context: "image",
            });
        }
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(InferBboxError::InvalidDimensions {
                width: self.grid_width,
                height: self.grid_height,
                context: "grid",
            });
        }
        if self.anchor_shapes.is_empty() {
            return Err(InferBboxError::EmptyAnchorShapes);
        }
        if self.labels.is_empty() {
            return Err(InferBboxError::EmptyLabelTable);
        }
        if anchor_count(self.grid_width, self.grid_height, self.anchors_per_grid()).is_none() {
            return Err(InferBboxError::InvalidConfig {
                reason: "anchor count overflows usize",
            });
        }
        if !self.intersection_thresh.is_finite() {
            return Err(InferBboxError::InvalidConfig {
                reason: "intersection_thresh must be finite",
            });
        }
        if !self.nms_intersection_thresh.is_finite() {
            return Err(InferBboxError::InvalidConfig {
                reason: "nms_intersection_thresh must be finite",
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(InferBboxError::InvalidConfig {
                reason: "epsilon must be positive and finite",
            });
        }
        Ok(())
    }
}
