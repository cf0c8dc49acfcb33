//! Detection pipeline: decode, clamp, score, rank, suppress, threshold.
//!
//! `Detector` owns the validated geometry and can be reused across images.
//! `InferBbox` binds a detector to one image's raw outputs and keeps the
//! detections of its most recent `filter` call.

use crate::anchor::AnchorGrid;
use crate::candidate::nms::{nms_per_class, ClassGroup, NmsParams};
use crate::candidate::topk::select_top_n;
use crate::geometry::decode::{clamp_boxes, decode_boxes};
use crate::geometry::BBox;
use crate::prediction::RawPrediction;
use crate::score::ProbabilityTable;
use crate::trace::{stage_event, stage_span};
use crate::util::InferBboxResult;

pub mod config;
pub mod labels;

pub use config::{DetectorConfig, DEFAULT_THRESH};

/// Final labeled detection in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Left edge.
    pub xmin: f64,
    /// Right edge.
    pub xmax: f64,
    /// Top edge.
    pub ymin: f64,
    /// Bottom edge.
    pub ymax: f64,
    /// Class id.
    pub class_idx: usize,
    /// Class name from the label table.
    pub label_name: String,
    /// Joint class/objectness probability.
    pub class_prob: f64,
}

impl Detection {
    /// Returns the detection box.
    pub fn bbox(&self) -> BBox {
        BBox::new(self.xmin, self.ymin, self.xmax, self.ymax)
    }

    /// Integer pixel bounds `[xmin, ymin, xmax, ymax]`, truncated toward zero.
    pub fn pixel_rect(&self) -> [i32; 4] {
        [
            self.xmin as i32,
            self.ymin as i32,
            self.xmax as i32,
            self.ymax as i32,
        ]
    }
}

/// Validated detector geometry, reusable across images.
#[derive(Clone, Debug)]
pub struct Detector {
    config: DetectorConfig,
    grid: AnchorGrid,
}

impl Detector {
    /// Validates `config` and builds its anchor grid.
    pub fn new(config: DetectorConfig) -> InferBboxResult<Self> {
        config.validate()?;
        let grid = AnchorGrid::new(
            config.image_width,
            config.image_height,
            config.grid_width,
            config.grid_height,
            &config.anchor_shapes,
        )?;
        Ok(Self { config, grid })
    }

    /// Returns the detector configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns the anchor grid.
    pub fn grid(&self) -> &AnchorGrid {
        &self.grid
    }

    /// Checks raw tensors against this detector's geometry.
    pub fn prediction<'a>(
        &self,
        delta_bbox: &'a [f32],
        class_scores: &'a [f32],
        conf_scores: &'a [f32],
    ) -> InferBboxResult<RawPrediction<'a>> {
        RawPrediction::new(
            delta_bbox,
            class_scores,
            conf_scores,
            self.grid.len(),
            self.config.num_classes(),
        )
    }

    /// Runs decode, clamp, scoring, top-N selection, and per-class NMS.
    ///
    /// Returns the class groups with their suppression masks, before the
    /// probability threshold is applied.
    pub fn suppress(&self, prediction: &RawPrediction<'_>) -> Vec<ClassGroup> {
        let mut boxes = decode_boxes(&self.grid, prediction);
        clamp_boxes(&mut boxes, self.config.image_width, self.config.image_height);

        let probs = ProbabilityTable::from_prediction(prediction);
        let top_n = select_top_n(&probs, &boxes, self.config.n_top_detections);
        stage_event!("top_n", count = top_n.len());

        let params = NmsParams {
            iou_thresh: self.config.nms_intersection_thresh,
            epsilon: self.config.epsilon,
        };
        let groups = nms_per_class(
            &top_n,
            self.config.num_classes(),
            params,
            self.config.parallel,
        );
        let survivors: usize = groups.iter().map(|g| g.survivors().count()).sum();
        stage_event!("nms", classes = groups.len(), survivors = survivors);
        groups
    }

    /// Produces the detections of `prediction` whose probability is at least
    /// `thresh`.
    ///
    /// Detections are ordered by class id, then by descending probability
    /// within a class.
    pub fn detect(&self, prediction: &RawPrediction<'_>, thresh: f64) -> Vec<Detection> {
        let _span = stage_span!("filter", anchors = prediction.anchors(), thresh = thresh);

        let groups = self.suppress(prediction);
        let mut detections = Vec::new();
        for group in &groups {
            let label_name = &self.config.labels[group.class_idx];
            for candidate in group.survivors().filter(|c| c.prob >= thresh) {
                detections.push(Detection {
                    xmin: candidate.bbox.xmin,
                    xmax: candidate.bbox.xmax,
                    ymin: candidate.bbox.ymin,
                    ymax: candidate.bbox.ymax,
                    class_idx: group.class_idx,
                    label_name: label_name.clone(),
                    class_prob: candidate.prob,
                });
            }
        }

        stage_event!("detections", count = detections.len());
        detections
    }
}

/// Post-processor for one image's raw model outputs.
#[derive(Clone, Debug)]
pub struct InferBbox<'a> {
    detector: Detector,
    prediction: RawPrediction<'a>,
    /// Detections of the most recent `filter` call.
    pub detections: Vec<Detection>,
}

impl<'a> InferBbox<'a> {
    /// Binds raw outputs to the default detector geometry.
    pub fn new(
        delta_bbox: &'a [f32],
        class_scores: &'a [f32],
        conf_scores: &'a [f32],
    ) -> InferBboxResult<Self> {
        Self::with_config(
            DetectorConfig::default(),
            delta_bbox,
            class_scores,
            conf_scores,
        )
    }

    /// Binds raw outputs to a custom detector geometry.
    pub fn with_config(
        config: DetectorConfig,
        delta_bbox: &'a [f32],
        class_scores: &'a [f32],
        conf_scores: &'a [f32],
    ) -> InferBboxResult<Self> {
        let detector = Detector::new(config)?;
        Self::with_detector(detector, delta_bbox, class_scores, conf_scores)
    }

    /// Binds raw outputs to an existing detector.
    pub fn with_detector(
        detector: Detector,
        delta_bbox: &'a [f32],
        class_scores: &'a [f32],
        conf_scores: &'a [f32],
    ) -> InferBboxResult<Self> {
        let prediction = detector.prediction(delta_bbox, class_scores, conf_scores)?;
        Ok(Self {
            detector,
            prediction,
            detections: Vec::new(),
        })
    }

    /// Recomputes `detections`, keeping survivors with probability `>= thresh`.
    pub fn filter(&mut self, thresh: f64) {
        self.detections = self.detector.detect(&self.prediction, thresh);
    }

    /// Runs `filter` with the configured `intersection_thresh`.
    pub fn filter_default(&mut self) {
        self.filter(self.detector.config().intersection_thresh);
    }

    /// Returns the detections of the most recent `filter` call.
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Returns the underlying detector.
    pub fn detector(&self) -> &Detector {
        &self.detector
    }
}

#[cfg(test)]
mod tests {
    use super::{Detection, Detector, DetectorConfig, InferBbox};
    use crate::anchor::AnchorShape;

    fn tiny_config() -> DetectorConfig {
        DetectorConfig {
            image_width: 100,
            image_height: 100,
            grid_width: 1,
            grid_height: 1,
            anchor_shapes: vec![AnchorShape::new(20.0, 40.0)],
            labels: vec!["thing".to_string()],
            n_top_detections: 4,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn pixel_rect_truncates() {
        let det = Detection {
            xmin: 1.9,
            xmax: 10.5,
            ymin: 0.2,
            ymax: 7.99,
            class_idx: 0,
            label_name: "a".into(),
            class_prob: 0.9,
        };
        assert_eq!(det.pixel_rect(), [1, 0, 10, 7]);
    }

    #[test]
    fn filter_replaces_previous_detections() {
        let delta = [0.0f32; 4];
        let class_scores = [1.0f32];
        let conf = [0.85f32];
        let mut infer = InferBbox::with_config(tiny_config(), &delta, &class_scores, &conf)
            .unwrap();

        infer.filter(0.5);
        assert_eq!(infer.detections().len(), 1);
        infer.filter(0.5);
        assert_eq!(infer.detections().len(), 1);
        infer.filter(0.9);
        assert!(infer.detections().is_empty());
        infer.filter_default();
        assert_eq!(infer.detections().len(), 1);
    }

    #[test]
    fn suppress_exposes_survivors_below_threshold() {
        let detector = Detector::new(tiny_config()).unwrap();
        let delta = [0.0f32; 4];
        let class_scores = [1.0f32];
        let conf = [0.79f32];
        let pred = detector.prediction(&delta, &class_scores, &conf).unwrap();

        let groups = detector.suppress(&pred);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].survivors().count(), 1);
        assert!(detector.detect(&pred, 0.8).is_empty());
    }
}
