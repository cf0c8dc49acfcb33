//! Python bindings for the infer-bbox detection post-processor.
//!
//! Exposes the detector configuration, the `InferBbox` filter, and its
//! detections to Python via PyO3, taking model outputs as numpy arrays.

use numpy::PyReadonlyArrayDyn;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use infer_bbox::{
    AnchorShape, Detection as RustDetection, Detector as RustDetector,
    DetectorConfig as RustDetectorConfig, InferBboxError,
};

/// Convert an InferBboxError to a Python exception.
fn to_py_err(err: InferBboxError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Copies a C-contiguous float32 array of any shape into a flat vector.
fn flatten(array: &PyReadonlyArrayDyn<'_, f32>) -> PyResult<Vec<f32>> {
    Ok(array.as_slice()?.to_vec())
}

/// A labeled detection in pixel coordinates.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    #[pyo3(get)]
    pub xmin: f64,
    #[pyo3(get)]
    pub xmax: f64,
    #[pyo3(get)]
    pub ymin: f64,
    #[pyo3(get)]
    pub ymax: f64,
    #[pyo3(get)]
    pub class_idx: usize,
    #[pyo3(get)]
    pub label_name: String,
    /// Joint class/objectness probability.
    #[pyo3(get)]
    pub class_prob: f64,
}

#[pymethods]
impl Detection {
    /// Integer pixel bounds (xmin, ymin, xmax, ymax).
    fn pixel_rect(&self) -> (i32, i32, i32, i32) {
        (
            self.xmin as i32,
            self.ymin as i32,
            self.xmax as i32,
            self.ymax as i32,
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "Detection(label='{}', prob={:.4}, box=({:.1}, {:.1}, {:.1}, {:.1}))",
            self.label_name, self.class_prob, self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

impl From<&RustDetection> for Detection {
    fn from(d: &RustDetection) -> Self {
        Self {
            xmin: d.xmin,
            xmax: d.xmax,
            ymin: d.ymin,
            ymax: d.ymax,
            class_idx: d.class_idx,
            label_name: d.label_name.clone(),
            class_prob: d.class_prob,
        }
    }
}

/// Fixed detector geometry and filtering knobs.
#[pyclass]
#[derive(Clone)]
pub struct DetectorConfig {
    inner: RustDetectorConfig,
}

#[pymethods]
impl DetectorConfig {
    /// Create a new DetectorConfig.
    ///
    /// Args:
    ///     image_width: Input width in pixels (default: 416)
    ///     image_height: Input height in pixels (default: 416)
    ///     grid_width: Grid columns (default: 23)
    ///     grid_height: Grid rows (default: 23)
    ///     anchor_shapes: List of (width, height) anchors (default: 9 k-means shapes)
    ///     labels: Class names (default: 20 PASCAL VOC classes)
    ///     intersection_thresh: Default detection floor (default: 0.8)
    ///     nms_intersection_thresh: IOU suppression floor (default: 0.1)
    ///     n_top_detections: Candidate pool size before NMS (default: 64)
    ///     epsilon: IOU denominator guard (default: 1e-7)
    ///     parallel: Run per-class NMS in parallel (default: False)
    #[new]
    #[pyo3(signature = (
        image_width = 416,
        image_height = 416,
        grid_width = 23,
        grid_height = 23,
        anchor_shapes = None,
        labels = None,
        intersection_thresh = 0.8,
        nms_intersection_thresh = 0.1,
        n_top_detections = 64,
        epsilon = 1e-7,
        parallel = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        image_width: usize,
        image_height: usize,
        grid_width: usize,
        grid_height: usize,
        anchor_shapes: Option<Vec<(f64, f64)>>,
        labels: Option<Vec<String>>,
        intersection_thresh: f64,
        nms_intersection_thresh: f64,
        n_top_detections: usize,
        epsilon: f64,
        parallel: bool,
    ) -> PyResult<Self> {
        let defaults = RustDetectorConfig::default();
        let inner = RustDetectorConfig {
            image_width,
            image_height,
            grid_width,
            grid_height,
            anchor_shapes: anchor_shapes
                .map(|shapes| {
                    shapes
                        .into_iter()
                        .map(|(w, h)| AnchorShape::new(w, h))
                        .collect()
                })
                .unwrap_or(defaults.anchor_shapes),
            labels: labels.unwrap_or(defaults.labels),
            intersection_thresh,
            nms_intersection_thresh,
            n_top_detections,
            epsilon,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Total anchor count W * H * anchors_per_grid.
    #[getter]
    fn anchors(&self) -> usize {
        self.inner.anchors()
    }

    /// Number of classes.
    #[getter]
    fn num_classes(&self) -> usize {
        self.inner.num_classes()
    }

    fn __repr__(&self) -> String {
        format!(
            "DetectorConfig(image={}x{}, grid={}x{}, anchors_per_grid={}, num_classes={}, n_top_detections={})",
            self.inner.image_width,
            self.inner.image_height,
            self.inner.grid_width,
            self.inner.grid_height,
            self.inner.anchors_per_grid(),
            self.inner.num_classes(),
            self.inner.n_top_detections
        )
    }
}

/// Post-processor for one image's raw model outputs.
///
/// The arrays are copied on construction, so they may be any C-contiguous
/// float32 shape whose flattened, anchor-major size matches the geometry.
#[pyclass]
pub struct InferBbox {
    detector: RustDetector,
    delta_bbox: Vec<f32>,
    class_scores: Vec<f32>,
    conf_scores: Vec<f32>,
    detections: Vec<RustDetection>,
}

#[pymethods]
impl InferBbox {
    /// Create a post-processor.
    ///
    /// Args:
    ///     delta_bbox: float32 array with 4 offsets per anchor
    ///     class_scores: float32 array with num_classes scores per anchor
    ///     conf_scores: float32 array with one confidence per anchor
    ///     config: DetectorConfig (default: DetectorConfig())
    #[new]
    #[pyo3(signature = (delta_bbox, class_scores, conf_scores, config = None))]
    fn new(
        delta_bbox: PyReadonlyArrayDyn<'_, f32>,
        class_scores: PyReadonlyArrayDyn<'_, f32>,
        conf_scores: PyReadonlyArrayDyn<'_, f32>,
        config: Option<DetectorConfig>,
    ) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let detector = RustDetector::new(cfg).map_err(to_py_err)?;
        let delta_bbox = flatten(&delta_bbox)?;
        let class_scores = flatten(&class_scores)?;
        let conf_scores = flatten(&conf_scores)?;
        detector
            .prediction(&delta_bbox, &class_scores, &conf_scores)
            .map_err(to_py_err)?;

        Ok(Self {
            detector,
            delta_bbox,
            class_scores,
            conf_scores,
            detections: Vec::new(),
        })
    }

    /// Recompute detections, keeping survivors with probability >= thresh.
    #[pyo3(signature = (thresh = 0.8))]
    fn filter(&mut self, thresh: f64) -> PyResult<()> {
        let prediction = self
            .detector
            .prediction(&self.delta_bbox, &self.class_scores, &self.conf_scores)
            .map_err(to_py_err)?;
        self.detections = self.detector.detect(&prediction, thresh);
        Ok(())
    }

    /// Detections of the most recent filter call.
    #[getter]
    fn detections(&self) -> Vec<Detection> {
        self.detections.iter().map(Detection::from).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "InferBbox(anchors={}, detections={})",
            self.conf_scores.len(),
            self.detections.len()
        )
    }
}

/// Python module for infer-bbox.
#[pymodule]
fn _infer_bbox(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<DetectorConfig>()?;
    m.add_class::<InferBbox>()?;
    m.add("DEFAULT_THRESH", infer_bbox::DEFAULT_THRESH)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
