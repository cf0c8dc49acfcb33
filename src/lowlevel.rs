//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the individual stages behind `Detector::detect`. Most users
//! should prefer `InferBbox` or `Detector`.

pub use crate::candidate::nms::{nms_per_class, non_maximal_suppression, ClassGroup, NmsParams};
pub use crate::candidate::topk::{select_top_n, ScoredCandidate};
pub use crate::geometry::decode::{clamp_boxes, decode_box, decode_boxes};
pub use crate::prediction::Delta;
pub use crate::score::ProbabilityTable;
