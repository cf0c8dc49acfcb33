//! InferBbox turns raw anchor-based detector outputs into labeled boxes.
//!
//! The pipeline decodes per-anchor offsets against a fixed anchor grid,
//! clamps boxes to the image, scores each anchor by class probability times
//! objectness, keeps the top-N anchors, and runs per-class non-maximal
//! suppression. Per-class suppression can run on `rayon` behind the `rayon`
//! feature.

pub mod anchor;
mod candidate;
pub mod detect;
pub mod geometry;
#[cfg(feature = "image-io")]
pub mod io;
pub mod lowlevel;
pub mod prediction;
pub mod score;
mod trace;
pub mod util;

pub use anchor::{Anchor, AnchorGrid, AnchorShape};
pub use detect::{Detection, Detector, DetectorConfig, InferBbox, DEFAULT_THRESH};
pub use geometry::BBox;
pub use prediction::RawPrediction;
pub use util::{InferBboxError, InferBboxResult};

pub use candidate::nms::non_maximal_suppression;
pub use candidate::topk::ScoredCandidate;
