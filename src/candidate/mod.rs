//! Candidate ranking and pruning.
//!
//! Includes class-agnostic top-N selection and per-class non-maximal
//! suppression over IOU.

pub(crate) mod nms;
pub(crate) mod topk;
