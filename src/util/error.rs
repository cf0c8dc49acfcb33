//! Error types for infer-bbox.

use thiserror::Error;

/// Result alias for infer-bbox operations.
pub type InferBboxResult<T> = std::result::Result<T, InferBboxError>;

/// Errors raised while validating detector geometry or model outputs.
///
/// Every check runs before any numeric work starts; the decode, score,
/// ranking, and suppression stages themselves never fail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InferBboxError {
    /// Image or grid dimensions are zero.
    #[error("invalid {context} dimensions: {width}x{height}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        context: &'static str,
    },
    /// An anchor shape is zero, negative, or not finite.
    #[error("invalid anchor shape at index {index}")]
    InvalidAnchorShape { index: usize },
    /// The anchor shape table is empty.
    #[error("anchor shape table is empty")]
    EmptyAnchorShapes,
    /// The class label table is empty.
    #[error("class label table is empty")]
    EmptyLabelTable,
    /// A scalar configuration parameter is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// A raw prediction tensor does not match the detector geometry.
    #[error("{tensor} tensor has {got} values, expected {expected}")]
    TensorSizeMismatch {
        tensor: &'static str,
        expected: usize,
        got: usize,
    },
    /// Image decoding or encoding failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
}
