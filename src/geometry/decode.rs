//! Anchor-relative offset decoding.

use crate::anchor::{Anchor, AnchorGrid};
use crate::geometry::BBox;
use crate::prediction::{Delta, RawPrediction};

/// Decodes one anchor's offsets into a corner-form pixel box.
///
/// Uses the single-shot detector parameterization: centers shift by the
/// offset scaled with the anchor size, sizes scale by `exp` of the log offset.
/// Malformed offsets are not rejected here; clamping is the backstop.
pub fn decode_box(anchor: &Anchor, delta: Delta) -> BBox {
    let center_x = anchor.center_x + delta.dx * anchor.width;
    let center_y = anchor.center_y + delta.dy * anchor.height;
    let width = anchor.width * delta.dw.exp();
    let height = anchor.height * delta.dh.exp();
    BBox::from_center(center_x, center_y, width, height)
}

/// Decodes every anchor of `prediction` against `grid`.
pub fn decode_boxes(grid: &AnchorGrid, prediction: &RawPrediction<'_>) -> Vec<BBox> {
    grid.as_slice()
        .iter()
        .zip(prediction.deltas())
        .map(|(anchor, delta)| decode_box(anchor, delta))
        .collect()
}

/// Clamps boxes in place so they lie within the image.
pub fn clamp_boxes(boxes: &mut [BBox], image_width: usize, image_height: usize) {
    for bbox in boxes.iter_mut() {
        *bbox = bbox.clamp_to_image(image_width, image_height);
    }
}
