//! Default anchor shape table.

use crate::anchor::AnchorShape;

/// Nine anchor shapes obtained by k-means clustering of training boxes,
/// expressed as `(width, height)` in pixels of a 416x416 input.
pub const DEFAULT_ANCHOR_SHAPES: [AnchorShape; 9] = [
    AnchorShape::new(377.0, 371.0),
    AnchorShape::new(64.0, 118.0),
    AnchorShape::new(129.0, 326.0),
    AnchorShape::new(172.0, 126.0),
    AnchorShape::new(34.0, 46.0),
    AnchorShape::new(353.0, 204.0),
    AnchorShape::new(89.0, 214.0),
    AnchorShape::new(249.0, 361.0),
    AnchorShape::new(209.0, 239.0),
];
