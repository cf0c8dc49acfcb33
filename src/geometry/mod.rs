//! Axis-aligned boxes in pixel space and the overlap metric used by NMS.
//!
//! Boxes are stored in corner form `[xmin, ymin, xmax, ymax]` with `f64`
//! coordinates so the exponential size term of the decoder does not lose
//! precision before ranking and suppression.

use crate::util::math::clamp_unit_range;

pub mod decode;

/// Corner-form bounding box in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    /// Left edge.
    pub xmin: f64,
    /// Top edge.
    pub ymin: f64,
    /// Right edge.
    pub xmax: f64,
    /// Bottom edge.
    pub ymax: f64,
}

impl BBox {
    /// Creates a box from its corners.
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Creates a box from a center point and a size.
    pub fn from_center(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self {
            xmin: center_x - half_w,
            ymin: center_y - half_h,
            xmax: center_x + half_w,
            ymax: center_y + half_h,
        }
    }

    /// Returns the box width, zero for inverted boxes.
    pub fn width(&self) -> f64 {
        (self.xmax - self.xmin).max(0.0)
    }

    /// Returns the box height, zero for inverted boxes.
    pub fn height(&self) -> f64 {
        (self.ymax - self.ymin).max(0.0)
    }

    /// Returns the box area.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns the overlap area with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let overlap_w = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let overlap_h = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        overlap_w * overlap_h
    }

    /// Intersection over union with `other`.
    ///
    /// `epsilon` is added to the union so degenerate boxes yield zero instead
    /// of NaN. The result is symmetric in its two arguments.
    pub fn iou(&self, other: &BBox, epsilon: f64) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        inter / (union + epsilon)
    }

    /// Clamps every edge into `[0, image_width - 1] x [0, image_height - 1]`.
    ///
    /// NaN edges collapse to zero, and the result always satisfies
    /// `xmin <= xmax` and `ymin <= ymax`.
    pub fn clamp_to_image(&self, image_width: usize, image_height: usize) -> BBox {
        let max_x = image_width.saturating_sub(1) as f64;
        let max_y = image_height.saturating_sub(1) as f64;
        let x0 = clamp_unit_range(self.xmin, max_x);
        let x1 = clamp_unit_range(self.xmax, max_x);
        let y0 = clamp_unit_range(self.ymin, max_y);
        let y1 = clamp_unit_range(self.ymax, max_y);
        BBox {
            xmin: x0.min(x1),
            ymin: y0.min(y1),
            xmax: x0.max(x1),
            ymax: y0.max(y1),
        }
    }
}
