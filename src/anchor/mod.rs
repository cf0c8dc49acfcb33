//! Anchor grid geometry.
//!
//! An `AnchorGrid` places `anchors_per_grid` reference boxes at the center of
//! every cell of a `W x H` grid laid over the input image. Anchors are stored
//! in the same anchor-major order as the model outputs:
//! `anchor = (h * W + w) * anchors_per_grid + k`.

use crate::geometry::BBox;
use crate::util::{InferBboxError, InferBboxResult};

pub mod shapes;

/// Canonical anchor size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorShape {
    /// Anchor width.
    pub width: f64,
    /// Anchor height.
    pub height: f64,
}

impl AnchorShape {
    /// Creates a shape from a width and a height.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Anchor box in center form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    /// Center x coordinate.
    pub center_x: f64,
    /// Center y coordinate.
    pub center_y: f64,
    /// Anchor width.
    pub width: f64,
    /// Anchor height.
    pub height: f64,
}

impl Anchor {
    /// Returns the anchor as a corner-form box.
    pub fn to_bbox(&self) -> BBox {
        BBox::from_center(self.center_x, self.center_y, self.width, self.height)
    }
}

/// Immutable table of anchors for one image geometry.
#[derive(Clone, Debug)]
pub struct AnchorGrid {
    grid_width: usize,
    grid_height: usize,
    anchors_per_grid: usize,
    anchors: Vec<Anchor>,
}

/// Returns `grid_width * grid_height * anchors_per_grid`, or `None` on overflow.
pub(crate) fn anchor_count(
    grid_width: usize,
    grid_height: usize,
    anchors_per_grid: usize,
) -> Option<usize> {
    grid_width
        .checked_mul(grid_height)?
        .checked_mul(anchors_per_grid)
}

impl AnchorGrid {
    /// Builds the anchor table for an image and grid geometry.
    ///
    /// Cell centers are spaced evenly, excluding the image borders:
    /// `cx = (w + 1) * image_width / (W + 1)` and likewise for `cy`.
    pub fn new(
        image_width: usize,
        image_height: usize,
        grid_width: usize,
        grid_height: usize,
        shapes: &[AnchorShape],
    ) -> InferBboxResult<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(InferBboxError::InvalidDimensions {
                width: image_width,
                height: image_height,
                context: "image",
            });
        }
        if grid_width == 0 || grid_height == 0 {
            return Err(InferBboxError::InvalidDimensions {
                width: grid_width,
                height: grid_height,
                context: "grid",
            });
        }
        if shapes.is_empty() {
            return Err(InferBboxError::EmptyAnchorShapes);
        }
        if let Some(index) = shapes.iter().position(|s| !s.is_valid()) {
            return Err(InferBboxError::InvalidAnchorShape { index });
        }

        let count = anchor_count(grid_width, grid_height, shapes.len()).ok_or(
            InferBboxError::InvalidConfig {
                reason: "anchor count overflows usize",
            },
        )?;

        let step_x = image_width as f64 / (grid_width as f64 + 1.0);
        let step_y = image_height as f64 / (grid_height as f64 + 1.0);
        let mut anchors = Vec::with_capacity(count);
        for h in 0..grid_height {
            let center_y = (h + 1) as f64 * step_y;
            for w in 0..grid_width {
                let center_x = (w + 1) as f64 * step_x;
                anchors.extend(shapes.iter().map(|shape| Anchor {
                    center_x,
                    center_y,
                    width: shape.width,
                    height: shape.height,
                }));
            }
        }

        Ok(Self {
            grid_width,
            grid_height,
            anchors_per_grid: shapes.len(),
            anchors,
        })
    }

    /// Returns the grid width `W` in cells.
    pub fn grid_width(&self) -> usize {
        self.grid_width
    }

    /// Returns the grid height `H` in cells.
    pub fn grid_height(&self) -> usize {
        self.grid_height
    }

    /// Returns the number of anchors per cell.
    pub fn anchors_per_grid(&self) -> usize {
        self.anchors_per_grid
    }

    /// Returns the total anchor count, `W * H * anchors_per_grid`.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns true when the grid holds no anchors.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Returns the anchor at `index`.
    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    /// Returns the flat anchor index for cell `(w, h)` and shape `k`.
    pub fn index_of(&self, w: usize, h: usize, k: usize) -> Option<usize> {
        if w >= self.grid_width || h >= self.grid_height || k >= self.anchors_per_grid {
            return None;
        }
        Some((h * self.grid_width + w) * self.anchors_per_grid + k)
    }

    /// Returns all anchors in anchor-major order.
    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }
}

#[cfg(test)]
mod tests {
    use super::shapes::DEFAULT_ANCHOR_SHAPES;
    use super::{AnchorGrid, AnchorShape};
    use crate::util::InferBboxError;

    #[test]
    fn default_geometry_has_expected_anchor_count() {
        let grid = AnchorGrid::new(416, 416, 23, 23, &DEFAULT_ANCHOR_SHAPES).unwrap();
        assert_eq!(grid.len(), 23 * 23 * 9);
        assert_eq!(grid.anchors_per_grid(), 9);
    }

    #[test]
    fn centers_follow_cell_layout() {
        let shapes = [AnchorShape::new(10.0, 20.0), AnchorShape::new(30.0, 40.0)];
        let grid = AnchorGrid::new(90, 60, 2, 1, &shapes).unwrap();
        assert_eq!(grid.len(), 4);

        let idx = grid.index_of(1, 0, 1).unwrap();
        assert_eq!(idx, 3);
        let anchor = grid.get(idx).unwrap();
        assert!((anchor.center_x - 60.0).abs() < 1e-12);
        assert!((anchor.center_y - 30.0).abs() < 1e-12);
        assert_eq!(anchor.width, 30.0);
        assert_eq!(anchor.height, 40.0);

        let first = grid.get(0).unwrap();
        assert!((first.center_x - 30.0).abs() < 1e-12);
        assert_eq!(first.width, 10.0);
        assert!(grid.index_of(2, 0, 0).is_none());
    }

    #[test]
    fn rejects_bad_geometry() {
        let shapes = [AnchorShape::new(1.0, 1.0)];
        let err = AnchorGrid::new(0, 10, 1, 1, &shapes).unwrap_err();
        assert_eq!(
            err,
            InferBboxError::InvalidDimensions {
                width: 0,
                height: 10,
                context: "image",
            }
        );
        let err = AnchorGrid::new(10, 10, 1, 0, &shapes).unwrap_err();
        assert!(matches!(err, InferBboxError::InvalidDimensions { context: "grid", .. }));
        let err = AnchorGrid::new(10, 10, 1, 1, &[]).unwrap_err();
        assert_eq!(err, InferBboxError::EmptyAnchorShapes);
        let err = AnchorGrid::new(10, 10, 1, 1, &[shapes[0], AnchorShape::new(-1.0, 2.0)])
            .unwrap_err();
        assert_eq!(err, InferBboxError::InvalidAnchorShape { index: 1 });
        let err = AnchorGrid::new(10, 10, usize::MAX, 2, &shapes).unwrap_err();
        assert_eq!(
            err,
            InferBboxError::InvalidConfig {
                reason: "anchor count overflows usize",
            }
        );
    }
}
