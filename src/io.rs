//! Image helpers built on the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::detect::Detection;
use crate::util::{InferBboxError, InferBboxResult};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Outline color used by `save_annotated`.
pub const DEFAULT_BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

fn io_err(err: image::ImageError) -> InferBboxError {
    InferBboxError::ImageIo {
        reason: err.to_string(),
    }
}

/// Reads `(width, height)` of an image file without decoding its pixels.
pub fn load_image_size<P: AsRef<Path>>(path: P) -> InferBboxResult<(usize, usize)> {
    let (width, height) = image::image_dimensions(path).map_err(io_err)?;
    Ok((width as usize, height as usize))
}

/// Draws one-pixel outlines of `detections` onto `img`.
///
/// Boxes are truncated to integer pixels and cropped to the image.
pub fn draw_detections(img: &mut RgbImage, detections: &[Detection], color: Rgb<u8>) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    for det in detections {
        let [x0, y0, x1, y1] = det.pixel_rect().map(i64::from);
        let (x0, x1) = (x0.clamp(0, max_x) as u32, x1.clamp(0, max_x) as u32);
        let (y0, y1) = (y0.clamp(0, max_y) as u32, y1.clamp(0, max_y) as u32);
        for x in x0..=x1 {
            img.put_pixel(x, y0, color);
            img.put_pixel(x, y1, color);
        }
        for y in y0..=y1 {
            img.put_pixel(x0, y, color);
            img.put_pixel(x1, y, color);
        }
    }
}

/// Loads `input`, draws `detections` on it, and writes the result to `output`.
pub fn save_annotated<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    detections: &[Detection],
) -> InferBboxResult<()> {
    let mut img = image::open(input).map_err(io_err)?.to_rgb8();
    draw_detections(&mut img, detections, DEFAULT_BOX_COLOR);
    img.save(output).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::{draw_detections, DEFAULT_BOX_COLOR};
    use crate::detect::Detection;
    use image::{Rgb, RgbImage};

    #[test]
    fn outlines_are_drawn_and_cropped() {
        let mut img = RgbImage::new(10, 10);
        let det = Detection {
            xmin: 2.0,
            xmax: 5.0,
            ymin: 3.0,
            ymax: 20.0,
            class_idx: 0,
            label_name: "a".into(),
            class_prob: 1.0,
        };
        draw_detections(&mut img, &[det], DEFAULT_BOX_COLOR);

        assert_eq!(*img.get_pixel(2, 3), DEFAULT_BOX_COLOR);
        assert_eq!(*img.get_pixel(5, 9), DEFAULT_BOX_COLOR);
        assert_eq!(*img.get_pixel(3, 5), Rgb([0, 0, 0]));
    }
}
