// THEORY:
// Debug output for tuning at the field. Each stage's result can be written as a
// PNG (or drawn over a copy of the frame) so a human can see where a threshold or
// area window went wrong. Nothing here is on the detection path.

use crate::core_modules::geometry::OrderedCorners;
use crate::core_modules::outline::{Outline, RotatedRect};
use crate::core_modules::{Frame, Mask};
use image::{ExtendedColorType, ImageEncoder, ImageError, Rgb};
use imageproc::drawing::draw_line_segment_mut;
use std::path::Path;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const HULL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Encodes a raw, tightly packed buffer as a PNG file.
pub fn save(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    buffer: &[u8],
    color: ExtendedColorType,
) -> Result<(), ImageError> {
    let output = std::fs::File::create(path)?;
    let encoder = image::codecs::png::PngEncoder::new(output);

    encoder.write_image(buffer, width, height, color)?;

    Ok(())
}

pub fn save_frame(path: impl AsRef<Path>, frame: &Frame) -> Result<(), ImageError> {
    save(path, frame.width(), frame.height(), frame.as_raw(), ExtendedColorType::Rgb8)
}

pub fn save_mask(path: impl AsRef<Path>, mask: &Mask) -> Result<(), ImageError> {
    save(path, mask.width(), mask.height(), mask.as_raw(), ExtendedColorType::L8)
}

/// Draws a closed polygon through `points` onto the frame.
pub fn draw_closed_polygon(frame: &mut Frame, points: &[(f32, f32)], color: Rgb<u8>) {
    if points.is_empty() {
        return;
    }
    for (i, &start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line_segment_mut(frame, start, end, color);
    }
}

/// Copy of the frame with every candidate outline traced on it.
pub fn render_outlines(frame: &Frame, outlines: &[Outline]) -> Frame {
    let mut canvas = frame.clone();
    for outline in outlines {
        let points: Vec<(f32, f32)> =
            outline.points().iter().map(|p| (p.x as f32, p.y as f32)).collect();
        draw_closed_polygon(&mut canvas, &points, OUTLINE_COLOR);
    }
    canvas
}

/// Copy of the frame with the winner's rotated bounding box drawn on it.
pub fn render_rotated_rect(frame: &Frame, rect: &RotatedRect) -> Frame {
    let mut canvas = frame.clone();
    let points = rect.corners.map(|p| (p.x as f32, p.y as f32));
    draw_closed_polygon(&mut canvas, &points, BOX_COLOR);
    canvas
}

/// Copy of the frame with the four resolved corners joined in canonical order.
pub fn render_corners(frame: &Frame, corners: &OrderedCorners) -> Frame {
    let mut canvas = frame.clone();
    let points = corners.to_array().map(|p| (p.x as f32, p.y as f32));
    draw_closed_polygon(&mut canvas, &points, HULL_COLOR);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::point::Point;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("goal_vision_{}_{}", std::process::id(), name))
    }

    #[test]
    fn saved_frame_reads_back() {
        let mut frame = Frame::from_pixel(24, 16, Rgb([10, 20, 30]));
        frame.put_pixel(23, 15, Rgb([200, 100, 50]));
        let path = temp_path("frame.png");

        save_frame(&path, &frame).expect("Error Saving File.");

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (24, 16));
        assert_eq!(loaded.get_pixel(23, 15).0, [200, 100, 50]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn saved_mask_is_single_channel() {
        let mut mask = Mask::new(10, 30);
        mask.put_pixel(3, 20, image::Luma([255]));
        let path = temp_path("mask.png");

        save_mask(&path, &mask).expect("Error Saving File.");

        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.color(), image::ColorType::L8);
        assert_eq!(loaded.to_luma8().get_pixel(3, 20).0, [255]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn outline_render_marks_the_boundary_only() {
        let frame = Frame::new(20, 20);
        let outline = Outline::from(vec![[2, 2], [2, 12], [12, 12], [12, 2]]);
        let canvas = render_outlines(&frame, &[outline]);
        assert_eq!(*canvas.get_pixel(2, 7), OUTLINE_COLOR);
        assert_eq!(*canvas.get_pixel(7, 7), Rgb([0, 0, 0]));
        // The source frame is left untouched.
        assert_eq!(*frame.get_pixel(2, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn corner_render_joins_the_quad() {
        let frame = Frame::new(20, 20);
        let ordered = OrderedCorners {
            top_left: Point::new(1.0, 1.0),
            top_right: Point::new(15.0, 1.0),
            bottom_right: Point::new(15.0, 10.0),
            bottom_left: Point::new(1.0, 10.0),
        };
        let canvas = render_corners(&frame, &ordered);
        assert_eq!(*canvas.get_pixel(8, 1), HULL_COLOR);
        assert_eq!(*canvas.get_pixel(8, 10), HULL_COLOR);
    }
}
