// THEORY:
// The `Segmenter` is the first stage of the goal finder. Retro-reflective tape lit
// by a ring light comes back to the camera far brighter than anything around it,
// so a plain per-channel color band is enough to isolate it.
//
// Key architectural principles:
// 1.  **Speckle Suppression**: A small median filter runs before classification.
//     Sensor noise produces isolated bright pixels that would otherwise become
//     tiny outlines and waste the selector's time.
// 2.  **Color Band, Not Intensity**: A pixel is foreground only when *each* of its
//     three channels lies inside that channel's own inclusive band. This is not a
//     grayscale threshold.
// 3.  **Pure Transform**: The input frame is never touched; the output is a fresh
//     single-channel `Mask` of the same dimensions holding only 0 or 255.

use crate::config::SegmenterConfig;
use crate::core_modules::{Frame, Mask};
use image::Luma;
use imageproc::filter::median_filter;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Stateless color-band thresholder.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Converts a color frame into a binary mask of reflective regions.
    pub fn segment(&self, frame: &Frame) -> Mask {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Mask::new(width, height);
        }

        let smoothed = if self.config.median_radius > 0 {
            median_filter(frame, self.config.median_radius, self.config.median_radius)
        } else {
            frame.clone()
        };

        let SegmenterConfig { red, green, blue, .. } = self.config;
        Mask::from_fn(width, height, |x, y| {
            let [r, g, b] = smoothed.get_pixel(x, y).0;
            if red.contains(r) && green.contains(g) && blue.contains(b) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelBand;
    use image::Rgb;

    fn frame_with_square(size: u32, x0: u32, y0: u32, side: u32, color: [u8; 3]) -> Frame {
        let mut frame = Frame::from_pixel(size, size, Rgb([5, 5, 5]));
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                frame.put_pixel(x, y, Rgb(color));
            }
        }
        frame
    }

    #[test]
    fn bright_square_becomes_foreground() {
        let frame = frame_with_square(20, 5, 5, 8, [200, 220, 210]);
        let mask = Segmenter::new(SegmenterConfig::default()).segment(&frame);

        assert_eq!(mask.dimensions(), frame.dimensions());
        assert_eq!(mask.get_pixel(8, 8).0[0], FOREGROUND);
        assert_eq!(mask.get_pixel(0, 0).0[0], BACKGROUND);
        assert!(mask.pixels().all(|p| p.0[0] == FOREGROUND || p.0[0] == BACKGROUND));
    }

    #[test]
    fn isolated_speckle_is_removed_by_the_median_pass() {
        let mut frame = Frame::from_pixel(11, 11, Rgb([0, 0, 0]));
        frame.put_pixel(5, 5, Rgb([255, 255, 255]));
        let mask = Segmenter::new(SegmenterConfig::default()).segment(&frame);
        assert!(mask.pixels().all(|p| p.0[0] == BACKGROUND));
    }

    #[test]
    fn every_channel_must_be_inside_its_band() {
        let config = SegmenterConfig {
            green: ChannelBand::new(150, 255),
            median_radius: 0,
            ..SegmenterConfig::default()
        };
        // Bright red: red and blue pass, green fails.
        let frame = frame_with_square(10, 0, 0, 10, [250, 30, 40]);
        let mask = Segmenter::new(config.clone()).segment(&frame);
        assert!(mask.pixels().all(|p| p.0[0] == BACKGROUND));

        let frame = frame_with_square(10, 0, 0, 10, [250, 150, 40]);
        let mask = Segmenter::new(config).segment(&frame);
        assert!(mask.pixels().all(|p| p.0[0] == FOREGROUND));
    }

    #[test]
    fn source_frame_is_left_untouched() {
        let frame = frame_with_square(12, 2, 2, 6, [230, 230, 230]);
        let before = frame.clone();
        let _ = Segmenter::new(SegmenterConfig::default()).segment(&frame);
        assert_eq!(frame, before);
    }

    #[test]
    fn empty_frame_yields_empty_mask() {
        let mask = Segmenter::new(SegmenterConfig::default()).segment(&Frame::new(0, 0));
        assert_eq!(mask.dimensions(), (0, 0));
    }
}
