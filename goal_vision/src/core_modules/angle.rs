// THEORY:
// The last stage converts the goal's top-center pixel into the angle pair the
// aiming logic consumes. The camera is treated as a linear pinhole: every pixel
// spans the same angle, which is the field of view divided by the frame size
// along that axis. Lens distortion is ignored.
//
// Sign convention: image x grows to the right and image y grows downward, so the
// vertical offset is flipped to make "above center" positive.

use crate::config::CameraConfig;
use crate::error::{Result, VisionError};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Angular offset of the goal from the optical axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleResult {
    /// Positive to the right of center.
    pub horizontal_degrees: f64,
    /// Positive above center.
    pub vertical_degrees: f64,
}

pub fn angles(
    point: Point<f64>,
    frame_height: u32,
    frame_width: u32,
    camera: &CameraConfig,
) -> Result<AngleResult> {
    if frame_width == 0 || frame_height == 0 {
        return Err(VisionError::InvalidFrame(format!(
            "cannot compute angles for a {frame_width}x{frame_height} frame"
        )));
    }

    let width = frame_width as f64;
    let height = frame_height as f64;
    let horizontal_per_pixel = camera.horizontal_fov_deg / width;
    let vertical_per_pixel = camera.vertical_fov_deg / height;

    Ok(AngleResult {
        horizontal_degrees: (point.x - width / 2.0) * horizontal_per_pixel,
        vertical_degrees: (height / 2.0 - point.y) * vertical_per_pixel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> CameraConfig {
        CameraConfig::default()
    }

    #[test]
    fn image_center_is_on_axis() {
        let result = angles(Point::new(320.0, 240.0), 480, 640, &camera()).unwrap();
        assert_relative_eq!(result.horizontal_degrees, 0.0);
        assert_relative_eq!(result.vertical_degrees, 0.0);
    }

    #[test]
    fn left_edge_is_minus_half_horizontal_fov() {
        let result = angles(Point::new(0.0, 240.0), 480, 640, &camera()).unwrap();
        assert_relative_eq!(result.horizontal_degrees, -28.5, epsilon = 1e-9);
        assert_relative_eq!(result.vertical_degrees, 0.0);
    }

    #[test]
    fn top_edge_is_plus_half_vertical_fov() {
        let result = angles(Point::new(320.0, 0.0), 480, 640, &camera()).unwrap();
        assert_relative_eq!(result.horizontal_degrees, 0.0);
        assert_relative_eq!(result.vertical_degrees, 21.5, epsilon = 1e-9);
    }

    #[test]
    fn goal_above_center() {
        // (240 - 100) * 43 / 480
        let result = angles(Point::new(320.0, 100.0), 480, 640, &camera()).unwrap();
        assert_relative_eq!(result.horizontal_degrees, 0.0);
        assert_relative_eq!(result.vertical_degrees, 12.541666666666666, epsilon = 1e-9);
    }

    #[test]
    fn right_and_below_are_positive_and_negative() {
        let result = angles(Point::new(480.0, 360.0), 480, 640, &camera()).unwrap();
        assert!(result.horizontal_degrees > 0.0);
        assert!(result.vertical_degrees < 0.0);
    }

    #[test]
    fn zero_sized_frame_is_rejected() {
        let err = angles(Point::new(0.0, 0.0), 0, 640, &camera()).unwrap_err();
        assert!(matches!(err, VisionError::InvalidFrame(_)));
    }
}
