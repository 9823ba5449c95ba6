// THEORY:
// The tuning knobs of the goal finder live here. On the robot they were constants
// baked into the vision script; here they are a typed, validated structure that
// can be read from a TOML file so a team can retune the color bands or the area
// window at an event without rebuilding. Every field has the field-tested default,
// so an empty file (or no file) yields a working configuration.

use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An inclusive `[min, max]` range for one color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBand {
    pub min: u8,
    pub max: u8,
}

impl ChannelBand {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ChannelBand {
    fn default() -> Self {
        Self::new(20, 255)
    }
}

/// Settings for the color-band thresholding stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub red: ChannelBand,
    pub green: ChannelBand,
    pub blue: ChannelBand,
    /// Radius of the square median window. A radius of 1 is a 3x3 window.
    pub median_radius: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            red: ChannelBand::default(),
            green: ChannelBand::default(),
            blue: ChannelBand::default(),
            median_radius: 1,
        }
    }
}

/// Settings for choosing the goal among all candidate outlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Exclusive lower bound of the accepted enclosed area, in square pixels.
    pub area_min: f64,
    /// Exclusive upper bound of the accepted enclosed area, in square pixels.
    pub area_max: f64,
    /// Outlines with fewer boundary points than this are never scored.
    pub min_points: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            area_min: 300.0,
            area_max: 1500.0,
            min_points: 8,
        }
    }
}

/// Settings for the iterative polygon simplification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerConfig {
    pub target_corner_count: usize,
    /// Starting tolerance, as a fraction of the outline perimeter.
    pub initial_coefficient: f64,
    pub step: f64,
    pub max_iterations: u32,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            target_corner_count: 4,
            initial_coefficient: 0.05,
            step: 0.01,
            max_iterations: 100,
        }
    }
}

/// Angular coverage of the camera, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub horizontal_fov_deg: f64,
    pub vertical_fov_deg: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            horizontal_fov_deg: 57.0,
            vertical_fov_deg: 43.0,
        }
    }
}

/// Output proportions of the rectified goal view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    pub aspect_width: f64,
    pub aspect_height: f64,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            aspect_width: 300.0,
            aspect_height: 210.0,
        }
    }
}

/// Configuration for the `GoalPipeline`, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub selector: SelectorConfig,
    pub corners: CornerConfig,
    pub camera: CameraConfig,
    pub rectify: RectifyConfig,
}

impl PipelineConfig {
    /// Parses and validates a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        let bands = [
            ("red", self.segmenter.red),
            ("green", self.segmenter.green),
            ("blue", self.segmenter.blue),
        ];
        for (name, band) in bands {
            if band.min > band.max {
                return Err(VisionError::InvalidConfig(format!(
                    "{name} band min {} exceeds max {}",
                    band.min, band.max
                )));
            }
        }

        let selector = &self.selector;
        if !(selector.area_min >= 0.0 && selector.area_min < selector.area_max) {
            return Err(VisionError::InvalidConfig(format!(
                "area band ({}, {}) is empty",
                selector.area_min, selector.area_max
            )));
        }

        let corners = &self.corners;
        if corners.target_corner_count < 3 {
            return Err(VisionError::InvalidConfig(
                "target_corner_count must be at least 3".into(),
            ));
        }
        if !(corners.step > 0.0) || !(corners.initial_coefficient > 0.0) {
            return Err(VisionError::InvalidConfig(
                "corner search coefficient and step must be positive".into(),
            ));
        }
        if corners.max_iterations == 0 {
            return Err(VisionError::InvalidConfig("max_iterations must be non-zero".into()));
        }

        if !(self.camera.horizontal_fov_deg > 0.0 && self.camera.vertical_fov_deg > 0.0) {
            return Err(VisionError::InvalidConfig("field of view must be positive".into()));
        }
        if !(self.rectify.aspect_width > 0.0 && self.rectify.aspect_height > 0.0) {
            return Err(VisionError::InvalidConfig("rectify aspect must be positive".into()));
        }
        Ok(())
    }
}
