// THEORY:
// `core_modules` holds one file per pipeline stage plus the value types passed
// between them. Each stage is usable on its own; `pipeline` wires them together
// in order.

pub mod angle;
pub mod corner_reducer;
pub mod geometry;
pub mod goal_selector;
pub mod outline;
pub mod reference_shapes;
pub mod region_extractor;
pub mod segmenter;
pub mod shape_match;
pub mod utils;

/// A decoded 8-bit RGB camera frame.
pub type Frame = image::RgbImage;

/// Single-channel segmentation output: 255 for foreground, 0 for background.
pub type Mask = image::GrayImage;
