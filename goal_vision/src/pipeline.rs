// THEORY:
// The `pipeline` module is the top-level API of the goal finder. It owns one
// instance of every stage and runs them strictly in order for each frame:
//
//   Segmenter -> Region Extractor -> Goal Selector -> Corner Reducer
//             -> Geometry Resolver -> Angle Calculator
//
// Key architectural principles:
// 1.  **Immutable After Construction**: A `GoalPipeline` holds only configuration
//     and the shared `ReferenceShapeSet`. Every method takes `&self`, so one
//     pipeline can serve many threads or tasks at once.
// 2.  **Per-Frame Ownership**: Every intermediate (mask, outlines, corners) is
//     created and owned by the call that processes the frame. Nothing carries over
//     between frames.
// 3.  **Typed Outcomes**: Losing the goal is `GoalNotFound`, a normal result the
//     control loop checks for, never a panic.
// 4.  **Inspectable**: `analyze` keeps every intermediate product, even when a later
//     stage fails, so the debug renders can show exactly where a frame was lost.

use crate::config::PipelineConfig;
use crate::core_modules::angle::{self, AngleResult};
use crate::core_modules::corner_reducer::CornerReducer;
use crate::core_modules::geometry::{self, Corners, OrderedCorners};
use crate::core_modules::goal_selector::{GoalSelector, Selection};
use crate::core_modules::outline::Outline;
use crate::core_modules::reference_shapes::ReferenceShapeSet;
use crate::core_modules::region_extractor::region_extractor;
use crate::core_modules::segmenter::Segmenter;
use crate::core_modules::utils::image_helper;
use crate::core_modules::{Frame, Mask};
use crate::error::{Result, VisionError};
use imageproc::point::Point;
use std::path::Path;
use std::sync::Arc;

/// Every intermediate product of one pipeline run.
#[derive(Debug)]
pub struct FrameAnalysis {
    pub mask: Mask,
    pub outlines: Vec<Outline>,
    pub selection: Option<Selection>,
    pub corners: Option<Corners>,
    pub ordered_corners: Option<OrderedCorners>,
    pub top_center: Option<Point<f64>>,
    /// The angle pair, or the reason the frame produced none.
    pub result: Result<AngleResult>,
}

impl FrameAnalysis {
    fn empty(mask: Mask, error: VisionError) -> Self {
        Self {
            mask,
            outlines: Vec::new(),
            selection: None,
            corners: None,
            ordered_corners: None,
            top_center: None,
            result: Err(error),
        }
    }

    pub fn goal_visible(&self) -> bool {
        self.result.is_ok()
    }

    /// Writes the mask and every overlay the run got far enough to produce as
    /// `<stem>_<stage>.png` files under `dir`.
    pub fn save_debug_renders(
        &self,
        frame: &Frame,
        dir: impl AsRef<Path>,
        stem: &str,
    ) -> std::result::Result<(), image::ImageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        image_helper::save_mask(dir.join(format!("{stem}_mask.png")), &self.mask)?;
        image_helper::save_frame(
            dir.join(format!("{stem}_outlines.png")),
            &image_helper::render_outlines(frame, &self.outlines),
        )?;
        if let Some(selection) = &self.selection {
            image_helper::save_frame(
                dir.join(format!("{stem}_box.png")),
                &image_helper::render_rotated_rect(frame, &selection.rotated_rect),
            )?;
        }
        if let Some(ordered) = &self.ordered_corners {
            image_helper::save_frame(
                dir.join(format!("{stem}_hull.png")),
                &image_helper::render_corners(frame, ordered),
            )?;
        }
        Ok(())
    }
}

/// The main, top-level struct for the goal finder.
#[derive(Debug, Clone)]
pub struct GoalPipeline {
    config: PipelineConfig,
    segmenter: Segmenter,
    selector: GoalSelector,
    corner_reducer: CornerReducer,
}

impl GoalPipeline {
    pub fn new(config: PipelineConfig, references: Arc<ReferenceShapeSet>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            segmenter: Segmenter::new(config.segmenter.clone()),
            selector: GoalSelector::new(references, config.selector.clone()),
            corner_reducer: CornerReducer::new(config.corners.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage and keeps all intermediate products.
    pub fn analyze(&self, frame: &Frame) -> FrameAnalysis {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return FrameAnalysis::empty(
                Mask::new(width, height),
                VisionError::InvalidFrame(format!("frame is {width}x{height}")),
            );
        }

        // --- 1. Segmentation ---
        let mask = self.segmenter.segment(frame);

        // --- 2. Region Extraction ---
        let outlines = match region_extractor::extract(&mask) {
            Ok(outlines) => outlines,
            Err(error) => return FrameAnalysis::empty(mask, error),
        };

        let mut analysis = FrameAnalysis {
            mask,
            outlines,
            selection: None,
            corners: None,
            ordered_corners: None,
            top_center: None,
            result: Err(VisionError::GoalNotFound("frame not processed")),
        };
        analysis.result = self.resolve(&mut analysis, width, height);

        match &analysis.result {
            Ok(angles) => log::debug!(
                "goal at {:.2} deg horizontal, {:.2} deg vertical",
                angles.horizontal_degrees,
                angles.vertical_degrees
            ),
            Err(error) => log::debug!("frame rejected: {error}"),
        }
        analysis
    }

    /// Stages 3 to 6, recording each product on `analysis` as it is produced.
    fn resolve(
        &self,
        analysis: &mut FrameAnalysis,
        width: u32,
        height: u32,
    ) -> Result<AngleResult> {
        // --- 3. Goal Selection ---
        let selection = self.selector.select(&analysis.outlines)?;
        let selection = analysis.selection.insert(selection);

        // --- 4. Corner Reduction ---
        let corners = self.corner_reducer.reduce(&selection.outline)?;
        analysis.corners = Some(corners);

        // --- 5. Geometry Resolution ---
        let ordered = geometry::order(&corners)?;
        let top_center = geometry::top_center(&ordered);
        analysis.ordered_corners = Some(ordered);
        analysis.top_center = Some(top_center);

        // --- 6. Angle Calculation ---
        angle::angles(top_center, height, width, &self.config.camera)
    }

    /// Angle pair for the goal in `frame`, or the reason there is none.
    pub fn detect(&self, frame: &Frame) -> Result<AngleResult> {
        self.analyze(frame).result
    }

    /// Same as `detect`, for a packed RGB8 buffer handed over by a camera.
    pub fn detect_buffer(&self, width: u32, height: u32, buffer: &[u8]) -> Result<AngleResult> {
        let frame = frame_from_buffer(width, height, buffer)?;
        self.detect(&frame)
    }

    pub fn goal_visible(&self, frame: &Frame) -> bool {
        self.detect(frame).is_ok()
    }

    /// Frontal view of the goal in `frame`, for diagnostics.
    pub fn rectify(&self, frame: &Frame, corners: &Corners) -> Result<Frame> {
        geometry::rectify(frame, corners, &self.config.rectify)
    }
}

/// Wraps a packed RGB8 buffer, checking it matches the stated dimensions.
pub fn frame_from_buffer(width: u32, height: u32, buffer: &[u8]) -> Result<Frame> {
    let expected = width as usize * height as usize * 3;
    if buffer.len() != expected {
        return Err(VisionError::InvalidFrame(format!(
            "buffer holds {} bytes, {width}x{height} RGB needs {expected}",
            buffer.len()
        )));
    }
    Frame::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| VisionError::InvalidFrame("buffer does not fit frame".into()))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::Rgb;

    #[test]
    fn detects_goal_above_center() {
        let analysis = pipeline().analyze(&goal_frame(300, 100));
        let angles = analysis.result.as_ref().unwrap();

        // Top-center is near (320, 100): centered horizontally, 140 px above center.
        assert_abs_diff_eq!(angles.horizontal_degrees, 0.0, epsilon = 0.5);
        assert_abs_diff_eq!(angles.vertical_degrees, 12.54, epsilon = 0.5);

        let selection = analysis.selection.as_ref().unwrap();
        assert!(selection.area > 300.0 && selection.area < 1500.0);
        assert!(analysis.corners.is_some());
        let top = analysis.top_center.unwrap();
        assert_abs_diff_eq!(top.x, 320.0, epsilon = 2.0);
        assert_abs_diff_eq!(top.y, 100.0, epsilon = 2.0);
    }

    #[test]
    fn goal_left_and_below_has_negative_angles() {
        let angles = pipeline().detect(&goal_frame(60, 400)).unwrap();
        assert!(angles.horizontal_degrees < -20.0);
        assert!(angles.vertical_degrees < -10.0);
    }

    #[test]
    fn dark_frame_is_goal_not_found() {
        let frame = Frame::from_pixel(640, 480, Rgb([5, 5, 5]));
        let analysis = pipeline().analyze(&frame);
        assert!(analysis.result.as_ref().unwrap_err().is_goal_not_found());
        assert!(analysis.outlines.is_empty());
        assert!(!pipeline().goal_visible(&frame));
    }

    #[test]
    fn oversized_goal_shape_alone_is_goal_not_found() {
        // A goal-shaped "U" of 101 x 81 pixels with a 61 x 51 notch: enough
        // boundary points to be scored, but an area far above the band.
        let mut frame = Frame::from_pixel(320, 240, Rgb([5, 5, 5]));
        for y in 0..81 {
            for x in 0..101 {
                let in_notch = y < 51 && (20..81).contains(&x);
                if !in_notch {
                    frame.put_pixel(20 + x, 20 + y, Rgb([250, 250, 250]));
                }
            }
        }
        let analysis = pipeline().analyze(&frame);
        assert_eq!(analysis.outlines.len(), 1);
        let outline = &analysis.outlines[0];
        assert!(outline.len() >= 8);
        assert!(outline.area() > 1500.0);
        assert!(analysis.selection.is_none());
        assert!(analysis.result.unwrap_err().is_goal_not_found());
    }

    /// Steep right triangle: in the area band, but it never reduces to four corners.
    fn triangle_frame() -> Frame {
        let mut frame = Frame::from_pixel(320, 240, Rgb([5, 5, 5]));
        for y in 0..60 {
            for x in 0..=y / 2 {
                frame.put_pixel(100 + x, 80 + y, Rgb([250, 250, 250]));
            }
        }
        frame
    }

    #[test]
    fn selection_survives_a_failed_corner_search() {
        let frame = triangle_frame();
        let analysis = pipeline().analyze(&frame);

        assert!(matches!(analysis.result, Err(VisionError::MalformedGeometry(_))));
        let selection = analysis.selection.as_ref().unwrap();
        assert!(selection.area > 300.0 && selection.area < 1500.0);
        assert!(analysis.corners.is_none());
        assert!(analysis.top_center.is_none());

        let dir = std::env::temp_dir().join(format!("goal_vision_lost_{}", std::process::id()));
        analysis.save_debug_renders(&frame, &dir, "lost").unwrap();
        assert!(dir.join("lost_box.png").exists());
        assert!(!dir.join("lost_hull.png").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn raw_buffer_matches_frame_detection() {
        let frame = goal_frame(300, 100);
        let from_frame = pipeline().detect(&frame).unwrap();
        let from_buffer = pipeline().detect_buffer(640, 480, frame.as_raw()).unwrap();
        assert_eq!(from_frame, from_buffer);
    }

    #[test]
    fn short_buffer_is_invalid_frame() {
        let err = pipeline().detect_buffer(640, 480, &[0u8; 100]).unwrap_err();
        assert!(matches!(err, VisionError::InvalidFrame(_)));
    }

    #[test]
    fn zero_sized_frame_is_invalid() {
        let err = pipeline().detect(&Frame::new(0, 0)).unwrap_err();
        assert!(matches!(err, VisionError::InvalidFrame(_)));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = PipelineConfig::default();
        config.selector.area_min = 2000.0;
        let err = GoalPipeline::new(config, references()).unwrap_err();
        assert!(matches!(err, VisionError::InvalidConfig(_)));
    }

    #[test]
    fn rectified_view_follows_goal_aspect() {
        let pipeline = pipeline();
        let frame = goal_frame(300, 100);
        let corners = pipeline.analyze(&frame).corners.unwrap();
        let view = pipeline.rectify(&frame, &corners).unwrap();
        let (w, h) = view.dimensions();
        assert!(h > 20);
        assert_abs_diff_eq!(w as f64 / h as f64, 300.0 / 210.0, epsilon = 0.1);
    }

    #[test]
    fn debug_renders_are_written() {
        let frame = goal_frame(300, 100);
        let analysis = pipeline().analyze(&frame);
        let dir = std::env::temp_dir().join(format!("goal_vision_debug_{}", std::process::id()));

        analysis.save_debug_renders(&frame, &dir, "frame0").unwrap();

        for stage in ["mask", "outlines", "box", "hull"] {
            assert!(dir.join(format!("frame0_{stage}.png")).exists(), "missing {stage} render");
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
