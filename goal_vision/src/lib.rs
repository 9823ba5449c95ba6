// THEORY:
// This file is the main entry point for the `goal_vision` library crate.
// It defines the public API exposed to the robot code and to the `goal_tester`
// driver.
//
// The primary goal is to export `GoalPipeline` and its associated data
// structures (`PipelineConfig`, `AngleResult`, `VisionError`, etc.) as the
// high-level interface for finding the retro-reflective goal in a camera frame.
// The individual stages stay reachable under `core_modules` for tuning and
// diagnostics, but a control loop only needs `GoalPipeline::detect`.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::PipelineConfig;
pub use core_modules::angle::AngleResult;
pub use core_modules::reference_shapes::ReferenceShapeSet;
pub use core_modules::{Frame, Mask};
pub use error::{Result, VisionError};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{FrameAnalysis, GoalPipeline};
