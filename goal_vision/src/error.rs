// THEORY:
// Every stage of the engine reports failure through one error type so that the
// caller (usually a robot control loop) has a single thing to match on. The most
// important variant, `GoalNotFound`, is not a bug: an empty field of view is a
// normal operating state and the loop simply tries again on the next frame.
// `MalformedGeometry` covers frames whose shapes defeat the corner search or
// the corner ordering. Both are recoverable for the process, fatal for the frame.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    /// No outline in the frame passed the goal acceptance test.
    #[error("goal not found: {0}")]
    GoalNotFound(&'static str),
    /// The winning outline could not be turned into a usable quadrilateral.
    #[error("malformed goal geometry: {0}")]
    MalformedGeometry(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("reference shape set is empty")]
    EmptyReferenceSet,
    #[error("reference outline {0} has no points")]
    InvalidReference(usize),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to parse reference shapes: {0}")]
    ReferenceParse(#[from] serde_json::Error),
    #[error("frame worker pool is unavailable")]
    WorkerUnavailable,
}

impl VisionError {
    /// True for the expected "nothing to aim at" outcome.
    pub fn is_goal_not_found(&self) -> bool {
        matches!(self, VisionError::GoalNotFound(_))
    }
}
