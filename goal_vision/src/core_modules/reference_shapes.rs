// THEORY:
// The `ReferenceShapeSet` is the learned model of what a goal looks like: a library
// of outlines cut from known-good captures. It is loaded once when the process
// starts and is read-only afterwards, so it can be shared between any number of
// pipelines and worker tasks behind an `Arc` without locking.
//
// The Hu invariants of every entry are computed at load time; scoring a candidate
// then only costs one descriptor computation for the candidate itself.

use crate::core_modules::outline::Outline;
use crate::core_modules::shape_match::HuMoments;
use crate::error::{Result, VisionError};
use std::path::Path;

/// One known-good goal silhouette and its precomputed descriptor.
#[derive(Debug, Clone)]
pub struct ReferenceShape {
    pub outline: Outline,
    pub descriptor: HuMoments,
}

/// An immutable library of reference goal outlines.
#[derive(Debug, Clone)]
pub struct ReferenceShapeSet {
    shapes: Vec<ReferenceShape>,
}

impl ReferenceShapeSet {
    /// Builds a set from outlines already in memory. The set must be non-empty
    /// and every outline must have at least one point.
    pub fn from_outlines(outlines: Vec<Outline>) -> Result<Self> {
        if outlines.is_empty() {
            return Err(VisionError::EmptyReferenceSet);
        }
        if let Some(index) = outlines.iter().position(Outline::is_empty) {
            return Err(VisionError::InvalidReference(index));
        }

        let shapes = outlines
            .into_iter()
            .map(|outline| {
                let descriptor = HuMoments::of(&outline);
                ReferenceShape { outline, descriptor }
            })
            .collect();
        Ok(Self { shapes })
    }

    /// Parses a JSON array of point sequences: `[[[x, y], ...], ...]`.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let outlines: Vec<Outline> = serde_json::from_str(source)?;
        Self::from_outlines(outlines)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let set = Self::from_json_str(&source)?;
        log::info!("loaded {} reference goal outlines from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceShape> {
        self.shapes.iter()
    }

    /// Lowest shape distance between `descriptor` and any reference entry.
    pub fn best_distance(&self, descriptor: &HuMoments) -> f64 {
        self.shapes
            .iter()
            .map(|shape| descriptor.distance(&shape.descriptor))
            .fold(f64::INFINITY, f64::min)
    }
}
