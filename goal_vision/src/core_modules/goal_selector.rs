// THEORY:
// The `GoalSelector` is the decision stage of the goal finder. The mask usually
// contains more than the goal: light fixtures, reflections off polycarbonate,
// other robots' tape. The selector scores every candidate outline against the
// `ReferenceShapeSet` and keeps the one that looks most like a goal.
//
// Decision rule:
// 1.  **Shape Score**: The dissimilarity of a candidate is its smallest Hu-moment
//     distance to any reference outline. Candidates with too few boundary points
//     carry no usable shape and get no score at all (an explicit `None` rather
//     than a huge sentinel number).
// 2.  **Area Window**: Only candidates whose enclosed area lies strictly inside the
//     configured band may win. This rejects both speckle and big bright panels.
// 3.  **Degenerate Scores**: A score of exactly zero means the descriptor carried no
//     information (e.g. a zero-area outline), so it cannot win either.
// 4.  **Uniform Rule**: The same test applies whether there is one candidate or fifty.
//     A lone outline that fails the test is reported as `GoalNotFound`.
// 5.  **Diagnostics**: The largest candidate is tracked and reported for logging only;
//     size is never the decision criterion.

use crate::config::SelectorConfig;
use crate::core_modules::outline::{Outline, RotatedRect};
use crate::core_modules::reference_shapes::ReferenceShapeSet;
use crate::core_modules::shape_match::HuMoments;
use crate::error::{Result, VisionError};
use std::sync::Arc;

/// Per-candidate measurements, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub index: usize,
    pub area: f64,
    pub point_count: usize,
    /// `None` when the outline has too few points to be scored.
    pub score: Option<f64>,
}

/// The winning outline and the evidence for it.
#[derive(Debug, Clone)]
pub struct Selection {
    pub outline: Outline,
    pub index: usize,
    pub score: f64,
    pub area: f64,
    pub rotated_rect: RotatedRect,
    /// Index and area of the largest candidate, for diagnostics only.
    pub largest: (usize, f64),
    pub candidates: Vec<CandidateScore>,
}

/// Picks the single best-matching goal outline from a set of candidates.
#[derive(Debug, Clone)]
pub struct GoalSelector {
    references: Arc<ReferenceShapeSet>,
    config: SelectorConfig,
}

impl GoalSelector {
    pub fn new(references: Arc<ReferenceShapeSet>, config: SelectorConfig) -> Self {
        Self { references, config }
    }

    pub fn references(&self) -> &ReferenceShapeSet {
        &self.references
    }

    /// Scores one outline against the reference library.
    pub fn score(&self, outline: &Outline) -> Option<f64> {
        if outline.len() < self.config.min_points {
            return None;
        }
        Some(self.references.best_distance(&HuMoments::of(outline)))
    }

    fn qualifies(&self, candidate: &CandidateScore) -> Option<f64> {
        let score = candidate.score?;
        let in_band =
            candidate.area > self.config.area_min && candidate.area < self.config.area_max;
        (in_band && score != 0.0 && score.is_finite()).then_some(score)
    }

    pub fn select(&self, outlines: &[Outline]) -> Result<Selection> {
        if outlines.is_empty() {
            return Err(VisionError::GoalNotFound("no candidate outlines"));
        }

        let candidates: Vec<CandidateScore> = outlines
            .iter()
            .enumerate()
            .map(|(index, outline)| CandidateScore {
                index,
                area: outline.area(),
                point_count: outline.len(),
                score: self.score(outline),
            })
            .collect();

        let mut largest = (0, candidates[0].area);
        let mut best: Option<(usize, f64)> = None;
        for candidate in &candidates {
            log::debug!(
                "candidate {}: {} points, area {:.1}, score {:?}",
                candidate.index,
                candidate.point_count,
                candidate.area,
                candidate.score
            );
            if candidate.area > largest.1 {
                largest = (candidate.index, candidate.area);
            }
            if let Some(score) = self.qualifies(candidate) {
                // Strict comparison keeps the earliest candidate on ties.
                if best.is_none_or(|(_, best_score)| score < best_score) {
                    best = Some((candidate.index, score));
                }
            }
        }

        log::debug!("largest candidate {} with area {:.1}", largest.0, largest.1);

        let Some((index, score)) = best else {
            return Err(VisionError::GoalNotFound("no outline passed the shape and area test"));
        };

        let outline = outlines[index].clone();
        let rotated_rect = outline.min_area_rect().ok_or_else(|| {
            VisionError::MalformedGeometry("winning outline has no points".into())
        })?;
        let area = candidates[index].area;
        let (box_w, box_h) = rotated_rect.size();
        log::debug!(
            "selected candidate {index} of {} against {} references: score {score:.5}, \
             area {area:.1}, box {box_w:.1} x {box_h:.1}",
            candidates.len(),
            self.references().len()
        );

        Ok(Selection {
            outline,
            index,
            score,
            area,
            rotated_rect,
            largest,
            candidates,
        })
    }
}
