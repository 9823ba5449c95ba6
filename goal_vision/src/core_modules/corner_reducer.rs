// THEORY:
// The `CornerReducer` collapses the winning outline into the four corners of the
// goal. Traced outlines are noisy: the tape is never perfectly straight and the
// blur rounds every corner, so the outline is simplified until it has exactly the
// number of vertices a goal has.
//
// Search:
// 1.  Approximate the outline with a Douglas-Peucker polygon whose tolerance is a
//     fraction (the coefficient) of the outline perimeter.
// 2.  Take the convex hull of that polygon, which discards the notch of the "U".
// 3.  Too many hull vertices: loosen the tolerance. Too few: tighten it.
//
// There is no closed-form guarantee that this converges, so the search is bounded
// both by an iteration cap and by the coefficient staying within (0, 1]. Running
// out of either is a `MalformedGeometry` failure for the frame.

use crate::config::CornerConfig;
use crate::core_modules::geometry::Corners;
use crate::core_modules::outline::Outline;
use crate::error::{Result, VisionError};
use imageproc::geometry::{approximate_polygon_dp, convex_hull};
use imageproc::point::Point;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct CornerReducer {
    config: CornerConfig,
}

impl CornerReducer {
    pub fn new(config: CornerConfig) -> Self {
        Self { config }
    }

    /// Reduces the outline to exactly four convex-hull corners.
    pub fn reduce(&self, outline: &Outline) -> Result<Corners> {
        let vertices = self.simplify(outline)?;
        Corners::try_from(vertices.as_slice())
    }

    /// Runs the bounded simplification search for `target_corner_count` vertices.
    pub fn simplify(&self, outline: &Outline) -> Result<Vec<Point<i32>>> {
        let target = self.config.target_corner_count;
        if outline.len() < target {
            return Err(VisionError::MalformedGeometry(format!(
                "outline has {} points, fewer than the {} corners requested",
                outline.len(),
                target
            )));
        }

        let perimeter = outline.perimeter();
        if !(perimeter > 0.0) {
            return Err(VisionError::MalformedGeometry("outline has zero perimeter".into()));
        }

        let mut coefficient = self.config.initial_coefficient;
        for iteration in 0..self.config.max_iterations {
            if !(coefficient > 0.0 && coefficient <= 1.0) {
                log::warn!("corner search left the coefficient range at {coefficient:.3}");
                return Err(VisionError::MalformedGeometry(format!(
                    "corner search coefficient {coefficient:.3} out of range \
                     after {iteration} iterations"
                )));
            }

            let epsilon = coefficient * perimeter;
            let approximation = approximate_polygon_dp(outline.points(), epsilon, true);
            let hull = convex_hull(approximation.as_slice());
            log::debug!(
                "corner search iteration {iteration}: coefficient {coefficient:.3}, \
                 {} hull vertices",
                hull.len()
            );

            match hull.len().cmp(&target) {
                Ordering::Equal => return Ok(hull),
                Ordering::Greater => coefficient += self.config.step,
                Ordering::Less => coefficient -= self.config.step,
            }
        }

        log::warn!(
            "corner search did not converge within {} iterations",
            self.config.max_iterations
        );
        Err(VisionError::MalformedGeometry(format!(
            "corner search did not converge within {} iterations",
            self.config.max_iterations
        )))
    }
}
