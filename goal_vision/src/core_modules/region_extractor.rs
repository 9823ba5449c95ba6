// THEORY:
// The `RegionExtractor` turns the binary `Mask` into the list of candidate outlines
// the `GoalSelector` will score.
//
// Algorithm steps:
// 1.  **Border Following**: Suzuki-Abe border following (via `imageproc`) walks the
//     boundary of every foreground component and every hole inside one.
// 2.  **Outermost Only**: Hole borders, and the outer borders of blobs sitting inside
//     a hole, are discarded. Only the outermost boundary of each top-level
//     component is a candidate.
// 3.  **Boundary Compression**: A traced border contains every pixel on it. Runs of
//     pixels stepping in the same direction are collapsed to their end points, so an
//     axis-aligned rectangle is described by its four corners.
// 4.  **Stateless Utility**: Like the segmenter, this stage has no memory. A mask in,
//     a list of outlines out.

use crate::core_modules::Mask;
use crate::core_modules::outline::Outline;
use crate::error::{Result, VisionError};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

pub mod region_extractor {
    use super::*;

    /// Finds the outermost outline of every foreground component in the mask.
    /// Fails with `GoalNotFound` when the mask has no foreground at all.
    pub fn extract(mask: &Mask) -> Result<Vec<Outline>> {
        if mask.width() == 0 || mask.height() == 0 {
            return Err(VisionError::GoalNotFound("mask is empty"));
        }

        let outlines: Vec<Outline> = find_contours::<i32>(mask)
            .into_iter()
            .filter(|contour| {
                matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
            })
            .filter(|contour| !contour.points.is_empty())
            .map(|contour| Outline::new(compress_boundary(&contour.points)))
            .collect();

        log::debug!("region extractor found {} outer outlines", outlines.len());

        if outlines.is_empty() {
            return Err(VisionError::GoalNotFound("no outlines in mask"));
        }
        Ok(outlines)
    }

    /// Keeps only the points of a closed boundary where the step direction changes.
    pub fn compress_boundary(points: &[Point<i32>]) -> Vec<Point<i32>> {
        let n = points.len();
        if n < 3 {
            return points.to_vec();
        }

        let step = |from: Point<i32>, to: Point<i32>| (to.x - from.x, to.y - from.y);
        let compressed: Vec<Point<i32>> = (0..n)
            .filter(|&i| {
                let prev = points[(i + n - 1) % n];
                let curr = points[i];
                let next = points[(i + 1) % n];
                step(prev, curr) != step(curr, next)
            })
            .map(|i| points[i])
            .collect();

        // A closed boundary always turns somewhere; keep a point regardless.
        if compressed.is_empty() {
            vec![points[0]]
        } else {
            compressed
        }
    }
}
