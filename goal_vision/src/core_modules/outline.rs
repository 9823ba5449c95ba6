// THEORY:
// An `Outline` is the closed boundary of one connected foreground region. It is a
// "dumb" data container: an ordered list of integer pixel coordinates plus the
// handful of summary measurements the later stages need (enclosed area, perimeter,
// rotated bounding rectangle). Shape comparison lives in `shape_match`; choosing
// among outlines lives in `goal_selector`.

use imageproc::geometry::{arc_length, min_area_rect};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// A closed boundary of a connected foreground region, in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<[i32; 2]>", into = "Vec<[i32; 2]>")]
pub struct Outline {
    points: Vec<Point<i32>>,
}

impl Outline {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area by the shoelace formula. Always non-negative.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice_area += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        }
        (twice_area * 0.5).abs()
    }

    /// Length of the closed boundary.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        arc_length(&self.points, true)
    }

    /// Minimum-area rotated rectangle enclosing the outline.
    pub fn min_area_rect(&self) -> Option<RotatedRect> {
        if self.points.is_empty() {
            return None;
        }
        Some(RotatedRect {
            corners: min_area_rect(&self.points),
        })
    }
}

impl From<Vec<[i32; 2]>> for Outline {
    fn from(raw: Vec<[i32; 2]>) -> Self {
        Self::new(raw.into_iter().map(|[x, y]| Point::new(x, y)).collect())
    }
}

impl From<Outline> for Vec<[i32; 2]> {
    fn from(outline: Outline) -> Self {
        outline.points.into_iter().map(|p| [p.x, p.y]).collect()
    }
}

/// The four corners of a minimum-area rotated bounding rectangle, kept for
/// display and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatedRect {
    pub corners: [Point<i32>; 4],
}

impl RotatedRect {
    pub fn center(&self) -> (f64, f64) {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        (sx / 4.0, sy / 4.0)
    }

    /// Lengths of the two adjacent sides.
    pub fn size(&self) -> (f64, f64) {
        let side = |a: Point<i32>, b: Point<i32>| {
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            dx.hypot(dy)
        };
        (
            side(self.corners[0], self.corners[1]),
            side(self.corners[1], self.corners[2]),
        )
    }

    pub fn area(&self) -> f64 {
        let (w, h) = self.size();
        w * h
    }
}
