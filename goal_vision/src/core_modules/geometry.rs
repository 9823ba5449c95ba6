// THEORY:
// The `geometry` module turns four unordered corner points into the measurements
// the aiming logic needs.
//
// 1.  **Ordering**: Corners are split around their centroid into a top pair and a
//     bottom pair (image y grows downward), then each pair into left and right.
//     The result is the canonical clockwise order [top-left, top-right,
//     bottom-right, bottom-left]. This assumes a roughly upright quadrilateral;
//     a split that does not yield two points on each side is reported as
//     `MalformedGeometry` instead of guessing.
// 2.  **Top-Center**: The aiming point is the middle of the goal's top edge: the
//     mean x of all four corners and the mean y of the two top corners.
// 3.  **Rectification**: For diagnostics, the quadrilateral can be mapped back to a
//     frontal view with a projective transform. Output height is the mean of the
//     left and right edge lengths; width follows from the goal's aspect ratio.

use crate::config::RectifyConfig;
use crate::core_modules::Frame;
use crate::error::{Result, VisionError};
use image::Rgb;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::point::Point;

/// Exactly four corner points, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners([Point<f64>; 4]);

impl Corners {
    pub fn new(points: [Point<f64>; 4]) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point<f64>; 4] {
        &self.0
    }

    /// Unweighted centroid of the four points.
    pub fn center(&self) -> Point<f64> {
        centroid(&self.0)
    }
}

impl TryFrom<&[Point<i32>]> for Corners {
    type Error = VisionError;

    fn try_from(points: &[Point<i32>]) -> Result<Self> {
        let points: [Point<i32>; 4] = points.try_into().map_err(|_| {
            VisionError::MalformedGeometry(format!("expected 4 corners, got {}", points.len()))
        })?;
        Ok(Self(points.map(|p| Point::new(p.x as f64, p.y as f64))))
    }
}

/// Corners in canonical order: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedCorners {
    pub top_left: Point<f64>,
    pub top_right: Point<f64>,
    pub bottom_right: Point<f64>,
    pub bottom_left: Point<f64>,
}

impl OrderedCorners {
    pub fn to_array(&self) -> [Point<f64>; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }
}

fn centroid(points: &[Point<f64>; 4]) -> Point<f64> {
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / 4.0, sy / 4.0)
}

fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Splits a pair into (left, right). Equal x falls back to y so the result does
/// not depend on input order.
fn left_right(a: Point<f64>, b: Point<f64>) -> (Point<f64>, Point<f64>) {
    let a_first = a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)).is_le();
    if a_first { (a, b) } else { (b, a) }
}

/// Assigns canonical roles to four corners.
pub fn order(corners: &Corners) -> Result<OrderedCorners> {
    let center = corners.center();
    let (top, bottom): (Vec<Point<f64>>, Vec<Point<f64>>) =
        corners.points().iter().copied().partition(|p| p.y < center.y);

    let (Ok([a, b]), Ok([c, d])) = (
        <[Point<f64>; 2]>::try_from(top.as_slice()),
        <[Point<f64>; 2]>::try_from(bottom.as_slice()),
    ) else {
        return Err(VisionError::MalformedGeometry(format!(
            "corner split around centroid gave {} top and {} bottom points",
            top.len(),
            bottom.len()
        )));
    };

    let (top_left, top_right) = left_right(a, b);
    let (bottom_left, bottom_right) = left_right(c, d);
    Ok(OrderedCorners {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    })
}

/// Middle of the top edge: mean x of all four corners, mean y of the top two.
pub fn top_center(ordered: &OrderedCorners) -> Point<f64> {
    let x = ordered.to_array().iter().map(|p| p.x).sum::<f64>() / 4.0;
    let y = (ordered.top_left.y + ordered.top_right.y) / 2.0;
    Point::new(x, y)
}

/// Resamples the goal quadrilateral into a frontal view.
pub fn rectify(frame: &Frame, corners: &Corners, config: &RectifyConfig) -> Result<Frame> {
    let ordered = order(corners)?;

    let height_right = distance(ordered.top_right, ordered.bottom_right).trunc();
    let height_left = distance(ordered.top_left, ordered.bottom_left).trunc();
    let height = ((height_left + height_right) / 2.0).trunc();
    let width = (height * config.aspect_width / config.aspect_height).trunc();
    if height < 1.0 || width < 1.0 {
        return Err(VisionError::MalformedGeometry(format!(
            "rectified view would be {width}x{height}"
        )));
    }

    let from = ordered.to_array().map(|p| (p.x as f32, p.y as f32));
    let (w, h) = (width as f32, height as f32);
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let projection = Projection::from_control_points(from, to).ok_or_else(|| {
        VisionError::MalformedGeometry("corners do not define a projective mapping".into())
    })?;

    let mut rectified = Frame::new(width as u32, height as u32);
    warp_into(frame, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut rectified);
    Ok(rectified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corners(points: [(f64, f64); 4]) -> Corners {
        Corners::new(points.map(|(x, y)| Point::new(x, y)))
    }

    fn permutations(items: [usize; 4]) -> Vec<[usize; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        idx.iter().for_each(|&i| seen[i] = true);
                        if seen.iter().all(|&s| s) {
                            out.push(idx.map(|i| items[i]));
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn ordering_is_clockwise_from_top_left() {
        let quad = corners([(52.0, 61.0), (10.0, 12.0), (11.0, 60.0), (50.0, 10.0)]);
        let ordered = order(&quad).unwrap();
        assert_eq!(ordered.top_left, Point::new(10.0, 12.0));
        assert_eq!(ordered.top_right, Point::new(50.0, 10.0));
        assert_eq!(ordered.bottom_right, Point::new(52.0, 61.0));
        assert_eq!(ordered.bottom_left, Point::new(11.0, 60.0));
    }

    #[test]
    fn ordering_ignores_input_permutation() {
        let quad = [(103.0, 42.0), (161.0, 47.0), (158.0, 96.0), (99.0, 90.0)];
        let expected = order(&corners(quad)).unwrap();
        let perms = permutations([0, 1, 2, 3]);
        assert_eq!(perms.len(), 24);
        for perm in perms {
            let shuffled = perm.map(|i| quad[i]);
            assert_eq!(order(&corners(shuffled)).unwrap(), expected);
        }
    }

    #[test]
    fn lopsided_split_is_malformed() {
        // Three points sit above the centroid.
        let quad = corners([(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (10.0, 30.0)]);
        let err = order(&quad).unwrap_err();
        assert!(matches!(err, VisionError::MalformedGeometry(_)));
    }

    #[test]
    fn coincident_points_are_malformed() {
        let err = order(&corners([(5.0, 5.0); 4])).unwrap_err();
        assert!(matches!(err, VisionError::MalformedGeometry(_)));
    }

    #[test]
    fn top_center_uses_all_x_and_top_y() {
        let quad = corners([(100.0, 40.0), (200.0, 44.0), (210.0, 120.0), (90.0, 118.0)]);
        let ordered = order(&quad).unwrap();
        let point = top_center(&ordered);
        assert_relative_eq!(point.x, 150.0);
        assert_relative_eq!(point.y, 42.0);
    }

    #[test]
    fn corners_require_exactly_four_points() {
        let three = [Point::new(0, 0), Point::new(1, 0), Point::new(0, 1)];
        assert!(Corners::try_from(&three[..]).is_err());
        let four = [Point::new(0, 0), Point::new(4, 0), Point::new(4, 4), Point::new(0, 4)];
        let corners = Corners::try_from(&four[..]).unwrap();
        assert_eq!(corners.center(), Point::new(2.0, 2.0));
    }

    #[test]
    fn rectify_produces_frontal_view_with_goal_aspect() {
        let mut frame = Frame::from_pixel(80, 60, Rgb([0, 0, 0]));
        for y in 10..=31 {
            for x in 20..=50 {
                frame.put_pixel(x, y, Rgb([240, 240, 240]));
            }
        }
        let quad = corners([(20.0, 10.0), (50.0, 10.0), (50.0, 31.0), (20.0, 31.0)]);
        let view = rectify(&frame, &quad, &RectifyConfig::default()).unwrap();

        // Height 21, width 21 * 300 / 210 = 30.
        assert_eq!(view.dimensions(), (30, 21));
        assert_eq!(view.get_pixel(15, 10).0, [240, 240, 240]);
    }

    #[test]
    fn rectify_rejects_flat_quadrilaterals() {
        let frame = Frame::new(10, 10);
        let quad = corners([(1.0, 1.0), (8.0, 1.0), (8.0, 1.5), (1.0, 1.5)]);
        let err = rectify(&frame, &quad, &RectifyConfig::default()).unwrap_err();
        assert!(matches!(err, VisionError::MalformedGeometry(_)));
    }
}
