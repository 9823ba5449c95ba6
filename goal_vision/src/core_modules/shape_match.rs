// THEORY:
// The `shape_match` module answers one question: "how much does this outline look
// like that one, ignoring where it is, how big it is and how it is rotated?"
//
// Algorithm:
// 1.  **Polygon Moments**: The raw spatial moments up to third order are computed
//     directly from the outline polygon with Green's theorem, so no raster is needed.
// 2.  **Normalization**: Central moments remove translation; dividing by powers of
//     the area removes scale.
// 3.  **Hu Invariants**: The seven Hu combinations of the normalized moments are
//     additionally invariant to rotation.
// 4.  **I1 Distance**: Each invariant is mapped to `sign(h) * log10(|h|)` and the
//     distance is the sum of `|1/m_a - 1/m_b|`. Invariants too close to zero in
//     either shape carry no information and are skipped.

use crate::core_modules::outline::Outline;

const HU_EPSILON: f64 = 1e-5;
const AREA_EPSILON: f64 = f64::EPSILON;

/// The seven Hu moment invariants of an outline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HuMoments(pub [f64; 7]);

/// Raw and central moments of a closed polygon up to third order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct PolygonMoments {
    m00: f64,
    mu20: f64,
    mu11: f64,
    mu02: f64,
    mu30: f64,
    mu21: f64,
    mu12: f64,
    mu03: f64,
}

impl PolygonMoments {
    fn of(outline: &Outline) -> Self {
        let points = outline.points();
        let n = points.len();
        if n < 3 {
            return Self::default();
        }

        let (mut a00, mut a10, mut a01) = (0.0, 0.0, 0.0);
        let (mut a20, mut a11, mut a02) = (0.0, 0.0, 0.0);
        let (mut a30, mut a21, mut a12, mut a03) = (0.0, 0.0, 0.0, 0.0);

        let last = points[n - 1];
        let (mut xp, mut yp) = (last.x as f64, last.y as f64);
        for p in points {
            let (x, y) = (p.x as f64, p.y as f64);
            let cross = xp * y - x * yp;
            let xs = xp + x;
            let ys = yp + y;

            a00 += cross;
            a10 += cross * xs;
            a01 += cross * ys;
            a20 += cross * (xp * xs + x * x);
            a11 += cross * (xp * (ys + yp) + x * (ys + y));
            a02 += cross * (yp * ys + y * y);
            a30 += cross * xs * (xp * xp + x * x);
            a03 += cross * ys * (yp * yp + y * y);
            a21 += cross * (xp * xp * (3.0 * yp + y) + 2.0 * x * xp * ys + x * x * (yp + 3.0 * y));
            a12 += cross * (yp * yp * (3.0 * xp + x) + 2.0 * y * yp * xs + y * y * (xp + 3.0 * x));

            xp = x;
            yp = y;
        }

        if a00.abs() <= AREA_EPSILON {
            return Self::default();
        }

        // Orientation of the polygon fixes the sign of every integral.
        let sign = if a00 > 0.0 { 1.0 } else { -1.0 };
        let m00 = a00 * sign / 2.0;
        let m10 = a10 * sign / 6.0;
        let m01 = a01 * sign / 6.0;
        let m20 = a20 * sign / 12.0;
        let m11 = a11 * sign / 24.0;
        let m02 = a02 * sign / 12.0;
        let m30 = a30 * sign / 20.0;
        let m21 = a21 * sign / 60.0;
        let m12 = a12 * sign / 60.0;
        let m03 = a03 * sign / 20.0;

        let cx = m10 / m00;
        let cy = m01 / m00;

        let mu20 = m20 - m10 * cx;
        let mu11 = m11 - m10 * cy;
        let mu02 = m02 - m01 * cy;
        let mu30 = m30 - cx * (3.0 * mu20 + cx * m10);
        let mu21 = m21 - cx * (2.0 * mu11 + cx * m01) - cy * mu20;
        let mu12 = m12 - cy * (2.0 * mu11 + cy * m10) - cx * mu02;
        let mu03 = m03 - cy * (3.0 * mu02 + cy * m01);

        Self { m00, mu20, mu11, mu02, mu30, mu21, mu12, mu03 }
    }
}

impl HuMoments {
    /// Computes the Hu invariants of a polygon outline. Degenerate outlines
    /// (fewer than three points or zero area) yield all zeros.
    pub fn of(outline: &Outline) -> Self {
        let m = PolygonMoments::of(outline);
        if m.m00 == 0.0 {
            return Self::default();
        }

        let inv_m00 = 1.0 / m.m00;
        let s2 = inv_m00 * inv_m00;
        let s3 = s2 * inv_m00.sqrt();

        let nu20 = m.mu20 * s2;
        let nu11 = m.mu11 * s2;
        let nu02 = m.mu02 * s2;
        let nu30 = m.mu30 * s3;
        let nu21 = m.mu21 * s3;
        let nu12 = m.mu12 * s3;
        let nu03 = m.mu03 * s3;

        let t0 = nu30 + nu12;
        let t1 = nu21 + nu03;
        let q0 = nu20 - nu02;
        let q1 = nu30 - 3.0 * nu12;
        let q2 = 3.0 * nu21 - nu03;

        let t0_sq = t0 * t0;
        let t1_sq = t1 * t1;

        Self([
            nu20 + nu02,
            q0 * q0 + 4.0 * nu11 * nu11,
            q1 * q1 + q2 * q2,
            t0_sq + t1_sq,
            q1 * t0 * (t0_sq - 3.0 * t1_sq) + q2 * t1 * (3.0 * t0_sq - t1_sq),
            q0 * (t0_sq - t1_sq) + 4.0 * nu11 * t0 * t1,
            q2 * t0 * (t0_sq - 3.0 * t1_sq) - q1 * t1 * (3.0 * t0_sq - t1_sq),
        ])
    }

    /// I1 distance between two sets of invariants. Zero means identical shape
    /// (or no usable information at all).
    pub fn distance(&self, other: &HuMoments) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a.abs() > HU_EPSILON && b.abs() > HU_EPSILON)
            .map(|(&a, &b)| (1.0 / log_scaled(a) - 1.0 / log_scaled(b)).abs())
            .sum()
    }
}

#[inline]
fn log_scaled(h: f64) -> f64 {
    h.signum() * h.abs().log10()
}

/// Dissimilarity between two outlines. Lower is more similar.
pub fn match_shapes(a: &Outline, b: &Outline) -> f64 {
    HuMoments::of(a).distance(&HuMoments::of(b))
}
