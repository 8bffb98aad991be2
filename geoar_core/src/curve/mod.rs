//! Parametric curves over a normalized parameter `u ∈ [0, 1]`.
//!
//! Every curve can be evaluated by parameter or by arc length. Arc-length
//! queries go through a piecewise-linear sample of the curve (cached at
//! construction and whenever the sample size or shape changes), so they are
//! as exact as the sample resolution allows.

mod catmull_rom;
mod line;

pub use catmull_rom::CatmullRomCurve;
pub use line::Line;

use nalgebra::{Vector2, Vector3};

use crate::error::CurveError;

/// Default number of interior sample points used for length estimation.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// A point on a curve together with the curve's derivative there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub point: Vector3<f64>,
    pub tangent: Vector3<f64>,
}

/// A parametric curve.
pub trait Curve {
    /// Curve position at `u ∈ [0, 1]`.
    fn point(&self, u: f64) -> Vector3<f64>;

    /// Position and analytic tangent at `u ∈ [0, 1]`.
    fn point_and_tangent(&self, u: f64) -> CurvePoint;

    /// `n + 2` points evenly spaced in `u`, both endpoints included.
    fn sample(&self, n: usize) -> Vec<Vector3<f64>> {
        let delta = 1.0 / (n as f64 + 1.0);
        (0..n + 2).map(|i| self.point(i as f64 * delta)).collect()
    }

    /// Piecewise-linear length over an `n`-point sample.
    ///
    /// The result is cached; calling again with the same `n` is free.
    fn estimate_length(&mut self, n: usize) -> f64;

    /// The cached length estimate.
    fn length(&self) -> f64;

    /// Curve parameter `u` at arc length `s`.
    ///
    /// Returns `CurveError::LengthOutOfRange` when `s` lies outside
    /// `[0, length()]`.
    fn parameter_for_length(&self, s: f64) -> Result<f64, CurveError>;

    /// Curve position at arc length `s`.
    fn point_at_length(&self, s: f64) -> Result<Vector3<f64>, CurveError> {
        Ok(self.point(self.parameter_for_length(s)?))
    }

    /// Position and tangent at arc length `s`.
    fn point_and_tangent_at_length(&self, s: f64) -> Result<CurvePoint, CurveError> {
        Ok(self.point_and_tangent(self.parameter_for_length(s)?))
    }
}

/// Cumulative arc length at each point of a curve sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ArcLengthTable {
    parameters: Vec<f64>,
    lengths: Vec<f64>,
}

impl ArcLengthTable {
    /// Samples `n + 2` points of `point` over `[0, 1]`.
    pub(crate) fn build(point: impl Fn(f64) -> Vector3<f64>, n: usize) -> Self {
        let count = n + 2;
        let delta = 1.0 / (n as f64 + 1.0);

        let mut parameters = Vec::with_capacity(count);
        let mut lengths = Vec::with_capacity(count);

        let mut length = 0.0;
        let mut previous: Option<Vector3<f64>> = None;

        for i in 0..count {
            let u = i as f64 * delta;
            let p = point(u);

            if let Some(prev) = previous {
                length += (p - prev).norm();
            }

            parameters.push(u);
            lengths.push(length);
            previous = Some(p);
        }

        Self { parameters, lengths }
    }

    pub(crate) fn total(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Linear interpolation of `u` within the sub-interval containing `s`.
    pub(crate) fn parameter_for_length(&self, s: f64) -> Result<f64, CurveError> {
        for i in 0..self.lengths.len().saturating_sub(1) {
            let (l0, l1) = (self.lengths[i], self.lengths[i + 1]);

            if s >= l0 && s <= l1 {
                let span = l1 - l0;
                if span <= 0.0 {
                    return Ok(self.parameters[i]);
                }

                let a = (s - l0) / span;
                return Ok((1.0 - a) * self.parameters[i] + a * self.parameters[i + 1]);
            }
        }

        Err(CurveError::LengthOutOfRange {
            length: s,
            total: self.total(),
        })
    }
}

/// Which part of a segment is closest to a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRegion {
    Start,
    Middle,
    End,
}

/// Distance from a point to a segment, and where on the segment it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDistance {
    pub distance: f64,
    pub region: SegmentRegion,
}

/// Distance from `point` to the segment `a`-`b` in the plane.
///
/// Degenerate segments (`a == b`) produce NaN.
pub fn point_line_segment_distance(
    point: &Vector2<f64>,
    a: &Vector2<f64>,
    b: &Vector2<f64>,
) -> SegmentDistance {
    let ap = point - a;
    let ab = b - a;
    let bp = point - b;

    let proj = ap.dot(&ab) / ab.norm();
    let u = proj / ab.norm();

    if u < 0.0 {
        SegmentDistance {
            distance: ap.norm(),
            region: SegmentRegion::Start,
        }
    } else if u > 1.0 {
        SegmentDistance {
            distance: bp.norm(),
            region: SegmentRegion::End,
        }
    } else {
        SegmentDistance {
            distance: (ap.norm_squared() - proj * proj).max(0.0).sqrt(),
            region: SegmentRegion::Middle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arc_length_table_straight_line() {
        let table = ArcLengthTable::build(|u| Vector3::new(4.0 * u, 0.0, 0.0), 3);
        assert_relative_eq!(table.total(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(table.parameter_for_length(1.0).unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(table.parameter_for_length(4.0).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_arc_length_table_out_of_range() {
        let table = ArcLengthTable::build(|u| Vector3::new(u, 0.0, 0.0), 10);
        assert!(matches!(
            table.parameter_for_length(-0.1),
            Err(CurveError::LengthOutOfRange { .. })
        ));
        assert!(matches!(
            table.parameter_for_length(1.5),
            Err(CurveError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn test_point_line_segment_distance_regions() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(10.0, 0.0);

        let mid = point_line_segment_distance(&Vector2::new(5.0, 3.0), &a, &b);
        assert_eq!(mid.region, SegmentRegion::Middle);
        assert_relative_eq!(mid.distance, 3.0, epsilon = 1e-12);

        let before = point_line_segment_distance(&Vector2::new(-3.0, 4.0), &a, &b);
        assert_eq!(before.region, SegmentRegion::Start);
        assert_relative_eq!(before.distance, 5.0, epsilon = 1e-12);

        let after = point_line_segment_distance(&Vector2::new(13.0, -4.0), &a, &b);
        assert_eq!(after.region, SegmentRegion::End);
        assert_relative_eq!(after.distance, 5.0, epsilon = 1e-12);
    }
}
