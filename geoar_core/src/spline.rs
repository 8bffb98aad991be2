//! Splines: chains of curve segments with a cumulative arc-length table.
//!
//! A spline over `N` control points holds `N - 1` segments and a table
//! where `lengths[i]` is the spline length from the start through the end
//! of segment `i`. Arc-length queries clamp to `[0, length]`, so unlike the
//! single-curve queries they never fail.

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::curve::{CatmullRomCurve, Curve, CurvePoint, Line, DEFAULT_SAMPLE_SIZE};
use crate::error::CurveError;

/// Centripetal parametrization.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Interpolation used between consecutive control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplineType {
    #[default]
    CatmullRom,
    Linear,
}

/// A spline queried by arc length.
pub trait Spline: fmt::Debug {
    /// The interpolated control points.
    fn points(&self) -> &[Vector3<f64>];

    /// Total estimated length.
    fn length(&self) -> f64;

    /// Cumulative length through the end of each segment.
    fn lengths(&self) -> &[f64];

    fn segment_count(&self) -> usize {
        self.lengths().len()
    }

    /// Length of each individual segment.
    fn segment_lengths(&self) -> Vec<f64>;

    /// Rebuilds all segments, estimating each length with `n` samples.
    fn calculate_segments(&mut self, n: usize);

    /// Spline position at arc length `s`, clamped to `[0, length]`.
    fn point_at_arc_length(&self, s: f64) -> Vector3<f64>;

    /// Position and tangent at arc length `s`, clamped to `[0, length]`.
    fn point_and_tangent_at_arc_length(&self, s: f64) -> CurvePoint;

    /// `n + 2` points equidistant in arc length, both ends included.
    fn sample_points(&self, n: usize) -> Vec<Vector3<f64>> {
        let delta = self.length() / (n as f64 + 1.0);
        (0..n + 2)
            .map(|i| self.point_at_arc_length(i as f64 * delta))
            .collect()
    }
}

/// Segments plus their cumulative length table.
#[derive(Debug, Clone, PartialEq)]
struct SegmentChain<C> {
    segments: Vec<C>,
    lengths: Vec<f64>,
}

impl<C: Curve> SegmentChain<C> {
    fn build(mut segments: Vec<C>, n: usize) -> Self {
        let mut lengths = Vec::with_capacity(segments.len());

        let mut total = 0.0;
        for segment in segments.iter_mut() {
            total += segment.estimate_length(n);
            lengths.push(total);
        }

        Self { segments, lengths }
    }

    fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    fn segment_lengths(&self) -> Vec<f64> {
        self.segments.iter().map(|s| s.length()).collect()
    }

    /// Segment index and local arc length for a global arc length.
    fn locate(&self, s: f64) -> Option<(usize, f64)> {
        let s = s.max(0.0).min(self.length());

        let index = self.lengths.iter().position(|&l| s <= l)?;
        let offset = if index == 0 { 0.0 } else { self.lengths[index - 1] };

        let segment = &self.segments[index];
        let local = (s - offset).max(0.0).min(segment.length());

        Some((index, local))
    }

    fn point_at(&self, s: f64) -> Vector3<f64> {
        let Some(last) = self.segments.last() else {
            return Vector3::zeros();
        };

        match self.locate(s) {
            Some((i, local)) => {
                let segment = &self.segments[i];
                segment
                    .point_at_length(local)
                    .unwrap_or_else(|_| segment.point(1.0))
            }
            None => {
                trace!(s, "arc length past last segment, using spline end");
                last.point(1.0)
            }
        }
    }

    fn point_and_tangent_at(&self, s: f64) -> CurvePoint {
        let Some(last) = self.segments.last() else {
            return CurvePoint {
                point: Vector3::zeros(),
                tangent: Vector3::zeros(),
            };
        };

        match self.locate(s) {
            Some((i, local)) => {
                let segment = &self.segments[i];
                segment
                    .point_and_tangent_at_length(local)
                    .unwrap_or_else(|_| segment.point_and_tangent(1.0))
            }
            None => last.point_and_tangent(1.0),
        }
    }
}

fn check_points(points: &[Vector3<f64>]) -> Result<(), CurveError> {
    if points.len() < 2 {
        return Err(CurveError::NotEnoughPoints(points.len()));
    }
    Ok(())
}

/// Open-ended Catmull-Rom spline through every control point.
///
/// The outer handles of the first and last segments are reflections of
/// the neighbouring point: `2·P0 − P1` and `2·Pn − Pn-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomSpline {
    points: Vec<Vector3<f64>>,
    alpha: f64,
    sample_size: usize,
    chain: SegmentChain<CatmullRomCurve>,
}

impl CatmullRomSpline {
    /// Builds the spline, estimating each segment with `n` samples.
    pub fn new(points: &[Vector3<f64>], n: usize, alpha: f64) -> Result<Self, CurveError> {
        check_points(points)?;

        let points = points.to_vec();
        let chain = Self::build_chain(&points, n, alpha);

        Ok(Self {
            points,
            alpha,
            sample_size: n,
            chain,
        })
    }

    fn build_chain(points: &[Vector3<f64>], n: usize, alpha: f64) -> SegmentChain<CatmullRomCurve> {
        let count = points.len() - 1;

        let start_handle = 2.0 * points[0] - points[1];
        let end_handle = 2.0 * points[count] - points[count - 1];

        let segments = (0..count)
            .map(|i| {
                let before = if i == 0 { start_handle } else { points[i - 1] };
                let after = if i + 1 == count { end_handle } else { points[i + 2] };

                CatmullRomCurve::with_sample_size(before, points[i], points[i + 1], after, alpha, n)
            })
            .collect();

        SegmentChain::build(segments, n)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Changes the tension and rebuilds every segment.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
        self.chain = Self::build_chain(&self.points, self.sample_size, alpha);
    }

    pub fn segments(&self) -> &[CatmullRomCurve] {
        &self.chain.segments
    }
}

impl Spline for CatmullRomSpline {
    fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    fn length(&self) -> f64 {
        self.chain.length()
    }

    fn lengths(&self) -> &[f64] {
        &self.chain.lengths
    }

    fn segment_lengths(&self) -> Vec<f64> {
        self.chain.segment_lengths()
    }

    fn calculate_segments(&mut self, n: usize) {
        self.sample_size = n;
        self.chain = Self::build_chain(&self.points, n, self.alpha);
    }

    fn point_at_arc_length(&self, s: f64) -> Vector3<f64> {
        self.chain.point_at(s)
    }

    fn point_and_tangent_at_arc_length(&self, s: f64) -> CurvePoint {
        self.chain.point_and_tangent_at(s)
    }
}

/// Polyline through every control point.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSpline {
    points: Vec<Vector3<f64>>,
    chain: SegmentChain<Line>,
}

impl LinearSpline {
    pub fn new(points: &[Vector3<f64>]) -> Result<Self, CurveError> {
        check_points(points)?;

        let points = points.to_vec();
        let chain = Self::build_chain(&points, DEFAULT_SAMPLE_SIZE);

        Ok(Self { points, chain })
    }

    fn build_chain(points: &[Vector3<f64>], n: usize) -> SegmentChain<Line> {
        let segments = points.windows(2).map(|w| Line::new(w[0], w[1])).collect();
        SegmentChain::build(segments, n)
    }

    pub fn segments(&self) -> &[Line] {
        &self.chain.segments
    }
}

impl Spline for LinearSpline {
    fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    fn length(&self) -> f64 {
        self.chain.length()
    }

    fn lengths(&self) -> &[f64] {
        &self.chain.lengths
    }

    fn segment_lengths(&self) -> Vec<f64> {
        self.chain.segment_lengths()
    }

    fn calculate_segments(&mut self, n: usize) {
        self.chain = Self::build_chain(&self.points, n);
    }

    fn point_at_arc_length(&self, s: f64) -> Vector3<f64> {
        self.chain.point_at(s)
    }

    fn point_and_tangent_at_arc_length(&self, s: f64) -> CurvePoint {
        self.chain.point_and_tangent_at(s)
    }
}

/// Builds a spline of the requested kind. `alpha` only affects Catmull-Rom.
pub fn build_spline(
    kind: SplineType,
    points: &[Vector3<f64>],
    n: usize,
    alpha: f64,
) -> Result<Box<dyn Spline + Send + Sync>, CurveError> {
    Ok(match kind {
        SplineType::CatmullRom => Box::new(CatmullRomSpline::new(points, n, alpha)?),
        SplineType::Linear => {
            let mut spline = LinearSpline::new(points)?;
            spline.calculate_segments(n);
            Box::new(spline)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    fn colinear() -> Vec<Vector3<f64>> {
        (0..4).map(|i| Vector3::new(i as f64, 0.0, 0.0)).collect()
    }

    fn zigzag() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 1.0),
            Vector3::new(4.0, 0.0, 5.0),
            Vector3::new(9.0, 2.0, 4.0),
            Vector3::new(10.0, 0.0, 12.0),
        ]
    }

    #[test]
    fn test_colinear_catmull_rom_is_straight() {
        let spline = CatmullRomSpline::new(&colinear(), 100, 0.5).unwrap();

        assert_eq!(spline.segment_count(), 3);
        assert_relative_eq!(spline.length(), 3.0, epsilon = 1e-9);

        for p in spline.sample_points(50) {
            assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_endpoints_are_exact() {
        let points = zigzag();
        let spline = CatmullRomSpline::new(&points, 100, 0.5).unwrap();

        assert_relative_eq!(spline.point_at_arc_length(0.0), points[0], epsilon = 1e-9);
        assert_relative_eq!(spline.point_at_arc_length(spline.length()), points[4], epsilon = 1e-9);
    }

    #[test]
    fn test_arc_length_is_clamped() {
        let points = zigzag();
        let spline = CatmullRomSpline::new(&points, 100, 0.5).unwrap();

        assert_relative_eq!(spline.point_at_arc_length(-10.0), points[0], epsilon = 1e-9);
        assert_relative_eq!(spline.point_at_arc_length(1e9), points[4], epsilon = 1e-9);
    }

    #[test]
    fn test_interior_control_points_at_segment_boundaries() {
        let points = zigzag();
        let spline = CatmullRomSpline::new(&points, 200, 0.5).unwrap();

        for (i, &l) in spline.lengths().iter().enumerate() {
            assert_relative_eq!(spline.point_at_arc_length(l), points[i + 1], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_not_enough_points() {
        let one = [Vector3::new(1.0, 2.0, 3.0)];
        assert_eq!(CatmullRomSpline::new(&one, 10, 0.5).unwrap_err(), CurveError::NotEnoughPoints(1));
        assert_eq!(LinearSpline::new(&[]).unwrap_err(), CurveError::NotEnoughPoints(0));
    }

    #[test]
    fn test_build_spline_errors_are_inspectable() {
        let one = [Vector3::new(1.0, 2.0, 3.0)];
        for kind in [SplineType::CatmullRom, SplineType::Linear] {
            let err = build_spline(kind, &one, 10, DEFAULT_ALPHA).unwrap_err();
            assert_eq!(err, CurveError::NotEnoughPoints(1));
        }

        let spline = build_spline(SplineType::Linear, &colinear(), 10, DEFAULT_ALPHA).unwrap();
        assert!(format!("{:?}", spline).starts_with("LinearSpline"));
    }

    #[test]
    fn test_two_point_spline_uses_both_handles() {
        let points = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0)];
        let spline = CatmullRomSpline::new(&points, 50, 0.5).unwrap();

        assert_eq!(spline.segment_count(), 1);
        assert_relative_eq!(spline.length(), 2.0, epsilon = 1e-9);

        let mid = spline.point_and_tangent_at_arc_length(1.0);
        assert_relative_eq!(mid.point, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert!(mid.tangent.z > 0.0);
    }

    #[test]
    fn test_linear_spline() {
        let points = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 4.0),
        ];
        let spline = LinearSpline::new(&points).unwrap();

        assert_eq!(spline.lengths(), &[3.0, 7.0]);
        assert_relative_eq!(spline.point_at_arc_length(5.0), Vector3::new(3.0, 0.0, 2.0), epsilon = 1e-12);

        let at = spline.point_and_tangent_at_arc_length(1.5);
        assert_relative_eq!(at.tangent, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_set_alpha_rebuilds_segments() {
        let points = zigzag();
        let mut spline = CatmullRomSpline::new(&points, 100, 0.5).unwrap();
        let centripetal = spline.length();

        spline.set_alpha(0.0);
        assert_eq!(spline.alpha(), 0.0);
        assert!(spline.segments().iter().all(|s| s.alpha() == 0.0));
        assert!((spline.length() - centripetal).abs() > 1e-9);
        assert_relative_eq!(*spline.lengths().last().unwrap(), spline.length());
    }

    #[test]
    fn test_sample_points_are_equidistant() {
        let points = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)];
        let spline = LinearSpline::new(&points).unwrap();

        let sample = spline.sample_points(3);
        assert_eq!(sample.len(), 5);
        for (i, p) in sample.iter().enumerate() {
            assert_relative_eq!(p.x, 2.5 * i as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_build_spline_dispatch() {
        let points = zigzag();

        let linear = build_spline(SplineType::Linear, &points, 10, DEFAULT_ALPHA).unwrap();
        let curved = build_spline(SplineType::CatmullRom, &points, 10, DEFAULT_ALPHA).unwrap();

        assert_eq!(linear.segment_count(), 4);
        assert_eq!(curved.segment_count(), 4);
        assert!(curved.length() > linear.length());
    }

    fn distinct_points() -> impl Strategy<Value = Vec<Vector3<f64>>> {
        // Unit offsets along x guarantee consecutive points never coincide.
        prop::collection::vec((-50.0..50.0f64, -50.0..50.0f64), 2..8).prop_map(|offsets| {
            offsets
                .into_iter()
                .enumerate()
                .map(|(i, (y, z))| Vector3::new(i as f64 * 10.0 + 1.0, y, z))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_length_is_sum_of_segments(points in distinct_points(), alpha in 0.0..1.0f64) {
            let spline = CatmullRomSpline::new(&points, 50, alpha).unwrap();

            let sum: f64 = spline.segment_lengths().iter().sum();
            prop_assert!((sum - spline.length()).abs() < 1e-9 * spline.length().max(1.0));
            prop_assert_eq!(spline.lengths().len(), points.len() - 1);
            prop_assert_eq!(*spline.lengths().last().unwrap(), spline.length());
            prop_assert!(spline.lengths().windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
