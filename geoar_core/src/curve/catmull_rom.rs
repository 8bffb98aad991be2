use nalgebra::Vector3;

use super::{ArcLengthTable, Curve, CurvePoint, DEFAULT_SAMPLE_SIZE};
use crate::error::CurveError;

/// A Catmull-Rom curve segment interpolating `p1` to `p2`.
///
/// `p0` and `p3` shape the tangents at the ends. Knots are spaced by
/// `‖Pᵢ₊₁ − Pᵢ‖^alpha`: `alpha = 0` is the uniform parametrization,
/// `0.5` centripetal and `1` chordal.
///
/// Coincident consecutive control points make a knot interval zero and the
/// evaluation divides by it; such curves produce NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve {
    p0: Vector3<f64>,
    p1: Vector3<f64>,
    p2: Vector3<f64>,
    p3: Vector3<f64>,

    alpha: f64,

    t0: f64,
    t1: f64,
    t2: f64,
    t3: f64,

    /// Sample resolution the arc-length table was built with
    sample_size: usize,

    table: ArcLengthTable,
}

/// Linear blend of `a` and `b` over the knot interval `[ta, tb]`.
fn blend(t: f64, ta: f64, tb: f64, a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a * ((tb - t) / (tb - ta)) + b * ((t - ta) / (tb - ta))
}

impl CatmullRomCurve {
    pub fn new(
        p0: Vector3<f64>,
        p1: Vector3<f64>,
        p2: Vector3<f64>,
        p3: Vector3<f64>,
        alpha: f64,
    ) -> Self {
        Self::with_sample_size(p0, p1, p2, p3, alpha, DEFAULT_SAMPLE_SIZE)
    }

    /// Builds the curve with an explicit arc-length sample resolution.
    pub fn with_sample_size(
        p0: Vector3<f64>,
        p1: Vector3<f64>,
        p2: Vector3<f64>,
        p3: Vector3<f64>,
        alpha: f64,
        sample_size: usize,
    ) -> Self {
        let mut curve = Self {
            p0,
            p1,
            p2,
            p3,
            alpha,
            t0: 0.0,
            t1: 0.0,
            t2: 0.0,
            t3: 0.0,
            sample_size,
            table: ArcLengthTable::default(),
        };

        curve.recalculate();
        curve
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
        self.recalculate();
    }

    pub fn control_points(&self) -> [Vector3<f64>; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// Replaces control point `index` (0..=3). Other indices are ignored.
    pub fn set_control_point(&mut self, index: usize, p: Vector3<f64>) {
        match index {
            0 => self.p0 = p,
            1 => self.p1 = p,
            2 => self.p2 = p,
            3 => self.p3 = p,
            _ => return,
        }
        self.recalculate();
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn t1(&self) -> f64 {
        self.t1
    }

    pub fn t2(&self) -> f64 {
        self.t2
    }

    pub fn t3(&self) -> f64 {
        self.t3
    }

    fn recalculate(&mut self) {
        self.calculate_knots();
        self.table = ArcLengthTable::build(|u| self.point(u), self.sample_size);
    }

    fn calculate_knots(&mut self) {
        let x = self.alpha * 0.5;

        self.t0 = 0.0;
        self.t1 = self.t0 + (self.p1 - self.p0).norm_squared().powf(x);
        self.t2 = self.t1 + (self.p2 - self.p1).norm_squared().powf(x);
        self.t3 = self.t2 + (self.p3 - self.p2).norm_squared().powf(x);
    }

    /// Maps `u ∈ [0, 1]` onto the knot interval `[t1, t2]`.
    fn knot_parameter(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        self.t1 * (1.0 - u) + self.t2 * u
    }
}

impl Curve for CatmullRomCurve {
    fn point(&self, u: f64) -> Vector3<f64> {
        let t = self.knot_parameter(u);
        let (t0, t1, t2, t3) = (self.t0, self.t1, self.t2, self.t3);

        let a1 = blend(t, t0, t1, &self.p0, &self.p1);
        let a2 = blend(t, t1, t2, &self.p1, &self.p2);
        let a3 = blend(t, t2, t3, &self.p2, &self.p3);

        let b1 = blend(t, t0, t2, &a1, &a2);
        let b2 = blend(t, t1, t3, &a2, &a3);

        blend(t, t1, t2, &b1, &b2)
    }

    /// Position and derivative with respect to the knot parameter `t`.
    ///
    /// Each blend level `x = w·l + (1−w)·r` differentiates to
    /// `w·l' + (1−w)·r' + (r − l)/(tb − ta)`.
    fn point_and_tangent(&self, u: f64) -> CurvePoint {
        let t = self.knot_parameter(u);
        let (t0, t1, t2, t3) = (self.t0, self.t1, self.t2, self.t3);

        let a1 = blend(t, t0, t1, &self.p0, &self.p1);
        let a2 = blend(t, t1, t2, &self.p1, &self.p2);
        let a3 = blend(t, t2, t3, &self.p2, &self.p3);

        let b1 = blend(t, t0, t2, &a1, &a2);
        let b2 = blend(t, t1, t3, &a2, &a3);

        let c = blend(t, t1, t2, &b1, &b2);

        let da1 = (self.p1 - self.p0) / (t1 - t0);
        let da2 = (self.p2 - self.p1) / (t2 - t1);
        let da3 = (self.p3 - self.p2) / (t3 - t2);

        let db1 = blend(t, t0, t2, &da1, &da2) + (a2 - a1) / (t2 - t0);
        let db2 = blend(t, t1, t3, &da2, &da3) + (a3 - a2) / (t3 - t1);

        let dc = blend(t, t1, t2, &db1, &db2) + (b2 - b1) / (t2 - t1);

        CurvePoint {
            point: c,
            tangent: dc,
        }
    }

    fn estimate_length(&mut self, n: usize) -> f64 {
        if n != self.sample_size {
            self.sample_size = n;
            self.table = ArcLengthTable::build(|u| self.point(u), n);
        }

        self.table.total()
    }

    fn length(&self) -> f64 {
        self.table.total()
    }

    fn parameter_for_length(&self, s: f64) -> Result<f64, CurveError> {
        self.table.parameter_for_length(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z)
    }

    fn arc() -> CatmullRomCurve {
        CatmullRomCurve::new(v(-1.0, 0.0, 0.0), v(0.0, 0.0, 0.0), v(1.0, 1.0, 0.0), v(1.0, 3.0, 0.0), 0.5)
    }

    #[test]
    fn test_interpolates_inner_control_points() {
        let curve = arc();
        assert_relative_eq!(curve.point(0.0), v(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(curve.point(1.0), v(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_parameter_is_clamped() {
        let curve = arc();
        assert_relative_eq!(curve.point(-3.0), curve.point(0.0), epsilon = 1e-12);
        assert_relative_eq!(curve.point(7.0), curve.point(1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_knots_centripetal() {
        let curve = CatmullRomCurve::new(v(0.0, 0.0, 0.0), v(4.0, 0.0, 0.0), v(4.0, 9.0, 0.0), v(4.0, 10.0, 0.0), 0.5);
        assert_relative_eq!(curve.t0(), 0.0);
        assert_relative_eq!(curve.t1(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(curve.t2(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(curve.t3(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_analytic_tangent_matches_finite_difference() {
        let curve = arc();
        let h = 1e-6;

        for &u in &[0.1, 0.35, 0.5, 0.8] {
            let analytic = curve.point_and_tangent(u).tangent;

            // d/dt = d/du / (t2 - t1)
            let numeric = (curve.point(u + h) - curve.point(u - h)) / (2.0 * h) / (curve.t2() - curve.t1());

            assert_relative_eq!(analytic, numeric, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_point_and_tangent_point_matches_point() {
        let curve = arc();
        for &u in &[0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_relative_eq!(curve.point_and_tangent(u).point, curve.point(u), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_length_bounds_and_cache() {
        let mut curve = arc();
        let chord = 2f64.sqrt();

        let coarse = curve.estimate_length(4);
        let fine = curve.estimate_length(200);

        assert!(coarse >= chord - 1e-12);
        assert!(fine >= coarse - 1e-12);
        assert_relative_eq!(curve.estimate_length(200), fine);
        assert_relative_eq!(curve.length(), fine);
    }

    #[test]
    fn test_point_at_length_endpoints_and_out_of_range() {
        let curve = arc();
        let total = curve.length();

        assert_relative_eq!(curve.point_at_length(0.0).unwrap(), v(0.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(curve.point_at_length(total).unwrap(), v(1.0, 1.0, 0.0), epsilon = 1e-9);

        assert!(matches!(
            curve.point_at_length(total + 0.5),
            Err(CurveError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn test_set_alpha_recomputes() {
        let mut curve = CatmullRomCurve::new(v(0.0, 0.0, 0.0), v(4.0, 0.0, 0.0), v(4.0, 9.0, 0.0), v(4.0, 10.0, 0.0), 0.5);
        let before = curve.length();

        curve.set_alpha(0.0);
        assert_relative_eq!(curve.t1(), 1.0);
        assert_relative_eq!(curve.t2(), 2.0);
        assert!((curve.length() - before).abs() > 1e-6);
    }

    #[test]
    fn test_set_control_point_recomputes() {
        let mut curve = arc();
        curve.set_control_point(2, v(2.0, 0.0, 0.0));
        assert_relative_eq!(curve.point(1.0), v(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(curve.control_points()[2], v(2.0, 0.0, 0.0));
    }
}
