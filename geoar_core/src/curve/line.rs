use nalgebra::Vector3;

use super::{Curve, CurvePoint};
use crate::error::CurveError;

/// A straight segment between two control points.
///
/// All queries are closed form; the sample size passed to
/// `estimate_length` is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    p0: Vector3<f64>,
    p1: Vector3<f64>,
    distance: f64,
}

impl Line {
    pub fn new(p0: Vector3<f64>, p1: Vector3<f64>) -> Self {
        Self {
            p0,
            p1,
            distance: (p1 - p0).norm(),
        }
    }

    pub fn p0(&self) -> Vector3<f64> {
        self.p0
    }

    pub fn p1(&self) -> Vector3<f64> {
        self.p1
    }

    pub fn set_p0(&mut self, p0: Vector3<f64>) {
        self.p0 = p0;
        self.distance = (self.p1 - self.p0).norm();
    }

    pub fn set_p1(&mut self, p1: Vector3<f64>) {
        self.p1 = p1;
        self.distance = (self.p1 - self.p0).norm();
    }

    /// Unit direction from `p0` to `p1`. NaN for a zero-length line.
    pub fn tangent(&self) -> Vector3<f64> {
        (self.p1 - self.p0) / self.distance
    }
}

impl Curve for Line {
    fn point(&self, u: f64) -> Vector3<f64> {
        self.p0 * (1.0 - u) + self.p1 * u
    }

    fn point_and_tangent(&self, u: f64) -> CurvePoint {
        CurvePoint {
            point: self.point(u),
            tangent: self.tangent(),
        }
    }

    fn estimate_length(&mut self, _n: usize) -> f64 {
        self.distance
    }

    fn length(&self) -> f64 {
        self.distance
    }

    fn parameter_for_length(&self, s: f64) -> Result<f64, CurveError> {
        if !(0.0..=self.distance).contains(&s) {
            return Err(CurveError::LengthOutOfRange {
                length: s,
                total: self.distance,
            });
        }

        if self.distance == 0.0 {
            return Ok(0.0);
        }

        Ok(s / self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_point_and_length() {
        let mut line = Line::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(line.estimate_length(100), 5.0);
        assert_relative_eq!(line.point(0.5), Vector3::new(1.5, 2.0, 0.0));

        let at = line.point_and_tangent_at_length(2.5).unwrap();
        assert_relative_eq!(at.point, Vector3::new(1.5, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(at.tangent, Vector3::new(0.6, 0.8, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_line_length_out_of_range() {
        let line = Line::new(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        assert!(line.point_at_length(1.5).is_err());
        assert!(line.point_at_length(-0.5).is_err());
        assert!(line.point_at_length(1.0).is_ok());
    }

    #[test]
    fn test_line_setters_recompute_distance() {
        let mut line = Line::new(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        line.set_p1(Vector3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(line.length(), 2.0);
        line.set_p0(Vector3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(line.length(), 3.0);
    }

    #[test]
    fn test_line_sample_includes_endpoints() {
        let line = Line::new(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        let sample = line.sample(3);
        assert_eq!(sample.len(), 5);
        assert_eq!(sample[0], Vector3::zeros());
        assert_relative_eq!(sample[4], Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }
}
