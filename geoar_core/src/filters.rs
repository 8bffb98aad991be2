//! Smoothing Filters
//!
//! Simple exponential smoothing for noisy sensor channels:
//! - `LowPassFilter`: scalar exponential moving average
//! - `AngleLowPassFilter`: wraparound-safe smoothing of compass angles
//! - `MovingAveragePosition`: accuracy-weighted smoothing of positions

use nalgebra::Vector3;

/// Scalar exponential low-pass filter.
///
/// `smooth_factor` is the weight kept from the previous output and is
/// expected in `[0, 1)`. This is a convention, not enforced. A factor of
/// zero or below disables the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct LowPassFilter {
    pub smooth_factor: f64,
    last_value: f64,
}

impl LowPassFilter {
    /// Creates a filter whose state starts at zero.
    pub fn new(smooth_factor: f64) -> Self {
        Self {
            smooth_factor,
            last_value: 0.0,
        }
    }

    /// Feeds one sample and returns the filtered value.
    pub fn apply(&mut self, x: f64) -> f64 {
        if self.smooth_factor <= 0.0 {
            return x;
        }

        self.last_value = self.smooth_factor * self.last_value + (1.0 - self.smooth_factor) * x;
        self.last_value
    }

    /// The most recent filtered value.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }
}

/// Low-pass filter for angles in degrees.
///
/// Sine and cosine are smoothed independently and recombined with `atan2`,
/// so crossing 0°/360° does not produce a spurious jump. Output is in
/// `(-180, 180]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleLowPassFilter {
    sin_filter: LowPassFilter,
    cos_filter: LowPassFilter,
}

impl AngleLowPassFilter {
    pub fn new(smooth_factor: f64) -> Self {
        Self {
            sin_filter: LowPassFilter::new(smooth_factor),
            cos_filter: LowPassFilter::new(smooth_factor),
        }
    }

    /// Feeds one angle (degrees) and returns the smoothed angle (degrees).
    pub fn apply(&mut self, angle: f64) -> f64 {
        if self.smooth_factor() <= 0.0 {
            return angle;
        }

        let (s, c) = angle.to_radians().sin_cos();

        let smoothed_sin = self.sin_filter.apply(s);
        let smoothed_cos = self.cos_filter.apply(c);

        smoothed_sin.atan2(smoothed_cos).to_degrees()
    }

    /// Updates both inner filters in lockstep.
    pub fn set_factor(&mut self, factor: f64) {
        self.sin_filter.smooth_factor = factor;
        self.cos_filter.smooth_factor = factor;
    }

    pub fn smooth_factor(&self) -> f64 {
        self.sin_filter.smooth_factor
    }
}

/// Maps any angle in degrees into `[0, 360)`.
pub fn normalized_degrees(value: f64) -> f64 {
    let r = value % 360.0;
    if r < 0.0 {
        // -0.0 and tiny negatives can round to 360.0
        let wrapped = 360.0 + r;
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    } else {
        r
    }
}

/// Accuracy-weighted exponential average of positions.
///
/// Samples with accuracy radius at or below `a_min` get the full `alpha`
/// weight; samples at or beyond `a_max` are ignored; in between, the weight
/// decays exponentially, reaching `cutoff` at `a_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAveragePosition {
    /// Accuracy (m) at or below which a sample gets full weight
    pub a_min: f64,

    /// Accuracy (m) at or above which a sample gets zero weight
    pub a_max: f64,

    /// Relative weight reached at `a_max` by the exponential decay
    pub cutoff: f64,

    /// Maximum blend factor for a single sample
    pub alpha: f64,

    position: Vector3<f64>,
    first: bool,
}

impl Default for MovingAveragePosition {
    fn default() -> Self {
        Self {
            a_min: 2.0,
            a_max: 10.0,
            cutoff: 0.01,
            alpha: 0.25,
            position: Vector3::zeros(),
            first: true,
        }
    }
}

impl MovingAveragePosition {
    pub fn new() -> Self {
        Self::default()
    }

    fn weight(&self, accuracy: f64) -> f64 {
        if accuracy <= self.a_min {
            return 1.0;
        }

        if accuracy >= self.a_max {
            return 0.0;
        }

        let lambda = (1.0 / self.cutoff).ln() / (self.a_max - self.a_min);
        (-lambda * (accuracy - self.a_min)).exp()
    }

    /// Adds a sample. The first sample initializes the average directly.
    pub fn add_entry(&mut self, position: Vector3<f64>, accuracy: f64) {
        if self.first {
            self.position = position;
            self.first = false;
            return;
        }

        let a = self.alpha * self.weight(accuracy);
        self.position = a * position + (1.0 - a) * self.position;
    }

    /// The current averaged position.
    pub fn average(&self) -> Vector3<f64> {
        self.position
    }

    /// Clears the average; the next sample re-initializes it.
    pub fn reset(&mut self) {
        self.first = true;
        self.position = Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Smallest signed difference between two angles, degrees.
    fn angular_delta(a: f64, b: f64) -> f64 {
        let d = (b - a).rem_euclid(360.0);
        if d > 180.0 {
            d - 360.0
        } else {
            d
        }
    }

    #[test]
    fn test_low_pass_passthrough_when_disabled() {
        let mut f = LowPassFilter::new(0.0);
        assert_eq!(f.apply(42.0), 42.0);
        assert_eq!(f.apply(-7.0), -7.0);

        let mut g = LowPassFilter::new(-0.5);
        assert_eq!(g.apply(3.0), 3.0);
    }

    #[test]
    fn test_low_pass_exponential_update() {
        let mut f = LowPassFilter::new(0.5);
        assert_relative_eq!(f.apply(10.0), 5.0);
        assert_relative_eq!(f.apply(10.0), 7.5);
        assert_relative_eq!(f.apply(10.0), 8.75);
        assert_relative_eq!(f.last_value(), 8.75);
    }

    #[test]
    fn test_angle_filter_passthrough_when_disabled() {
        let mut f = AngleLowPassFilter::new(0.0);
        assert_eq!(f.apply(359.0), 359.0);
    }

    #[test]
    fn test_angle_filter_wraparound_has_no_spurious_jump() {
        let mut f = AngleLowPassFilter::new(0.5);
        let inputs = [350.0, 355.0, 2.0, 5.0];

        let largest_step = inputs
            .windows(2)
            .map(|w| angular_delta(w[0], w[1]).abs())
            .fold(0.0, f64::max);

        let mut previous_output = f.apply(inputs[0]);
        for &angle in &inputs[1..] {
            let output = f.apply(angle);
            let output_delta = angular_delta(previous_output, output).abs();

            assert!(
                output_delta <= largest_step,
                "output jumped {output_delta}° but no input step exceeds {largest_step}°"
            );
            previous_output = output;
        }
    }

    #[test]
    fn test_angle_filter_converges_across_north() {
        let mut f = AngleLowPassFilter::new(0.8);
        let mut out = 0.0;
        for _ in 0..200 {
            out = f.apply(358.0);
        }
        assert_relative_eq!(normalized_degrees(out), 358.0, epsilon = 1e-6);
    }

    #[test]
    fn test_angle_filter_set_factor_lockstep() {
        let mut f = AngleLowPassFilter::new(0.9);
        f.set_factor(0.0);
        assert_eq!(f.smooth_factor(), 0.0);
        assert_eq!(f.apply(123.0), 123.0);
    }

    #[test]
    fn test_normalized_degrees() {
        assert_relative_eq!(normalized_degrees(370.0), 10.0);
        assert_relative_eq!(normalized_degrees(-10.0), 350.0);
        assert_relative_eq!(normalized_degrees(-360.0), 0.0);
        assert_relative_eq!(normalized_degrees(0.0), 0.0);
        assert!(normalized_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_moving_average_weights() {
        let mut m = MovingAveragePosition::new();
        m.add_entry(Vector3::new(0.0, 0.0, 0.0), 1.0);
        assert_eq!(m.average(), Vector3::zeros());

        // Accurate sample moves by alpha
        m.add_entry(Vector3::new(4.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(m.average().x, 1.0);

        // Inaccurate sample is ignored
        m.add_entry(Vector3::new(100.0, 0.0, 0.0), 50.0);
        assert_relative_eq!(m.average().x, 1.0);

        // Mid accuracy blends with less than full weight
        m.add_entry(Vector3::new(5.0, 0.0, 0.0), 6.0);
        assert!(m.average().x > 1.0 && m.average().x < 2.0);
    }

    #[test]
    fn test_moving_average_reset() {
        let mut m = MovingAveragePosition::new();
        m.add_entry(Vector3::new(1.0, 2.0, 3.0), 1.0);
        m.reset();
        m.add_entry(Vector3::new(9.0, 9.0, 9.0), 100.0);
        assert_eq!(m.average(), Vector3::new(9.0, 9.0, 9.0));
    }
}
