//! Post-processing of discretized damage distributions.
//!
//! Downstream convolution produces a density sampled on a uniform damage
//! support. This module answers percentile queries against it, resamples
//! it onto a common grid so party members can be compared, and rescales
//! a total-damage support into DPS.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A probability density sampled on a uniformly spaced support.
///
/// Deserialized as produced by the convolution engine; validate with
/// [`Distribution::new`] after reading untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub support: Vec<f64>,
    pub density: Vec<f64>,
}

impl Distribution {
    /// Validates shape: matching lengths, at least two points, finite
    /// values, and a strictly increasing support.
    pub fn new(support: Vec<f64>, density: Vec<f64>) -> Result<Self, AnalysisError> {
        if support.len() != density.len() || support.len() < 2 {
            return Err(AnalysisError::InvalidDistribution {
                context: "support and density must share a length of at least 2",
            });
        }
        if support.iter().chain(&density).any(|x| !x.is_finite()) {
            return Err(AnalysisError::InvalidDistribution {
                context: "support and density must be finite",
            });
        }
        if support.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::DegenerateSupport {
                context: "support must be strictly increasing",
            });
        }
        Ok(Self { support, density })
    }

    fn dx(&self) -> f64 {
        self.support[1] - self.support[0]
    }

    /// Percentile (0..=100) of `value` under this distribution: the CDF
    /// evaluated at the support point nearest `value`.
    pub fn percentile_of_value(&self, value: f64) -> f64 {
        let cdf = self.cdf();
        let nearest = self
            .support
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - value).abs().total_cmp(&(*b - value).abs())
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        cdf[nearest] * 100.0
    }

    /// Damage value at percentile `q` (0..=1): the support point whose
    /// cumulative probability is nearest `q`.
    pub fn value_at_percentile(&self, q: f64) -> f64 {
        let cdf = self.cdf();
        let idx = cdf
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - q).abs().total_cmp(&(*b - q).abs()))
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.support[idx]
    }

    fn cdf(&self) -> Vec<f64> {
        let dx = self.dx();
        let mut acc = 0.0;
        self.density
            .iter()
            .map(|&d| {
                acc += d * dx;
                acc
            })
            .collect()
    }

    /// Resamples onto `n` evenly spaced points spanning the same range,
    /// interpolating the density linearly. Used to put every party
    /// member's distribution on one shared grid before convolution.
    pub fn resample(&self, n: usize) -> Result<Self, AnalysisError> {
        if n < 2 {
            return Err(AnalysisError::InvalidDistribution {
                context: "resample requires at least 2 points",
            });
        }
        let lo = self.support[0];
        let hi = self.support[self.support.len() - 1];
        let step = (hi - lo) / (n - 1) as f64;
        let support: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
        let density = support.iter().map(|&x| self.interp(x)).collect();
        Self::new(support, density)
    }

    /// Linear interpolation of the density at `x`, clamped to the ends.
    fn interp(&self, x: f64) -> f64 {
        if x <= self.support[0] {
            return self.density[0];
        }
        if x >= self.support[self.support.len() - 1] {
            return self.density[self.density.len() - 1];
        }
        // partition_point: first index with support > x.
        let hi = self.support.partition_point(|&s| s <= x);
        let lo = hi - 1;
        let w = (x - self.support[lo]) / (self.support[hi] - self.support[lo]);
        self.density[lo] * (1.0 - w) + self.density[hi] * w
    }

    /// Converts a total-damage support into DPS by dividing through by
    /// the active fight time, renormalizing to unit area by trapezoidal
    /// integration.
    pub fn rescale_time(&self, seconds: f64) -> Result<Self, AnalysisError> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(AnalysisError::InvalidDistribution {
                context: "time basis must be positive and finite",
            });
        }
        let support: Vec<f64> = self.support.iter().map(|s| s / seconds).collect();
        let area = trapezoid(&support, &self.density);
        if area <= 0.0 {
            return Err(AnalysisError::InvalidDistribution {
                context: "density has no mass after rescaling",
            });
        }
        let density = self.density.iter().map(|d| d / area).collect();
        Self::new(support, density)
    }
}

fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform density on [0, 100] with 101 points.
    fn uniform() -> Distribution {
        let support: Vec<f64> = (0..=100).map(f64::from).collect();
        let density = vec![0.01; 101];
        Distribution::new(support, density).unwrap()
    }

    #[test]
    fn percentile_roundtrip_on_uniform() {
        let d = uniform();
        let p = d.percentile_of_value(50.0);
        assert!((p - 50.0).abs() < 1.5, "got {p}");
        let v = d.value_at_percentile(0.5);
        assert!((v - 50.0).abs() < 1.5, "got {v}");
    }

    #[test]
    fn value_at_percentile_takes_nearest_cumulative_mass() {
        // CDF is [0.30, 0.45, 1.00]; 0.45 sits closest to q = 0.5, so the
        // lookup must settle on the middle point rather than overshoot to
        // the first point at or above q.
        let d = Distribution::new(vec![0.0, 1.0, 2.0], vec![0.30, 0.15, 0.55]).unwrap();
        assert_eq!(d.value_at_percentile(0.5), 1.0);
    }

    #[test]
    fn percentile_clamps_outside_support() {
        let d = uniform();
        assert!(d.percentile_of_value(-10.0) < 2.0);
        assert!(d.percentile_of_value(500.0) > 98.0);
    }

    #[test]
    fn resample_preserves_uniform_density() {
        let d = uniform();
        let r = d.resample(51).unwrap();
        assert_eq!(r.support.len(), 51);
        assert_eq!(r.support[0], 0.0);
        assert_eq!(*r.support.last().unwrap(), 100.0);
        for v in &r.density {
            assert!((v - 0.01).abs() < 1e-12);
        }
    }

    #[test]
    fn rescale_time_divides_support_and_renormalizes() {
        let d = uniform();
        let r = d.rescale_time(10.0).unwrap();
        assert!((r.support.last().unwrap() - 10.0).abs() < 1e-12);
        let area = super::trapezoid(&r.support, &r.density);
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn deserializes_engine_output() {
        let raw = r#"{"support": [0.0, 1.0, 2.0], "density": [0.0, 1.0, 0.0]}"#;
        let d: Distribution = serde_json::from_str(raw).unwrap();
        let d = Distribution::new(d.support, d.density).unwrap();
        assert!((d.value_at_percentile(0.5) - 1.0).abs() < 1.1);
    }

    #[test]
    fn shape_errors_are_rejected() {
        assert!(Distribution::new(vec![0.0], vec![1.0]).is_err());
        assert!(Distribution::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(Distribution::new(vec![0.0, 0.0], vec![0.5, 0.5]).is_err());
        assert!(Distribution::new(vec![0.0, f64::NAN], vec![0.5, 0.5]).is_err());
        assert!(uniform().rescale_time(0.0).is_err());
    }
}
