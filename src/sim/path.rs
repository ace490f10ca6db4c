//! Fitted path and the path sampler
//!
//! A `Path` is the dense, immutable-until-next-edit product of the curve
//! fitter. Samples are stored in y-up world space; derivatives are taken with
//! respect to the segment-local spline parameter, which is all curvature and
//! unit tangents need.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position and analytic derivatives at one point of the path
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub position: Vec2,
    pub derivative: Vec2,
    pub second_derivative: Vec2,
}

impl PathSample {
    /// Component-wise linear blend toward `other`
    #[inline]
    pub fn lerp(&self, other: &PathSample, t: f32) -> PathSample {
        PathSample {
            position: self.position.lerp(other.position, t),
            derivative: self.derivative.lerp(other.derivative, t),
            second_derivative: self.second_derivative.lerp(other.second_derivative, t),
        }
    }

    /// Unit tangent, or zero when the derivative is degenerate
    #[inline]
    pub fn tangent(&self) -> Vec2 {
        let len = self.derivative.length();
        if len < crate::consts::DERIVATIVE_EPSILON {
            Vec2::ZERO
        } else {
            self.derivative / len
        }
    }
}

/// Dense samples plus a parallel cumulative arc-length array
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Path {
    samples: Vec<PathSample>,
    arc_lengths: Vec<f32>,
    has_loop: bool,
}

impl Path {
    /// The "no simulation possible" path
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from fitted samples; arc lengths are accumulated chord lengths
    pub(crate) fn from_samples(samples: Vec<PathSample>, has_loop: bool) -> Self {
        let mut arc_lengths = Vec::with_capacity(samples.len());
        let mut total = 0.0;
        for (i, sample) in samples.iter().enumerate() {
            if i > 0 {
                total += sample.position.distance(samples[i - 1].position);
            }
            arc_lengths.push(total);
        }
        Self {
            samples,
            arc_lengths,
            has_loop,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    pub fn arc_lengths(&self) -> &[f32] {
        &self.arc_lengths
    }

    /// Sample positions, for the renderer
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.samples.iter().map(|s| s.position)
    }

    /// Whether the loop heuristic flagged this path
    pub fn has_loop(&self) -> bool {
        self.has_loop
    }

    /// Largest valid path parameter (`sample_count - 1`)
    pub fn max_parameter(&self) -> f32 {
        self.samples.len().saturating_sub(1) as f32
    }

    pub fn total_length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Height of the lowest sample (the potential energy datum)
    pub fn lowest_height(&self) -> f32 {
        self.samples
            .iter()
            .map(|s| s.position.y)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    /// Clamp `parameter` into range and split it into (index, fraction)
    fn locate(&self, parameter: f32) -> (usize, f32) {
        let max = self.max_parameter();
        let p = if parameter.is_nan() {
            0.0
        } else {
            parameter.clamp(0.0, max)
        };
        let index = (p.floor() as usize).min(self.samples.len().saturating_sub(2));
        (index, p - index as f32)
    }

    /// Interpolated position and derivatives at a continuous parameter.
    ///
    /// Near-zero derivatives (cusps) are passed through untouched; callers
    /// that divide by the derivative magnitude must guard for it.
    pub fn sample_at(&self, parameter: f32) -> PathSample {
        match self.samples.len() {
            0 => PathSample::default(),
            1 => self.samples[0],
            _ => {
                let (i, frac) = self.locate(parameter);
                self.samples[i].lerp(&self.samples[i + 1], frac)
            }
        }
    }

    /// Cumulative arc length at a continuous parameter
    pub fn arc_length_at(&self, parameter: f32) -> f32 {
        if self.arc_lengths.len() < 2 {
            return 0.0;
        }
        let (i, frac) = self.locate(parameter);
        let a = self.arc_lengths[i];
        a + (self.arc_lengths[i + 1] - a) * frac
    }

    /// Inverse of `arc_length_at`, clamped to the path ends
    pub fn parameter_at_arc_length(&self, s: f32) -> f32 {
        if self.arc_lengths.len() < 2 {
            return 0.0;
        }
        let total = self.total_length();
        if s.is_nan() || s <= 0.0 {
            return 0.0;
        }
        if s >= total {
            return self.max_parameter();
        }
        // First index whose cumulative length exceeds s
        let upper = self.arc_lengths.partition_point(|&a| a <= s);
        let i = upper.saturating_sub(1).min(self.arc_lengths.len() - 2);
        let a = self.arc_lengths[i];
        let span = self.arc_lengths[i + 1] - a;
        if span <= f32::EPSILON {
            i as f32
        } else {
            i as f32 + (s - a) / span
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(n: usize) -> Path {
        let samples = (0..n)
            .map(|i| PathSample {
                position: Vec2::new(i as f32, 0.0),
                derivative: Vec2::X,
                second_derivative: Vec2::ZERO,
            })
            .collect();
        Path::from_samples(samples, false)
    }

    #[test]
    fn test_sample_at_interpolates() {
        let path = straight(5);
        let s = path.sample_at(2.25);
        assert!((s.position.x - 2.25).abs() < 1e-6);
        assert_eq!(s.derivative, Vec2::X);
    }

    #[test]
    fn test_sample_at_clamps() {
        let path = straight(5);
        assert_eq!(path.sample_at(-3.0).position, Vec2::ZERO);
        assert_eq!(path.sample_at(99.0).position, Vec2::new(4.0, 0.0));
        assert_eq!(path.sample_at(4.0).position, Vec2::new(4.0, 0.0));
        assert_eq!(path.sample_at(f32::NAN).position, Vec2::ZERO);
    }

    #[test]
    fn test_empty_path_is_neutral() {
        let path = Path::empty();
        assert!(path.is_empty());
        assert_eq!(path.max_parameter(), 0.0);
        assert_eq!(path.total_length(), 0.0);
        assert_eq!(path.sample_at(1.0), PathSample::default());
        assert_eq!(path.parameter_at_arc_length(1.0), 0.0);
    }

    #[test]
    fn test_arc_length_inverse() {
        let path = straight(11);
        assert!((path.total_length() - 10.0).abs() < 1e-5);
        assert!((path.arc_length_at(3.5) - 3.5).abs() < 1e-5);
        assert!((path.parameter_at_arc_length(7.25) - 7.25).abs() < 1e-5);
        assert_eq!(path.parameter_at_arc_length(-1.0), 0.0);
        assert_eq!(path.parameter_at_arc_length(50.0), 10.0);
    }

    #[test]
    fn test_degenerate_tangent_is_zero() {
        let sample = PathSample::default();
        assert_eq!(sample.tangent(), Vec2::ZERO);
    }
}
