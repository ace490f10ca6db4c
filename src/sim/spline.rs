//! Curve fitter: uniform Catmull-Rom through the control points
//!
//! Each segment between points `i` and `i+1` is a cubic in a local parameter
//! `t ∈ [0, 1]`, shaped by the flanking points `i-1` and `i+2` (repeated at the
//! ends). First and second derivatives come from the analytic derivative of the
//! same basis, so curvature agrees with the rendered curve.

use glam::Vec2;

use super::forces::curvature;
use super::path::{Path, PathSample};
use super::track::ControlPoint;
use crate::consts::{
    LOOP_CURVATURE_THRESHOLD, LOOP_NEIGHBOR_SPAN, MIN_CONTROL_POINTS, PATH_SAMPLE_BUDGET,
};
use crate::track_to_world;

/// Polynomial coefficients of one Catmull-Rom segment: `q(t) = c0 + c1 t + c2 t² + c3 t³`
#[derive(Debug, Clone, Copy)]
struct Segment {
    c0: Vec2,
    c1: Vec2,
    c2: Vec2,
    c3: Vec2,
}

impl Segment {
    fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self {
            c0: p1,
            c1: 0.5 * (p2 - p0),
            c2: 0.5 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3),
            c3: 0.5 * (-p0 + 3.0 * p1 - 3.0 * p2 + p3),
        }
    }

    fn eval(&self, t: f32) -> PathSample {
        let t2 = t * t;
        PathSample {
            position: self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * (t2 * t),
            derivative: self.c1 + self.c2 * (2.0 * t) + self.c3 * (3.0 * t2),
            second_derivative: self.c2 * 2.0 + self.c3 * (6.0 * t),
        }
    }
}

/// Samples per segment for a track with `segments` segments
pub fn samples_per_segment(segments: usize) -> usize {
    (PATH_SAMPLE_BUDGET / segments.max(1)).max(1)
}

/// Fit a path through ordered control points.
///
/// Returns an empty path for fewer than two points. Total sample count stays
/// near `PATH_SAMPLE_BUDGET` however many points there are.
pub fn fit(points: &[ControlPoint]) -> Path {
    if points.len() < MIN_CONTROL_POINTS {
        log::debug!("fit: {} control point(s), no path", points.len());
        return Path::empty();
    }

    let world: Vec<Vec2> = points.iter().map(|p| track_to_world(p.x, p.y)).collect();
    let last = world.len() - 1;
    let segments = last;
    let per_segment = samples_per_segment(segments);

    let mut samples = Vec::with_capacity(segments * per_segment + 1);
    let mut tail = None;
    for i in 0..segments {
        let segment = Segment::new(
            world[i.saturating_sub(1)],
            world[i],
            world[i + 1],
            world[(i + 2).min(last)],
        );
        for j in 0..per_segment {
            samples.push(segment.eval(j as f32 / per_segment as f32));
        }
        tail = Some(segment);
    }
    if let Some(segment) = tail {
        samples.push(segment.eval(1.0));
    }

    let has_loop = detect_loop(&samples);
    log::debug!(
        "fit: {} points -> {} samples ({} per segment), loop={}",
        points.len(),
        samples.len(),
        per_segment,
        has_loop
    );
    Path::from_samples(samples, has_loop)
}

/// Loop heuristic: a sharply curved sample sitting above both neighbors.
///
/// A single-valued track cannot hold a real vertical loop; this flags crests
/// tight enough to read as one. It only changes scoring language.
fn detect_loop(samples: &[PathSample]) -> bool {
    let span = LOOP_NEIGHBOR_SPAN;
    if samples.len() <= 2 * span {
        return false;
    }
    (span..samples.len() - span).any(|i| {
        let s = &samples[i];
        let k = curvature(s.derivative, s.second_derivative);
        k.abs() > LOOP_CURVATURE_THRESHOLD
            && s.position.y > samples[i - span].position.y
            && s.position.y > samples[i + span].position.y
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::track::{Track, TrackPreset};
    use proptest::prelude::*;

    fn cp(x: f32, y: f32) -> ControlPoint {
        ControlPoint::new(x, y)
    }

    #[test]
    fn test_fit_rejects_single_point() {
        assert!(fit(&[cp(0.5, 0.5)]).is_empty());
        assert!(fit(&[]).is_empty());
    }

    #[test]
    fn test_fit_passes_through_control_points() {
        let points = [cp(0.0, 0.2), cp(0.5, 0.8), cp(1.0, 0.2)];
        let path = fit(&points);
        let per = samples_per_segment(2);
        assert_eq!(path.len(), 2 * per + 1);
        for (k, p) in points.iter().enumerate() {
            let pos = path.samples()[k * per].position;
            assert!((pos - track_to_world(p.x, p.y)).length() < 1e-5);
        }
    }

    #[test]
    fn test_sample_budget_redistributes() {
        let two = fit(&[cp(0.0, 0.5), cp(1.0, 0.5)]);
        let many: Vec<_> = (0..12).map(|i| cp(i as f32 / 11.0, 0.5)).collect();
        let twelve = fit(&many);
        assert_eq!(two.len(), PATH_SAMPLE_BUDGET + 1);
        assert!(twelve.len() <= PATH_SAMPLE_BUDGET + 1);
        assert!(twelve.len() > PATH_SAMPLE_BUDGET * 9 / 10);
    }

    #[test]
    fn test_analytic_derivative_matches_finite_difference() {
        let seg = Segment::new(
            Vec2::new(0.0, 0.8),
            Vec2::new(0.3, 0.1),
            Vec2::new(0.6, 0.7),
            Vec2::new(1.0, 0.2),
        );
        let h = 1e-3;
        let t = 0.4;
        let fd = (seg.eval(t + h).position - seg.eval(t - h).position) / (2.0 * h);
        assert!((fd - seg.eval(t).derivative).length() < 1e-3);
        let fd2 = (seg.eval(t + h).derivative - seg.eval(t - h).derivative) / (2.0 * h);
        assert!((fd2 - seg.eval(t).second_derivative).length() < 1e-2);
    }

    #[test]
    fn test_collinear_points_have_zero_curvature() {
        let path = fit(&[cp(0.0, 0.1), cp(1.0, 0.9)]);
        for s in path.samples() {
            assert!(curvature(s.derivative, s.second_derivative).abs() < 1e-3);
        }
        assert!(!path.has_loop());
    }

    #[test]
    fn test_loop_heuristic() {
        assert!(!fit(Track::preset(TrackPreset::Valley).points()).has_loop());
        assert!(fit(Track::preset(TrackPreset::Hairpin).points()).has_loop());
    }

    #[test]
    fn test_valley_bottom_has_positive_curvature() {
        let path = fit(Track::preset(TrackPreset::Valley).points());
        let mid = path.samples()[samples_per_segment(2)];
        let k = curvature(mid.derivative, mid.second_derivative);
        assert!((k - 12.0).abs() < 1e-3, "valley curvature {k}");
    }

    proptest! {
        #[test]
        fn prop_arc_length_non_decreasing(
            raw in prop::collection::vec((0.0f32..=1.0, 0.0f32..=1.0), 2..=12)
        ) {
            let track = Track::new(raw.into_iter().map(|(x, y)| cp(x, y))).unwrap();
            let path = fit(track.points());
            prop_assert_eq!(path.arc_lengths().len(), path.len());
            prop_assert!(path.arc_lengths().windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(path.arc_lengths()[0], 0.0);
        }
    }
}
