//! Control points and track editing
//!
//! A track is the ordered list of user-placed control points the curve fitter
//! runs through. Points live in normalized track space: `[0,1]×[0,1]`, y-down
//! like the editor canvas. The path is single-valued in x, so the list is kept
//! sorted by x after every edit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_CONTROL_POINTS, MIN_CONTROL_POINTS};

/// Reasons a track edit is refused. A refused edit never mutates the track.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("a track needs at least {MIN_CONTROL_POINTS} control points, got {0}")]
    TooFewPoints(usize),
    #[error("a track holds at most {MAX_CONTROL_POINTS} control points")]
    TooManyPoints,
    #[error("control point index {index} out of range (track has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("control point coordinates must be finite, got ({x}, {y})")]
    NonFinite { x: f32, y: f32 },
}

/// A user-placed control point in track space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f32,
    pub y: f32,
}

impl ControlPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp into the unit square, rejecting NaN/inf
    fn sanitized(self) -> Result<Self, TrackError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(TrackError::NonFinite {
                x: self.x,
                y: self.y,
            });
        }
        Ok(Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        })
    }
}

/// Built-in tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackPreset {
    /// Single shallow valley between two equal hills
    Valley,
    /// Tall drop followed by a smaller airtime hill
    Camelback,
    /// Steep first drop into a long runout
    Plunge,
    /// Sharp crest that trips the loop heuristic
    Hairpin,
}

impl TrackPreset {
    pub const ALL: [TrackPreset; 4] = [
        TrackPreset::Valley,
        TrackPreset::Camelback,
        TrackPreset::Plunge,
        TrackPreset::Hairpin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackPreset::Valley => "valley",
            TrackPreset::Camelback => "camelback",
            TrackPreset::Plunge => "plunge",
            TrackPreset::Hairpin => "hairpin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "valley" => Some(TrackPreset::Valley),
            "camelback" | "camel" => Some(TrackPreset::Camelback),
            "plunge" => Some(TrackPreset::Plunge),
            "hairpin" => Some(TrackPreset::Hairpin),
            _ => None,
        }
    }

    fn points(&self) -> Vec<ControlPoint> {
        let raw: &[(f32, f32)] = match self {
            TrackPreset::Valley => &[(0.0, 0.2), (0.5, 0.8), (1.0, 0.2)],
            TrackPreset::Camelback => &[
                (0.0, 0.1),
                (0.3, 0.85),
                (0.55, 0.45),
                (0.8, 0.8),
                (1.0, 0.6),
            ],
            TrackPreset::Plunge => &[(0.0, 0.05), (0.25, 0.9), (0.6, 0.85), (1.0, 0.7)],
            TrackPreset::Hairpin => &[
                (0.0, 0.1),
                (0.3, 0.9),
                (0.36, 0.5),
                (0.42, 0.9),
                (0.7, 0.95),
                (1.0, 0.8),
            ],
        };
        raw.iter().map(|&(x, y)| ControlPoint::new(x, y)).collect()
    }
}

/// Ordered, bounded list of control points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    points: Vec<ControlPoint>,
}

impl Track {
    /// Build a track, clamping points into the unit square and sorting by x
    pub fn new(points: impl IntoIterator<Item = ControlPoint>) -> Result<Self, TrackError> {
        let points = points
            .into_iter()
            .map(ControlPoint::sanitized)
            .collect::<Result<Vec<_>, _>>()?;
        if points.len() < MIN_CONTROL_POINTS {
            return Err(TrackError::TooFewPoints(points.len()));
        }
        if points.len() > MAX_CONTROL_POINTS {
            return Err(TrackError::TooManyPoints);
        }
        let mut track = Self { points };
        track.sort();
        Ok(track)
    }

    pub fn preset(preset: TrackPreset) -> Self {
        let mut track = Self {
            points: preset.points(),
        };
        track.sort();
        track
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert a point, returning the index it landed at after sorting
    pub fn insert(&mut self, point: ControlPoint) -> Result<usize, TrackError> {
        let point = point.sanitized()?;
        if self.points.len() >= MAX_CONTROL_POINTS {
            return Err(TrackError::TooManyPoints);
        }
        let index = self.points.partition_point(|p| p.x <= point.x);
        self.points.insert(index, point);
        Ok(index)
    }

    /// Move (drag) a point, returning its index after re-sorting
    pub fn move_point(&mut self, index: usize, point: ControlPoint) -> Result<usize, TrackError> {
        let point = point.sanitized()?;
        if index >= self.points.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        self.points.remove(index);
        let new_index = self.points.partition_point(|p| p.x <= point.x);
        self.points.insert(new_index, point);
        Ok(new_index)
    }

    pub fn remove(&mut self, index: usize) -> Result<ControlPoint, TrackError> {
        if index >= self.points.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        if self.points.len() <= MIN_CONTROL_POINTS {
            return Err(TrackError::TooFewPoints(self.points.len() - 1));
        }
        Ok(self.points.remove(index))
    }

    fn sort(&mut self) {
        // Stable, so coincident x keep their insertion order
        self.points.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
}
