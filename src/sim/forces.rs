//! Force analyzer: curvature, G-force and mechanical energy
//!
//! Heights are y-up world units; potential energy is measured from the
//! lowest point of the current path so it never depends on where the track
//! sits on the canvas.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DERIVATIVE_EPSILON, G_FORCE_SCALE};

/// Per-tick force and energy readout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceReading {
    pub curvature: f32,
    pub g_force: f32,
    pub kinetic_energy: f32,
    pub potential_energy: f32,
}

impl ForceReading {
    #[inline]
    pub fn total_energy(&self) -> f32 {
        self.kinetic_energy + self.potential_energy
    }
}

/// Inputs that stay fixed for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyFrame {
    pub gravity: f32,
    pub mass: f32,
    /// Height potential energy is measured from, captured at run start
    pub datum_height: f32,
}

/// Signed planar curvature `κ = (dx·d2y − dy·d2x) / |d|³`.
///
/// Positive where the path bends upward (valleys, for a left-to-right path).
/// Returns 0 for a degenerate derivative.
#[inline]
pub fn curvature(derivative: Vec2, second_derivative: Vec2) -> f32 {
    let len = derivative.length();
    if len < DERIVATIVE_EPSILON {
        return 0.0;
    }
    derivative.perp_dot(second_derivative) / (len * len * len)
}

/// G-force felt by a rider moving at `speed` through curvature `kappa`
#[inline]
pub fn g_force(speed: f32, kappa: f32, gravity: f32) -> f32 {
    1.0 + (speed * speed * kappa * G_FORCE_SCALE) / gravity
}

/// Analyze the rider's state at one path sample.
///
/// A near-zero derivative short-circuits to a neutral 1.0 g.
pub fn analyze(
    derivative: Vec2,
    second_derivative: Vec2,
    speed: f32,
    height: f32,
    frame: &EnergyFrame,
) -> ForceReading {
    let degenerate = derivative.length() < DERIVATIVE_EPSILON;
    let kappa = if degenerate {
        0.0
    } else {
        curvature(derivative, second_derivative)
    };
    let g = if degenerate {
        1.0
    } else {
        g_force(speed, kappa, frame.gravity)
    };
    ForceReading {
        curvature: kappa,
        g_force: g,
        kinetic_energy: 0.5 * frame.mass * speed * speed,
        potential_energy: frame.mass * frame.gravity * (height - frame.datum_height).max(0.0),
    }
}

/// Total mechanical energy captured at the start of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBaseline {
    pub energy: f32,
}

impl EnergyBaseline {
    pub fn new(reading: &ForceReading) -> Self {
        Self {
            energy: reading.total_energy(),
        }
    }

    /// Relative drift |E − E₀| / |E₀| (absolute when E₀ is ~0)
    pub fn drift(&self, reading: &ForceReading) -> f32 {
        let delta = (reading.total_energy() - self.energy).abs();
        if self.energy.abs() > 1e-6 {
            delta / self.energy.abs()
        } else {
            delta
        }
    }
}
