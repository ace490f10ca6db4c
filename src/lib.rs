//! Coaster Sim - curve-constrained roller coaster physics
//!
//! Core modules:
//! - `sim`: Deterministic simulation (curve fitting, integration, forces, events)
//! - `challenge`: Scoring state machine shared by every challenge mode
//! - `effects`: Particle and score-popup bookkeeping driven by ride events
//! - `settings`: Data-driven physics and quality configuration

pub mod challenge;
pub mod effects;
pub mod settings;
pub mod sim;

pub use challenge::{ChallengePhase, ChallengeState, Tier};
pub use effects::Effects;
pub use settings::{QualityPreset, Settings, SettingsError};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz animation callback)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame gap the clock will try to catch up on (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Gravitational acceleration in track units/s²
    pub const GRAVITY: f32 = 9.81;
    /// Friction coefficient bounds (operator-tunable before a run)
    pub const FRICTION_MIN: f32 = 0.0;
    pub const FRICTION_MAX: f32 = 0.5;
    /// Rider mass, fixed for energy bookkeeping
    pub const RIDER_MASS: f32 = 1.0;

    /// Control point count bounds
    pub const MIN_CONTROL_POINTS: usize = 2;
    pub const MAX_CONTROL_POINTS: usize = 12;

    /// Total sample budget of a fitted path, split evenly across segments
    pub const PATH_SAMPLE_BUDGET: usize = 600;

    /// Converts track-space curvature into rider-felt curvature.
    ///
    /// Track space is normalized to the editor canvas, so raw `v²κ/g` reads far
    /// higher than a coaster of that silhouette would at full scale. Every
    /// G-force in the crate goes through this one constant.
    pub const G_FORCE_SCALE: f32 = 0.2;

    /// Below this derivative magnitude a sample is treated as degenerate
    pub const DERIVATIVE_EPSILON: f32 = 1e-6;

    /// |G| above this derails the rider
    pub const DERAIL_G: f32 = 6.0;
    /// Ride scoring downgrade thresholds
    pub const GREAT_G: f32 = 3.0;
    pub const CLOSE_G: f32 = 5.0;

    /// Loop heuristic: |κ| above this at a local crest flags the track
    pub const LOOP_CURVATURE_THRESHOLD: f32 = 20.0;
    /// Loop heuristic: neighbor offset (samples) used for the crest test
    pub const LOOP_NEIGHBOR_SPAN: usize = 4;

    /// Velocity kept (and reversed) when bouncing off a path end
    pub const BOUNDARY_RESTITUTION: f32 = 0.9;

    /// Simulated seconds a finished attempt stays on screen before resetting
    pub const RESULT_HOLD_SECS: f32 = 2.0;
    /// Simulated seconds a score popup stays alive
    pub const POPUP_TTL_SECS: f32 = 1.5;
}

/// Convert a y-down track-space point (editor canvas) to y-up world space
#[inline]
pub fn track_to_world(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, 1.0 - y)
}
