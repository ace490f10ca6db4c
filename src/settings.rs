//! Simulation settings
//!
//! Physics constants, timestep and effect quality. Serialized as JSON so a
//! front-end can persist them alongside its own preferences.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{FRICTION_MAX, FRICTION_MIN, GRAVITY, MAX_SUBSTEPS, RIDER_MASS, SIM_DT};
use crate::sim::PhysicsConstants;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Live particles allowed before a burst starts evicting the oldest
    pub fn particle_budget(self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    /// Gravitational acceleration (track units/s²)
    pub gravity: f32,
    /// Friction coefficient, clamped to [0, 0.5]
    pub friction: f32,
    /// Push off the station (track units/s)
    pub launch_speed: f32,

    // === Timing ===
    /// Fixed simulation timestep (seconds)
    pub sim_dt: f32,
    /// Substep cap per frame
    pub max_substeps: u32,

    // === Effects ===
    pub quality: QualityPreset,
    /// Particle effects on ride events
    pub particles: bool,
    /// Seed for particle spread
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: 0.0,
            launch_speed: 0.5,

            sim_dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,

            quality: QualityPreset::Medium,
            particles: true,
            seed: 0x5eed,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str::<Settings>(json)?.validated()
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Clamp tunables into range and reject values the physics can't run with
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "gravity must be positive, got {}",
                self.gravity
            )));
        }
        if !(self.sim_dt.is_finite() && self.sim_dt > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "sim_dt must be positive, got {}",
                self.sim_dt
            )));
        }
        if !self.friction.is_finite() || !self.launch_speed.is_finite() {
            return Err(SettingsError::Invalid(
                "friction and launch_speed must be finite".to_string(),
            ));
        }
        self.friction = self.friction.clamp(FRICTION_MIN, FRICTION_MAX);
        self.max_substeps = self.max_substeps.max(1);
        Ok(self)
    }

    /// Physics constants for a run
    pub fn physics(&self) -> PhysicsConstants {
        PhysicsConstants {
            gravity: self.gravity,
            mass: RIDER_MASS,
            ..PhysicsConstants::default()
        }
        .with_friction(self.friction)
    }

    /// Particle budget handed to the effects layer; zero turns bursts off
    pub fn particle_budget(&self) -> usize {
        if self.particles {
            self.quality.particle_budget()
        } else {
            0
        }
    }
}
