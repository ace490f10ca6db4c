//! Particle bursts and score popups driven by ride events
//!
//! Purely presentational: nothing here feeds back into the simulation. The
//! session calls `on_event` exactly once per terminal event and `update` once
//! per tick.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::POPUP_TTL_SECS;
use crate::sim::Event;

/// Downward pull on particles (world units/s²)
const PARTICLE_GRAVITY: f32 = 1.5;
/// Per-tick velocity retention
const PARTICLE_DRAG: f32 = 0.98;
/// Popups drift upward while they fade
const POPUP_RISE_SPEED: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Bright sparks for a clean finish
    Spark,
    /// Debris from a derailment
    Debris,
    /// Confetti for a cleared loop
    Confetti,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Floating score text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePopup {
    pub text: String,
    pub points: u32,
    pub pos: Vec2,
    /// Seconds left on screen
    pub ttl: f32,
}

/// Particle and popup buffers
#[derive(Debug, Clone)]
pub struct Effects {
    particles: Vec<Particle>,
    popups: Vec<ScorePopup>,
    max_particles: usize,
    rng: Pcg32,
}

impl Effects {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        Self {
            particles: Vec::with_capacity(max_particles),
            popups: Vec::new(),
            max_particles,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn popups(&self) -> &[ScorePopup] {
        &self.popups
    }

    /// React to a terminal ride event at world position `at`
    pub fn on_event(&mut self, event: &Event, at: Vec2) {
        let outcome = event.outcome();
        let (kind, count, speed) = match event {
            Event::Derailed(_) | Event::LoopFailed(_) => (ParticleKind::Debris, 40, 0.8),
            Event::LoopCleared(_) => (ParticleKind::Confetti, 60, 0.6),
            Event::RideComplete(_) => (ParticleKind::Spark, 10 + 10 * outcome.points as usize, 0.5),
        };
        self.burst(kind, at, count, speed);
        self.popups.push(ScorePopup {
            text: outcome.label.to_string(),
            points: outcome.points,
            pos: at,
            ttl: POPUP_TTL_SECS,
        });
    }

    fn burst(&mut self, kind: ParticleKind, at: Vec2, count: usize, speed: f32) {
        if self.max_particles == 0 {
            return;
        }
        for _ in 0..count {
            if self.particles.len() >= self.max_particles {
                // Remove oldest particles to make room
                self.particles.remove(0);
            }
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let magnitude = speed * self.rng.random_range(0.3..1.0);
            self.particles.push(Particle {
                pos: at,
                vel: Vec2::from_angle(angle) * magnitude,
                kind,
                life: 1.0,
                size: self.rng.random_range(0.004..0.012),
            });
        }
    }

    /// Age particles and popups by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel * dt;
            particle.vel.y -= PARTICLE_GRAVITY * dt;
            particle.vel *= PARTICLE_DRAG;
            particle.life -= dt * 1.5;
            particle.size *= 0.995;
        }
        self.particles.retain(|p| p.life > 0.0);

        for popup in self.popups.iter_mut() {
            popup.ttl -= dt;
            popup.pos.y += POPUP_RISE_SPEED * dt;
        }
        self.popups.retain(|p| p.ttl > 0.0);
    }
}
