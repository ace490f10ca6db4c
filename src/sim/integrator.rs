//! Motion integrator: velocity-Verlet along the fitted path
//!
//! The rider's only integrated state is its path parameter and a signed
//! along-track speed. Speed is in world units per second; the position
//! half of each step moves along the cumulative arc-length table and maps
//! back to a parameter, so gravity and kinetic energy share units.

use serde::{Deserialize, Serialize};

use super::path::{Path, PathSample};
use crate::consts::{BOUNDARY_RESTITUTION, FRICTION_MAX, FRICTION_MIN, GRAVITY, RIDER_MASS};

/// Physics configuration for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConstants {
    pub gravity: f32,
    /// Velocity-proportional drag coefficient, `[0, 0.5]`
    pub friction: f32,
    pub mass: f32,
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: 0.0,
            mass: RIDER_MASS,
        }
    }
}

impl PhysicsConstants {
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(FRICTION_MIN, FRICTION_MAX);
        self
    }
}

/// Path end the rider ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    Start,
    End,
}

/// Integrated rider state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderState {
    pub path_parameter: f32,
    /// Signed speed, positive toward increasing parameter
    pub velocity: f32,
    /// Boundary the rider is resting against, cleared once it moves away.
    /// Keeps boundary hits edge-triggered.
    #[serde(default)]
    latched: Option<Boundary>,
}

impl Default for RiderState {
    fn default() -> Self {
        Self::at_start(0.0)
    }
}

impl RiderState {
    /// Rider on the start of the path. Starting there does not count as a hit.
    pub fn at_start(velocity: f32) -> Self {
        Self {
            path_parameter: 0.0,
            velocity,
            latched: Some(Boundary::Start),
        }
    }

    pub fn at(path_parameter: f32, velocity: f32) -> Self {
        Self {
            path_parameter,
            velocity,
            latched: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.abs()
    }

    pub fn latched(&self) -> Option<Boundary> {
        self.latched
    }
}

/// Outcome of one integrator step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Path sample at the pre-step parameter (the one `a1` came from)
    pub pre_sample: PathSample,
    /// Speed before the step
    pub pre_speed: f32,
    /// Boundary newly reached this step, if any
    pub boundary: Option<Boundary>,
}

/// Tangential acceleration: gravity along the unit tangent plus drag.
/// A degenerate tangent contributes no gravity.
#[inline]
fn tangential_acceleration(sample: &PathSample, velocity: f32, constants: &PhysicsConstants) -> f32 {
    // World space is y-up, so gravity pulls along -y
    -constants.gravity * sample.tangent().y - constants.friction * velocity * 2.0
}

/// Advance the rider by `dt` with a velocity-Verlet half-step scheme.
///
/// The path is re-sampled at the new parameter before the second velocity
/// half-step; reusing the old tangent drifts energy over long runs.
pub fn step(
    rider: &RiderState,
    path: &Path,
    constants: &PhysicsConstants,
    dt: f32,
) -> (RiderState, StepReport) {
    let pre_sample = path.sample_at(rider.path_parameter);
    let report = StepReport {
        pre_sample,
        pre_speed: rider.speed(),
        boundary: None,
    };
    if path.len() < 2 {
        return (*rider, report);
    }

    let a1 = tangential_acceleration(&pre_sample, rider.velocity, constants);
    let v_half = rider.velocity + a1 * dt * 0.5;

    let s = path.arc_length_at(rider.path_parameter) + v_half * dt;
    let parameter = path.parameter_at_arc_length(s);

    let post_sample = path.sample_at(parameter);
    let a2 = tangential_acceleration(&post_sample, v_half, constants);
    let mut velocity = v_half + a2 * dt * 0.5;

    let max = path.max_parameter();
    let (parameter, hit) = if s <= 0.0 {
        velocity = velocity.abs() * BOUNDARY_RESTITUTION;
        (0.0, Some(Boundary::Start))
    } else if s >= path.total_length() {
        velocity = -velocity.abs() * BOUNDARY_RESTITUTION;
        (max, Some(Boundary::End))
    } else {
        (parameter, None)
    };

    let boundary = match hit {
        Some(b) if rider.latched != Some(b) => Some(b),
        _ => None,
    };
    let next = RiderState {
        path_parameter: parameter,
        velocity,
        latched: hit,
    };
    (next, StepReport { boundary, ..report })
}
