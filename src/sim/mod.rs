//! Deterministic simulation module
//!
//! All ride logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (effects)
//! - Path rebuilt from scratch on every track edit
//! - No rendering or platform dependencies

pub mod forces;
pub mod integrator;
pub mod monitor;
pub mod path;
pub mod schedule;
pub mod session;
pub mod spline;
pub mod track;

pub use forces::{EnergyBaseline, EnergyFrame, ForceReading, analyze, curvature, g_force};
pub use integrator::{Boundary, PhysicsConstants, RiderState, StepReport, step};
pub use monitor::{Event, EventKind, EventMonitor, RideMetrics, RideOutcome, RidePhase};
pub use path::{Path, PathSample};
pub use schedule::EventQueue;
pub use session::{Session, SessionError, SessionPhase, TickReport};
pub use spline::{fit, samples_per_segment};
pub use track::{ControlPoint, Track, TrackError, TrackPreset};
