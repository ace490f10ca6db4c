//! Simulation session and the fixed timestep tick
//!
//! The session owns every piece of per-run state: track, fitted path, rider,
//! event monitor, challenge score and effects. Each tick runs the pipeline
//! integrate → analyze → monitor → score synchronously. Track edits rebuild
//! the path and reset the rider; they never touch the challenge score.

use glam::Vec2;
use serde::Serialize;
use thiserror::Error;

use super::forces::{EnergyBaseline, EnergyFrame, ForceReading, analyze};
use super::integrator::{PhysicsConstants, RiderState, step};
use super::monitor::{Event, EventMonitor};
use super::path::Path;
use super::schedule::EventQueue;
use super::spline::fit;
use super::track::{ControlPoint, Track, TrackError};
use crate::challenge::ChallengeState;
use crate::consts::{MAX_FRAME_DT, RESULT_HOLD_SECS};
use crate::effects::Effects;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("no simulation possible: the track has no fitted path")]
    NoPath,
    #[error("a run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// No usable path yet
    Editing,
    /// Path fitted, rider waiting at the station
    Ready,
    /// Ticking
    Running,
    /// Terminal event raised, result on screen
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduledAction {
    /// Return to the station once the result has been shown
    EndAttempt,
}

/// Everything the rendering, audio and effects collaborators need per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Terminal events raised this tick (at most one)
    pub events: Vec<Event>,
    /// Rider position in world space
    pub position: Vec2,
    pub speed: f32,
    /// Forces at the pre-step position; `None` unless a run is ticking
    pub reading: Option<ForceReading>,
}

/// An owned simulation session
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    constants: PhysicsConstants,
    track: Option<Track>,
    path: Path,
    rider: RiderState,
    monitor: EventMonitor,
    challenge: ChallengeState,
    effects: Effects,
    queue: EventQueue<ScheduledAction>,
    phase: SessionPhase,
    energy_frame: EnergyFrame,
    baseline: Option<EnergyBaseline>,
    max_energy_drift: f32,
    /// Simulated seconds since the session was created
    time: f64,
    time_ticks: u64,
    accumulator: f32,
}

impl Session {
    /// Session with no track yet
    pub fn new(settings: Settings) -> Self {
        let constants = settings.physics();
        let effects = Effects::new(settings.seed, settings.particle_budget());
        Self {
            constants,
            track: None,
            path: Path::empty(),
            rider: RiderState::at_start(0.0),
            monitor: EventMonitor::new(false),
            challenge: ChallengeState::new(),
            effects,
            queue: EventQueue::new(),
            phase: SessionPhase::Editing,
            energy_frame: EnergyFrame {
                gravity: constants.gravity,
                mass: constants.mass,
                datum_height: 0.0,
            },
            baseline: None,
            max_energy_drift: 0.0,
            time: 0.0,
            time_ticks: 0,
            accumulator: 0.0,
            settings,
        }
    }

    pub fn with_track(settings: Settings, track: Track) -> Self {
        let mut session = Self::new(settings);
        session.set_track(track);
        session
    }

    // --- accessors ---

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn constants(&self) -> &PhysicsConstants {
        &self.constants
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rider(&self) -> &RiderState {
        &self.rider
    }

    pub fn monitor(&self) -> &EventMonitor {
        &self.monitor
    }

    pub fn challenge(&self) -> &ChallengeState {
        &self.challenge
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Worst relative energy drift seen during the current run
    pub fn max_energy_drift(&self) -> f32 {
        self.max_energy_drift
    }

    /// Rider position in world space
    pub fn rider_position(&self) -> Vec2 {
        self.path.sample_at(self.rider.path_parameter).position
    }

    // --- track editing ---

    /// Replace the whole track
    pub fn set_track(&mut self, track: Track) {
        self.track = Some(track);
        self.rebuild();
    }

    /// Drop the track; nothing can run until a new one is set
    pub fn clear_track(&mut self) {
        self.track = None;
        self.rebuild();
    }

    pub fn insert_point(&mut self, point: ControlPoint) -> Result<usize, SessionError> {
        let index = self.track_mut()?.insert(point)?;
        self.rebuild();
        Ok(index)
    }

    pub fn move_point(&mut self, index: usize, point: ControlPoint) -> Result<usize, SessionError> {
        let index = self.track_mut()?.move_point(index, point)?;
        self.rebuild();
        Ok(index)
    }

    pub fn remove_point(&mut self, index: usize) -> Result<ControlPoint, SessionError> {
        let point = self.track_mut()?.remove(index)?;
        self.rebuild();
        Ok(point)
    }

    fn track_mut(&mut self) -> Result<&mut Track, SessionError> {
        self.track.as_mut().ok_or(SessionError::NoPath)
    }

    /// Full path rebuild; abandons any run in progress
    fn rebuild(&mut self) {
        self.path = match &self.track {
            Some(track) => fit(track.points()),
            None => Path::empty(),
        };
        if self.phase == SessionPhase::Running {
            log::info!("run abandoned: track edited");
        }
        self.queue.clear();
        self.baseline = None;
        self.rider = RiderState::at_start(0.0);
        self.monitor.reset(self.path.has_loop());
        self.phase = if self.path.is_empty() {
            SessionPhase::Editing
        } else {
            SessionPhase::Ready
        };
    }

    // --- configuration ---

    /// Change friction; refused while a run is in progress
    pub fn set_friction(&mut self, friction: f32) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Running {
            return Err(SessionError::RunInProgress);
        }
        self.constants = self.constants.with_friction(friction);
        self.settings.friction = self.constants.friction;
        Ok(())
    }

    // --- challenge ---

    pub fn start_challenge(&mut self) {
        self.challenge.start();
    }

    pub fn reset_challenge(&mut self) {
        self.challenge.reset();
    }

    // --- run lifecycle ---

    /// Put the rider at the station and start ticking
    pub fn start_run(&mut self) -> Result<(), SessionError> {
        if self.path.is_empty() {
            log::warn!("start refused: no path");
            return Err(SessionError::NoPath);
        }
        if self.phase == SessionPhase::Running {
            return Err(SessionError::RunInProgress);
        }

        self.queue.clear();
        self.rider = RiderState::at_start(self.settings.launch_speed);
        self.monitor.reset(self.path.has_loop());
        self.challenge.begin_attempt();
        self.energy_frame = EnergyFrame {
            gravity: self.constants.gravity,
            mass: self.constants.mass,
            datum_height: self.path.lowest_height(),
        };
        self.baseline = Some(EnergyBaseline::new(&self.read_forces(&self.rider)));
        self.max_energy_drift = 0.0;
        self.phase = SessionPhase::Running;
        log::info!(
            "run started: {} samples, length {:.3}, friction {:.2}, loop={}",
            self.path.len(),
            self.path.total_length(),
            self.constants.friction,
            self.path.has_loop()
        );
        Ok(())
    }

    /// Stop ticking the rider; nothing is in flight to cancel
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Running || self.phase == SessionPhase::Finished {
            log::info!("run stopped at t={:.2}s", self.time);
            self.queue.clear();
            self.phase = SessionPhase::Ready;
        }
    }

    fn read_forces(&self, rider: &RiderState) -> ForceReading {
        let sample = self.path.sample_at(rider.path_parameter);
        analyze(
            sample.derivative,
            sample.second_derivative,
            rider.speed(),
            sample.position.y,
            &self.energy_frame,
        )
    }

    /// Advance one fixed timestep
    pub fn tick(&mut self, dt: f32) -> TickReport {
        self.time += f64::from(dt);
        self.time_ticks += 1;

        for action in self.queue.poll(self.time) {
            match action {
                ScheduledAction::EndAttempt => {
                    if self.phase == SessionPhase::Finished {
                        log::debug!("attempt over, rider back at the station");
                        self.rider = RiderState::at_start(0.0);
                        self.phase = SessionPhase::Ready;
                    }
                }
            }
        }

        let mut events = Vec::new();
        let mut reading = None;
        if self.phase == SessionPhase::Running {
            let (next, report) = step(&self.rider, &self.path, &self.constants, dt);

            // Forces come from the same pre-step sample the integrator used
            let forces = analyze(
                report.pre_sample.derivative,
                report.pre_sample.second_derivative,
                report.pre_speed,
                report.pre_sample.position.y,
                &self.energy_frame,
            );
            if let Some(baseline) = &self.baseline {
                self.max_energy_drift = self.max_energy_drift.max(baseline.drift(&forces));
            }
            self.rider = next;

            if let Some(event) = self.monitor.observe(forces.g_force, report.boundary) {
                let at = if event.is_failure() {
                    report.pre_sample.position
                } else {
                    self.rider_position()
                };
                self.finish(&event, at);
                events.push(event);
            }
            reading = Some(forces);
        }

        self.effects.update(dt);

        TickReport {
            events,
            position: self.rider_position(),
            speed: self.rider.speed(),
            reading,
        }
    }

    /// Record a terminal event once: score it, fire effects, schedule the reset
    fn finish(&mut self, event: &Event, at: Vec2) {
        self.phase = SessionPhase::Finished;
        let outcome = event.outcome();
        let tag = event.kind().as_str();
        if !self.challenge.has_result(tag) {
            self.challenge.submit_result(tag, outcome.tier, outcome.points);
        }
        self.effects.on_event(event, at);
        self.queue
            .schedule(self.time + f64::from(RESULT_HOLD_SECS), ScheduledAction::EndAttempt);
        log::info!(
            "{}: {} (+{}), peak {:.2} g, energy drift {:.2}%",
            tag,
            outcome.label,
            outcome.points,
            event.metrics().peak_g_force,
            self.max_energy_drift * 100.0
        );
    }

    /// Run as many fixed ticks as `frame_dt` of wall time covers.
    ///
    /// Large frame gaps are clamped and substeps are capped, so a stalled
    /// frame never turns into a catch-up spiral.
    pub fn advance(&mut self, frame_dt: f32) -> Vec<TickReport> {
        let sim_dt = self.settings.sim_dt;
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut reports = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= sim_dt && substeps < self.settings.max_substeps {
            reports.push(self.tick(sim_dt));
            self.accumulator -= sim_dt;
            substeps += 1;
        }
        if substeps == self.settings.max_substeps {
            // Drop the backlog rather than carrying it into the next frame
            self.accumulator = self.accumulator.min(sim_dt);
        }
        reports
    }
}
