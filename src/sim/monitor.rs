//! Event monitor: turns per-tick readings into terminal ride events
//!
//! Each attempt starts `Running` and ends in exactly one of `Derailed` or
//! `Completed`. Both transitions are edge-triggered: once the attempt is over,
//! further readings are ignored until `reset`.

use serde::{Deserialize, Serialize};

use super::integrator::Boundary;
use crate::challenge::Tier;
use crate::consts::{CLOSE_G, DERAIL_G, GREAT_G};

/// Phase of the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RidePhase {
    Running,
    Derailed,
    Completed,
}

/// Metrics carried by every ride event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideMetrics {
    /// Largest |G| seen during the attempt
    pub peak_g_force: f32,
    /// Rider left through the far end rather than rolling back to the start.
    /// Informational only; scoring treats both ends alike.
    pub completed: bool,
    /// Track was flagged by the loop heuristic
    pub loop_detected: bool,
}

/// Terminal ride event, consumed once by scoring and effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Derailed(RideMetrics),
    LoopFailed(RideMetrics),
    LoopCleared(RideMetrics),
    RideComplete(RideMetrics),
}

/// Event tag without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Derailed,
    LoopFailed,
    LoopCleared,
    RideComplete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Derailed => "derailed",
            EventKind::LoopFailed => "loop_failed",
            EventKind::LoopCleared => "loop_cleared",
            EventKind::RideComplete => "ride_complete",
        }
    }
}

/// Points and display label for a finished attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RideOutcome {
    pub tier: Tier,
    pub points: u32,
    pub label: &'static str,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Derailed(_) => EventKind::Derailed,
            Event::LoopFailed(_) => EventKind::LoopFailed,
            Event::LoopCleared(_) => EventKind::LoopCleared,
            Event::RideComplete(_) => EventKind::RideComplete,
        }
    }

    pub fn metrics(&self) -> &RideMetrics {
        match self {
            Event::Derailed(m) | Event::LoopFailed(m) | Event::LoopCleared(m) | Event::RideComplete(m) => m,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Event::Derailed(_) | Event::LoopFailed(_))
    }

    /// Score this event.
    ///
    /// A finished ride starts at 3 points and loses one above `GREAT_G` and
    /// another above `CLOSE_G`, whichever end of the track it left through.
    /// Clearing a flagged loop adds one back, capped at 3. Derailing is a miss.
    pub fn outcome(&self) -> RideOutcome {
        let m = self.metrics();
        match self {
            Event::Derailed(_) => RideOutcome {
                tier: Tier::Miss,
                points: 0,
                label: "Derailed!",
            },
            Event::LoopFailed(_) => RideOutcome {
                tier: Tier::Miss,
                points: 0,
                label: "Loop Failed!",
            },
            Event::RideComplete(_) | Event::LoopCleared(_) => {
                let mut points: u32 = if m.peak_g_force > CLOSE_G {
                    1
                } else if m.peak_g_force > GREAT_G {
                    2
                } else {
                    3
                };
                let label = if matches!(self, Event::LoopCleared(_)) {
                    points = (points + 1).min(3);
                    "Loop Cleared!"
                } else {
                    match points {
                        3 => "Perfect Ride!",
                        2 => "Great Ride!",
                        _ => "Rough Ride",
                    }
                };
                RideOutcome {
                    tier: Tier::from_points(points),
                    points,
                    label,
                }
            }
        }
    }
}

/// Per-attempt state machine over `RidePhase`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMonitor {
    phase: RidePhase,
    peak_g_force: f32,
    loop_detected: bool,
}

impl EventMonitor {
    pub fn new(loop_detected: bool) -> Self {
        Self {
            phase: RidePhase::Running,
            peak_g_force: 0.0,
            loop_detected,
        }
    }

    /// Start a new attempt
    pub fn reset(&mut self, loop_detected: bool) {
        *self = Self::new(loop_detected);
    }

    pub fn phase(&self) -> RidePhase {
        self.phase
    }

    pub fn peak_g_force(&self) -> f32 {
        self.peak_g_force
    }

    pub fn is_running(&self) -> bool {
        self.phase == RidePhase::Running
    }

    /// Feed one tick's G-force and boundary hit.
    ///
    /// Returns an event only on the transition out of `Running`. Overstress
    /// is checked before the boundary, so a tick that does both derails.
    pub fn observe(&mut self, g_force: f32, boundary: Option<Boundary>) -> Option<Event> {
        if self.phase != RidePhase::Running {
            return None;
        }
        if g_force.is_finite() {
            self.peak_g_force = self.peak_g_force.max(g_force.abs());
        }

        if g_force.abs() > DERAIL_G {
            self.phase = RidePhase::Derailed;
            let metrics = self.metrics(false);
            log::info!("rider derailed at {:.2} g", g_force);
            return Some(if self.loop_detected {
                Event::LoopFailed(metrics)
            } else {
                Event::Derailed(metrics)
            });
        }

        let boundary = boundary?;
        self.phase = RidePhase::Completed;
        let metrics = self.metrics(boundary == Boundary::End);
        log::info!(
            "ride finished at {:?} (peak {:.2} g)",
            boundary,
            self.peak_g_force
        );
        Some(if self.loop_detected {
            Event::LoopCleared(metrics)
        } else {
            Event::RideComplete(metrics)
        })
    }

    fn metrics(&self, completed: bool) -> RideMetrics {
        RideMetrics {
            peak_g_force: self.peak_g_force,
            completed,
            loop_detected: self.loop_detected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(peak: f32, loop_detected: bool) -> Event {
        let mut monitor = EventMonitor::new(loop_detected);
        monitor.observe(peak, None);
        monitor
            .observe(1.0, Some(Boundary::End))
            .expect("boundary ends the ride")
    }

    #[test]
    fn test_derail_is_edge_triggered() {
        let mut monitor = EventMonitor::new(false);
        assert_eq!(monitor.observe(2.0, None), None);
        let event = monitor.observe(-6.5, None);
        assert!(matches!(event, Some(Event::Derailed(_))));
        assert_eq!(monitor.phase(), RidePhase::Derailed);
        // Still overstressed, already terminal
        assert_eq!(monitor.observe(9.0, None), None);
        assert_eq!(monitor.observe(1.0, Some(Boundary::End)), None);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut monitor = EventMonitor::new(false);
        assert_eq!(monitor.observe(DERAIL_G, None), None);
        assert!(monitor.is_running());
    }

    #[test]
    fn test_boundary_completes_ride() {
        let mut monitor = EventMonitor::new(false);
        monitor.observe(2.5, None);
        let event = monitor.observe(1.1, Some(Boundary::End)).unwrap();
        assert_eq!(event.kind(), EventKind::RideComplete);
        assert_eq!(event.metrics().peak_g_force, 2.5);
        assert!(event.metrics().completed);
        assert_eq!(monitor.phase(), RidePhase::Completed);
    }

    #[test]
    fn test_scoring_tiers() {
        let perfect = finished(2.9, false).outcome();
        assert_eq!((perfect.tier, perfect.points), (Tier::Perfect, 3));
        let great = finished(3.5, false).outcome();
        assert_eq!((great.tier, great.points), (Tier::Great, 2));
        let rough = finished(5.5, false).outcome();
        assert_eq!((rough.tier, rough.points), (Tier::Close, 1));
    }

    #[test]
    fn test_loop_bonus_is_capped() {
        let clean = finished(2.0, true);
        assert_eq!(clean.kind(), EventKind::LoopCleared);
        let outcome = clean.outcome();
        assert_eq!(outcome.points, 3);
        assert_eq!(outcome.label, "Loop Cleared!");

        let hard = finished(4.0, true).outcome();
        assert_eq!((hard.tier, hard.points), (Tier::Perfect, 3));
        let rough = finished(5.5, true).outcome();
        assert_eq!((rough.tier, rough.points), (Tier::Great, 2));
    }

    #[test]
    fn test_failures_score_zero() {
        let mut monitor = EventMonitor::new(true);
        let event = monitor.observe(7.0, None).unwrap();
        assert_eq!(event.kind(), EventKind::LoopFailed);
        let outcome = event.outcome();
        assert_eq!((outcome.tier, outcome.points), (Tier::Miss, 0));
        assert!(event.is_failure());
    }

    #[test]
    fn test_roll_back_to_start() {
        let mut monitor = EventMonitor::new(false);
        let event = monitor.observe(1.5, Some(Boundary::Start)).unwrap();
        assert_eq!(event.kind(), EventKind::RideComplete);
        assert!(!event.metrics().completed);
        assert_eq!(monitor.phase(), RidePhase::Completed);
        let outcome = event.outcome();
        assert_eq!((outcome.tier, outcome.points), (Tier::Perfect, 3));
        assert_eq!(outcome.label, "Perfect Ride!");
    }

    #[test]
    fn test_roll_back_scores_by_peak_g() {
        let mut monitor = EventMonitor::new(false);
        monitor.observe(3.85, None);
        let outcome = monitor.observe(1.0, Some(Boundary::Start)).unwrap().outcome();
        assert_eq!((outcome.tier, outcome.points), (Tier::Great, 2));
    }

    #[test]
    fn test_roll_back_clears_loop() {
        let mut monitor = EventMonitor::new(true);
        let event = monitor.observe(1.5, Some(Boundary::Start)).unwrap();
        assert_eq!(event.kind(), EventKind::LoopCleared);
        assert_eq!(event.outcome().points, 3);
    }

    #[test]
    fn test_reset_starts_new_attempt() {
        let mut monitor = EventMonitor::new(false);
        monitor.observe(8.0, None);
        monitor.reset(false);
        assert!(monitor.is_running());
        assert_eq!(monitor.peak_g_force(), 0.0);
        assert!(monitor.observe(8.0, None).is_some());
    }

    #[test]
    fn test_non_finite_g_does_not_poison_peak() {
        let mut monitor = EventMonitor::new(false);
        monitor.observe(f32::NAN, None);
        monitor.observe(2.0, None);
        assert_eq!(monitor.peak_g_force(), 2.0);
    }
}
