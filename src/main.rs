//! Coaster Sim headless runner
//!
//! Rides one track to its terminal event and prints a JSON summary.
//!
//! Usage: `coaster-sim [settings.json] [preset]`

use std::error::Error;
use std::path::Path;

use coaster_sim::Settings;
use coaster_sim::sim::{Event, Session, Track, TrackPreset};

/// Give up on rides that never reach a terminal event (simulated seconds)
const RIDE_TIMEOUT_SECS: f32 = 120.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut settings = Settings::default();
    let mut preset = TrackPreset::Valley;
    for arg in std::env::args().skip(1) {
        if arg.ends_with(".json") {
            settings = Settings::load(Path::new(&arg))?;
        } else {
            preset = TrackPreset::from_str(&arg).ok_or_else(|| {
                let known: Vec<_> = TrackPreset::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown preset '{arg}' (expected one of {})", known.join(", "))
            })?;
        }
    }
    log::info!("Coaster Sim (native) starting: preset {}", preset.as_str());

    let sim_dt = settings.sim_dt;
    let mut session = Session::with_track(settings, Track::preset(preset));
    session.start_challenge();
    session.start_run()?;

    let max_ticks = (RIDE_TIMEOUT_SECS / sim_dt).ceil() as u64;
    let mut terminal: Option<Event> = None;
    while terminal.is_none() && session.time_ticks() < max_ticks {
        terminal = session.tick(sim_dt).events.into_iter().next();
    }
    if terminal.is_none() {
        log::warn!("ride timed out after {RIDE_TIMEOUT_SECS}s");
    }

    let summary = serde_json::json!({
        "preset": preset.as_str(),
        "samples": session.path().len(),
        "track_length": session.path().total_length(),
        "loop_detected": session.path().has_loop(),
        "ticks": session.time_ticks(),
        "event": terminal.map(|e| e.kind().as_str()),
        "outcome": terminal.map(|e| e.outcome()),
        "peak_g_force": session.monitor().peak_g_force(),
        "max_energy_drift": session.max_energy_drift(),
        "challenge": session.challenge(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm; there is no runner
}
