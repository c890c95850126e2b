//! # Simulated Hardware
//!
//! Stand-ins for the knobs, the power switch and the media engine so the
//! console can run on a development machine (`ghost-radio --mock`).

use crate::controller::{AnalogInput, DigitalInput, PlaybackSink};
use crate::playback::{Command, PlaybackTarget};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// How often a drifting knob takes a random step.
pub const DRIFT_INTERVAL: Duration = Duration::from_secs(2);

/// Knob held at a fixed position, optionally wandering like a hand on the dial.
pub struct SimulatedKnob {
    value: f64,
    /// Largest step per drift interval, as a fraction of full travel
    drift: Option<f64>,
    last_drift: Instant,
    rng: fastrand::Rng,
}

impl SimulatedKnob {
    /// A knob parked at `percent` (0 to 100).
    pub fn fixed(percent: f64) -> Self {
        Self {
            value: (percent / 100.0).clamp(0.0, 1.0),
            drift: None,
            last_drift: Instant::now(),
            rng: fastrand::Rng::new(),
        }
    }

    /// A knob starting at `percent` that moves up to `step_percent` either way
    /// every [`DRIFT_INTERVAL`].
    pub fn drifting(percent: f64, step_percent: f64) -> Self {
        Self {
            drift: Some(step_percent / 100.0),
            ..Self::fixed(percent)
        }
    }

    /// Same as [`SimulatedKnob::drifting`] with a seeded generator.
    pub fn drifting_with_seed(percent: f64, step_percent: f64, seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            ..Self::drifting(percent, step_percent)
        }
    }

    fn step(&mut self) {
        if let Some(max_step) = self.drift {
            // Uniform in -max_step..max_step
            let delta = (self.rng.f64() - 0.5) * 2.0 * max_step;
            self.value = (self.value + delta).clamp(0.0, 1.0);
        }
    }
}

impl AnalogInput for SimulatedKnob {
    fn read(&mut self) -> f64 {
        if self.drift.is_some() && self.last_drift.elapsed() >= DRIFT_INTERVAL {
            self.step();
            self.last_drift = Instant::now();
        }
        self.value
    }
}

/// Power switch stuck in one position.
pub struct SimulatedSwitch(pub bool);

impl DigitalInput for SimulatedSwitch {
    fn read(&mut self) -> bool {
        self.0
    }
}

/// Player that only logs what it was told and remembers it.
#[derive(Debug, Default)]
pub struct LoggingPlayer {
    history: Vec<Command>,
    now_playing: Option<PlaybackTarget>,
    volume: u8,
}

impl LoggingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command received, oldest first.
    pub fn history(&self) -> &[Command] {
        &self.history
    }

    pub fn now_playing(&self) -> Option<&PlaybackTarget> {
        self.now_playing.as_ref()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }
}

impl PlaybackSink for LoggingPlayer {
    fn stop(&mut self) {
        if self.now_playing.take().is_some() {
            log::info!("Mock: audio stopped");
        }
        self.history.push(Command::Stop);
    }

    fn load_and_play(&mut self, target: &PlaybackTarget) {
        match target {
            PlaybackTarget::Stream(url) => log::info!("Mock: now playing stream {}", url),
            PlaybackTarget::Static => log::info!("Mock: now playing static"),
        }
        self.now_playing = Some(target.clone());
        self.history.push(Command::LoadAndPlay(target.clone()));
    }

    fn set_volume(&mut self, percent: u8) {
        if percent != self.volume {
            log::debug!("Mock: volume {}", percent);
        }
        self.volume = percent.min(100);
        self.history.push(Command::SetVolume(percent));
    }
}

/// Shared knob for scripted rigs: keep a clone and turn it between ticks.
impl AnalogInput for Rc<Cell<f64>> {
    fn read(&mut self) -> f64 {
        self.get()
    }
}

/// Shared switch for scripted rigs.
impl DigitalInput for Rc<Cell<bool>> {
    fn read(&mut self) -> bool {
        self.get()
    }
}

/// Shared player for scripted rigs, inspectable while the controller owns a clone.
impl<S: PlaybackSink> PlaybackSink for Rc<RefCell<S>> {
    fn stop(&mut self) {
        self.borrow_mut().stop();
    }

    fn load_and_play(&mut self, target: &PlaybackTarget) {
        self.borrow_mut().load_and_play(target);
    }

    fn set_volume(&mut self, percent: u8) {
        self.borrow_mut().set_volume(percent);
    }
}
