//! # Control Loop
//!
//! Drives the console at a fixed cadence: sample the power switch and both
//! knobs, run the readings through the volume curve and station resolver,
//! let [`playback::decide`] pick the commands, and hand them to the player.
//!
//! This is the only place side effects happen. Everything it calls into is
//! pure, so the loop can be exercised with simulated inputs and a recording
//! sink instead of real hardware.
//!
//! ## Collaborators
//!
//! The controller talks to hardware and the media engine through three narrow
//! traits. Implementations are expected to never fail from the loop's point of
//! view: inputs return a last-known value on read errors and sinks log their
//! own failures.
//!
//! ## Shutdown
//!
//! [`Controller::run`] exits when the shutdown future resolves. Dropping the
//! controller, on that path or any other, issues exactly one final `stop()`.

use crate::playback::{self, Command, CycleInputs, PlaybackState, PlaybackTarget};
use crate::stations::StationMap;
use crate::volume;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Default tick period.
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Normalized analog control (0.0 to 1.0).
pub trait AnalogInput {
    fn read(&mut self) -> f64;
}

/// On/off control.
pub trait DigitalInput {
    fn read(&mut self) -> bool;
}

/// Media engine commands. Fire-and-forget: failures are the sink's to report.
pub trait PlaybackSink {
    fn stop(&mut self);
    fn load_and_play(&mut self, target: &PlaybackTarget);
    fn set_volume(&mut self, percent: u8);
}

/// Owns the playback state and every collaborator for the life of the loop.
pub struct Controller<T, V, P, S>
where
    T: AnalogInput,
    V: AnalogInput,
    P: DigitalInput,
    S: PlaybackSink,
{
    tuner: T,
    volume: V,
    power: P,
    sink: S,
    stations: StationMap,
    state: PlaybackState,
}

impl<T, V, P, S> Controller<T, V, P, S>
where
    T: AnalogInput,
    V: AnalogInput,
    P: DigitalInput,
    S: PlaybackSink,
{
    pub fn new(tuner: T, volume: V, power: P, sink: S, stations: StationMap) -> Self {
        Self {
            tuner,
            volume,
            power,
            sink,
            stations,
            state: PlaybackState::default(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one control cycle and return the commands that were dispatched.
    pub fn tick(&mut self) -> Vec<Command> {
        let power_on = self.power.read();
        let tuner_pct = self.tuner.read() * 100.0;
        let volume_level = volume::compute_volume(self.volume.read());

        log::debug!(
            "Power: {}  Tuner: {:6.1}  Volume: {:6.1}",
            power_on,
            tuner_pct,
            volume_level
        );

        let inputs = CycleInputs {
            power_on,
            volume: volume_level,
            source: self.stations.resolve(tuner_pct).map(str::to_owned),
        };
        let decision = playback::decide(&self.state, &inputs);

        if decision.state.is_on() != self.state.is_on() {
            log::info!("Power {}", if power_on { "ON" } else { "OFF" });
        }

        for command in &decision.commands {
            match command {
                Command::Stop => self.sink.stop(),
                Command::SetVolume(percent) => self.sink.set_volume(*percent),
                Command::LoadAndPlay(target) => {
                    match target {
                        PlaybackTarget::Stream(url) => log::info!("Tuning to station: {}", url),
                        PlaybackTarget::Static => log::info!("No station matched. Playing static."),
                    }
                    self.sink.load_and_play(target);
                }
            }
        }

        self.state = decision.state;
        decision.commands
    }

    /// Tick every `period` until `shutdown` resolves, then stop playback.
    ///
    /// Ticks that overrun are delayed rather than bursted, so every decision
    /// sees fresh readings.
    pub async fn run<F>(mut self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log::info!(
            "Control loop running every {} ms with {} station(s)",
            period.as_millis(),
            self.stations.len()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
        // Drop issues the final stop
    }
}

impl<T, V, P, S> Drop for Controller<T, V, P, S>
where
    T: AnalogInput,
    V: AnalogInput,
    P: DigitalInput,
    S: PlaybackSink,
{
    fn drop(&mut self) {
        log::info!("Stopping playback");
        self.sink.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::LoggingPlayer;
    use crate::stations::StationBinding;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Rig {
        tuner: Rc<Cell<f64>>,
        volume: Rc<Cell<f64>>,
        power: Rc<Cell<bool>>,
        player: Rc<RefCell<LoggingPlayer>>,
    }

    type TestController =
        Controller<Rc<Cell<f64>>, Rc<Cell<f64>>, Rc<Cell<bool>>, Rc<RefCell<LoggingPlayer>>>;

    fn rig() -> (Rig, TestController) {
        let rig = Rig {
            tuner: Rc::new(Cell::new(0.3)),
            volume: Rc::new(Cell::new(1.0)),
            power: Rc::new(Cell::new(true)),
            player: Rc::new(RefCell::new(LoggingPlayer::new())),
        };
        let stations = StationMap::new(vec![
            StationBinding::new(0.0, 50.0, "A"),
            StationBinding::new(25.0, 75.0, "B"),
        ])
        .unwrap();
        let controller = Controller::new(
            rig.tuner.clone(),
            rig.volume.clone(),
            rig.power.clone(),
            rig.player.clone(),
            stations,
        );
        (rig, controller)
    }

    #[test]
    fn test_first_tick_tunes_first_match() {
        let (rig, mut controller) = rig();
        let commands = controller.tick();
        assert_eq!(
            commands,
            vec![
                Command::SetVolume(100),
                Command::Stop,
                Command::LoadAndPlay(PlaybackTarget::Stream("A".into()))
            ]
        );
        assert_eq!(controller.state(), &PlaybackState::OnTuned("A".into()));
        assert_eq!(rig.player.borrow().history(), commands.as_slice());
    }

    #[test]
    fn test_tuner_is_scaled_to_dial_percent() {
        let (rig, mut controller) = rig();
        rig.tuner.set(0.6);
        controller.tick();
        assert_eq!(controller.state(), &PlaybackState::OnTuned("B".into()));
        rig.tuner.set(0.9);
        controller.tick();
        assert_eq!(controller.state(), &PlaybackState::OnUntuned);
    }

    #[test]
    fn test_volume_goes_through_curve() {
        let (rig, mut controller) = rig();
        rig.volume.set(0.5);
        let commands = controller.tick();
        assert_eq!(commands[0], Command::SetVolume(82));
        rig.volume.set(0.0);
        assert_eq!(controller.tick(), vec![Command::SetVolume(0)]);
    }

    #[test]
    fn test_drop_stops_playback_once() {
        let (rig, mut controller) = rig();
        controller.tick();
        let before = rig.player.borrow().history().len();
        drop(controller);
        let player = rig.player.borrow();
        assert_eq!(player.history().len(), before + 1);
        assert_eq!(player.history().last(), Some(&Command::Stop));
        assert_eq!(player.now_playing(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_shutdown_then_stops() {
        let (rig, controller) = rig();
        controller
            .run(
                Duration::from_millis(50),
                tokio::time::sleep(Duration::from_millis(120)),
            )
            .await;

        let player = rig.player.borrow();
        let history = player.history();
        // Ticks at 0, 50 and 100 ms: one restart, then volume-only ticks
        let volumes = history
            .iter()
            .filter(|c| matches!(c, Command::SetVolume(_)))
            .count();
        let loads = history
            .iter()
            .filter(|c| matches!(c, Command::LoadAndPlay(_)))
            .count();
        assert_eq!(volumes, 3);
        assert_eq!(loads, 1);
        assert_eq!(history.last(), Some(&Command::Stop));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_immediate_shutdown_still_stops() {
        let (rig, controller) = rig();
        controller
            .run(Duration::from_millis(50), std::future::ready(()))
            .await;
        assert_eq!(rig.player.borrow().history(), &[Command::Stop]);
    }
}
