//! # Playback Decisions
//!
//! Pure state machine that decides, once per control tick, what the player
//! has to do. It never touches hardware; the controller feeds it this tick's
//! readings plus the previous state and dispatches the returned commands.
//!
//! ## States
//!
//! - [`PlaybackState::Off`]: power switch is off. The last selected source is
//!   remembered but never reused without a restart.
//! - [`PlaybackState::OnTuned`]: powered and playing a station stream.
//! - [`PlaybackState::OnUntuned`]: powered, dial between stations, playing static.
//!
//! ## Restart Rule
//!
//! Stopping and reloading media is slow and audible, so playback restarts only
//! when the resolved source changes or when power has just come on. A power
//! cycle always restarts, even onto the same station, because the old media
//! handle is stale. Volume is applied every powered tick.

use crate::volume;

/// What the player should load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackTarget {
    /// Network stream URL from the station map
    Stream(String),
    /// Local static noise file
    Static,
}

impl From<Option<String>> for PlaybackTarget {
    fn from(source: Option<String>) -> Self {
        match source {
            Some(url) => PlaybackTarget::Stream(url),
            None => PlaybackTarget::Static,
        }
    }
}

/// Command for the playback sink, in dispatch order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Stop,
    SetVolume(u8),
    LoadAndPlay(PlaybackTarget),
}

/// Playback state carried from one tick to the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Off { remembered: Option<String> },
    OnTuned(String),
    OnUntuned,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Off { remembered: None }
    }
}

impl PlaybackState {
    pub fn is_on(&self) -> bool {
        !matches!(self, PlaybackState::Off { .. })
    }

    /// Source selected in this state (`None` means static or nothing).
    pub fn selected_source(&self) -> Option<&str> {
        match self {
            PlaybackState::Off { remembered } => remembered.as_deref(),
            PlaybackState::OnTuned(url) => Some(url),
            PlaybackState::OnUntuned => None,
        }
    }

    fn powered(source: Option<String>) -> Self {
        match source {
            Some(url) => PlaybackState::OnTuned(url),
            None => PlaybackState::OnUntuned,
        }
    }
}

/// Readings for one tick, already run through the volume curve and resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleInputs {
    pub power_on: bool,
    /// Output level from [`volume::compute_volume`], 0 to 100
    pub volume: f64,
    /// Resolved station URL, `None` for static
    pub source: Option<String>,
}

/// Outcome of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub state: PlaybackState,
    pub commands: Vec<Command>,
}

impl Decision {
    /// True if this tick stops and reloads media.
    pub fn restarted(&self) -> bool {
        self.commands
            .iter()
            .any(|command| matches!(command, Command::LoadAndPlay(_)))
    }
}

/// Decide the next state and the commands for this tick.
///
/// # Example
/// ```
/// use ghost_radio_lib::playback::{decide, Command, CycleInputs, PlaybackState, PlaybackTarget};
///
/// let inputs = CycleInputs { power_on: true, volume: 95.0, source: None };
/// let decision = decide(&PlaybackState::default(), &inputs);
///
/// assert_eq!(decision.state, PlaybackState::OnUntuned);
/// assert_eq!(
///     decision.commands,
///     vec![
///         Command::SetVolume(95),
///         Command::Stop,
///         Command::LoadAndPlay(PlaybackTarget::Static),
///     ]
/// );
/// ```
pub fn decide(prev: &PlaybackState, inputs: &CycleInputs) -> Decision {
    if !inputs.power_on {
        // Stop is idempotent; selection memory survives the off period
        return Decision {
            state: PlaybackState::Off {
                remembered: prev.selected_source().map(str::to_owned),
            },
            commands: vec![Command::Stop],
        };
    }

    let mut commands = vec![Command::SetVolume(volume::to_percent(inputs.volume))];

    let source_changed = inputs.source.as_deref() != prev.selected_source();
    if source_changed || !prev.is_on() {
        commands.push(Command::Stop);
        commands.push(Command::LoadAndPlay(PlaybackTarget::from(
            inputs.source.clone(),
        )));
        return Decision {
            state: PlaybackState::powered(inputs.source.clone()),
            commands,
        };
    }

    Decision {
        state: prev.clone(),
        commands,
    }
}
