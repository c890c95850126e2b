//! # Ghost Radio Core Library
//!
//! Control logic for a vintage-style internet radio: a tuner knob picks a
//! streaming station, a volume knob sets the level, and a power switch turns
//! the whole thing on and off. Built for a Raspberry Pi with an MCP3008 ADC,
//! but everything outside the hardware adapters runs anywhere.
//!
//! ## Data Flow
//!
//! Every 50 ms the [`controller::Controller`] runs one cycle:
//!
//! 1. **Sample**: power switch, tuner and volume readings (0.0 to 1.0)
//! 2. **Map**: volume through the taper in [`volume`], tuner through the
//!    first-match lookup in [`stations`]
//! 3. **Decide**: [`playback::decide`] compares against last cycle's state and
//!    picks the player commands
//! 4. **Act**: commands go to a [`controller::PlaybackSink`]
//!
//! Steps 2 and 3 are pure functions. Playback only restarts when the station
//! changes or power comes on, so a steady dial plays without gaps.
//!
//! ## Modules
//!
//! - [`volume`]: knob-to-level curve with hard mute
//! - [`stations`]: station list file, validation and tuner lookup
//! - [`playback`]: playback state machine
//! - [`controller`]: collaborator traits and the fixed-rate loop
//! - [`mcp3008`]: ADC protocol behind the knobs
//! - [`mpv`]: player backed by an `mpv` process (unix)
//! - [`mock`]: simulated knobs, switch and player
//! - [`config`]: `ghost-radio.toml`

pub mod config;
pub mod controller;
pub mod mcp3008;
pub mod mock;
#[cfg(unix)]
pub mod mpv;
pub mod playback;
pub mod stations;
pub mod volume;

pub use controller::{AnalogInput, Controller, DigitalInput, PlaybackSink};
pub use playback::{Command, PlaybackState, PlaybackTarget};
pub use stations::{StationBinding, StationMap};
