//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the ghost-radio.toml file.
//! It provides a centralized way to configure the station list location, the ADC and
//! power switch wiring, the control loop cadence and the media player.
//!
//! Every field has a default, so a file only needs the settings that differ from
//! the reference build (MCP3008 on spidev0.1, power switch on GPIO 17).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "ghost-radio.toml";

/// Application configuration loaded from ghost-radio.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// JSON file with the tuner-range to stream bindings
    pub stations_file: PathBuf,
    /// Local audio played when the dial is between stations
    pub static_file: PathBuf,
    /// Control loop period in milliseconds
    pub tick_ms: u64,
    /// ADC and GPIO wiring
    pub hardware: HardwareConfig,
    /// Media player process
    pub player: PlayerConfig,
}

/// Wiring of the knobs and the power switch
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// SPI bus number (the N in /dev/spidevN.M)
    pub spi_bus: u8,
    /// SPI chip select (the M in /dev/spidevN.M)
    pub spi_chip_select: u8,
    /// SPI clock; the MCP3008 is happy at 500 kHz on 3.3 V
    pub spi_clock_hz: u32,
    /// MCP3008 channel wired to the tuner pot
    pub tuner_channel: u8,
    /// MCP3008 channel wired to the volume pot
    pub volume_channel: u8,
    /// Reverse the tuner reading (pot mounted backwards)
    pub invert_tuner: bool,
    /// GPIO character device
    pub gpio_chip: PathBuf,
    /// BCM line number of the power switch
    pub power_pin: u32,
    /// Switch pulls the line low when on (pull-up wiring)
    pub power_active_low: bool,
}

/// External media player settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv executable
    pub command: String,
    /// Path of the JSON IPC socket mpv is told to open
    pub ipc_socket: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stations_file: PathBuf::from("stations.json"),
            static_file: PathBuf::from("static.wav"),
            tick_ms: 50,
            hardware: HardwareConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            spi_bus: 0,
            spi_chip_select: 1, // spidev0.0 is not exposed on the reference build
            spi_clock_hz: 500_000,
            tuner_channel: 0,
            volume_channel: 1,
            invert_tuner: true,
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            power_pin: 17,
            power_active_low: true,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            command: "mpv".to_string(),
            ipc_socket: PathBuf::from("/tmp/ghost-radio-mpv.sock"),
        }
    }
}

impl Config {
    /// Load configuration from ghost-radio.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config file format in {}: {}", path.display(), e);
                    log::warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        log::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Control loop period, never shorter than 1 ms
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Device node of the ADC, e.g. /dev/spidev0.1
    pub fn spi_device(&self) -> PathBuf {
        PathBuf::from(format!(
            "/dev/spidev{}.{}",
            self.hardware.spi_bus, self.hardware.spi_chip_select
        ))
    }
}
