//! # Ghost Radio Application Entry Point
//!
//! This binary wires the control loop to real hardware (MCP3008 knobs, GPIO
//! power switch, mpv player) or, with `--mock`, to simulated controls for
//! development without a Pi. It also edits the station list (`stations`
//! subcommand).

// Test modules
#[cfg(test)]
mod tests;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_sysfs;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hw_spi_spidev;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ghost_radio_lib::config::{Config, CONFIG_FILE};
use ghost_radio_lib::mock::{LoggingPlayer, SimulatedKnob, SimulatedSwitch};
use ghost_radio_lib::stations::{StationBinding, StationMap};
use ghost_radio_lib::{AnalogInput, Controller, DigitalInput, PlaybackSink};
use std::path::PathBuf;
use std::time::Duration;

/// Ghost Radio - analog tuner console for internet radio
#[derive(Parser, Debug)]
#[command(name = "ghost-radio")]
#[command(about = "Analog tuner console for internet radio streams", long_about = None)]
#[command(version)]
pub struct Args {
    /// Path to configuration file (default: ghost-radio.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use simulated knobs and power switch instead of hardware
    #[arg(long)]
    pub mock: bool,

    /// Simulated tuner position in percent
    #[arg(long, default_value_t = 50.0, requires = "mock")]
    pub tuner: f64,

    /// Simulated volume knob position in percent
    #[arg(long, default_value_t = 75.0, requires = "mock")]
    pub volume: f64,

    /// Start the simulated power switch in the off position
    #[arg(long, requires = "mock")]
    pub power_off: bool,

    /// Let the simulated knobs wander randomly
    #[arg(long, requires = "mock")]
    pub drift: bool,

    /// Send simulated sessions to mpv instead of only logging
    #[arg(long, requires = "mock")]
    pub play: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    pub write_config: bool,

    #[command(subcommand)]
    pub command: Option<Cmd>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Cmd {
    /// Inspect or edit the station list
    Stations {
        #[command(subcommand)]
        action: StationAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum StationAction {
    /// Print stations in match order
    List,
    /// Append a station
    Add {
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
        #[arg(long)]
        url: String,
    },
    /// Replace the station at INDEX, keeping its position
    Update {
        index: usize,
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
        #[arg(long)]
        url: String,
    },
    /// Remove the station at INDEX
    Remove { index: usize },
    /// Move a station to a new position (earlier wins overlaps)
    Move { from: usize, to: usize },
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("Ghost Radio v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = Config::load_from_path(&config_path);

    if args.write_config {
        return config.save(&config_path);
    }

    if let Some(Cmd::Stations { action }) = &args.command {
        return manage_stations(&config, action);
    }

    // A bad station list is fatal: never start the loop without one
    let stations = StationMap::load(&config.stations_file).with_context(|| {
        format!(
            "loading station map from {}",
            config.stations_file.display()
        )
    })?;

    let duration = args.duration.map(Duration::from_secs);
    if let Some(limit) = duration {
        log::info!("Running for {} seconds", limit.as_secs());
    }

    if args.mock {
        return run_mock(&args, &config, stations, duration);
    }

    run_hardware(&config, stations, duration)
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .parse_default_env()
        .init();
}

/// Apply a `stations` subcommand to the configured station file.
fn manage_stations(config: &Config, action: &StationAction) -> anyhow::Result<()> {
    let path = &config.stations_file;

    // Adding to a list that does not exist yet starts a new file
    let mut map = match (action, path.exists()) {
        (StationAction::Add { .. }, false) => StationMap::default(),
        _ => StationMap::load(path)
            .with_context(|| format!("loading station map from {}", path.display()))?,
    };

    match action {
        StationAction::List => {
            if map.is_empty() {
                println!("No stations configured; the whole dial plays static.");
            }
            for (index, binding) in map.bindings().iter().enumerate() {
                println!(
                    "{:>3}  {:6.1} - {:6.1}  {}",
                    index, binding.min, binding.max, binding.url
                );
            }
            return Ok(());
        }
        StationAction::Add { min, max, url } => {
            map.add(StationBinding::new(*min, *max, url.clone()))?;
            log::info!("Added {} at {:.1}-{:.1}", url, min, max);
        }
        StationAction::Update {
            index,
            min,
            max,
            url,
        } => {
            let old = map.update(*index, StationBinding::new(*min, *max, url.clone()))?;
            log::info!(
                "Station {} now {} at {:.1}-{:.1} (was {})",
                index,
                url,
                min,
                max,
                old.url
            );
        }
        StationAction::Remove { index } => {
            let removed = map.remove(*index)?;
            log::info!("Removed {}", removed.url);
        }
        StationAction::Move { from, to } => {
            map.move_binding(*from, *to)?;
            log::info!("Moved station {} to position {}", from, to);
        }
    }

    map.save(path)
        .with_context(|| format!("saving station map to {}", path.display()))
}

/// Resolves on Ctrl-C, SIGTERM, or after `limit` if given.
async fn shutdown_signal(limit: Option<Duration>) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let timer = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = interrupt => log::info!("Interrupted"),
        _ = terminate => log::info!("Terminated"),
        _ = timer => log::info!("Run duration elapsed"),
    }
}

/// Build the single-threaded runtime and drive `controller` until shutdown.
fn run_controller<T, V, P, S>(
    config: &Config,
    controller: Controller<T, V, P, S>,
    duration: Option<Duration>,
) -> anyhow::Result<()>
where
    T: AnalogInput,
    V: AnalogInput,
    P: DigitalInput,
    S: PlaybackSink,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    log::info!("Ghost Radio initialized. Press Ctrl+C to exit.");
    rt.block_on(controller.run(config.tick(), shutdown_signal(duration)));
    log::info!("Ghost Radio stopped.");
    Ok(())
}

fn run_mock(
    args: &Args,
    config: &Config,
    stations: StationMap,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    let (tuner, volume) = if args.drift {
        log::info!("Mock controls drifting every {:?}", ghost_radio_lib::mock::DRIFT_INTERVAL);
        (
            SimulatedKnob::drifting(args.tuner, 1.0),
            SimulatedKnob::drifting(args.volume, 1.5),
        )
    } else {
        (
            SimulatedKnob::fixed(args.tuner),
            SimulatedKnob::fixed(args.volume),
        )
    };
    let power = SimulatedSwitch(!args.power_off);

    if args.play {
        #[cfg(unix)]
        {
            let player = ghost_radio_lib::mpv::MpvPlayer::spawn(
                &config.player.command,
                &config.player.ipc_socket,
                &config.static_file,
            )?;
            let controller = Controller::new(tuner, volume, power, player, stations);
            return run_controller(config, controller, duration);
        }
        #[cfg(not(unix))]
        return Err(anyhow::anyhow!("--play needs mpv IPC, which is unix only"));
    }

    let controller = Controller::new(tuner, volume, power, LoggingPlayer::new(), stations);
    run_controller(config, controller, duration)
}

#[cfg(all(target_os = "linux", feature = "hardware"))]
fn run_hardware(
    config: &Config,
    stations: StationMap,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    use ghost_radio_lib::mcp3008::{Mcp3008, Mcp3008Channel};
    use std::cell::RefCell;
    use std::rc::Rc;

    let hw = &config.hardware;
    log::info!(
        "MCP3008 on {} (tuner ch {}, volume ch {}), power switch on GPIO {}",
        config.spi_device().display(),
        hw.tuner_channel,
        hw.volume_channel,
        hw.power_pin
    );

    let spi = hw_spi_spidev::SpidevAdc::open(config).context("opening MCP3008")?;
    let adc = Rc::new(RefCell::new(Mcp3008::new(spi)));
    let tuner = Mcp3008Channel::new(adc.clone(), hw.tuner_channel, hw.invert_tuner)?;
    let volume = Mcp3008Channel::new(adc, hw.volume_channel, false)?;
    let power = gpio_sysfs::PowerSwitch::open(config).context("opening power switch")?;

    let player = ghost_radio_lib::mpv::MpvPlayer::spawn(
        &config.player.command,
        &config.player.ipc_socket,
        &config.static_file,
    )?;

    let controller = Controller::new(tuner, volume, power, player, stations);
    run_controller(config, controller, duration)
}

#[cfg(not(all(target_os = "linux", feature = "hardware")))]
fn run_hardware(
    _config: &Config,
    _stations: StationMap,
    _duration: Option<Duration>,
) -> anyhow::Result<()> {
    if cfg!(target_os = "linux") {
        Err(anyhow::anyhow!(
            "Hardware support not enabled. Rebuild with --features hardware, or use --mock."
        ))
    } else {
        Err(anyhow::anyhow!(
            "Hardware mode is only available on Linux. Use --mock for development."
        ))
    }
}
