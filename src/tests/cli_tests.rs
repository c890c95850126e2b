//! Command line parsing checks.

use crate::{Args, Cmd, StationAction};
use clap::Parser;

#[test]
fn defaults_run_hardware_mode() {
    let args = Args::try_parse_from(["ghost-radio"]).unwrap();
    assert!(!args.mock);
    assert_eq!(args.duration, None);
    assert_eq!(args.verbose, 0);
    assert!(args.command.is_none());
}

#[test]
fn mock_options_parse() {
    let args = Args::try_parse_from([
        "ghost-radio",
        "--mock",
        "--tuner",
        "42.5",
        "--power-off",
        "--duration",
        "10",
        "-vv",
    ])
    .unwrap();
    assert!(args.mock);
    assert_eq!(args.tuner, 42.5);
    assert_eq!(args.volume, 75.0);
    assert!(args.power_off);
    assert_eq!(args.duration, Some(10));
    assert_eq!(args.verbose, 2);
}

#[test]
fn simulated_controls_require_mock() {
    assert!(Args::try_parse_from(["ghost-radio", "--tuner", "10"]).is_err());
    assert!(Args::try_parse_from(["ghost-radio", "--drift"]).is_err());
}

#[test]
fn station_subcommands_parse() {
    let args = Args::try_parse_from([
        "ghost-radio",
        "stations",
        "add",
        "--min",
        "10",
        "--max",
        "20",
        "--url",
        "http://radio/a",
    ])
    .unwrap();
    assert_eq!(
        args.command,
        Some(Cmd::Stations {
            action: StationAction::Add {
                min: 10.0,
                max: 20.0,
                url: "http://radio/a".into()
            }
        })
    );

    let args = Args::try_parse_from(["ghost-radio", "stations", "move", "2", "0"]).unwrap();
    assert_eq!(
        args.command,
        Some(Cmd::Stations {
            action: StationAction::Move { from: 2, to: 0 }
        })
    );

    let args = Args::try_parse_from([
        "ghost-radio",
        "stations",
        "update",
        "1",
        "--min",
        "30",
        "--max",
        "35.5",
        "--url",
        "http://radio/b",
    ])
    .unwrap();
    assert_eq!(
        args.command,
        Some(Cmd::Stations {
            action: StationAction::Update {
                index: 1,
                min: 30.0,
                max: 35.5,
                url: "http://radio/b".into()
            }
        })
    );
    assert!(Args::try_parse_from(["ghost-radio", "stations", "update", "1"]).is_err());
}
