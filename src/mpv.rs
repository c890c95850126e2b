//! # mpv Playback Sink
//!
//! Plays stations through a long-running `mpv` process controlled over its
//! JSON IPC socket. mpv does the stream fetching, decoding and audio output;
//! this module only translates console commands into IPC messages:
//!
//! | Console command        | IPC message                              |
//! |------------------------|------------------------------------------|
//! | `stop`                 | `["stop"]`                               |
//! | `load_and_play(url)`   | `["loadfile", url, "replace"]`           |
//! | `load_and_play(static)`| `["loadfile", <static file>, "replace"]` |
//! | `set_volume(v)`        | `["set_property", "volume", v]`          |
//!
//! Each message is one line of JSON, written in blocking mode with a short
//! timeout so a line is never split. mpv answers every message; replies are
//! drained without blocking and discarded so the socket buffer never fills.
//! Send failures are logged and not retried: the next source change or power
//! cycle tries again. A write that times out leaves the stream unusable.

use crate::controller::PlaybackSink;
use crate::playback::PlaybackTarget;
use serde_json::{json, Value};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Attempts to connect to a freshly spawned mpv before giving up.
const CONNECT_ATTEMPTS: u32 = 40;
const CONNECT_DELAY: Duration = Duration::from_millis(50);

/// Longest a single command may block the control loop.
const WRITE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mpv IPC socket {path} never came up: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mpv IPC: {0}")]
    Io(#[from] std::io::Error),

    #[error("mpv IPC stream is broken; restart required")]
    Broken,
}

/// Encode one IPC request line.
fn encode(args: Value) -> String {
    let mut line = json!({ "command": args }).to_string();
    line.push('\n');
    line
}

/// Connected mpv instance.
pub struct MpvPlayer {
    child: Option<Child>,
    socket: UnixStream,
    static_file: PathBuf,
    last_volume: Option<u8>,
    broken: bool,
}

impl MpvPlayer {
    /// Start `command` (normally `mpv`) in idle mode and connect to its socket.
    pub fn spawn(command: &str, ipc_socket: &Path, static_file: &Path) -> Result<Self, PlayerError> {
        // A stale socket from a crashed run would accept nothing
        let _ = std::fs::remove_file(ipc_socket);

        let child = Command::new(command)
            .arg("--idle=yes")
            .arg("--no-video")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", ipc_socket.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                command: command.to_string(),
                source,
            })?;
        log::info!("Started {} (pid {})", command, child.id());

        let mut attempt = 0;
        let socket = loop {
            match UnixStream::connect(ipc_socket) {
                Ok(socket) => break socket,
                Err(source) if attempt + 1 >= CONNECT_ATTEMPTS => {
                    let mut child = child;
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PlayerError::Connect {
                        path: ipc_socket.to_path_buf(),
                        source,
                    });
                }
                Err(_) => {
                    attempt += 1;
                    thread::sleep(CONNECT_DELAY);
                }
            }
        };

        Self::connected(socket, static_file, Some(child))
    }

    /// Drive an mpv that is already listening on `socket`.
    pub fn from_socket(socket: UnixStream, static_file: &Path) -> Result<Self, PlayerError> {
        Self::connected(socket, static_file, None)
    }

    fn connected(
        socket: UnixStream,
        static_file: &Path,
        child: Option<Child>,
    ) -> Result<Self, PlayerError> {
        // Built before the fallible call so a failure still kills the child
        let player = Self {
            child,
            socket,
            static_file: static_file.to_path_buf(),
            last_volume: None,
            broken: false,
        };
        player.socket.set_nonblocking(false)?;
        player.socket.set_write_timeout(Some(WRITE_TIMEOUT))?;
        Ok(player)
    }

    fn send(&mut self, args: Value) -> Result<(), PlayerError> {
        if self.broken {
            return Err(PlayerError::Broken);
        }
        self.drain_replies()?;
        let line = encode(args);
        // A timed-out write may leave half a line behind, so the stream is done
        if let Err(e) = self.socket.write_all(line.as_bytes()) {
            self.broken = true;
            return Err(e.into());
        }
        Ok(())
    }

    /// Read and discard pending replies without blocking.
    fn drain_replies(&mut self) -> Result<(), PlayerError> {
        self.socket.set_nonblocking(true)?;
        let result = self.read_pending();
        self.socket.set_nonblocking(false)?;
        result
    }

    fn read_pending(&mut self) -> Result<(), PlayerError> {
        let mut buf = [0u8; 1024];
        loop {
            match self.socket.read(&mut buf) {
                Ok(0) => {
                    self.broken = true;
                    return Err(PlayerError::Io(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "mpv closed the IPC socket",
                    )));
                }
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn send_logged(&mut self, what: &str, args: Value) -> bool {
        match self.send(args) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("mpv {} failed: {}", what, e);
                false
            }
        }
    }
}

impl PlaybackSink for MpvPlayer {
    fn stop(&mut self) {
        self.send_logged("stop", json!(["stop"]));
    }

    fn load_and_play(&mut self, target: &PlaybackTarget) {
        let location = match target {
            PlaybackTarget::Stream(url) => url.clone(),
            PlaybackTarget::Static => {
                if !self.static_file.exists() {
                    log::warn!(
                        "Static audio file not found: {}",
                        self.static_file.display()
                    );
                    return;
                }
                self.static_file.display().to_string()
            }
        };
        self.send_logged("loadfile", json!(["loadfile", location, "replace"]));
    }

    fn set_volume(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last_volume == Some(percent) {
            return;
        }
        if self.send_logged("volume", json!(["set_property", "volume", percent])) {
            self.last_volume = Some(percent);
        }
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
