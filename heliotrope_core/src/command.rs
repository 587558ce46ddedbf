//! Host commands arriving over the serial link.
//!
//! Commands are newline terminated text tokens. Both the English tokens and the
//! Spanish ones older host tools still send are accepted; anything else is ignored.

use heapless::Vec;
use log::{debug, info};

/// Longest command line kept; longer lines are thrown away whole.
pub const LINE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    EnableAlarms,
    DisableAlarms,
    FollowLight,
    StopFollowing,
}

impl Command {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "alarms_on" | "alarmas_on" => Some(Command::EnableAlarms),
            "alarms_off" | "alarmas_off" => Some(Command::DisableAlarms),
            "follow_light_on" | "seguir_luz" => Some(Command::FollowLight),
            "stop_following" | "no_seguir" => Some(Command::StopFollowing),
            _ => None,
        }
    }
}

/// The two switches the host can flip. Owned by the cycle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlFlags {
    pub alarms: bool,
    pub follow_light: bool,
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self {
            alarms: false,
            follow_light: true,
        }
    }
}

impl ControlFlags {
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::EnableAlarms => self.alarms = true,
            Command::DisableAlarms => self.alarms = false,
            Command::FollowLight => self.follow_light = true,
            Command::StopFollowing => self.follow_light = false,
        }
        info!("{:?}: {:?}", command, self);
    }
}

/// Assembles command lines from a byte stream.
#[derive(Debug, Default)]
pub struct LineBuffer {
    line: Vec<u8, LINE_CAPACITY>,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte, yielding a command when it completes a recognised line.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        if byte != b'\n' {
            if self.line.push(byte).is_err() {
                self.overflowed = true;
            }
            return None;
        }

        let command = if self.overflowed {
            debug!("dropping over-long command line");
            None
        } else {
            let command = core::str::from_utf8(&self.line)
                .ok()
                .and_then(Command::parse);
            if command.is_none() {
                debug!("ignoring unknown command");
            }
            command
        };
        self.line.clear();
        self.overflowed = false;

        command
    }

    pub fn extend<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = Command> + 'a {
        bytes.iter().filter_map(move |b| self.push(*b))
    }
}
