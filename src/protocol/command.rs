//! Command encoding for the HTD serial protocol.
//!
//! Every outbound command is a fixed six-byte packet:
//! ```text
//! [0x02] [0x00] [zone] [type] [opcode] [checksum]
//! ```
//! where `type` is `0x06` for a status query and `0x04` for a modification,
//! and `checksum` is the 8-bit wrapping sum of the five preceding bytes.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::packet::SYNC_BYTE;

/// Length of every outbound command packet.
pub const COMMAND_LEN: usize = 6;

/// Type byte of a status query.
pub const QUERY_TYPE: u8 = 0x06;

/// Type byte of a modification command.
pub const MODIFY_TYPE: u8 = 0x04;

/// Zone id addressing every zone at once.
pub const ALL_ZONES: u8 = 0;

/// Lowest selectable source.
pub const MIN_SOURCE: u8 = 1;

/// Highest selectable source.
pub const MAX_SOURCE: u8 = 6;

/// Command opcodes sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandOpcode {
    /// Request current status.
    Query = 0x00,
    /// Raise volume one step.
    VolumeUp = 0x09,
    /// Lower volume one step.
    VolumeDown = 0x0A,
    /// Power the zone on.
    PowerOn = 0x20,
    /// Power the zone off.
    PowerOff = 0x21,
    /// Raise bass one step.
    BassUp = 0x26,
    /// Lower bass one step.
    BassDown = 0x27,
    /// Raise treble one step.
    TrebleUp = 0x28,
    /// Lower treble one step.
    TrebleDown = 0x29,
    /// Shift balance right.
    BalanceRight = 0x2A,
    /// Shift balance left.
    BalanceLeft = 0x2B,
    /// Power every zone on (zone 0 only).
    AllOn = 0x38,
    /// Power every zone off (zone 0 only).
    AllOff = 0x39,
}

impl From<CommandOpcode> for u8 {
    fn from(cmd: CommandOpcode) -> Self {
        cmd as Self
    }
}

/// A validated source input, 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Source(u8);

impl Source {
    /// Validates a source number.
    pub fn new(source: u8) -> Result<Self> {
        if (MIN_SOURCE..=MAX_SOURCE).contains(&source) {
            Ok(Self(source))
        } else {
            Err(Error::InvalidSource {
                value: source.to_string(),
            })
        }
    }

    /// Source number, 1-based.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Opcode selecting this source.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        self.0 + 2
    }
}

impl std::str::FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.parse::<u8>().map_err(|_| Error::InvalidSource {
            value: s.to_string(),
        })?;
        Self::new(value)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A device action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Request current status.
    Query,
    /// Power on.
    PowerOn,
    /// Power off.
    PowerOff,
    /// Volume up.
    VolumeUp,
    /// Volume down.
    VolumeDown,
    /// Balance left.
    BalanceLeft,
    /// Balance right.
    BalanceRight,
    /// Treble up.
    TrebleUp,
    /// Treble down.
    TrebleDown,
    /// Bass up.
    BassUp,
    /// Bass down.
    BassDown,
    /// Select an input source.
    SetSource(Source),
    /// Power every zone on.
    AllOn,
    /// Power every zone off.
    AllOff,
}

impl Command {
    /// Opcode byte for this action.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        let op = match self {
            Self::SetSource(source) => return source.opcode(),
            Self::Query => CommandOpcode::Query,
            Self::PowerOn => CommandOpcode::PowerOn,
            Self::PowerOff => CommandOpcode::PowerOff,
            Self::VolumeUp => CommandOpcode::VolumeUp,
            Self::VolumeDown => CommandOpcode::VolumeDown,
            Self::BalanceLeft => CommandOpcode::BalanceLeft,
            Self::BalanceRight => CommandOpcode::BalanceRight,
            Self::TrebleUp => CommandOpcode::TrebleUp,
            Self::TrebleDown => CommandOpcode::TrebleDown,
            Self::BassUp => CommandOpcode::BassUp,
            Self::BassDown => CommandOpcode::BassDown,
            Self::AllOn => CommandOpcode::AllOn,
            Self::AllOff => CommandOpcode::AllOff,
        };
        op as u8
    }
}

/// A command addressed to a zone, consumed once by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandRequest {
    /// Target zone, or [`ALL_ZONES`].
    pub zone: u8,
    /// Action to perform.
    pub command: Command,
}

impl CommandRequest {
    /// Creates a request for a zone.
    #[must_use]
    pub const fn new(zone: u8, command: Command) -> Self {
        Self { zone, command }
    }

    /// Queries every zone.
    #[must_use]
    pub const fn all_zone_query() -> Self {
        Self::new(ALL_ZONES, Command::Query)
    }

    /// Encodes the request into its wire form.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        encode_command(self.zone, self.command.opcode())
    }
}

/// Computes the 8-bit wrapping sum of `data`.
#[must_use]
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Encodes a zone and opcode into a checksummed command packet.
#[must_use]
pub fn encode_command(zone: u8, opcode: u8) -> Bytes {
    let packet_type = if opcode == u8::from(CommandOpcode::Query) {
        QUERY_TYPE
    } else {
        MODIFY_TYPE
    };

    let mut buf = BytesMut::with_capacity(COMMAND_LEN);
    buf.put_u8(SYNC_BYTE);
    buf.put_u8(0x00);
    buf.put_u8(zone);
    buf.put_u8(packet_type);
    buf.put_u8(opcode);
    let sum = checksum(&buf);
    buf.put_u8(sum);
    buf.freeze()
}
