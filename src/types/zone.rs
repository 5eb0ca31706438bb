//! Zone status and state types.

use std::fmt;

/// Number of zones on the amplifier.
pub const ZONE_COUNT: usize = 6;

/// A decoded treble, bass or balance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Level in device steps (dB for tone, position for balance).
    Value(i8),
    /// Raw byte outside the defined table.
    Invalid(u8),
}

impl Level {
    /// Returns the level if the raw byte was in the table.
    #[must_use]
    pub const fn value(self) -> Option<i8> {
        match self {
            Self::Value(v) => Some(v),
            Self::Invalid(_) => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Invalid(_) => f.write_str("err"),
        }
    }
}

/// Snapshot of one zone, decoded from a zone status packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStatus {
    /// Zone id.
    pub zone: u8,
    /// Power on.
    pub power: bool,
    /// Muted.
    pub mute: bool,
    /// Party mode enabled.
    pub party_mode: bool,
    /// Party input (0-3).
    pub party_input: u8,
    /// Selected input source, 1-based.
    pub input: u16,
    /// Volume (1-256, larger is louder).
    pub volume: u16,
    /// Treble level.
    pub treble: Level,
    /// Bass level.
    pub bass: Level,
    /// Balance level.
    pub balance: Level,
}

/// Power and keypad presence for every zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneState {
    /// Power flag per zone, index 0 is zone 1.
    pub zones: [bool; ZONE_COUNT],
    /// Keypad presence per zone, index 0 is zone 1.
    pub keypads: [bool; ZONE_COUNT],
}

/// Renders a flag the way the device documentation names it.
#[must_use]
pub const fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
