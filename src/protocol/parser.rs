//! Packet parsing for the HTD serial protocol.
//!
//! Maps complete device packets onto zone events. All functions are pure.

use crate::error::{FrameError, Result};
use crate::event::Event;
use crate::protocol::frame::Packet;
use crate::protocol::packet::{PacketType, SYNC_BYTE};
use crate::types::{Level, ZONE_COUNT, ZoneState, ZoneStatus};

/// Length of zone status and zone state packets.
const ZONE_PACKET_LEN: usize = 14;

/// Treble and bass byte encodings.
const TONE_LEVELS: [(u8, i8); 7] = [
    (0xF4, -12),
    (0xF8, -8),
    (0xFC, -4),
    (0x00, 0),
    (0x04, 4),
    (0x08, 8),
    (0x0C, 12),
];

/// Balance byte encodings.
const BALANCE_LEVELS: [(u8, i8); 7] = [
    (0xEE, -18),
    (0xF4, -12),
    (0xFA, -6),
    (0x00, 0),
    (0x06, 6),
    (0x0C, 12),
    (0x12, 18),
];

fn lookup(table: &[(u8, i8)], byte: u8) -> Level {
    table
        .iter()
        .find(|&&(raw, _)| raw == byte)
        .map_or(Level::Invalid(byte), |&(_, level)| Level::Value(level))
}

/// Decodes a treble or bass byte.
#[must_use]
pub fn tone_level(byte: u8) -> Level {
    lookup(&TONE_LEVELS, byte)
}

/// Decodes a balance byte.
#[must_use]
pub fn balance_level(byte: u8) -> Level {
    lookup(&BALANCE_LEVELS, byte)
}

/// Decodes a volume byte. The device counts down from 256, so 0x00 is 256.
#[must_use]
pub fn volume(byte: u8) -> u16 {
    256 - u16::from(byte)
}

const fn bit(byte: u8, pos: usize) -> bool {
    byte & (1 << pos) != 0
}

fn check_zone_packet(data: &[u8]) -> Result<()> {
    if data.len() < ZONE_PACKET_LEN {
        return Err(FrameError::Incomplete {
            expected: ZONE_PACKET_LEN,
            got: data.len(),
        }
        .into());
    }
    if data[0] != SYNC_BYTE {
        return Err(FrameError::BadSync(data[0]).into());
    }
    Ok(())
}

/// Parses a zone status packet.
///
/// Format:
/// ```text
/// [0x02] [0x00] [zone:1] [0x05] [flags:1] [?:1] [?:1] [reserved:1]
/// [input:1] [volume:1] [treble:1] [bass:1] [balance:1] [checksum:1]
/// ```
/// `flags` carries power (bit 7), mute (bit 6), party mode (bit 3) and the
/// party input (bits 0-1).
///
/// Returns `Ok(None)` when the reserved byte is non-zero; the device sends
/// such packets routinely and they do not describe the zone.
pub fn parse_zone_status(data: &[u8]) -> Result<Option<ZoneStatus>> {
    check_zone_packet(data)?;

    if data[7] != 0 {
        return Ok(None);
    }

    let flags = data[4];
    Ok(Some(ZoneStatus {
        zone: data[2],
        power: bit(flags, 7),
        mute: bit(flags, 6),
        party_mode: bit(flags, 3),
        party_input: flags & 0x03,
        input: u16::from(data[8]) + 1,
        volume: volume(data[9]),
        treble: tone_level(data[10]),
        bass: tone_level(data[11]),
        balance: balance_level(data[12]),
    }))
}

/// Parses a zone/keypad existence packet.
///
/// Bit `i` of byte 5 is the power flag of zone `i + 1`; bit `i` of byte 6
/// is its keypad presence.
pub fn parse_zone_state(data: &[u8]) -> Result<ZoneState> {
    check_zone_packet(data)?;

    let mut state = ZoneState::default();
    for i in 0..ZONE_COUNT {
        state.zones[i] = bit(data[5], i);
        state.keypads[i] = bit(data[6], i);
    }
    Ok(state)
}

/// Translates a complete packet into the event it describes, if any.
///
/// Packet types other than zone status and zone state are recognized by the
/// decoder but carry nothing to publish.
#[must_use]
pub fn translate(packet: &Packet) -> Option<Event> {
    let result = match packet.packet_type() {
        PacketType::ZoneStatus => {
            parse_zone_status(packet.as_bytes()).map(|status| status.map(Event::ZoneStatus))
        }
        PacketType::ZoneState => {
            parse_zone_state(packet.as_bytes()).map(|state| Some(Event::ZoneState(state)))
        }
        other => {
            tracing::trace!("ignoring {:?} packet", other);
            Ok(None)
        }
    };

    result.unwrap_or_else(|e| {
        tracing::warn!("failed to parse {:?} packet: {}", packet.packet_type(), e);
        None
    })
}
