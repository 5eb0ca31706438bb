//! Packet type definitions for the HTD serial protocol.
//!
//! Every device packet starts with the sync marker and carries its command
//! type at offset 3. The command type alone decides the packet length.

/// Synchronization marker that starts every packet.
pub const SYNC_BYTE: u8 = 0x02;

/// Offset of the command-type byte within a packet.
pub const TYPE_OFFSET: usize = 3;

/// Length assumed for an unrecognized command type.
pub const UNKNOWN_PACKET_LEN: usize = 1;

/// Command types carried at offset 3 of a device packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Echo of a zone modification command.
    ZoneModify = 0x04,
    /// Zone internal status snapshot.
    ZoneStatus = 0x05,
    /// Zone and keypad existence bitmap.
    ZoneState = 0x06,
    /// Model information.
    ModelInfo = 0x08,
    /// Memory slot read request (M1, M2 or M3).
    MemoryRead = 0x0A,
    /// Memory slot response.
    MemoryResponse = 0x0B,
}

impl PacketType {
    /// Looks up a command-type byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x04 => Some(Self::ZoneModify),
            0x05 => Some(Self::ZoneStatus),
            0x06 => Some(Self::ZoneState),
            0x08 => Some(Self::ModelInfo),
            0x0A => Some(Self::MemoryRead),
            0x0B => Some(Self::MemoryResponse),
            _ => None,
        }
    }

    /// Total packet length, header and trailing checksum included.
    #[must_use]
    pub const fn frame_len(self) -> usize {
        match self {
            Self::ZoneStatus | Self::ZoneState => 14,
            Self::ZoneModify | Self::ModelInfo | Self::MemoryRead | Self::MemoryResponse => 6,
        }
    }
}

impl From<PacketType> for u8 {
    fn from(pkt: PacketType) -> Self {
        pkt as Self
    }
}

/// Returns the packet length dictated by a command-type byte.
#[must_use]
pub const fn frame_len_for(type_byte: u8) -> usize {
    match PacketType::from_byte(type_byte) {
        Some(pkt) => pkt.frame_len(),
        None => UNKNOWN_PACKET_LEN,
    }
}
