//! Protocol definitions for HTD serial communication.
//!
//! This module contains the low-level protocol types including:
//! - Inbound packet types and lengths
//! - Byte-at-a-time frame decoding
//! - Packet parsing into zone events
//! - Command encoding

pub mod command;
pub mod frame;
pub mod packet;
pub mod parser;

pub use command::{
    ALL_ZONES, Command, CommandOpcode, CommandRequest, Source, checksum, encode_command,
};
pub use frame::{FrameDecoder, Packet};
pub use packet::{PacketType, SYNC_BYTE, frame_len_for};
pub use parser::{balance_level, parse_zone_state, parse_zone_status, tone_level, translate};
