//! Frame decoding for the HTD serial protocol.
//!
//! Device packets are self-delimiting only through their command-type byte:
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬─────────────────────────┐
//! │  0x02    │  0x00    │  zone    │  type    │  payload ... checksum   │
//! │  1 byte  │  1 byte  │  1 byte  │  1 byte  │  frame_len(type) - 4    │
//! └──────────┴──────────┴──────────┴──────────┴─────────────────────────┘
//! ```
//! The decoder is fed one byte at a time, exactly as the reader loop receives
//! them, and resynchronizes on the sync marker whenever the stream is off.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::command::checksum;
use crate::protocol::packet::{PacketType, SYNC_BYTE, TYPE_OFFSET};

/// A complete device packet of a recognized command type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    packet_type: PacketType,
    data: Bytes,
}

impl Packet {
    /// Command type of this packet.
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// Zone byte at offset 2.
    #[must_use]
    pub fn zone(&self) -> u8 {
        self.data[2]
    }

    /// Raw packet bytes, sync marker through checksum.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if the trailing byte is the 8-bit sum of all other bytes.
    #[must_use]
    pub fn checksum_valid(&self) -> bool {
        match self.data.split_last() {
            Some((&last, rest)) => checksum(rest) == last,
            None => false,
        }
    }
}

/// Byte-at-a-time packet assembler.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    verify_checksums: bool,
}

impl FrameDecoder {
    /// Creates a new frame decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(16),
            verify_checksums: false,
        }
    }

    /// Discards complete packets whose trailing checksum does not match.
    #[must_use]
    pub const fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Pushes one byte into the decoder.
    ///
    /// Returns `Some(packet)` once the accumulated bytes form a complete
    /// packet of a recognized command type. The accumulator is reset after
    /// every complete packet and after a stray first byte.
    ///
    /// An unknown command-type byte resets the accumulator as soon as it
    /// arrives rather than on the byte after it. Its frame length is one
    /// byte, which a buffer already holding four bytes can never match, so
    /// waiting would only let the buffer grow without bound.
    pub fn push(&mut self, byte: u8) -> Option<Packet> {
        self.buffer.put_u8(byte);

        if self.buffer.len() == 1 && byte != SYNC_BYTE {
            tracing::debug!("not a sync byte: {:02x}", byte);
            self.clear();
            return None;
        }

        if self.buffer.len() <= TYPE_OFFSET {
            return None;
        }

        let type_byte = self.buffer[TYPE_OFFSET];
        let Some(packet_type) = PacketType::from_byte(type_byte) else {
            tracing::warn!(
                "unknown response code {:02x}, dropping {}",
                type_byte,
                hex::encode(&self.buffer)
            );
            self.clear();
            return None;
        };

        if self.buffer.len() < packet_type.frame_len() {
            return None;
        }

        let packet = Packet {
            packet_type,
            data: self.buffer.split().freeze(),
        };

        if self.verify_checksums && !packet.checksum_valid() {
            tracing::debug!("checksum mismatch, dropping {}", hex::encode(&packet.data));
            return None;
        }

        tracing::trace!("decoded {:?} packet: {}", packet_type, hex::encode(&packet.data));
        Some(packet)
    }

    /// Pushes a run of bytes, collecting every packet completed along the way.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Packet> {
        data.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: [u8; 14] = [
        0x02, 0x00, 0x03, 0x05, 0x80, 0x00, 0x02, 0x00, 0x01, 0xC8, 0x00, 0x00, 0x00, 0x55,
    ];

    #[test]
    fn test_decode_complete_status_packet() {
        let mut decoder = FrameDecoder::new();
        let (last, head) = STATUS.split_last().unwrap();
        for &b in head {
            assert_eq!(decoder.push(b), None);
        }
        let packet = decoder.push(*last).unwrap();
        assert_eq!(packet.packet_type(), PacketType::ZoneStatus);
        assert_eq!(packet.zone(), 3);
        assert_eq!(packet.as_bytes(), &STATUS);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_stray_first_byte_is_discarded() {
        for b in (0u8..=255).filter(|&b| b != SYNC_BYTE) {
            let mut decoder = FrameDecoder::new();
            assert_eq!(decoder.push(b), None);
            assert_eq!(decoder.buffered(), 0);
        }
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut decoder = FrameDecoder::new();
        let mut stream = vec![0xFF, 0x13, 0x00];
        stream.extend_from_slice(&STATUS);
        let packets = decoder.feed(&stream);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].zone(), 3);
    }

    #[test]
    fn test_back_to_back_packets() {
        let mut decoder = FrameDecoder::new();
        let echo = [0x02, 0x00, 0x01, 0x04, 0x20, 0x27];
        let mut stream = echo.to_vec();
        stream.extend_from_slice(&STATUS);
        let packets = decoder.feed(&stream);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].packet_type(), PacketType::ZoneModify);
        assert_eq!(packets[1].packet_type(), PacketType::ZoneStatus);
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(&[0x02, 0x00, 0x01, 0x7F]).is_empty());
        assert_eq!(decoder.buffered(), 0);

        // Decoding continues with the next packet.
        let packets = decoder.feed(&STATUS);
        assert_eq!(packets.len(), 1);
    }

    #[test]
    fn test_checksum_not_verified_by_default() {
        let mut decoder = FrameDecoder::new();
        let mut bad = STATUS;
        bad[13] = 0x00;
        assert_eq!(decoder.feed(&bad).len(), 1);
    }

    #[test]
    fn test_checksum_verification_drops_mismatch() {
        let mut decoder = FrameDecoder::new().verify_checksums(true);
        let mut bad = STATUS;
        bad[13] = 0x00;
        assert!(decoder.feed(&bad).is_empty());
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.feed(&STATUS).len(), 1);
    }

    #[test]
    fn test_clear_discards_partial_packet() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&STATUS[..6]);
        decoder.clear();
        assert_eq!(decoder.buffered(), 0);

        // The tail of the old packet cannot complete anything.
        assert!(decoder.feed(&STATUS[6..]).is_empty());
        assert_eq!(decoder.feed(&STATUS).len(), 1);
    }

    #[test]
    fn test_partial_packet_is_held() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(&STATUS[..9]).is_empty());
        assert_eq!(decoder.buffered(), 9);
        assert_eq!(decoder.feed(&STATUS[9..]).len(), 1);
    }
}
