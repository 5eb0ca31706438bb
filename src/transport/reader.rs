//! Link reader loop.
//!
//! Reads the link one byte at a time, feeds the frame decoder and forwards
//! decoded zone events to the dispatcher. The loop ends only when the link
//! reports end-of-stream or a read error, or when the dispatcher is gone.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::event::Event;
use crate::protocol::{FrameDecoder, translate};
use crate::types::{ZoneState, ZoneStatus};

/// Channels from a reader task back to the dispatcher.
#[derive(Debug, Clone)]
pub struct ReaderChannels {
    /// Decoded zone status snapshots.
    pub status: mpsc::Sender<ZoneStatus>,
    /// Decoded zone state bitmaps.
    pub state: mpsc::Sender<ZoneState>,
    /// Terminal notification carrying the link generation that ended.
    pub exit: mpsc::Sender<u64>,
}

/// Runs the read loop until the link ends.
///
/// `generation` identifies the link this reader belongs to, so that a late
/// exit from a link the dispatcher has already torn down can be told apart.
pub async fn run_read_loop<R>(
    mut reader: R,
    mut decoder: FrameDecoder,
    generation: u64,
    channels: ReaderChannels,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::debug!("link {} reached end of stream", generation);
                break;
            }
            Err(e) => {
                tracing::error!("serial read error: {}", e);
                break;
            }
        };

        tracing::trace!("received byte {:02x}", byte);
        let Some(packet) = decoder.push(byte) else {
            continue;
        };

        let delivered = match translate(&packet) {
            Some(Event::ZoneStatus(status)) => channels.status.send(status).await.is_ok(),
            Some(Event::ZoneState(state)) => channels.state.send(state).await.is_ok(),
            _ => true,
        };
        if !delivered {
            tracing::debug!("dispatcher dropped, stopping reader");
            return;
        }
    }

    let _ = channels.exit.send(generation).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockLink;
    use tokio::io::AsyncWriteExt;

    fn channels() -> (
        ReaderChannels,
        mpsc::Receiver<ZoneStatus>,
        mpsc::Receiver<ZoneState>,
        mpsc::Receiver<u64>,
    ) {
        let (status, status_rx) = mpsc::channel(4);
        let (state, state_rx) = mpsc::channel(4);
        let (exit, exit_rx) = mpsc::channel(1);
        (
            ReaderChannels {
                status,
                state,
                exit,
            },
            status_rx,
            state_rx,
            exit_rx,
        )
    }

    #[tokio::test]
    async fn test_reader_forwards_events_and_exits_on_eof() {
        let (mut device, link) = tokio::io::duplex(64);
        let (tx, mut status_rx, mut state_rx, mut exit_rx) = channels();
        let task = tokio::spawn(run_read_loop(link, FrameDecoder::new(), 7, tx));

        device
            .write_all(&[
                0x55, // noise before the first packet
                0x02, 0x00, 0x02, 0x05, 0x80, 0x00, 0x00, 0x00, 0x00, 0xD8, 0x04, 0xFC, 0x06,
                0x00,
            ])
            .await
            .unwrap();
        device
            .write_all(&[
                0x02, 0x00, 0x00, 0x06, 0x00, 0x03, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ])
            .await
            .unwrap();

        let status = status_rx.recv().await.unwrap();
        assert_eq!(status.zone, 2);
        assert_eq!(status.volume, 40);
        assert_eq!(status.input, 1);

        let state = state_rx.recv().await.unwrap();
        assert_eq!(state.zones, [true, true, false, false, false, false]);
        assert_eq!(state.keypads, [true, false, false, false, false, false]);

        drop(device);
        assert_eq!(exit_rx.recv().await, Some(7));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_reader_drops_malformed_status() {
        let (mut device, link) = tokio::io::duplex(64);
        let (tx, mut status_rx, _state_rx, mut exit_rx) = channels();
        let task = tokio::spawn(run_read_loop(link, FrameDecoder::new(), 1, tx));

        // Reserved byte set: discarded without an event.
        device
            .write_all(&[
                0x02, 0x00, 0x01, 0x05, 0x80, 0x00, 0x00, 0x01, 0x00, 0xD8, 0x00, 0x00, 0x00,
                0x00,
            ])
            .await
            .unwrap();
        drop(device);

        assert_eq!(exit_rx.recv().await, Some(1));
        assert!(status_rx.try_recv().is_err());
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_reader_exits_on_read_error() {
        let (tx, _status_rx, _state_rx, mut exit_rx) = channels();
        let task = tokio::spawn(run_read_loop(MockLink::BrokenRead, FrameDecoder::new(), 3, tx));

        assert_eq!(exit_rx.recv().await, Some(3));
        task.await.unwrap();
    }
}
