//! Command handlers for HTD zone operations.
//!
//! Each method hands one request to the dispatcher and
//! returns once the dispatcher has taken it. Requests that arrive while the
//! link is down are dropped by the dispatcher without an error.

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::{ALL_ZONES, Command, CommandRequest, Source};

/// Cloneable handle for sending commands to the amplifier.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    sender: mpsc::Sender<CommandRequest>,
}

impl CommandHandler {
    /// Creates a handler sending into the dispatcher's command channel.
    #[must_use]
    pub(crate) const fn new(sender: mpsc::Sender<CommandRequest>) -> Self {
        Self { sender }
    }

    /// Sends a request to the dispatcher.
    pub async fn send(&self, request: CommandRequest) -> Result<()> {
        tracing::trace!("queueing zone {} {:?}", request.zone, request.command);
        self.sender
            .send(request)
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    async fn zone(&self, zone: u8, command: Command) -> Result<()> {
        self.send(CommandRequest::new(zone, command)).await
    }

    /// Powers a zone on.
    pub async fn power_on(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::PowerOn).await
    }

    /// Powers a zone off.
    pub async fn power_off(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::PowerOff).await
    }

    /// Powers every zone on.
    pub async fn all_on(&self) -> Result<()> {
        self.zone(ALL_ZONES, Command::AllOn).await
    }

    /// Powers every zone off.
    pub async fn all_off(&self) -> Result<()> {
        self.zone(ALL_ZONES, Command::AllOff).await
    }

    /// Raises a zone's volume one step.
    pub async fn volume_up(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::VolumeUp).await
    }

    /// Lowers a zone's volume one step.
    pub async fn volume_down(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::VolumeDown).await
    }

    /// Shifts a zone's balance one step left.
    pub async fn balance_left(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::BalanceLeft).await
    }

    /// Shifts a zone's balance one step right.
    pub async fn balance_right(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::BalanceRight).await
    }

    /// Raises a zone's treble one step.
    pub async fn treble_up(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::TrebleUp).await
    }

    /// Lowers a zone's treble one step.
    pub async fn treble_down(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::TrebleDown).await
    }

    /// Raises a zone's bass one step.
    pub async fn bass_up(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::BassUp).await
    }

    /// Lowers a zone's bass one step.
    pub async fn bass_down(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::BassDown).await
    }

    /// Selects an input source (1-6) for a zone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSource`] without sending anything if `source`
    /// is outside 1-6.
    pub async fn set_source(&self, zone: u8, source: u8) -> Result<()> {
        let source = Source::new(source)?;
        self.zone(zone, Command::SetSource(source)).await
    }

    /// Requests the status of one zone.
    pub async fn zone_query(&self, zone: u8) -> Result<()> {
        self.zone(zone, Command::Query).await
    }

    /// Requests the status of every zone.
    pub async fn all_zone_query(&self) -> Result<()> {
        self.send(CommandRequest::all_zone_query()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> (CommandHandler, mpsc::Receiver<CommandRequest>) {
        let (tx, rx) = mpsc::channel(4);
        (CommandHandler::new(tx), rx)
    }

    #[tokio::test]
    async fn test_zone_commands() {
        let (handler, mut rx) = handler();

        handler.power_on(3).await.unwrap();
        let request = rx.recv().await.unwrap();
        assert_eq!(request, CommandRequest::new(3, Command::PowerOn));
        assert_eq!(&request.encode()[..], &[0x02, 0x00, 0x03, 0x04, 0x20, 0x29]);

        handler.bass_down(2).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().command.opcode(), 0x27);

        handler.balance_right(2).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().command.opcode(), 0x2A);
    }

    #[tokio::test]
    async fn test_all_zone_commands_use_zone_zero() {
        let (handler, mut rx) = handler();

        handler.all_on().await.unwrap();
        handler.all_off().await.unwrap();
        handler.all_zone_query().await.unwrap();

        for opcode in [0x38, 0x39, 0x00] {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.zone, 0);
            assert_eq!(request.command.opcode(), opcode);
        }
    }

    #[tokio::test]
    async fn test_set_source() {
        let (handler, mut rx) = handler();

        handler.set_source(1, 4).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().command.opcode(), 0x06);
    }

    #[tokio::test]
    async fn test_set_source_out_of_range_sends_nothing() {
        let (handler, mut rx) = handler();

        let err = handler.set_source(1, 7).await.unwrap_err();
        assert!(matches!(err, Error::InvalidSource { .. }));
        assert!(handler.set_source(1, 0).await.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_dispatcher() {
        let (handler, rx) = handler();
        drop(rx);
        assert!(matches!(
            handler.zone_query(1).await,
            Err(Error::ChannelClosed)
        ));
    }
}
