//! Connection state machine.
//!
//! The dispatcher is the only owner of the link. Open attempts, the reader
//! task and command callers all talk to it through channels, and it handles
//! their messages one at a time:
//!
//! ```text
//! Disconnected ──start──▶ Connecting ──open ok──▶ Connected
//!                          ▲      │                   │
//!                          └──────┘ open failed,      │ end of stream,
//!                            after retry delay        │ read or write error
//!                          ▲                          │
//!                          └──────── teardown ◀───────┘
//! ```

use std::sync::Arc;

use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::HtdConfig;
use crate::error::Result;
use crate::event::{Event, EventPublisher};
use crate::protocol::{CommandRequest, FrameDecoder};
use crate::transport::Connector;
use crate::transport::reader::{ReaderChannels, run_read_loop};
use crate::types::{ZoneState, ZoneStatus};

/// Capacity of the internal channels. Senders wait until the dispatcher
/// takes each message.
pub(crate) const CHANNEL_CAPACITY: usize = 1;

/// Link availability as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No link and no open attempt in flight.
    Disconnected,
    /// An open attempt is pending or waiting out the retry delay.
    Connecting,
    /// Link open, reader running.
    Connected,
}

enum Link<L> {
    Disconnected,
    Connecting(JoinHandle<()>),
    Connected {
        writer: WriteHalf<L>,
        reader: JoinHandle<()>,
        generation: u64,
    },
}

impl<L> Link<L> {
    const fn state(&self) -> ConnectionState {
        match self {
            Self::Disconnected => ConnectionState::Disconnected,
            Self::Connecting(_) => ConnectionState::Connecting,
            Self::Connected { .. } => ConnectionState::Connected,
        }
    }
}

/// Single-threaded control loop owning the link.
pub(crate) struct Dispatcher<C: Connector> {
    connector: Arc<C>,
    config: HtdConfig,
    events: EventPublisher,
    link: Link<C::Link>,
    generation: u64,
    commands: mpsc::Receiver<CommandRequest>,
    open_tx: mpsc::Sender<Result<C::Link>>,
    open_rx: mpsc::Receiver<Result<C::Link>>,
    status_tx: mpsc::Sender<ZoneStatus>,
    status_rx: mpsc::Receiver<ZoneStatus>,
    state_tx: mpsc::Sender<ZoneState>,
    state_rx: mpsc::Receiver<ZoneState>,
    exit_tx: mpsc::Sender<u64>,
    exit_rx: mpsc::Receiver<u64>,
}

impl<C: Connector> Dispatcher<C> {
    /// Creates a dispatcher in the `Disconnected` state.
    pub(crate) fn new(
        connector: Arc<C>,
        config: HtdConfig,
        events: EventPublisher,
        commands: mpsc::Receiver<CommandRequest>,
    ) -> Self {
        let (open_tx, open_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (status_tx, status_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (state_tx, state_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (exit_tx, exit_rx) = mpsc::channel(CHANNEL_CAPACITY);

        Self {
            connector,
            config,
            events,
            link: Link::Disconnected,
            generation: 0,
            commands,
            open_tx,
            open_rx,
            status_tx,
            status_rx,
            state_tx,
            state_rx,
            exit_tx,
            exit_rx,
        }
    }

    /// Current connection state.
    pub(crate) const fn state(&self) -> ConnectionState {
        self.link.state()
    }

    /// Runs until every command sender has been dropped.
    pub(crate) async fn run(mut self) {
        self.begin_connect(false);

        loop {
            tokio::select! {
                Some(result) = self.open_rx.recv() => self.on_open(result).await,
                Some(generation) = self.exit_rx.recv() => self.on_reader_exit(generation),
                Some(status) = self.status_rx.recv() => {
                    self.events.publish(Event::ZoneStatus(status));
                }
                Some(state) = self.state_rx.recv() => {
                    self.events.publish(Event::ZoneState(state));
                }
                request = self.commands.recv() => match request {
                    Some(request) => self.write(request).await,
                    None => break,
                },
            }
        }

        tracing::debug!("command channel closed, stopping dispatcher");
        self.close();
    }

    /// Spawns a single open attempt, optionally after the retry delay.
    fn begin_connect(&mut self, after_delay: bool) {
        let connector = Arc::clone(&self.connector);
        let open_tx = self.open_tx.clone();
        let delay = after_delay.then_some(self.config.retry_delay);

        let task = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
                tracing::info!("reconnecting");
            }
            let result = connector.open().await;
            let _ = open_tx.send(result).await;
        });
        self.link = Link::Connecting(task);
    }

    async fn on_open(&mut self, result: Result<C::Link>) {
        if self.state() != ConnectionState::Connecting {
            tracing::debug!("discarding open result in state {:?}", self.state());
            return;
        }

        let link = match result {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!("failed to open link: {}", e);
                self.begin_connect(true);
                return;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let (read_half, writer) = tokio::io::split(link);
        let decoder = FrameDecoder::new().verify_checksums(self.config.verify_checksums);
        let channels = ReaderChannels {
            status: self.status_tx.clone(),
            state: self.state_tx.clone(),
            exit: self.exit_tx.clone(),
        };
        let reader = tokio::spawn(run_read_loop(read_half, decoder, generation, channels));

        self.link = Link::Connected {
            writer,
            reader,
            generation,
        };
        tracing::info!("link {} connected", generation);
        self.events.publish(Event::Connected);

        // Refresh every zone.
        self.write(CommandRequest::all_zone_query()).await;
    }

    fn on_reader_exit(&mut self, generation: u64) {
        match self.link {
            Link::Connected {
                generation: current,
                ..
            } if current == generation => {
                self.teardown();
                self.begin_connect(false);
            }
            _ => tracing::debug!("ignoring exit of stale link {}", generation),
        }
    }

    /// Encodes and writes a command. Dropped unless connected.
    async fn write(&mut self, request: CommandRequest) {
        let Link::Connected { writer, .. } = &mut self.link else {
            tracing::debug!(
                "not connected, dropping zone {} {:?}",
                request.zone,
                request.command
            );
            return;
        };

        let bytes = request.encode();
        tracing::debug!("write command: {}", hex::encode(&bytes));

        let result = async {
            writer.write_all(&bytes).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::error!("write failure: {}", e);
            self.teardown();
            self.begin_connect(false);
        }
    }

    /// Closes the link if open. The reader task is stopped with it.
    fn teardown(&mut self) {
        let link = std::mem::replace(&mut self.link, Link::Disconnected);
        if let Link::Connected {
            reader, generation, ..
        } = link
        {
            reader.abort();
            tracing::info!("link {} closed", generation);
            self.events.publish(Event::Disconnected);
        }
    }

    /// Stops any pending open attempt and closes the link.
    fn close(&mut self) {
        if let Link::Connecting(task) = &self.link {
            task.abort();
        }
        self.teardown();
    }
}

impl<C: Connector> Drop for Dispatcher<C> {
    fn drop(&mut self) {
        self.close();
    }
}
