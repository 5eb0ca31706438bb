//! Main [`Htd`] client implementation.
//!
//! This module provides the high-level [`Htd`] client that wires the
//! connector, the dispatcher, event publishing and the command surface
//! together.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bus::Topics;
use crate::commands::CommandHandler;
use crate::config::HtdConfig;
use crate::dispatcher::{CHANNEL_CAPACITY, Dispatcher};
use crate::error::Result;
use crate::event::{EventPublisher, Subscription};
use crate::protocol::CommandRequest;
use crate::transport::{Connector, SerialConfig, SerialConnector};

/// Client for an HTD amplifier.
pub struct Htd<C: Connector = SerialConnector> {
    connector: Arc<C>,
    config: HtdConfig,
    events: EventPublisher,
    commands: CommandHandler,
    topics: Topics,

    // Taken by `start`
    command_rx: Option<mpsc::Receiver<CommandRequest>>,
    task: Option<JoinHandle<()>>,
}

impl Htd<SerialConnector> {
    /// Creates a new client for a serial port.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0")
    ///
    /// # Returns
    ///
    /// A new client (not yet started).
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_serial_config(SerialConfig::new(port), HtdConfig::default())
    }

    /// Creates a new client with custom serial and client configuration.
    #[must_use]
    pub fn with_serial_config(serial: SerialConfig, config: HtdConfig) -> Self {
        Self::new(SerialConnector::new(serial), config)
    }
}

impl<C: Connector> Htd<C> {
    /// Creates a new client using the given connector.
    #[must_use]
    pub fn new(connector: C, config: HtdConfig) -> Self {
        let events = EventPublisher::new(config.event_capacity);
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);

        Self {
            connector: Arc::new(connector),
            config,
            events,
            commands: CommandHandler::new(command_tx),
            topics: Topics::default(),
            command_rx: Some(command_rx),
            task: None,
        }
    }

    /// Uses a custom bus topic layout.
    #[must_use]
    pub fn with_topics(mut self, topics: Topics) -> Self {
        self.topics = topics;
        self
    }

    /// Starts the dispatcher, which opens the link and keeps it open.
    ///
    /// Open failures are retried forever at the configured interval, so this
    /// returns immediately. Subscribe first to observe the first
    /// [`Event::Connected`](crate::Event::Connected). Calling it again has no
    /// effect.
    pub fn start(&mut self) {
        let Some(command_rx) = self.command_rx.take() else {
            tracing::debug!("dispatcher already started");
            return;
        };

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.connector),
            self.config.clone(),
            self.events.clone(),
            command_rx,
        );
        self.task = Some(tokio::spawn(dispatcher.run()));
    }

    /// Returns true while the dispatcher task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the dispatcher and closes the link.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::info!("shutting down");
            task.abort();
        }
    }

    /// Returns the command handler.
    #[must_use]
    pub const fn commands(&self) -> &CommandHandler {
        &self.commands
    }

    /// Returns the bus topic layout.
    #[must_use]
    pub const fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Subscribes to events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    /// Handles an inbound bus message.
    ///
    /// Malformed messages are logged and dropped; the error is returned for
    /// callers that want to report it.
    pub async fn handle_bus_message(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let request = match self.topics.parse_command(topic, payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    "dropping message on {}: {} (payload {:?})",
                    topic,
                    e,
                    String::from_utf8_lossy(payload)
                );
                return Err(e);
            }
        };
        self.commands.send(request).await
    }
}

impl<C: Connector> Drop for Htd<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
