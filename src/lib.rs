//! # htd-serial
//!
//! An async serial protocol engine for HTD multi-zone audio amplifiers.
//!
//! The amplifier speaks a small binary protocol over RS-232. This library
//! keeps the link open (reopening it whenever it fails), decodes the device's
//! packets into zone events, and encodes control commands.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Self-healing link: fixed-interval retries, reconnect on read or write failure
//! - Broadcast event stream of zone status and zone state updates
//! - Bus topic mapping for bridging to a publish/subscribe broker
//!
//! ## Quick Start
//!
//! ```no_run
//! use htd_serial::{Event, Htd};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), htd_serial::Error> {
//!     let mut htd = Htd::serial("/dev/ttyUSB0");
//!     let mut events = htd.subscribe();
//!     htd.start();
//!
//!     htd.commands().power_on(1).await?;
//!     htd.commands().set_source(1, 3).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if let Event::ZoneStatus(status) = event {
//!             println!("zone {} volume {}", status.zone, status.volume);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Wire format: frame decoding, packet parsing, command encoding
//! - [`types`] - Zone status and zone state
//! - [`transport`] - Link opening (serial) and the reader loop
//! - [`dispatcher`] - Connection state machine owning the link
//! - [`event`] - Event publishing
//! - [`commands`] - Command handler for zone operations
//! - [`bus`] - Message bus topic mapping
//! - [`client`] - High-level [`Htd`] client

pub mod bus;
pub mod client;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use bus::{StatusUpdate, Topics};
pub use client::Htd;
pub use commands::CommandHandler;
pub use config::HtdConfig;
pub use dispatcher::ConnectionState;
pub use error::{Error, FrameError, Result};
pub use event::{Event, EventPublisher, Subscription};
pub use protocol::{
    Command, CommandOpcode, CommandRequest, FrameDecoder, Packet, PacketType, Source,
};
pub use transport::{Connector, SerialConfig, SerialConnector, serial::list_ports};
pub use types::{Level, ZoneState, ZoneStatus};
