//! Transport layer for HTD communication.
//!
//! A [`Connector`] opens the physical link; the dispatcher owns whatever it
//! returns. The serial implementation is the only one shipped, but anything
//! byte-oriented (a TCP serial bridge, an in-memory pipe) can stand in.

#[cfg(test)]
pub(crate) mod mock;
pub mod reader;
pub mod serial;

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// Opens links to the device.
pub trait Connector: Send + Sync + 'static {
    /// Link handle produced by a successful open.
    type Link: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Makes a single attempt to open the link. Never retries.
    fn open(&self) -> BoxFuture<'_, Result<Self::Link>>;
}

pub use serial::{SerialConfig, SerialConnector};
