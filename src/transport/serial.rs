//! Serial/USB transport implementation.
//!
//! HTD amplifiers speak 38400 baud, 8 data bits, no parity, one stop bit,
//! with no flow control and no RS-485 signalling.

use futures::future::BoxFuture;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::error::{Error, Result};
use crate::transport::Connector;

/// Default baud rate for HTD amplifiers.
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// Configuration for serial transport.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM3").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }
}

/// Opens the amplifier's serial port.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    /// Creates a connector with the given configuration.
    #[must_use]
    pub const fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    /// Creates a connector for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Connector for SerialConnector {
    type Link = SerialStream;

    fn open(&self) -> BoxFuture<'_, Result<SerialStream>> {
        Box::pin(async move {
            tracing::info!(
                "opening serial port {} at {} baud",
                self.config.port,
                self.config.baud_rate
            );

            // Async reads complete as soon as one byte is available, so no
            // inter-character timeout applies.
            let stream = tokio_serial::new(&self.config.port, self.config.baud_rate)
                .data_bits(DataBits::Eight)
                .stop_bits(StopBits::One)
                .parity(Parity::None)
                .flow_control(FlowControl::None)
                .open_native_async()?;

            Ok(stream)
        })
    }
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
