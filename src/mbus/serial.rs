//! Serial transport: 8 data bits, even parity, 1 stop bit, with the receive
//! timeout scaled to the line speed.

use crate::error::MBusError;
use crate::mbus::transport::Transport;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;

/// Standard M-Bus baud rates as defined in EN 13757-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MBusBaudRate {
    Baud300 = 300,
    Baud600 = 600,
    Baud1200 = 1200,
    Baud2400 = 2400,
    Baud4800 = 4800,
    Baud9600 = 9600,
    Baud19200 = 19200,
    Baud38400 = 38400,
}

impl MBusBaudRate {
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// Receive timeout for this line speed. The slave answer window is
    /// 330 bit times + 50 ms, so slower lines wait longer.
    pub fn timeout(&self) -> Duration {
        match self {
            MBusBaudRate::Baud300 => Duration::from_millis(1200),
            MBusBaudRate::Baud600 => Duration::from_millis(800),
            MBusBaudRate::Baud1200 => Duration::from_millis(400),
            MBusBaudRate::Baud2400 | MBusBaudRate::Baud4800 => Duration::from_millis(200),
            _ => Duration::from_millis(100),
        }
    }
}

impl TryFrom<u32> for MBusBaudRate {
    type Error = MBusError;

    fn try_from(value: u32) -> Result<Self, MBusError> {
        match value {
            300 => Ok(MBusBaudRate::Baud300),
            600 => Ok(MBusBaudRate::Baud600),
            1200 => Ok(MBusBaudRate::Baud1200),
            2400 => Ok(MBusBaudRate::Baud2400),
            4800 => Ok(MBusBaudRate::Baud4800),
            9600 => Ok(MBusBaudRate::Baud9600),
            19200 => Ok(MBusBaudRate::Baud19200),
            38400 => Ok(MBusBaudRate::Baud38400),
            other => Err(MBusError::InvalidBaudrate(other)),
        }
    }
}

/// Serial line transport backed by tokio-serial.
pub struct SerialTransport {
    port_name: String,
    baudrate: MBusBaudRate,
    port: Option<tokio_serial::SerialStream>,
}

impl SerialTransport {
    pub fn new(port_name: &str, baudrate: MBusBaudRate) -> Self {
        SerialTransport {
            port_name: port_name.to_string(),
            baudrate,
            port: None,
        }
    }

    pub fn baudrate(&self) -> MBusBaudRate {
        self.baudrate
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<(), MBusError> {
        let port = tokio_serial::new(&self.port_name, self.baudrate.as_u32())
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::Even)
            .timeout(self.baudrate.timeout())
            .open_native_async()
            .map_err(|e| MBusError::TransportError(e.to_string()))?;
        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MBusError> {
        // dropping the stream closes the port
        self.port = None;
        Ok(())
    }

    async fn send_bytes(&mut self, buf: &[u8]) -> Result<(), MBusError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| MBusError::TransportError("serial port not open".into()))?;
        port.write_all(buf)
            .await
            .map_err(|e| MBusError::TransportError(e.to_string()))?;
        port.flush()
            .await
            .map_err(|e| MBusError::TransportError(e.to_string()))
    }

    async fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<usize, MBusError> {
        let deadline = self.baudrate.timeout();
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| MBusError::TransportError("serial port not open".into()))?;

        match timeout(deadline, port.read(buf)).await {
            Err(_) => Err(MBusError::Timeout),
            Ok(Ok(0)) => Err(MBusError::Timeout),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(MBusError::TransportError(e.to_string())),
        }
    }
}
