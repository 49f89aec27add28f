//! TCP transport for M-Bus gateways. Plain socket, no framing beyond the
//! M-Bus frame itself.

use crate::error::MBusError;
use crate::mbus::transport::Transport;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const TCP_TIMEOUT: Duration = Duration::from_secs(4);

pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// `addr` is a `host:port` pair.
    pub fn new(addr: &str) -> Self {
        TcpTransport {
            addr: addr.to_string(),
            stream: None,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&mut self) -> Result<(), MBusError> {
        let stream = timeout(TCP_TIMEOUT, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| MBusError::Timeout)?
            .map_err(|e| MBusError::TransportError(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MBusError> {
        self.stream = None;
        Ok(())
    }

    async fn send_bytes(&mut self, buf: &[u8]) -> Result<(), MBusError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MBusError::TransportError("socket not connected".into()))?;
        timeout(TCP_TIMEOUT, stream.write_all(buf))
            .await
            .map_err(|_| MBusError::Timeout)?
            .map_err(|e| MBusError::TransportError(e.to_string()))
    }

    async fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<usize, MBusError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MBusError::TransportError("socket not connected".into()))?;
        match timeout(TCP_TIMEOUT, stream.read(buf)).await {
            Err(_) => Err(MBusError::Timeout),
            Ok(Ok(0)) => Err(MBusError::TransportError("connection closed".into())),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(MBusError::TransportError(e.to_string())),
        }
    }
}
