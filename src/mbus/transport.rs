//! Transport abstraction for the bus handle.
//!
//! A transport moves raw bytes; framing and session logic live above it in
//! [`crate::mbus::protocol`]. Serial and TCP implementations are provided,
//! plus an in-memory mock that scripts request/reply exchanges for tests.

use crate::error::MBusError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Byte-level transport under a bus handle. `recv_bytes` must return
/// [`MBusError::Timeout`] deterministically when the line stays silent.
#[async_trait]
pub trait Transport: Send {
    async fn open(&mut self) -> Result<(), MBusError>;
    async fn close(&mut self) -> Result<(), MBusError>;
    async fn send_bytes(&mut self, buf: &[u8]) -> Result<(), MBusError>;
    /// Reads available bytes into `buf`, returning the count.
    async fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<usize, MBusError>;
}

#[derive(Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    scripted: VecDeque<Vec<Vec<u8>>>,
    pending: VecDeque<Vec<u8>>,
    open: bool,
}

/// Scripted in-memory transport.
///
/// Each entry queued with [`MockTransport::enqueue_reply`] is armed by one
/// `send_bytes` call; its chunks are then served one per `recv_bytes` call.
/// An exhausted queue times out, like a silent bus. Clones share state, so a
/// test can keep one clone and hand the other to the bus handle.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the reply chunks served after the next unanswered send.
    pub fn enqueue_reply(&self, chunks: Vec<Vec<u8>>) {
        self.state.lock().unwrap().scripted.push_back(chunks);
    }

    /// Arms a silent bus for the next send.
    pub fn enqueue_silence(&self) {
        self.state.lock().unwrap().scripted.push_back(Vec::new());
    }

    /// Everything the client wrote, one entry per send.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.sent.clear();
        state.scripted.clear();
        state.pending.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<(), MBusError> {
        self.state.lock().unwrap().open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MBusError> {
        self.state.lock().unwrap().open = false;
        Ok(())
    }

    async fn send_bytes(&mut self, buf: &[u8]) -> Result<(), MBusError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(buf.to_vec());
        if let Some(chunks) = state.scripted.pop_front() {
            state.pending.extend(chunks);
        }
        Ok(())
    }

    async fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<usize, MBusError> {
        let mut state = self.state.lock().unwrap();
        match state.pending.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                // anything that did not fit goes back to the front
                if n < chunk.len() {
                    state.pending.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None => Err(MBusError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_pairs_sends_with_replies() {
        let mock = MockTransport::new();
        mock.enqueue_reply(vec![vec![0xE5]]);

        let mut transport = mock.clone();
        transport
            .send_bytes(&[0x10, 0x40, 0x00, 0x40, 0x16])
            .await
            .unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(transport.recv_bytes(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], 0xE5);

        // queue exhausted: silent bus
        assert!(matches!(
            transport.recv_bytes(&mut buf).await,
            Err(MBusError::Timeout)
        ));
        assert_eq!(mock.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_serves_chunks_separately() {
        let mock = MockTransport::new();
        mock.enqueue_reply(vec![vec![0x10, 0x40], vec![0x00, 0x40, 0x16]]);

        let mut transport = mock.clone();
        transport.send_bytes(&[0x00]).await.unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(transport.recv_bytes(&mut buf).await.unwrap(), 2);
        assert_eq!(transport.recv_bytes(&mut buf).await.unwrap(), 3);
    }
}
