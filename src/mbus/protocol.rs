//! # M-Bus session layer
//!
//! The bus handle owns a transport, the option set and the optional event
//! callbacks, and implements the request/response choreography of a master
//! station: ping, data readout with FCB-driven multi-telegram continuation,
//! secondary address selection and scanning, and the slave management
//! commands (set address, switch baudrate, application reset).

use crate::constants::*;
use crate::error::MBusError;
use crate::logging::{log_debug, log_error};
use crate::mbus::frame::{
    frame_get_secondary_address, pack_frame, pack_select_frame, parse_frame, FrameParseOutcome,
    MBusFrame, MBusFrameType,
};
use crate::mbus::secondary::SecondaryMask;
use crate::mbus::serial::{MBusBaudRate, SerialTransport};
use crate::mbus::tcp::TcpTransport;
use crate::mbus::transport::Transport;
use crate::payload::data::{mbus_frame_data_parse, MBusFrameData};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;

/// Echo purge policy for two-wire topologies where the master hears its own
/// transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeFirstFrame {
    None,
    /// Discard a received frame whose direction is master-to-slave.
    M2S,
    /// Discard a received frame whose direction is slave-to-master.
    S2M,
}

/// Per-handle option set.
#[derive(Debug, Clone)]
pub struct HandleOptions {
    pub max_data_retry: u32,
    pub max_search_retry: u32,
    pub purge_first_frame: PurgeFirstFrame,
}

impl Default for HandleOptions {
    fn default() -> Self {
        HandleOptions {
            max_data_retry: 3,
            max_search_retry: 1,
            purge_first_frame: PurgeFirstFrame::M2S,
        }
    }
}

/// Outcome of selecting a secondary address mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// Exactly one slave acknowledged and the bus went silent.
    Single,
    /// More than one slave answered; the mask must be narrowed.
    Collision,
    /// Nobody answered.
    Nothing,
}

/// Outcome of probing a mask down to a concrete device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// One device matched; carries its full secondary address.
    Single(String),
    Collision,
    Nothing,
}

/// A hit reported by the primary address scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryScanHit {
    Found(u8),
    /// Garbled reply: several slaves share this address.
    Collision(u8),
}

pub type SendEventHandler = Box<dyn FnMut(&[u8]) + Send>;
pub type RecvEventHandler = Box<dyn FnMut(&[u8]) + Send>;
pub type ScanProgressHandler = Box<dyn FnMut(&str) + Send>;
pub type FoundEventHandler = Box<dyn FnMut(&MBusFrame) + Send>;

/// Handle to one half-duplex M-Bus. Requests on a handle are strictly
/// serialized; callbacks run synchronously on the send/receive path and must
/// not re-enter the handle.
pub struct MBusHandle {
    transport: Box<dyn Transport>,
    options: HandleOptions,
    send_event: Option<SendEventHandler>,
    recv_event: Option<RecvEventHandler>,
    scan_progress: Option<ScanProgressHandler>,
    found_event: Option<FoundEventHandler>,
    last_error: Option<String>,
}

impl MBusHandle {
    /// Opens a serial M-Bus device, e.g. `/dev/ttyUSB0`.
    pub async fn connect_serial(port: &str, baudrate: MBusBaudRate) -> Result<Self, MBusError> {
        Self::open(Box::new(SerialTransport::new(port, baudrate))).await
    }

    /// Opens a TCP gateway, `host:port`.
    pub async fn connect_tcp(addr: &str) -> Result<Self, MBusError> {
        Self::open(Box::new(TcpTransport::new(addr))).await
    }

    /// Wraps an already-constructed transport and opens it.
    pub async fn open(mut transport: Box<dyn Transport>) -> Result<Self, MBusError> {
        transport.open().await?;
        Ok(MBusHandle {
            transport,
            options: HandleOptions::default(),
            send_event: None,
            recv_event: None,
            scan_progress: None,
            found_event: None,
            last_error: None,
        })
    }

    pub async fn disconnect(&mut self) -> Result<(), MBusError> {
        self.transport.close().await
    }

    pub fn options(&self) -> &HandleOptions {
        &self.options
    }

    pub fn set_max_data_retry(&mut self, value: u32) -> Result<(), MBusError> {
        if value > 9 {
            return Err(MBusError::InvalidOptionValue);
        }
        self.options.max_data_retry = value;
        Ok(())
    }

    pub fn set_max_search_retry(&mut self, value: u32) -> Result<(), MBusError> {
        if value > 9 {
            return Err(MBusError::InvalidOptionValue);
        }
        self.options.max_search_retry = value;
        Ok(())
    }

    pub fn set_purge_first_frame(&mut self, value: PurgeFirstFrame) {
        self.options.purge_first_frame = value;
    }

    /// Registers a callback fired with the raw bytes of every sent frame.
    pub fn register_send_event(&mut self, handler: SendEventHandler) {
        self.send_event = Some(handler);
    }

    /// Registers a callback fired with the raw bytes of every received frame.
    pub fn register_recv_event(&mut self, handler: RecvEventHandler) {
        self.recv_event = Some(handler);
    }

    /// Registers a callback fired with each candidate mask during a
    /// secondary scan.
    pub fn register_scan_progress(&mut self, handler: ScanProgressHandler) {
        self.scan_progress = Some(handler);
    }

    /// Registers a callback fired with the response frame of each device
    /// found by a secondary scan.
    pub fn register_found_event(&mut self, handler: FoundEventHandler) {
        self.found_event = Some(handler);
    }

    /// Text of the most recent error on this handle.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record_error(&mut self, error: &MBusError) {
        self.last_error = Some(error.to_string());
    }

    // ------------------------------------------------------------------
    // Frame I/O
    // ------------------------------------------------------------------

    pub async fn send_frame(&mut self, frame: &MBusFrame) -> Result<(), MBusError> {
        let bytes = pack_frame(frame);
        log_debug(&format!("send: {}", hex::encode_upper(&bytes)));
        if let Some(handler) = self.send_event.as_mut() {
            handler(&bytes);
        }
        match self.transport.send_bytes(&bytes).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    async fn recv_frame_raw(&mut self) -> Result<MBusFrame, MBusError> {
        let mut buf: Vec<u8> = Vec::with_capacity(MBUS_FRAME_BASE_SIZE_CONTROL);

        loop {
            let mut chunk = [0u8; 256];
            let n = match self.transport.recv_bytes(&mut chunk).await {
                Ok(n) => n,
                Err(e) => {
                    // a timeout mid-frame still counts as a timeout
                    self.record_error(&e);
                    return Err(e);
                }
            };
            buf.extend_from_slice(&chunk[..n]);

            match parse_frame(&buf) {
                Ok(FrameParseOutcome::Complete { mut frame, .. }) => {
                    log_debug(&format!("recv: {}", hex::encode_upper(&buf)));
                    if let Some(handler) = self.recv_event.as_mut() {
                        handler(&buf);
                    }
                    frame.timestamp = Utc::now();
                    return Ok(frame);
                }
                Ok(FrameParseOutcome::NeedMore(_)) => continue,
                Err(e) => {
                    log_debug(&format!("recv (invalid): {}", hex::encode_upper(&buf)));
                    self.record_error(&e);
                    return Err(e);
                }
            }
        }
    }

    /// Receives one frame, applying the configured echo purge: when the
    /// frame's direction matches the purge policy it is discarded and the
    /// next frame is returned instead.
    pub async fn recv_frame(&mut self) -> Result<MBusFrame, MBusError> {
        let frame = self.recv_frame_raw().await?;

        let is_echo = match frame.direction() {
            MBUS_CONTROL_MASK_DIR_M2S => self.options.purge_first_frame == PurgeFirstFrame::M2S,
            _ => self.options.purge_first_frame == PurgeFirstFrame::S2M,
        };

        if is_echo {
            return self.recv_frame_raw().await;
        }
        Ok(frame)
    }

    /// Drains queued frames (and garbage) until the line goes silent.
    /// Returns whether anything was drained.
    pub async fn purge_frames(&mut self) -> bool {
        let mut received = false;
        loop {
            match self.recv_frame().await {
                Ok(_) => received = true,
                Err(e) if e.is_invalid_frame() => received = true,
                Err(_) => break,
            }
        }
        received
    }

    // ------------------------------------------------------------------
    // Session operations
    // ------------------------------------------------------------------

    /// Sends SND_NKE to an address, optionally draining any reply bytes.
    pub async fn send_ping_frame(
        &mut self,
        address: u8,
        purge_response: bool,
    ) -> Result<(), MBusError> {
        let mut frame = MBusFrame::new(MBusFrameType::Short);
        frame.control = MBUS_CONTROL_MASK_SND_NKE | MBUS_CONTROL_MASK_DIR_M2S;
        frame.address = address;
        frame.update_checksum();

        self.send_frame(&frame).await?;
        if purge_response {
            self.purge_frames().await;
        }
        Ok(())
    }

    /// Sends a REQ_UD2 request frame without waiting for the reply.
    pub async fn send_request_frame(&mut self, address: u8) -> Result<(), MBusError> {
        let mut frame = MBusFrame::new(MBusFrameType::Short);
        frame.control = MBUS_CONTROL_MASK_REQ_UD2 | MBUS_CONTROL_MASK_DIR_M2S;
        frame.address = address;
        frame.update_checksum();
        self.send_frame(&frame).await
    }

    /// Requests data from a slave and collects the complete reply, following
    /// multi-telegram readouts by toggling the FCB bit until the slave stops
    /// flagging that more records follow, or `max_frames` is reached.
    ///
    /// Each frame is retried up to `max_data_retry` times: a timeout resends
    /// the request, an invalid frame purges the line first.
    pub async fn sendrecv_request(
        &mut self,
        address: u8,
        max_frames: usize,
    ) -> Result<Vec<MBusFrame>, MBusError> {
        let mut request = MBusFrame::new(MBusFrameType::Short);
        request.control = MBUS_CONTROL_MASK_REQ_UD2
            | MBUS_CONTROL_MASK_DIR_M2S
            | MBUS_CONTROL_MASK_FCV
            | MBUS_CONTROL_MASK_FCB;
        request.address = address;
        request.update_checksum();

        let mut frames: Vec<MBusFrame> = Vec::new();
        let mut retry = 0u32;

        loop {
            if retry > self.options.max_data_retry {
                let error = MBusError::NoResponse(retry);
                self.record_error(&error);
                return Err(error);
            }

            self.send_frame(&request).await?;

            let frame = match self.recv_frame().await {
                Ok(frame) => frame,
                Err(e) if e.is_timeout() => {
                    log_debug("no response frame received, retrying");
                    retry += 1;
                    continue;
                }
                Err(e) if e.is_invalid_frame() => {
                    log_debug("invalid response frame received, purging and retrying");
                    retry += 1;
                    self.purge_frames().await;
                    continue;
                }
                Err(e) => return Err(e),
            };
            retry = 0;
            self.purge_frames().await;

            let reply_data = match mbus_frame_data_parse(&frame) {
                Ok(data) => data,
                Err(e) => {
                    self.record_error(&e);
                    return Err(e);
                }
            };

            let more_frames = matches!(
                &reply_data,
                MBusFrameData::Variable(var) if var.more_records_follow
            );
            frames.push(frame);

            if more_frames && max_frames > 0 && frames.len() < max_frames {
                // drive the slave's frame-count state machine
                request.control ^= MBUS_CONTROL_MASK_FCB;
                request.update_checksum();
            } else {
                break;
            }
        }

        Ok(frames)
    }

    /// One-shot readout: request and return a single telegram chain with the
    /// default frame limit.
    pub async fn request_data(&mut self, address: u8) -> Result<Vec<MBusFrame>, MBusError> {
        self.sendrecv_request(address, 16).await
    }

    /// Selects the slave(s) matching a secondary address mask.
    pub async fn select_secondary_address(&mut self, mask: &str) -> Result<ProbeResult, MBusError> {
        let mut frame = MBusFrame::new(MBusFrameType::Long);
        pack_select_frame(&mut frame, mask)?;
        self.send_frame(&frame).await?;

        match self.recv_frame().await {
            Err(e) if e.is_timeout() => Ok(ProbeResult::Nothing),
            Err(e) if e.is_invalid_frame() => {
                // mangled reply: several slaves answered on top of each other
                self.purge_frames().await;
                Ok(ProbeResult::Collision)
            }
            Err(e) => Err(e),
            Ok(reply) if reply.frame_type == MBusFrameType::Ack => {
                if self.purge_frames().await {
                    Ok(ProbeResult::Collision)
                } else {
                    Ok(ProbeResult::Single)
                }
            }
            Ok(_) => Ok(ProbeResult::Nothing),
        }
    }

    /// Probes a mask down to a device: select, then read out the responder's
    /// identity via the network layer address. Retried `max_search_retry`
    /// times while nothing answers.
    pub async fn probe_secondary_address(&mut self, mask: &str) -> Result<ProbeOutcome, MBusError> {
        for _ in 0..=self.options.max_search_retry {
            match self.select_secondary_address(mask).await? {
                ProbeResult::Nothing => continue,
                ProbeResult::Collision => return Ok(ProbeOutcome::Collision),
                ProbeResult::Single => {
                    self.send_request_frame(MBUS_ADDRESS_NETWORK_LAYER).await?;

                    let reply = match self.recv_frame().await {
                        Err(e) if e.is_timeout() => return Ok(ProbeOutcome::Nothing),
                        Err(e) if e.is_invalid_frame() => {
                            self.purge_frames().await;
                            return Ok(ProbeOutcome::Collision);
                        }
                        Err(e) => return Err(e),
                        Ok(reply) => reply,
                    };

                    if self.purge_frames().await {
                        return Ok(ProbeOutcome::Collision);
                    }

                    if reply.frame_type != MBusFrameType::Long {
                        return Ok(ProbeOutcome::Nothing);
                    }

                    return match frame_get_secondary_address(&reply) {
                        Ok(address) => {
                            if let Some(handler) = self.found_event.as_mut() {
                                handler(&reply);
                            }
                            Ok(ProbeOutcome::Single(address))
                        }
                        Err(e) => {
                            log_error(&format!(
                                "failed to read secondary address from reply: {e}"
                            ));
                            Ok(ProbeOutcome::Nothing)
                        }
                    };
                }
            }
        }
        Ok(ProbeOutcome::Nothing)
    }

    /// Scans for devices matching a secondary address mask, subdividing on
    /// collisions. Returns the secondary addresses of all devices found.
    pub async fn scan_secondary(&mut self, mask: &str) -> Result<Vec<String>, MBusError> {
        let mask = SecondaryMask::parse(mask)?;
        let mut found = Vec::new();
        self.scan_secondary_range(0, mask, &mut found).await?;
        Ok(found)
    }

    /// Recursive step of the secondary scan: enumerate digits 0..9 at the
    /// first position, descend one position on collision.
    fn scan_secondary_range<'a>(
        &'a mut self,
        pos: usize,
        mask: SecondaryMask,
        found: &'a mut Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<(), MBusError>> + Send + 'a>> {
        Box::pin(async move {
            if pos >= 16 {
                return Ok(());
            }

            if !mask.is_wildcard_at(pos) {
                if pos < 15 {
                    return self.scan_secondary_range(pos + 1, mask, found).await;
                }
                return self.scan_probe_candidate(15, mask, found).await;
            }

            for digit in 0..=9u8 {
                let candidate = mask.with_digit(pos, digit);
                self.scan_probe_candidate(pos, candidate, found).await?;
            }
            Ok(())
        })
    }

    async fn scan_probe_candidate(
        &mut self,
        pos: usize,
        candidate: SecondaryMask,
        found: &mut Vec<String>,
    ) -> Result<(), MBusError> {
        let mask_str = candidate.to_string();
        if let Some(handler) = self.scan_progress.as_mut() {
            handler(&mask_str);
        }

        match self.probe_secondary_address(&mask_str).await? {
            ProbeOutcome::Single(address) => {
                log_debug(&format!(
                    "found device {address} using address mask {mask_str}"
                ));
                found.push(address);
            }
            ProbeOutcome::Collision => {
                self.scan_secondary_range(pos + 1, candidate, found).await?;
            }
            ProbeOutcome::Nothing => {}
        }
        Ok(())
    }

    /// Pings every primary address in `range`, reporting devices that
    /// acknowledge and addresses where several slaves answer at once.
    pub async fn scan_primary(
        &mut self,
        range: std::ops::RangeInclusive<u8>,
    ) -> Result<Vec<PrimaryScanHit>, MBusError> {
        let mut hits = Vec::new();

        'next_address: for address in range {
            for _ in 0..=self.options.max_search_retry {
                self.send_ping_frame(address, false).await?;

                match self.recv_frame().await {
                    Err(e) if e.is_timeout() => continue,
                    Err(e) if e.is_invalid_frame() => {
                        self.purge_frames().await;
                        hits.push(PrimaryScanHit::Collision(address));
                        continue 'next_address;
                    }
                    Err(e) => return Err(e),
                    Ok(reply) => {
                        if reply.frame_type == MBusFrameType::Ack {
                            hits.push(PrimaryScanHit::Found(address));
                        }
                        self.purge_frames().await;
                        continue 'next_address;
                    }
                }
            }
        }

        Ok(hits)
    }

    /// Sends a SND_UD long frame carrying user data to a slave.
    pub async fn send_user_data_frame(
        &mut self,
        address: u8,
        control_information: u8,
        data: &[u8],
    ) -> Result<(), MBusError> {
        if data.len() > MBUS_FRAME_DATA_LENGTH {
            return Err(MBusError::InvalidFrameLength);
        }

        let mut frame = MBusFrame::new(if data.is_empty() {
            MBusFrameType::Control
        } else {
            MBusFrameType::Long
        });
        frame.control = MBUS_CONTROL_MASK_SND_UD | MBUS_CONTROL_MASK_DIR_M2S;
        frame.address = address;
        frame.control_information = control_information;
        frame.data = data.to_vec();
        frame.update_checksum();
        self.send_frame(&frame).await
    }

    async fn expect_ack(&mut self) -> Result<(), MBusError> {
        match self.recv_frame().await {
            Ok(reply) if reply.frame_type == MBusFrameType::Ack => Ok(()),
            Ok(reply) => {
                let error = MBusError::InvalidReply(format!(
                    "expected ACK, got {:?} frame",
                    reply.frame_type
                ));
                self.record_error(&error);
                Err(error)
            }
            Err(e) => Err(e),
        }
    }

    /// Reprograms a slave's primary address. The special addresses (network
    /// layer, broadcast) are rejected.
    pub async fn set_primary_address(
        &mut self,
        old_address: u8,
        new_address: u8,
    ) -> Result<(), MBusError> {
        if new_address >= MBUS_ADDRESS_NETWORK_LAYER {
            return Err(MBusError::InvalidPrimaryAddress(new_address));
        }

        // bus address record: DIF 0x01, VIF 0x7A, one byte of data
        let payload = [0x01, 0x7A, new_address];
        self.send_user_data_frame(old_address, MBUS_CONTROL_INFO_DATA_SEND, &payload)
            .await?;
        self.expect_ack().await
    }

    /// Orders a slave to switch its baudrate.
    pub async fn switch_baudrate(&mut self, address: u8, baudrate: u32) -> Result<(), MBusError> {
        let control_information = match baudrate {
            300 => MBUS_CONTROL_INFO_SET_BAUDRATE_300,
            600 => MBUS_CONTROL_INFO_SET_BAUDRATE_600,
            1200 => MBUS_CONTROL_INFO_SET_BAUDRATE_1200,
            2400 => MBUS_CONTROL_INFO_SET_BAUDRATE_2400,
            4800 => MBUS_CONTROL_INFO_SET_BAUDRATE_4800,
            9600 => MBUS_CONTROL_INFO_SET_BAUDRATE_9600,
            19200 => MBUS_CONTROL_INFO_SET_BAUDRATE_19200,
            38400 => MBUS_CONTROL_INFO_SET_BAUDRATE_38400,
            other => return Err(MBusError::InvalidBaudrate(other)),
        };

        self.send_user_data_frame(address, control_information, &[])
            .await?;
        self.expect_ack().await
    }

    /// Resets the application layer of a slave, with an optional subcode.
    pub async fn application_reset(
        &mut self,
        address: u8,
        subcode: Option<u8>,
    ) -> Result<(), MBusError> {
        let data: &[u8] = match &subcode {
            Some(code) => std::slice::from_ref(code),
            None => &[],
        };
        self.send_user_data_frame(address, MBUS_CONTROL_INFO_APPLICATION_RESET, data)
            .await?;
        self.expect_ack().await
    }
}
