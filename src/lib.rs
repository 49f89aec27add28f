//! # mbus-master
//!
//! A master-station implementation of the wired M-Bus (Meter-Bus,
//! EN 13757-2/3) protocol for reading utility meters over a serial line or a
//! TCP gateway.
//!
//! The crate is layered the way the bus is: a link-layer frame codec
//! ([`mbus::frame`]), transports behind the [`mbus::Transport`] seam, a
//! session layer driving request/response cycles ([`mbus::MBusHandle`]), and
//! the application-layer decoder that turns long-frame payloads into typed,
//! unit-normalized records ([`payload`]). Decoded telegrams render to a
//! canonical XML form ([`xml`]).
//!
//! ## Example
//!
//! ```no_run
//! use mbus_master::{MBusBaudRate, MBusHandle};
//!
//! # async fn readout() -> Result<(), mbus_master::MBusError> {
//! let mut handle = MBusHandle::connect_serial("/dev/ttyUSB0", MBusBaudRate::Baud2400).await?;
//! let frames = handle.request_data(5).await?;
//! println!("{}", mbus_master::xml::mbus_frame_chain_xml(&frames)?);
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod mbus;
pub mod payload;
pub mod xml;

pub use crate::error::MBusError;
pub use crate::logging::{init_logger, log_info};

pub use mbus::{
    FrameParseOutcome, MBusBaudRate, MBusFrame, MBusFrameType, MBusHandle, MockTransport,
    PrimaryScanHit, ProbeOutcome, ProbeResult, PurgeFirstFrame, SecondaryMask, Transport,
};
pub use payload::{MBusDataVariable, MBusFrameData, MBusRecord, MBusRecordValue};

use payload::data::{mbus_frame_data_parse, MBusFrameData as FrameData};
use payload::record::mbus_data_record_normalize;

/// Connect to an M-Bus device via serial port at the default 2400 baud.
pub async fn connect(port: &str) -> Result<MBusHandle, MBusError> {
    MBusHandle::connect_serial(port, MBusBaudRate::Baud2400).await
}

/// Connect to an M-Bus gateway via TCP (`host:port`).
pub async fn connect_tcp(addr: &str) -> Result<MBusHandle, MBusError> {
    MBusHandle::connect_tcp(addr).await
}

/// Request data from a device and return its normalized records.
///
/// Records that fail to decode are skipped with a diagnostic; the rest of
/// the telegram is still returned.
pub async fn send_request(
    handle: &mut MBusHandle,
    address: u8,
) -> Result<Vec<MBusRecord>, MBusError> {
    let frames = handle.request_data(address).await?;
    records_from_frames(&frames)
}

/// Extracts and normalizes all records of a telegram chain.
pub fn records_from_frames(frames: &[MBusFrame]) -> Result<Vec<MBusRecord>, MBusError> {
    let mut records = Vec::new();
    for frame in frames {
        if let FrameData::Variable(var) = mbus_frame_data_parse(frame)? {
            for record in &var.records {
                match mbus_data_record_normalize(record) {
                    Ok(normalized) => records.push(normalized),
                    Err(e) => logging::log_error(&format!("skipping record: {e}")),
                }
            }
        }
    }
    Ok(records)
}
