//! Error types for the M-Bus master library.
//!
//! Every fallible operation returns [`MBusError`]. The receive path needs to
//! tell timeouts and malformed frames apart from hard failures, so the enum
//! carries classifier methods instead of forcing callers to match on message
//! strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MBusError {
    /// Transport-level failure (serial port or TCP socket).
    #[error("Transport error: {0}")]
    TransportError(String),

    /// No bytes arrived within the transport's deadline.
    #[error("Receive timeout")]
    Timeout,

    /// Unknown frame start byte.
    #[error("Invalid M-Bus frame start (0x{0:02X})")]
    InvalidStartByte(u8),

    /// The two length fields of a control/long frame disagree.
    #[error("Invalid M-Bus frame length ({length1} != {length2})")]
    LengthFieldMismatch { length1: u8, length2: u8 },

    /// The length field does not match the actual frame size.
    #[error("Invalid M-Bus frame length")]
    InvalidFrameLength,

    /// Bytes remain in the buffer after a complete frame.
    #[error("Too much data in frame")]
    TooMuchData,

    /// Control code outside the accepted command set.
    #[error("Unknown control code 0x{0:02X}")]
    UnknownControlCode(u8),

    /// The frame does not end with the stop byte.
    #[error("No frame stop")]
    MissingStopByte,

    #[error("Invalid checksum (0x{expected:02X} != 0x{calculated:02X})")]
    InvalidChecksum { expected: u8, calculated: u8 },

    /// A frame parsed but is not acceptable for the pending request.
    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    /// Record data ended before the declared record length.
    #[error("Premature end of record data")]
    PrematureEndAtData,

    /// LVAR byte outside the ranges defined for variable-length data.
    #[error("Unknown variable data length (LVAR 0x{0:02X})")]
    UnknownLvar(u8),

    #[error("Unknown DIF: 0x{0:02X}")]
    UnknownDif(u8),

    #[error("Unknown VIF: 0x{0:03X}")]
    UnknownVif(u16),

    #[error("Unknown VIFE: 0x{0:02X}")]
    UnknownVife(u8),

    /// Plain-text VIF longer than the record can carry.
    #[error("Custom VIF too long ({0} bytes)")]
    CustomVifTooLong(usize),

    #[error("Unknown control information 0x{0:02X}")]
    UnknownControlInformation(u8),

    #[error("Invalid primary address {0}")]
    InvalidPrimaryAddress(u8),

    #[error("Invalid secondary address mask: {0}")]
    InvalidSecondaryAddress(String),

    #[error("Invalid baudrate {0}")]
    InvalidBaudrate(u32),

    #[error("Invalid option value")]
    InvalidOptionValue,

    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    #[error("Invalid manufacturer")]
    InvalidManufacturer,

    /// Retries exhausted without an acceptable reply.
    #[error("No response from device after {0} attempts")]
    NoResponse(u32),

    #[error("Frame parse error: {0}")]
    FrameParseError(String),

    #[error("{0}")]
    Other(String),
}

impl MBusError {
    /// True for errors the session layer retries without purging.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MBusError::Timeout)
    }

    /// True for errors that mean garbage is on the wire: the session layer
    /// purges the line before retrying.
    pub fn is_invalid_frame(&self) -> bool {
        matches!(
            self,
            MBusError::InvalidStartByte(_)
                | MBusError::LengthFieldMismatch { .. }
                | MBusError::InvalidFrameLength
                | MBusError::TooMuchData
                | MBusError::UnknownControlCode(_)
                | MBusError::MissingStopByte
                | MBusError::InvalidChecksum { .. }
                | MBusError::InvalidReply(_)
                | MBusError::FrameParseError(_)
        )
    }
}
