//! Link-layer frame codec, transports and the session layer of an M-Bus
//! master station.

pub mod frame;
pub mod protocol;
pub mod secondary;
pub mod serial;
pub mod tcp;
pub mod transport;

pub use frame::{pack_frame, parse_frame, verify_frame, FrameParseOutcome, MBusFrame, MBusFrameType};
pub use protocol::{
    HandleOptions, MBusHandle, PrimaryScanHit, ProbeOutcome, ProbeResult, PurgeFirstFrame,
};
pub use secondary::SecondaryMask;
pub use serial::{MBusBaudRate, SerialTransport};
pub use tcp::TcpTransport;
pub use transport::{MockTransport, Transport};
