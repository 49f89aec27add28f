//! # M-Bus link-layer frame codec
//!
//! Parses raw byte buffers into typed frames and packs frames back into
//! their wire representation. The parser is written against `nom`'s
//! streaming combinators so that an under-full buffer reports exactly how
//! many more bytes the caller has to read before retrying.

use crate::constants::*;
use crate::error::MBusError;
use crate::payload::data_encoding::mbus_data_bcd_decode;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, TimeZone, Utc};
use nom::bytes::streaming::take;
use nom::number::streaming::be_u8;
use nom::IResult;

/// Represents an M-Bus frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MBusFrame {
    pub frame_type: MBusFrameType,
    pub control: u8,
    pub address: u8,
    pub control_information: u8,
    pub data: Vec<u8>,
    pub checksum: u8,
    /// Receive time, stamped by the bus handle.
    pub timestamp: DateTime<Utc>,
}

/// Represents the different types of M-Bus frames.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MBusFrameType {
    Ack,
    Short,
    Control,
    Long,
}

/// Result of feeding a byte buffer to [`parse_frame`]: either a full frame
/// or a request for more bytes. `NeedMore` never consumes input.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameParseOutcome {
    Complete { frame: MBusFrame, consumed: usize },
    NeedMore(usize),
}

impl MBusFrame {
    pub fn new(frame_type: MBusFrameType) -> Self {
        MBusFrame {
            frame_type,
            control: 0,
            address: 0,
            control_information: 0,
            data: Vec::new(),
            checksum: 0,
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    /// Direction bit of the control field. ACK frames only ever travel from
    /// slave to master.
    pub fn direction(&self) -> u8 {
        if self.frame_type == MBusFrameType::Ack {
            MBUS_CONTROL_MASK_DIR_S2M
        } else {
            self.control & MBUS_CONTROL_MASK_DIR
        }
    }

    /// Arithmetic sum of the protected bytes, without carry. Zero for ACK.
    pub fn calculate_checksum(&self) -> u8 {
        let mut cksum: u8 = 0;
        match self.frame_type {
            MBusFrameType::Ack => {}
            MBusFrameType::Short => {
                cksum = self.control.wrapping_add(self.address);
            }
            MBusFrameType::Control | MBusFrameType::Long => {
                cksum = self
                    .control
                    .wrapping_add(self.address)
                    .wrapping_add(self.control_information);
                for byte in &self.data {
                    cksum = cksum.wrapping_add(*byte);
                }
            }
        }
        cksum
    }

    fn length_field(&self) -> u8 {
        match self.frame_type {
            MBusFrameType::Control => 3,
            MBusFrameType::Long => self.data.len() as u8 + 3,
            _ => 0,
        }
    }

    /// Updates the stored checksum from the current frame content.
    pub fn update_checksum(&mut self) {
        self.checksum = self.calculate_checksum();
    }
}

/// Verifies a parsed frame: control code acceptance, length fields and
/// checksum. Start and stop bytes are enforced by the parser itself.
pub fn verify_frame(frame: &MBusFrame) -> Result<(), MBusError> {
    match frame.frame_type {
        MBusFrameType::Ack => return Ok(()),
        MBusFrameType::Short => {
            const ACCEPTED: [u8; 5] = [
                MBUS_CONTROL_MASK_SND_NKE,
                MBUS_CONTROL_MASK_REQ_UD1,
                MBUS_CONTROL_MASK_REQ_UD1 | MBUS_CONTROL_MASK_FCB,
                MBUS_CONTROL_MASK_REQ_UD2,
                MBUS_CONTROL_MASK_REQ_UD2 | MBUS_CONTROL_MASK_FCB,
            ];
            if !ACCEPTED.contains(&frame.control) {
                return Err(MBusError::UnknownControlCode(frame.control));
            }
        }
        MBusFrameType::Control | MBusFrameType::Long => {
            const ACCEPTED: [u8; 6] = [
                MBUS_CONTROL_MASK_SND_UD,
                MBUS_CONTROL_MASK_SND_UD | MBUS_CONTROL_MASK_FCB,
                MBUS_CONTROL_MASK_RSP_UD,
                MBUS_CONTROL_MASK_RSP_UD | MBUS_CONTROL_MASK_DFC,
                MBUS_CONTROL_MASK_RSP_UD | MBUS_CONTROL_MASK_ACD,
                MBUS_CONTROL_MASK_RSP_UD | MBUS_CONTROL_MASK_DFC | MBUS_CONTROL_MASK_ACD,
            ];
            if !ACCEPTED.contains(&frame.control) {
                return Err(MBusError::UnknownControlCode(frame.control));
            }
            if frame.data.len() > MBUS_FRAME_DATA_LENGTH {
                return Err(MBusError::InvalidFrameLength);
            }
        }
    }

    let calculated = frame.calculate_checksum();
    if frame.checksum != calculated {
        return Err(MBusError::InvalidChecksum {
            expected: frame.checksum,
            calculated,
        });
    }

    Ok(())
}

fn short_frame_body(input: &[u8]) -> IResult<&[u8], (u8, u8, u8, u8)> {
    let (input, body) = take(4usize)(input)?;
    Ok((input, (body[0], body[1], body[2], body[3])))
}

fn long_frame_lengths(input: &[u8]) -> IResult<&[u8], (u8, u8)> {
    let (input, lengths) = take(2usize)(input)?;
    Ok((input, (lengths[0], lengths[1])))
}

/// Parses one frame from the start of `input`.
///
/// Returns `NeedMore(n)` when at least `n` further bytes are required,
/// without consuming anything. Anything left over after a complete frame is
/// an error ("too much data"): callers purge and resync instead of silently
/// slipping the frame boundary.
pub fn parse_frame(input: &[u8]) -> Result<FrameParseOutcome, MBusError> {
    let (rest, start) = match be_u8::<_, nom::error::Error<&[u8]>>(input) {
        Ok(v) => v,
        Err(nom::Err::Incomplete(_)) => return Ok(FrameParseOutcome::NeedMore(1)),
        Err(_) => return Err(MBusError::FrameParseError("empty input".into())),
    };

    match start {
        MBUS_FRAME_ACK_START => {
            if !rest.is_empty() {
                return Err(MBusError::TooMuchData);
            }
            Ok(FrameParseOutcome::Complete {
                frame: MBusFrame::new(MBusFrameType::Ack),
                consumed: 1,
            })
        }

        MBUS_FRAME_SHORT_START => {
            let (rest, (control, address, checksum, stop)) = match short_frame_body(rest) {
                Ok(v) => v,
                Err(nom::Err::Incomplete(nom::Needed::Size(n))) => {
                    return Ok(FrameParseOutcome::NeedMore(n.get()))
                }
                Err(_) => return Ok(FrameParseOutcome::NeedMore(1)),
            };
            if !rest.is_empty() {
                return Err(MBusError::TooMuchData);
            }
            if stop != MBUS_FRAME_STOP {
                return Err(MBusError::MissingStopByte);
            }

            let mut frame = MBusFrame::new(MBusFrameType::Short);
            frame.control = control;
            frame.address = address;
            frame.checksum = checksum;
            verify_frame(&frame)?;

            Ok(FrameParseOutcome::Complete {
                frame,
                consumed: MBUS_FRAME_BASE_SIZE_SHORT,
            })
        }

        MBUS_FRAME_CONTROL_START => {
            let (rest, (length1, length2)) = match long_frame_lengths(rest) {
                Ok(v) => v,
                Err(nom::Err::Incomplete(nom::Needed::Size(n))) => {
                    return Ok(FrameParseOutcome::NeedMore(n.get()))
                }
                Err(_) => return Ok(FrameParseOutcome::NeedMore(1)),
            };

            if length1 != length2 {
                return Err(MBusError::LengthFieldMismatch { length1, length2 });
            }
            if length1 < 3 {
                return Err(MBusError::InvalidFrameLength);
            }

            // start2, C, A, CI, data, checksum, stop
            let body_len = length1 as usize + 3;
            let (rest, body) = match take::<_, _, nom::error::Error<&[u8]>>(body_len)(rest) {
                Ok(v) => v,
                Err(nom::Err::Incomplete(nom::Needed::Size(n))) => {
                    return Ok(FrameParseOutcome::NeedMore(n.get()))
                }
                Err(_) => return Ok(FrameParseOutcome::NeedMore(1)),
            };
            if !rest.is_empty() {
                return Err(MBusError::TooMuchData);
            }

            if body[0] != MBUS_FRAME_CONTROL_START {
                return Err(MBusError::FrameParseError("second start byte missing".into()));
            }
            if body[body_len - 1] != MBUS_FRAME_STOP {
                return Err(MBusError::MissingStopByte);
            }

            let data_size = length1 as usize - 3;
            let frame_type = if data_size == 0 {
                MBusFrameType::Control
            } else {
                MBusFrameType::Long
            };

            let mut frame = MBusFrame::new(frame_type);
            frame.control = body[1];
            frame.address = body[2];
            frame.control_information = body[3];
            frame.data = body[4..4 + data_size].to_vec();
            frame.checksum = body[body_len - 2];
            verify_frame(&frame)?;

            Ok(FrameParseOutcome::Complete {
                frame,
                consumed: MBUS_FRAME_FIXED_SIZE_LONG + length1 as usize,
            })
        }

        other => Err(MBusError::InvalidStartByte(other)),
    }
}

/// Packs a frame into its on-wire byte sequence. Length and checksum fields
/// are computed from the frame content, never taken from the struct.
pub fn pack_frame(frame: &MBusFrame) -> BytesMut {
    let mut buf = BytesMut::with_capacity(frame.data.len() + MBUS_FRAME_BASE_SIZE_CONTROL);

    match frame.frame_type {
        MBusFrameType::Ack => {
            buf.put_u8(MBUS_FRAME_ACK_START);
        }
        MBusFrameType::Short => {
            buf.put_u8(MBUS_FRAME_SHORT_START);
            buf.put_u8(frame.control);
            buf.put_u8(frame.address);
            buf.put_u8(frame.calculate_checksum());
            buf.put_u8(MBUS_FRAME_STOP);
        }
        MBusFrameType::Control | MBusFrameType::Long => {
            buf.put_u8(MBUS_FRAME_CONTROL_START);
            buf.put_u8(frame.length_field());
            buf.put_u8(frame.length_field());
            buf.put_u8(MBUS_FRAME_CONTROL_START);
            buf.put_u8(frame.control);
            buf.put_u8(frame.address);
            buf.put_u8(frame.control_information);
            buf.put_slice(&frame.data);
            buf.put_u8(frame.calculate_checksum());
            buf.put_u8(MBUS_FRAME_STOP);
        }
    }

    buf
}

/// Builds the slave-select frame for a 16-hex-digit secondary address mask
/// ('F' nibbles are wildcards). The mask is packed as 4 ID BCD bytes,
/// 2 manufacturer bytes, version and medium.
pub fn pack_select_frame(frame: &mut MBusFrame, mask: &str) -> Result<(), MBusError> {
    let cleaned: Vec<char> = mask.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() != 16 || !cleaned.iter().all(|c| c.is_ascii_hexdigit()) {
        return Err(MBusError::InvalidSecondaryAddress(mask.to_string()));
    }

    let nibble = |c: char| c.to_digit(16).unwrap_or(0) as u8;

    let mut data = [0u8; 8];
    // ID nibbles, high nibble first, little-endian byte order
    let mut j = 3usize;
    let mut high = true;
    for c in &cleaned[0..8] {
        let n = if *c == 'F' || *c == 'f' { 0x0F } else { nibble(*c) };
        if high {
            data[j] |= n << 4;
            high = false;
        } else {
            data[j] |= n;
            high = true;
            j = j.wrapping_sub(1);
        }
    }
    // manufacturer, version, medium
    data[4] = (nibble(cleaned[8]) << 4) | nibble(cleaned[9]);
    data[5] = (nibble(cleaned[10]) << 4) | nibble(cleaned[11]);
    data[6] = (nibble(cleaned[12]) << 4) | nibble(cleaned[13]);
    data[7] = (nibble(cleaned[14]) << 4) | nibble(cleaned[15]);

    frame.frame_type = MBusFrameType::Long;
    frame.control = MBUS_CONTROL_MASK_SND_UD | MBUS_CONTROL_MASK_FCB;
    frame.address = MBUS_ADDRESS_NETWORK_LAYER;
    frame.control_information = MBUS_CONTROL_INFO_SELECT_SLAVE;
    frame.data = data.to_vec();
    frame.update_checksum();
    Ok(())
}

/// Extracts the 16-hex secondary address from a variable data response.
pub fn frame_get_secondary_address(frame: &MBusFrame) -> Result<String, MBusError> {
    if frame.control_information != MBUS_CONTROL_INFO_RESP_VARIABLE {
        return Err(MBusError::InvalidReply(
            "non-variable data response (can't get secondary address)".into(),
        ));
    }
    if frame.data.len() < MBUS_DATA_VARIABLE_HEADER_LENGTH {
        return Err(MBusError::FrameParseError("variable data header too short".into()));
    }

    let id = mbus_data_bcd_decode(&frame.data[0..4]);
    Ok(format!(
        "{:08}{:02X}{:02X}{:02X}{:02X}",
        id, frame.data[4], frame.data[5], frame.data[6], frame.data[7]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_needmore_counts() {
        assert_eq!(parse_frame(&[]).unwrap(), FrameParseOutcome::NeedMore(1));
        assert_eq!(
            parse_frame(&[0x10]).unwrap(),
            FrameParseOutcome::NeedMore(4)
        );
        assert_eq!(
            parse_frame(&[0x10, 0x40, 0x00]).unwrap(),
            FrameParseOutcome::NeedMore(2)
        );
        assert_eq!(
            parse_frame(&[0x68]).unwrap(),
            FrameParseOutcome::NeedMore(2)
        );
        assert_eq!(
            parse_frame(&[0x68, 0x05]).unwrap(),
            FrameParseOutcome::NeedMore(1)
        );
        // L = 5 means the full frame is 11 bytes
        assert_eq!(
            parse_frame(&[0x68, 0x05, 0x05, 0x68]).unwrap(),
            FrameParseOutcome::NeedMore(7)
        );
    }

    #[test]
    fn test_parse_excess_bytes_rejected() {
        assert!(matches!(
            parse_frame(&[0xE5, 0x00]),
            Err(MBusError::TooMuchData)
        ));
        assert!(matches!(
            parse_frame(&[0x10, 0x40, 0x00, 0x40, 0x16, 0xE5]),
            Err(MBusError::TooMuchData)
        ));
    }

    #[test]
    fn test_length_field_mismatch() {
        assert!(matches!(
            parse_frame(&[0x68, 0x04, 0x05, 0x68]),
            Err(MBusError::LengthFieldMismatch { .. })
        ));
        assert!(matches!(
            parse_frame(&[0x68, 0x02, 0x02, 0x68]),
            Err(MBusError::InvalidFrameLength)
        ));
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let result = parse_frame(&[0x10, 0x40, 0x00, 0x41, 0x16]);
        assert!(matches!(
            result,
            Err(MBusError::InvalidChecksum {
                expected: 0x41,
                calculated: 0x40
            })
        ));
    }

    #[test]
    fn test_unknown_control_code() {
        // control 0x00 is not an accepted short frame command
        let result = parse_frame(&[0x10, 0x00, 0x01, 0x01, 0x16]);
        assert!(matches!(result, Err(MBusError::UnknownControlCode(0x00))));
    }

    #[test]
    fn test_pack_select_frame_wildcards() {
        let mut frame = MBusFrame::new(MBusFrameType::Long);
        pack_select_frame(&mut frame, "14491001FFFF0106").unwrap();

        assert_eq!(frame.address, MBUS_ADDRESS_NETWORK_LAYER);
        assert_eq!(frame.control_information, MBUS_CONTROL_INFO_SELECT_SLAVE);
        assert_eq!(
            frame.data,
            vec![0x01, 0x10, 0x49, 0x14, 0xFF, 0xFF, 0x01, 0x06]
        );
        assert_eq!(frame.checksum, frame.calculate_checksum());
    }

    #[test]
    fn test_pack_select_frame_rejects_bad_mask() {
        let mut frame = MBusFrame::new(MBusFrameType::Long);
        assert!(pack_select_frame(&mut frame, "123").is_err());
        assert!(pack_select_frame(&mut frame, "XYZ1100114491001").is_err());
    }
}
