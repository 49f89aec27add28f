//! Tests for the link-layer frame codec: parsing, packing, verification and
//! the streaming contract.

use mbus_master::error::MBusError;
use mbus_master::mbus::frame::{
    pack_frame, parse_frame, verify_frame, FrameParseOutcome, MBusFrame, MBusFrameType,
};
use proptest::prelude::*;

fn parse_complete(bytes: &[u8]) -> MBusFrame {
    match parse_frame(bytes).unwrap() {
        FrameParseOutcome::Complete { frame, consumed } => {
            assert_eq!(consumed, bytes.len());
            frame
        }
        other => panic!("expected complete frame, got {other:?}"),
    }
}

#[test]
fn test_parse_ack_frame() {
    let frame = parse_complete(&[0xE5]);
    assert_eq!(frame.frame_type, MBusFrameType::Ack);
    assert_eq!(frame.checksum, 0);
}

#[test]
fn test_parse_short_frame_snd_nke() {
    // SND_NKE to address 0
    let frame = parse_complete(&[0x10, 0x40, 0x00, 0x40, 0x16]);
    assert_eq!(frame.frame_type, MBusFrameType::Short);
    assert_eq!(frame.control, 0x40);
    assert_eq!(frame.address, 0x00);
    assert_eq!(frame.checksum, 0x40);
}

#[test]
fn test_short_frame_round_trip() {
    let bytes = [0x10, 0x40, 0x00, 0x40, 0x16];
    let frame = parse_complete(&bytes);
    assert_eq!(pack_frame(&frame).as_ref(), &bytes[..]);
}

#[test]
fn test_parse_control_frame() {
    // RSP_UD control frame: 0x68 03 03 0x68 08 05 72 cs 0x16
    let checksum = 0x08u8.wrapping_add(0x05).wrapping_add(0x72);
    let bytes = [0x68, 0x03, 0x03, 0x68, 0x08, 0x05, 0x72, checksum, 0x16];
    let frame = parse_complete(&bytes);
    assert_eq!(frame.frame_type, MBusFrameType::Control);
    assert_eq!(frame.control, 0x08);
    assert_eq!(frame.address, 0x05);
    assert_eq!(frame.control_information, 0x72);
    assert!(frame.data.is_empty());
}

#[test]
fn test_parse_long_frame() {
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = 0x08;
    frame.address = 0x01;
    frame.control_information = 0x72;
    frame.data = vec![0x01, 0x02, 0x03, 0x04, 0x05];
    frame.update_checksum();

    let bytes = pack_frame(&frame);
    assert_eq!(bytes[1], 8); // L = data + 3
    assert_eq!(bytes[2], 8);

    let parsed = parse_complete(&bytes);
    assert_eq!(parsed, frame);
}

#[test]
fn test_rsp_ud_with_acd_dfc_accepted() {
    for control in [0x08u8, 0x18, 0x28, 0x38] {
        let mut frame = MBusFrame::new(MBusFrameType::Long);
        frame.control = control;
        frame.address = 0x01;
        frame.control_information = 0x72;
        frame.data = vec![0x00];
        frame.update_checksum();
        assert!(verify_frame(&frame).is_ok(), "control 0x{control:02X}");
    }
}

#[test]
fn test_verify_rejects_unknown_control() {
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = 0x48;
    frame.address = 0x01;
    frame.control_information = 0x72;
    frame.update_checksum();
    assert!(matches!(
        verify_frame(&frame),
        Err(MBusError::UnknownControlCode(0x48))
    ));
}

#[test]
fn test_checksum_identity() {
    // checksum equals the mod-256 sum of the protected bytes
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = 0x08;
    frame.address = 0xAB;
    frame.control_information = 0x72;
    frame.data = vec![0xFF, 0xFF, 0xFF];
    frame.update_checksum();

    let expected = [0x08u8, 0xAB, 0x72, 0xFF, 0xFF, 0xFF]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    assert_eq!(frame.checksum, expected);
}

#[test]
fn test_needmore_progression_drives_streaming_reads() {
    // feed a long frame byte by byte, tracking what the parser asks for
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = 0x08;
    frame.address = 0x01;
    frame.control_information = 0x72;
    frame.data = vec![0xAA; 10];
    frame.update_checksum();
    let bytes = pack_frame(&frame);

    for cut in 0..bytes.len() {
        match parse_frame(&bytes[..cut]).unwrap() {
            FrameParseOutcome::NeedMore(n) => {
                assert!(n > 0);
                assert!(cut + n <= bytes.len(), "over-asked at cut {cut}");
            }
            FrameParseOutcome::Complete { .. } => panic!("complete at cut {cut}"),
        }
    }
    assert!(matches!(
        parse_frame(&bytes).unwrap(),
        FrameParseOutcome::Complete { .. }
    ));
}

proptest! {
    #[test]
    fn prop_short_frame_round_trip(
        control in prop::sample::select(vec![0x40u8, 0x5A, 0x7A, 0x5B, 0x7B]),
        address in any::<u8>(),
    ) {
        let mut frame = MBusFrame::new(MBusFrameType::Short);
        frame.control = control;
        frame.address = address;
        frame.update_checksum();

        let bytes = pack_frame(&frame);
        let parsed = parse_complete(&bytes);
        prop_assert_eq!(parsed, frame);
    }

    #[test]
    fn prop_long_frame_round_trip(
        control in prop::sample::select(vec![0x53u8, 0x73, 0x08, 0x18, 0x28, 0x38]),
        address in any::<u8>(),
        ci in any::<u8>(),
        data in prop::collection::vec(any::<u8>(), 1..252),
    ) {
        let mut frame = MBusFrame::new(MBusFrameType::Long);
        frame.control = control;
        frame.address = address;
        frame.control_information = ci;
        frame.data = data;
        frame.update_checksum();

        let bytes = pack_frame(&frame);
        let parsed = parse_complete(&bytes);
        prop_assert_eq!(parsed, frame);
    }

    #[test]
    fn prop_parse_is_total(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        // parsing arbitrary bytes never panics and NeedMore is always positive
        match parse_frame(&bytes) {
            Ok(FrameParseOutcome::Complete { consumed, .. }) => {
                prop_assert!(consumed <= bytes.len());
            }
            Ok(FrameParseOutcome::NeedMore(n)) => prop_assert!(n > 0),
            Err(_) => {}
        }
    }
}
