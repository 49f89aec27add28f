//! Golden tests for the canonical XML rendering.

use mbus_master::constants::*;
use mbus_master::mbus::frame::{MBusFrame, MBusFrameType};
use mbus_master::xml::{mbus_data_error_xml, mbus_frame_chain_xml, mbus_frame_xml};

/// RSP_UD long frame with the given variable-data payload, epoch timestamp.
fn response_frame(payload: Vec<u8>) -> MBusFrame {
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = MBUS_CONTROL_MASK_RSP_UD;
    frame.address = 0x01;
    frame.control_information = MBUS_CONTROL_INFO_RESP_VARIABLE;
    frame.data = payload;
    frame.update_checksum();
    frame
}

fn header_bytes() -> Vec<u8> {
    vec![
        0x78, 0x56, 0x34, 0x12, // id 12345678
        0x77, 0x04, // manufacturer ACW
        0x0A, // version
        0x07, // medium: water
        0x01, // access number
        0x00, // status
        0x00, 0x00, // signature
    ]
}

#[test]
fn test_minimal_energy_record_xml() {
    // one 16 bit integer record: raw 1 at VIF 0x01 normalizes to 0.01 Wh
    let mut payload = header_bytes();
    payload.extend_from_slice(&[0x02, 0x01, 0x01, 0x00]);
    let frame = response_frame(payload);

    let expected = "\
<MBusData>

    <SlaveInformation>
        <Id>12345678</Id>
        <Manufacturer>ACW</Manufacturer>
        <Version>10</Version>
        <ProductName>Itron CF 51</ProductName>
        <Medium>Water</Medium>
        <AccessNumber>1</AccessNumber>
        <Status>00</Status>
        <Signature>0000</Signature>
    </SlaveInformation>

    <DataRecord id=\"0\">
        <Function>Instantaneous value</Function>
        <StorageNumber>0</StorageNumber>
        <Unit>Wh</Unit>
        <Quantity>Energy</Quantity>
        <Value>0.010000</Value>
        <Timestamp>1970-01-01T00:00:00</Timestamp>
    </DataRecord>

</MBusData>
";

    assert_eq!(mbus_frame_xml(&frame).unwrap(), expected);
}

#[test]
fn test_tariff_and_device_rendered_when_present() {
    let mut payload = header_bytes();
    // DIFE 0x50: tariff 1, device 1
    payload.extend_from_slice(&[0x82, 0x50, 0x01, 0x2A, 0x00]);
    let frame = response_frame(payload);

    let xml = mbus_frame_xml(&frame).unwrap();
    assert!(xml.contains("        <Tariff>1</Tariff>\n"));
    assert!(xml.contains("        <Device>1</Device>\n"));
}

#[test]
fn test_tariff_omitted_when_absent() {
    let mut payload = header_bytes();
    payload.extend_from_slice(&[0x02, 0x01, 0x01, 0x00]);
    let frame = response_frame(payload);

    let xml = mbus_frame_xml(&frame).unwrap();
    assert!(!xml.contains("<Tariff>"));
    assert!(!xml.contains("<Device>"));
}

#[test]
fn test_string_value_is_escaped() {
    let mut payload = header_bytes();
    // LVAR ASCII record carrying "A&B" (reversed on the wire)
    payload.extend_from_slice(&[0x0D, 0x78, 0x03, b'B', b'&', b'A']);
    let frame = response_frame(payload);

    let xml = mbus_frame_xml(&frame).unwrap();
    assert!(xml.contains("<Value>A&amp;B</Value>"));
}

#[test]
fn test_multi_frame_chain_numbers_records_globally() {
    let mut payload1 = header_bytes();
    payload1.extend_from_slice(&[0x02, 0x01, 0x01, 0x00, 0x1F]);
    let mut payload2 = header_bytes();
    payload2.extend_from_slice(&[0x02, 0x01, 0x02, 0x00]);

    let frames = vec![response_frame(payload1), response_frame(payload2)];
    let xml = mbus_frame_chain_xml(&frames).unwrap();

    // ids are global across the chain, frame attribute present
    assert!(xml.contains("<DataRecord id=\"0\" frame=\"0\">"));
    assert!(xml.contains("<DataRecord id=\"1\" frame=\"0\">"));
    assert!(xml.contains("<DataRecord id=\"2\" frame=\"1\">"));
    assert!(xml.contains("<Function>More records follow</Function>"));
    // slave information appears exactly once
    assert_eq!(xml.matches("<SlaveInformation>").count(), 1);
}

#[test]
fn test_single_frame_has_no_frame_attribute() {
    let mut payload = header_bytes();
    payload.extend_from_slice(&[0x02, 0x01, 0x01, 0x00]);
    let xml = mbus_frame_chain_xml(&[response_frame(payload)]).unwrap();
    assert!(xml.contains("<DataRecord id=\"0\">"));
    assert!(!xml.contains("frame="));
}

#[test]
fn test_error_response_xml() {
    let xml = mbus_data_error_xml(0x08);
    let expected = "\
<MBusData>

    <SlaveInformation>
        <Error>Application busy</Error>
    </SlaveInformation>

</MBusData>
";
    assert_eq!(xml, expected);
}

#[test]
fn test_fixed_response_xml() {
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = MBUS_CONTROL_MASK_RSP_UD;
    frame.address = 0x01;
    frame.control_information = MBUS_CONTROL_INFO_RESP_FIXED;
    frame.data = vec![
        0x78, 0x56, 0x34, 0x12, // id
        0x09, // access number
        0x00, // status: BCD, actual
        0x04, 0x2C, // counter types: 100 Wh / m^3
        0x42, 0x00, 0x00, 0x00, // counter 1
        0x13, 0x00, 0x00, 0x00, // counter 2
    ];
    frame.update_checksum();

    let xml = mbus_frame_xml(&frame).unwrap();
    assert!(xml.contains("<Id>12345678</Id>"));
    assert!(xml.contains("<Function>Actual value</Function>"));
    assert!(xml.contains("<Unit>100 Wh</Unit>"));
    assert!(xml.contains("<Unit>m^3</Unit>"));
    assert!(xml.contains("<Value>42</Value>"));
    assert!(xml.contains("<Value>13</Value>"));
}
