//! Canonical XML rendering of decoded telegrams.
//!
//! This textual form is the acceptance format of a readout: tests compare
//! byte-for-byte against it. Record ids are global across a multi-telegram
//! chain, and the `frame` attribute appears only when the chain holds more
//! than one frame.

use crate::error::MBusError;
use crate::logging::log_error;
use crate::mbus::frame::MBusFrame;
use crate::payload::data::{
    mbus_data_error_lookup, mbus_data_fixed_function, mbus_data_fixed_medium,
    mbus_data_fixed_unit, mbus_data_product_name, mbus_data_variable_medium_lookup, MBusDataFixed,
    MBusDataVariable, MBusDataVariableHeader, MBusFrameData,
};
use crate::payload::record::{mbus_data_record_normalize, MBusRecord, MBusRecordValue};
use std::fmt::Write as _;

/// Escapes text for XML content: `& < > "` become entities and control
/// characters become spaces.
pub fn mbus_str_xml_encode(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for c in src.chars() {
        if c.is_control() {
            out.push(' ');
            continue;
        }
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the `<SlaveInformation>` block of a variable data header.
pub fn mbus_data_variable_header_xml(header: &MBusDataVariableHeader) -> String {
    let mut buff = String::new();

    let _ = writeln!(buff, "    <SlaveInformation>");
    let _ = writeln!(buff, "        <Id>{}</Id>", header.id());
    let _ = writeln!(
        buff,
        "        <Manufacturer>{}</Manufacturer>",
        mbus_str_xml_encode(&header.manufacturer_code())
    );
    let _ = writeln!(buff, "        <Version>{}</Version>", header.version);
    let _ = writeln!(
        buff,
        "        <ProductName>{}</ProductName>",
        mbus_str_xml_encode(&mbus_data_product_name(header))
    );
    let _ = writeln!(
        buff,
        "        <Medium>{}</Medium>",
        mbus_str_xml_encode(&mbus_data_variable_medium_lookup(header.medium))
    );
    let _ = writeln!(
        buff,
        "        <AccessNumber>{}</AccessNumber>",
        header.access_no
    );
    let _ = writeln!(buff, "        <Status>{:02X}</Status>", header.status);
    let _ = writeln!(
        buff,
        "        <Signature>{:02X}{:02X}</Signature>",
        header.signature[1], header.signature[0]
    );
    let _ = writeln!(buff, "    </SlaveInformation>\n");

    buff
}

/// Renders one normalized record. `frame_cnt` adds the `frame` attribute
/// used in multi-telegram chains.
pub fn mbus_data_record_xml(
    record: &MBusRecord,
    record_cnt: usize,
    frame_cnt: Option<usize>,
) -> String {
    let mut buff = String::new();

    match frame_cnt {
        Some(frame) => {
            let _ = writeln!(
                buff,
                "    <DataRecord id=\"{record_cnt}\" frame=\"{frame}\">"
            );
        }
        None => {
            let _ = writeln!(buff, "    <DataRecord id=\"{record_cnt}\">");
        }
    }

    let _ = writeln!(
        buff,
        "        <Function>{}</Function>",
        mbus_str_xml_encode(&record.function_medium)
    );
    let _ = writeln!(
        buff,
        "        <StorageNumber>{}</StorageNumber>",
        record.storage_number
    );

    if record.tariff >= 0 {
        let _ = writeln!(buff, "        <Tariff>{}</Tariff>", record.tariff);
        let _ = writeln!(buff, "        <Device>{}</Device>", record.device);
    }

    let _ = writeln!(
        buff,
        "        <Unit>{}</Unit>",
        mbus_str_xml_encode(&record.unit)
    );
    let _ = writeln!(
        buff,
        "        <Quantity>{}</Quantity>",
        mbus_str_xml_encode(&record.quantity)
    );

    match &record.value {
        MBusRecordValue::Numeric(value) => {
            let _ = writeln!(buff, "        <Value>{value:.6}</Value>");
        }
        MBusRecordValue::String(value) => {
            let _ = writeln!(buff, "        <Value>{}</Value>", mbus_str_xml_encode(value));
        }
    }

    let _ = writeln!(
        buff,
        "        <Timestamp>{}</Timestamp>",
        record.timestamp.format("%Y-%m-%dT%H:%M:%S")
    );
    let _ = writeln!(buff, "    </DataRecord>\n");

    buff
}

fn push_records(
    buff: &mut String,
    data: &MBusDataVariable,
    record_cnt: &mut usize,
    frame_cnt: Option<usize>,
) {
    for record in &data.records {
        match mbus_data_record_normalize(record) {
            Ok(normalized) => {
                buff.push_str(&mbus_data_record_xml(&normalized, *record_cnt, frame_cnt));
            }
            Err(e) => {
                // a record that fails to decode is skipped, the rest of the
                // telegram is still rendered
                log_error(&format!("skipping record {record_cnt}: {e}"));
                match frame_cnt {
                    Some(frame) => {
                        let _ = writeln!(
                            buff,
                            "    <DataRecord id=\"{record_cnt}\" frame=\"{frame}\">"
                        );
                    }
                    None => {
                        let _ = writeln!(buff, "    <DataRecord id=\"{record_cnt}\">");
                    }
                }
                let _ = writeln!(buff, "    </DataRecord>\n");
            }
        }
        *record_cnt += 1;
    }
}

/// Renders a complete variable data response.
pub fn mbus_data_variable_xml(data: &MBusDataVariable) -> String {
    let mut buff = String::from("<MBusData>\n\n");
    buff.push_str(&mbus_data_variable_header_xml(&data.header));

    let mut record_cnt = 0;
    push_records(&mut buff, data, &mut record_cnt, None);

    buff.push_str("</MBusData>\n");
    buff
}

/// Renders a fixed data response.
pub fn mbus_data_fixed_xml(data: &MBusDataFixed) -> String {
    let mut buff = String::from("<MBusData>\n\n");

    let _ = writeln!(buff, "    <SlaveInformation>");
    let _ = writeln!(buff, "        <Id>{}</Id>", data.id());
    let _ = writeln!(
        buff,
        "        <Medium>{}</Medium>",
        mbus_str_xml_encode(&mbus_data_fixed_medium(data))
    );
    let _ = writeln!(buff, "        <AccessNumber>{}</AccessNumber>", data.tx_cnt);
    let _ = writeln!(buff, "        <Status>{:02X}</Status>", data.status);
    let _ = writeln!(buff, "    </SlaveInformation>\n");

    for (id, (cnt_type, cnt_val)) in [
        (data.cnt1_type, &data.cnt1_val),
        (data.cnt2_type, &data.cnt2_val),
    ]
    .iter()
    .enumerate()
    {
        let _ = writeln!(buff, "    <DataRecord id=\"{id}\">");
        let _ = writeln!(
            buff,
            "        <Function>{}</Function>",
            mbus_str_xml_encode(mbus_data_fixed_function(data.status))
        );
        let _ = writeln!(
            buff,
            "        <Unit>{}</Unit>",
            mbus_str_xml_encode(mbus_data_fixed_unit(*cnt_type))
        );
        let _ = writeln!(buff, "        <Value>{}</Value>", data.counter_value(cnt_val));
        let _ = writeln!(buff, "    </DataRecord>\n");
    }

    buff.push_str("</MBusData>\n");
    buff
}

/// Renders a general application error response.
pub fn mbus_data_error_xml(error: u8) -> String {
    let mut buff = String::from("<MBusData>\n\n");
    let _ = writeln!(buff, "    <SlaveInformation>");
    let _ = writeln!(
        buff,
        "        <Error>{}</Error>",
        mbus_str_xml_encode(&mbus_data_error_lookup(error))
    );
    let _ = writeln!(buff, "    </SlaveInformation>\n");
    buff.push_str("</MBusData>\n");
    buff
}

/// Renders a single response frame.
pub fn mbus_frame_xml(frame: &MBusFrame) -> Result<String, MBusError> {
    mbus_frame_chain_xml(std::slice::from_ref(frame))
}

/// Renders a telegram chain. The slave information comes from the first
/// frame; record ids run across the whole chain.
pub fn mbus_frame_chain_xml(frames: &[MBusFrame]) -> Result<String, MBusError> {
    let first = frames
        .first()
        .ok_or_else(|| MBusError::Other("empty frame chain".into()))?;

    match crate::payload::data::mbus_frame_data_parse(first)? {
        MBusFrameData::Error(code) => Ok(mbus_data_error_xml(code)),
        MBusFrameData::Fixed(fixed) => Ok(mbus_data_fixed_xml(&fixed)),
        MBusFrameData::Variable(first_var) => {
            let mut buff = String::from("<MBusData>\n\n");
            buff.push_str(&mbus_data_variable_header_xml(&first_var.header));

            let multi_frame = frames.len() > 1;
            let mut record_cnt = 0;

            for (frame_cnt, frame) in frames.iter().enumerate() {
                let var = if frame_cnt == 0 {
                    first_var.clone()
                } else {
                    match crate::payload::data::mbus_frame_data_parse(frame)? {
                        MBusFrameData::Variable(var) => var,
                        _ => {
                            return Err(MBusError::InvalidReply(
                                "mixed response types in telegram chain".into(),
                            ))
                        }
                    }
                };

                let frame_attr = multi_frame.then_some(frame_cnt);
                push_records(&mut buff, &var, &mut record_cnt, frame_attr);
            }

            buff.push_str("</MBusData>\n");
            Ok(buff)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_encode_escapes() {
        assert_eq!(mbus_str_xml_encode("a&b<c>d\"e"), "a&amp;b&lt;c&gt;d&quot;e");
        assert_eq!(mbus_str_xml_encode("a\x01b"), "a b");
    }
}
