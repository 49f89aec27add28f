//! Data records of the variable data structure: the DIB/VIB walk over a long
//! frame payload, and decoding of each record into a typed, normalized value.

use crate::constants::*;
use crate::error::MBusError;
use crate::payload::data_encoding::{
    mbus_data_bcd_decode, mbus_data_bin_decode, mbus_data_date_decode, mbus_data_float_decode,
    mbus_data_int_decode, mbus_data_str_decode, mbus_data_tm_decode,
};
use crate::payload::vif::normalize_vib;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Data information block: DIF plus up to ten extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MBusDataInformationBlock {
    pub dif: u8,
    pub ndife: usize,
    pub dife: [u8; MBUS_MAX_DIFE],
}

/// Value information block: VIF plus up to ten extensions and the optional
/// plain-text unit of VIF 0x7C/0xFC (stored in natural order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MBusValueInformationBlock {
    pub vif: u8,
    pub nvife: usize,
    pub vife: [u8; MBUS_MAX_VIFE],
    pub custom_vif: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MBusDataRecordHeader {
    pub dib: MBusDataInformationBlock,
    pub vib: MBusValueInformationBlock,
}

/// One raw record sliced out of a variable data payload.
#[derive(Debug, Clone)]
pub struct MBusDataRecord {
    pub drh: MBusDataRecordHeader,
    pub data: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl MBusDataRecord {
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// True for the manufacturer-specific and more-records-follow markers,
    /// which carry an opaque blob instead of a DIB/VIB-described value.
    pub fn is_special_function(&self) -> bool {
        self.drh.dib.dif == MBUS_DIB_DIF_MANUFACTURER_SPECIFIC
            || self.drh.dib.dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW
    }
}

/// Value of a normalized record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MBusRecordValue {
    Numeric(f64),
    String(String),
}

/// A fully decoded and unit-normalized data record, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct MBusRecord {
    pub timestamp: DateTime<Utc>,
    pub storage_number: u64,
    /// -1 when the record carries no DIFE.
    pub tariff: i64,
    /// -1 when the record carries no DIFE.
    pub device: i32,
    pub is_numeric: bool,
    pub value: MBusRecordValue,
    pub unit: String,
    pub function_medium: String,
    pub quantity: String,
}

/// Data length in bytes for a DIF data-field code. Variable-length (0xD)
/// reports zero here; its length comes from the LVAR byte.
pub fn mbus_dif_datalength_lookup(dif: u8) -> usize {
    match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
        0x0 => 0,
        0x1 => 1,
        0x2 => 2,
        0x3 => 3,
        0x4 => 4,
        0x5 => 4,
        0x6 => 6,
        0x7 => 8,
        0x8 => 0,
        0x9 => 1,
        0xA => 2,
        0xB => 3,
        0xC => 4,
        0xD => 0,
        0xE => 6,
        0xF => 8,
        _ => unreachable!(),
    }
}

/// Translates an LVAR byte into the record data length.
pub fn mbus_variable_data_length(lvar: u8) -> Result<usize, MBusError> {
    match lvar {
        0x00..=0xBF => Ok(lvar as usize),
        0xC0..=0xCF => Ok((lvar - 0xC0) as usize * 2),
        0xD0..=0xDF => Ok((lvar - 0xD0) as usize * 2),
        0xE0..=0xEF => Ok((lvar - 0xE0) as usize),
        0xF0..=0xFA => Ok((lvar - 0xF0) as usize),
        _ => Err(MBusError::UnknownLvar(lvar)),
    }
}

/// Storage number: DIF bit 6 is bit 0, each DIFE contributes one more bit.
pub fn mbus_data_record_storage_number(dib: &MBusDataInformationBlock) -> u64 {
    let mut result = ((dib.dif & MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO) >> 6) as u64;
    let mut bit_index = 1;

    for dife in &dib.dife[..dib.ndife] {
        result |= ((dife & MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO) as u64) << bit_index;
        bit_index += 1;
    }
    result
}

/// Tariff: two bits per DIFE, -1 when the record carries no DIFE.
pub fn mbus_data_record_tariff(dib: &MBusDataInformationBlock) -> i64 {
    if dib.ndife == 0 {
        return -1;
    }

    let mut result = 0i64;
    let mut bit_index = 0;
    for dife in &dib.dife[..dib.ndife] {
        result |= (((dife & MBUS_DATA_RECORD_DIFE_MASK_TARIFF) >> 4) as i64) << bit_index;
        bit_index += 2;
    }
    result
}

/// Device (subunit): one bit per DIFE, -1 when the record carries no DIFE.
pub fn mbus_data_record_device(dib: &MBusDataInformationBlock) -> i32 {
    if dib.ndife == 0 {
        return -1;
    }

    let mut result = 0i32;
    let mut bit_index = 0;
    for dife in &dib.dife[..dib.ndife] {
        result |= (((dife & MBUS_DATA_RECORD_DIFE_MASK_DEVICE) >> 6) as i32) << bit_index;
        bit_index += 1;
    }
    result
}

/// Function classifier from DIF bits 4-5.
pub fn mbus_data_record_function(dif: u8) -> &'static str {
    match dif & MBUS_DATA_RECORD_DIF_MASK_FUNCTION {
        0x00 => "Instantaneous value",
        0x10 => "Maximum value",
        0x20 => "Minimum value",
        0x30 => "Value during error state",
        _ => "unknown",
    }
}

/// Walks a variable data payload (everything after the 12-byte header) into a
/// record list. Returns the records and whether the slave flagged that more
/// records follow in another telegram.
pub fn mbus_data_records_parse(
    data: &[u8],
    timestamp: DateTime<Utc>,
) -> Result<(Vec<MBusDataRecord>, bool), MBusError> {
    let mut records = Vec::new();
    let mut more_records_follow = false;
    let mut i = 0;

    while i < data.len() {
        if data[i] == MBUS_DIB_DIF_IDLE_FILLER {
            i += 1;
            continue;
        }

        let mut record = MBusDataRecord {
            drh: MBusDataRecordHeader::default(),
            data: Vec::new(),
            timestamp,
        };

        record.drh.dib.dif = data[i];
        i += 1;

        if record.is_special_function() {
            if record.drh.dib.dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW {
                more_records_follow = true;
            }

            // the remainder of the telegram belongs to this record
            if data.len() - i > MBUS_DATA_RECORD_MAX_SIZE {
                return Err(MBusError::PrematureEndAtData);
            }
            record.data.extend_from_slice(&data[i..]);
            records.push(record);
            break;
        }

        let mut data_len = mbus_dif_datalength_lookup(record.drh.dib.dif);

        // DIF extensions
        let mut ext = record.drh.dib.dif;
        while (ext & MBUS_DIB_DIF_EXTENSION_BIT) != 0 && record.drh.dib.ndife < MBUS_MAX_DIFE {
            let dife = *data.get(i).ok_or(MBusError::PrematureEndAtData)?;
            record.drh.dib.dife[record.drh.dib.ndife] = dife;
            record.drh.dib.ndife += 1;
            i += 1;
            ext = dife;
        }

        record.drh.vib.vif = *data.get(i).ok_or(MBusError::PrematureEndAtData)?;
        i += 1;

        if (record.drh.vib.vif & MBUS_DIB_VIF_WITHOUT_EXTENSION) == 0x7C {
            // plain-text unit, length-prefixed and reversed on the wire
            let var_vif_len = *data.get(i).ok_or(MBusError::PrematureEndAtData)? as usize;
            i += 1;
            if var_vif_len > MBUS_CUSTOM_VIF_MAX_SIZE {
                return Err(MBusError::CustomVifTooLong(var_vif_len));
            }
            let text = data
                .get(i..i + var_vif_len)
                .ok_or(MBusError::PrematureEndAtData)?;
            record.drh.vib.custom_vif = mbus_data_str_decode(text);
            i += var_vif_len;
        }

        // VIF extensions
        if (record.drh.vib.vif & MBUS_DIB_VIF_EXTENSION_BIT) != 0 {
            let mut ext = record.drh.vib.vif;
            while (ext & MBUS_DIB_VIF_EXTENSION_BIT) != 0 && record.drh.vib.nvife < MBUS_MAX_VIFE {
                let vife = *data.get(i).ok_or(MBusError::PrematureEndAtData)?;
                record.drh.vib.vife[record.drh.vib.nvife] = vife;
                record.drh.vib.nvife += 1;
                i += 1;
                ext = vife;
            }
        }

        if (record.drh.dib.dif & MBUS_DATA_RECORD_DIF_MASK_DATA) == 0x0D {
            let lvar = *data.get(i).ok_or(MBusError::PrematureEndAtData)?;
            i += 1;
            data_len = mbus_variable_data_length(lvar)?;
        }

        if data_len > MBUS_DATA_RECORD_MAX_SIZE {
            return Err(MBusError::PrematureEndAtData);
        }

        let payload = data
            .get(i..i + data_len)
            .ok_or(MBusError::PrematureEndAtData)?;
        record.data.extend_from_slice(payload);
        i += data_len;

        records.push(record);
    }

    Ok((records, more_records_follow))
}

/// Decodes the raw value of a record per its DIF data-field code, before any
/// unit normalization. Two, four and six byte integers turn into date strings
/// when the VIB declares a time point.
fn mbus_data_record_value_decode(record: &MBusDataRecord) -> Result<MBusRecordValue, MBusError> {
    let vif = record.drh.vib.vif & MBUS_DIB_VIF_WITHOUT_EXTENSION;
    let vife = if record.drh.vib.nvife > 0 {
        record.drh.vib.vife[0] & MBUS_DIB_VIF_WITHOUT_EXTENSION
    } else {
        0
    };
    let is_date_time = vif == 0x6D
        || (record.drh.vib.vif == 0xFD && vife == 0x30)
        || (record.drh.vib.vif == 0xFD && vife == 0x70);

    if record.data_len() < mbus_dif_datalength_lookup(record.drh.dib.dif) {
        return Err(MBusError::PrematureEndAtData);
    }

    let value = match record.drh.dib.dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
        0x00 => MBusRecordValue::String(String::new()),
        0x01 => MBusRecordValue::Numeric(mbus_data_int_decode(&record.data[..1]) as f64),
        0x02 => {
            if vif == 0x6C {
                MBusRecordValue::String(mbus_data_date_decode(&record.data).to_string())
            } else {
                MBusRecordValue::Numeric(mbus_data_int_decode(&record.data[..2]) as f64)
            }
        }
        0x03 => MBusRecordValue::Numeric(mbus_data_int_decode(&record.data[..3]) as f64),
        0x04 => {
            if is_date_time {
                MBusRecordValue::String(mbus_data_tm_decode(&record.data).to_string())
            } else {
                MBusRecordValue::Numeric(mbus_data_int_decode(&record.data[..4]) as f64)
            }
        }
        0x05 => MBusRecordValue::Numeric(mbus_data_float_decode(&record.data) as f64),
        0x06 => {
            if is_date_time {
                MBusRecordValue::String(mbus_data_tm_decode(&record.data).to_string())
            } else {
                MBusRecordValue::Numeric(mbus_data_int_decode(&record.data[..6]) as f64)
            }
        }
        0x07 => MBusRecordValue::Numeric(mbus_data_int_decode(&record.data[..8]) as f64),
        0x09 => MBusRecordValue::Numeric(mbus_data_bcd_decode(&record.data[..1]) as f64),
        0x0A => MBusRecordValue::Numeric(mbus_data_bcd_decode(&record.data[..2]) as f64),
        0x0B => MBusRecordValue::Numeric(mbus_data_bcd_decode(&record.data[..3]) as f64),
        0x0C => MBusRecordValue::Numeric(mbus_data_bcd_decode(&record.data[..4]) as f64),
        0x0D => {
            if record.data_len() <= 0xBF {
                MBusRecordValue::String(mbus_data_str_decode(&record.data))
            } else {
                return Err(MBusError::Other(
                    "non-ASCII variable length data not supported".into(),
                ));
            }
        }
        0x0E => MBusRecordValue::Numeric(mbus_data_bcd_decode(&record.data[..6]) as f64),
        0x0F => MBusRecordValue::String(mbus_data_bin_decode(&record.data)),
        code => return Err(MBusError::UnknownDif(code)),
    };

    Ok(value)
}

/// Produces the normalized form of a raw record: typed value, SI-oriented
/// unit, quantity name, function classifier and the storage/tariff/device
/// counters accumulated from the DIFE chain.
pub fn mbus_data_record_normalize(record: &MBusDataRecord) -> Result<MBusRecord, MBusError> {
    let mut out = MBusRecord {
        timestamp: record.timestamp,
        storage_number: mbus_data_record_storage_number(&record.drh.dib),
        tariff: mbus_data_record_tariff(&record.drh.dib),
        device: mbus_data_record_device(&record.drh.dib),
        is_numeric: true,
        value: MBusRecordValue::Numeric(0.0),
        unit: String::new(),
        function_medium: String::new(),
        quantity: String::new(),
    };

    if record.is_special_function() {
        out.function_medium = if record.drh.dib.dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW {
            "More records follow"
        } else {
            "Manufacturer specific"
        }
        .to_string();

        out.is_numeric = false;
        out.value = MBusRecordValue::String(mbus_data_bin_decode(&record.data));
        return Ok(out);
    }

    out.function_medium = mbus_data_record_function(record.drh.dib.dif).to_string();

    match mbus_data_record_value_decode(record)? {
        MBusRecordValue::Numeric(raw) => {
            let normalized = normalize_vib(&record.drh.vib, raw)?;
            out.unit = normalized.unit;
            out.quantity = normalized.quantity;
            out.value = MBusRecordValue::Numeric(normalized.value);
        }
        MBusRecordValue::String(s) => {
            // dates and strings keep their text form, but still carry the
            // unit and quantity of the VIB
            let normalized = normalize_vib(&record.drh.vib, 0.0)?;
            out.unit = normalized.unit;
            out.quantity = normalized.quantity;
            out.is_numeric = false;
            out.value = MBusRecordValue::String(s);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(data: &[u8]) -> MBusDataRecord {
        let (records, _) = mbus_data_records_parse(data, Utc::now()).unwrap();
        assert_eq!(records.len(), 1);
        records.into_iter().next().unwrap()
    }

    #[test]
    fn test_dif_datalength_lookup_all_cases() {
        let expected = [0, 1, 2, 3, 4, 4, 6, 8, 0, 1, 2, 3, 4, 0, 6, 8];
        for (dif, expected) in expected.iter().enumerate() {
            assert_eq!(mbus_dif_datalength_lookup(dif as u8), *expected);
        }
    }

    #[test]
    fn test_lvar_translation() {
        assert_eq!(mbus_variable_data_length(0x05).unwrap(), 5);
        assert_eq!(mbus_variable_data_length(0xBF).unwrap(), 191);
        assert_eq!(mbus_variable_data_length(0xC4).unwrap(), 8);
        assert_eq!(mbus_variable_data_length(0xD4).unwrap(), 8);
        assert_eq!(mbus_variable_data_length(0xE9).unwrap(), 9);
        assert_eq!(mbus_variable_data_length(0xFA).unwrap(), 10);
        assert!(mbus_variable_data_length(0xFB).is_err());
        assert!(mbus_variable_data_length(0xFF).is_err());
    }

    #[test]
    fn test_parse_single_int16_record() {
        // DIF 0x02 (16 bit int), VIF 0x01 (energy, 10 mWh), value 1
        let record = parse_one(&[0x02, 0x01, 0x01, 0x00]);
        assert_eq!(record.drh.dib.dif, 0x02);
        assert_eq!(record.drh.vib.vif, 0x01);
        assert_eq!(record.data, vec![0x01, 0x00]);

        let normalized = mbus_data_record_normalize(&record).unwrap();
        assert_eq!(normalized.quantity, "Energy");
        assert_eq!(normalized.unit, "Wh");
        assert!(matches!(normalized.value, MBusRecordValue::Numeric(v) if (v - 0.01).abs() < 1e-12));
        assert_eq!(normalized.storage_number, 0);
        assert_eq!(normalized.tariff, -1);
        assert_eq!(normalized.device, -1);
    }

    #[test]
    fn test_dife_counters() {
        // DIF 0xC2: storage bit set, extension; DIFE 0x51: storage 1, tariff 1,
        // device 1
        let record = parse_one(&[0xC2, 0x51, 0x13, 0x00, 0x00]);
        assert_eq!(record.drh.dib.ndife, 1);
        assert_eq!(mbus_data_record_storage_number(&record.drh.dib), 0b11);
        assert_eq!(mbus_data_record_tariff(&record.drh.dib), 1);
        assert_eq!(mbus_data_record_device(&record.drh.dib), 1);
    }

    #[test]
    fn test_filler_skipped_and_lengths_conserved() {
        let data = [
            0x2F, 0x2F, // filler
            0x02, 0x01, 0x2A, 0x00, // int16 record
            0x0C, 0x13, 0x27, 0x04, 0x85, 0x02, // 8 digit BCD volume
        ];
        let (records, more) = mbus_data_records_parse(&data, Utc::now()).unwrap();
        assert!(!more);
        assert_eq!(records.len(), 2);

        // the walk accounts for every non-filler byte
        let consumed: usize = records
            .iter()
            .map(|r| 1 + r.drh.dib.ndife + 1 + r.drh.vib.nvife + r.data_len())
            .sum();
        assert_eq!(consumed, data.len() - 2);
    }

    #[test]
    fn test_more_records_follow_consumes_rest() {
        let data = [0x02, 0x01, 0x2A, 0x00, 0x1F, 0xAA, 0xBB];
        let (records, more) = mbus_data_records_parse(&data, Utc::now()).unwrap();
        assert!(more);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].data, vec![0xAA, 0xBB]);

        let normalized = mbus_data_record_normalize(&records[1]).unwrap();
        assert_eq!(normalized.function_medium, "More records follow");
        assert_eq!(normalized.value, MBusRecordValue::String("AA BB".into()));
    }

    #[test]
    fn test_custom_vif_record() {
        // DIF 0x01, VIF 0x7C, length 3, "RH%" reversed on the wire, value 55
        let record = parse_one(&[0x01, 0x7C, 0x03, b'%', b'H', b'R', 0x37]);
        assert_eq!(record.drh.vib.custom_vif, "RH%");

        let normalized = mbus_data_record_normalize(&record).unwrap();
        assert_eq!(normalized.unit, "-");
        assert_eq!(normalized.quantity, "RH%");
        assert!(matches!(normalized.value, MBusRecordValue::Numeric(v) if v == 55.0));
    }

    #[test]
    fn test_lvar_string_record() {
        // DIF 0x0D, VIF 0x78 (fabrication no), LVAR 4, "A123" reversed
        let record = parse_one(&[0x0D, 0x78, 0x04, b'3', b'2', b'1', b'A']);
        let normalized = mbus_data_record_normalize(&record).unwrap();
        assert!(!normalized.is_numeric);
        assert_eq!(normalized.value, MBusRecordValue::String("A123".into()));
        assert_eq!(normalized.quantity, "Fabrication No");
    }

    #[test]
    fn test_type_g_date_record() {
        // DIF 0x02 with VIF 0x6C: type G date 2000-01-01
        let record = parse_one(&[0x02, 0x6C, 0x01, 0x01]);
        let normalized = mbus_data_record_normalize(&record).unwrap();
        assert_eq!(normalized.value, MBusRecordValue::String("2000-01-01".into()));
        assert_eq!(normalized.quantity, "Time point (date)");
    }

    #[test]
    fn test_type_f_datetime_record() {
        let record = parse_one(&[0x04, 0x6D, 0x00, 0x20, 0x01, 0x01]);
        let normalized = mbus_data_record_normalize(&record).unwrap();
        assert_eq!(
            normalized.value,
            MBusRecordValue::String("2000-01-01T00:00:00Z".into())
        );
    }

    #[test]
    fn test_truncated_record_rejected() {
        let data = [0x04, 0x13, 0x01, 0x02]; // 32 bit int with 2 data bytes
        assert!(matches!(
            mbus_data_records_parse(&data, Utc::now()),
            Err(MBusError::PrematureEndAtData)
        ));
    }

    #[test]
    fn test_negative_bcd_record() {
        // 8 digit BCD with sign nibble in the MSB
        let record = parse_one(&[0x0C, 0x13, 0x42, 0x00, 0x00, 0xF0]);
        let normalized = mbus_data_record_normalize(&record).unwrap();
        assert!(matches!(normalized.value, MBusRecordValue::Numeric(v) if v < 0.0));
    }
}
