//! M-Bus protocol constants, based on the EN 13757 standard.

// ----------------------------------------------------------------------------
// Frame geometry
// ----------------------------------------------------------------------------

/// Single-byte acknowledgement frame.
pub const MBUS_FRAME_ACK_START: u8 = 0xE5;
/// Start byte of a short frame.
pub const MBUS_FRAME_SHORT_START: u8 = 0x10;
/// Start byte (both positions) of a control or long frame.
pub const MBUS_FRAME_CONTROL_START: u8 = 0x68;
/// Stop byte of every multi-byte frame.
pub const MBUS_FRAME_STOP: u8 = 0x16;

pub const MBUS_FRAME_BASE_SIZE_SHORT: usize = 5;
pub const MBUS_FRAME_BASE_SIZE_CONTROL: usize = 9;
/// Fixed overhead of a control/long frame: start, L, L, start, checksum, stop.
pub const MBUS_FRAME_FIXED_SIZE_LONG: usize = 6;
/// Maximum user data of a long frame (L field covers C + A + CI + data).
pub const MBUS_FRAME_DATA_LENGTH: usize = 252;

// ----------------------------------------------------------------------------
// Control field
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_MASK_SND_NKE: u8 = 0x40;
pub const MBUS_CONTROL_MASK_SND_UD: u8 = 0x53;
pub const MBUS_CONTROL_MASK_REQ_UD1: u8 = 0x5A;
pub const MBUS_CONTROL_MASK_REQ_UD2: u8 = 0x5B;
pub const MBUS_CONTROL_MASK_RSP_UD: u8 = 0x08;

pub const MBUS_CONTROL_MASK_FCB: u8 = 0x20;
pub const MBUS_CONTROL_MASK_FCV: u8 = 0x10;
/// Access demand, set by the slave in RSP_UD.
pub const MBUS_CONTROL_MASK_ACD: u8 = 0x20;
/// Data flow control, set by the slave in RSP_UD.
pub const MBUS_CONTROL_MASK_DFC: u8 = 0x10;

pub const MBUS_CONTROL_MASK_DIR: u8 = 0x40;
pub const MBUS_CONTROL_MASK_DIR_M2S: u8 = 0x40;
pub const MBUS_CONTROL_MASK_DIR_S2M: u8 = 0x00;

// ----------------------------------------------------------------------------
// Addresses
// ----------------------------------------------------------------------------

pub const MBUS_MAX_PRIMARY_SLAVES: u8 = 250;
/// Network layer address used for secondary addressing.
pub const MBUS_ADDRESS_NETWORK_LAYER: u8 = 0xFD;
pub const MBUS_ADDRESS_BROADCAST_REPLY: u8 = 0xFE;
pub const MBUS_ADDRESS_BROADCAST_NOREPLY: u8 = 0xFF;

// ----------------------------------------------------------------------------
// Control information (CI) codes
// ----------------------------------------------------------------------------

pub const MBUS_CONTROL_INFO_APPLICATION_RESET: u8 = 0x50;
pub const MBUS_CONTROL_INFO_DATA_SEND: u8 = 0x51;
pub const MBUS_CONTROL_INFO_SELECT_SLAVE: u8 = 0x52;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_300: u8 = 0xB8;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_600: u8 = 0xB9;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_1200: u8 = 0xBA;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_2400: u8 = 0xBB;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_4800: u8 = 0xBC;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_9600: u8 = 0xBD;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_19200: u8 = 0xBE;
pub const MBUS_CONTROL_INFO_SET_BAUDRATE_38400: u8 = 0xBF;
pub const MBUS_CONTROL_INFO_ERROR_GENERAL: u8 = 0x70;
pub const MBUS_CONTROL_INFO_RESP_VARIABLE: u8 = 0x72;
pub const MBUS_CONTROL_INFO_RESP_FIXED: u8 = 0x73;

// ----------------------------------------------------------------------------
// Data information block
// ----------------------------------------------------------------------------

pub const MBUS_DATA_RECORD_DIF_MASK_DATA: u8 = 0x0F;
pub const MBUS_DATA_RECORD_DIF_MASK_FUNCTION: u8 = 0x30;
pub const MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO: u8 = 0x40;
pub const MBUS_DATA_RECORD_DIF_MASK_EXTENSION: u8 = 0x80;

/// DIFE bit 0 extends the storage number by one bit per extension byte.
pub const MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO: u8 = 0x01;
/// DIFE bits 4-5 extend the tariff by two bits per extension byte.
pub const MBUS_DATA_RECORD_DIFE_MASK_TARIFF: u8 = 0x30;
/// DIFE bit 6 extends the device (subunit) by one bit per extension byte.
pub const MBUS_DATA_RECORD_DIFE_MASK_DEVICE: u8 = 0x40;

pub const MBUS_DIB_DIF_EXTENSION_BIT: u8 = 0x80;
pub const MBUS_DIB_DIF_IDLE_FILLER: u8 = 0x2F;
pub const MBUS_DIB_DIF_MANUFACTURER_SPECIFIC: u8 = 0x0F;
pub const MBUS_DIB_DIF_MORE_RECORDS_FOLLOW: u8 = 0x1F;

pub const MBUS_DIB_VIF_EXTENSION_BIT: u8 = 0x80;
pub const MBUS_DIB_VIF_WITHOUT_EXTENSION: u8 = 0x7F;

/// Maximum number of DIFE / VIFE bytes per record.
pub const MBUS_MAX_DIFE: usize = 10;
pub const MBUS_MAX_VIFE: usize = 10;

/// Maximum payload of a single data record.
pub const MBUS_DATA_RECORD_MAX_SIZE: usize = 234;
/// Maximum length of a plain-text (custom) VIF unit string.
pub const MBUS_CUSTOM_VIF_MAX_SIZE: usize = 127;

// ----------------------------------------------------------------------------
// Fixed data structure
// ----------------------------------------------------------------------------

pub const MBUS_DATA_VARIABLE_HEADER_LENGTH: usize = 12;
pub const MBUS_DATA_FIXED_LENGTH: usize = 16;

pub const MBUS_DATA_FIXED_STATUS_FORMAT_MASK: u8 = 0x80;
pub const MBUS_DATA_FIXED_STATUS_FORMAT_BCD: u8 = 0x00;
pub const MBUS_DATA_FIXED_STATUS_FORMAT_INT: u8 = 0x80;
pub const MBUS_DATA_FIXED_STATUS_DATE_MASK: u8 = 0x40;
pub const MBUS_DATA_FIXED_STATUS_DATE_STORED: u8 = 0x40;

// ----------------------------------------------------------------------------
// Variable data mediums
// ----------------------------------------------------------------------------

pub const MBUS_VARIABLE_DATA_MEDIUM_OTHER: u8 = 0x00;
pub const MBUS_VARIABLE_DATA_MEDIUM_OIL: u8 = 0x01;
pub const MBUS_VARIABLE_DATA_MEDIUM_ELECTRICITY: u8 = 0x02;
pub const MBUS_VARIABLE_DATA_MEDIUM_GAS: u8 = 0x03;
pub const MBUS_VARIABLE_DATA_MEDIUM_HEAT_OUT: u8 = 0x04;
pub const MBUS_VARIABLE_DATA_MEDIUM_STEAM: u8 = 0x05;
pub const MBUS_VARIABLE_DATA_MEDIUM_HOT_WATER: u8 = 0x06;
pub const MBUS_VARIABLE_DATA_MEDIUM_WATER: u8 = 0x07;
pub const MBUS_VARIABLE_DATA_MEDIUM_HEAT_COST: u8 = 0x08;
pub const MBUS_VARIABLE_DATA_MEDIUM_COMPR_AIR: u8 = 0x09;
pub const MBUS_VARIABLE_DATA_MEDIUM_COOL_OUT: u8 = 0x0A;
pub const MBUS_VARIABLE_DATA_MEDIUM_COOL_IN: u8 = 0x0B;
pub const MBUS_VARIABLE_DATA_MEDIUM_HEAT_IN: u8 = 0x0C;
pub const MBUS_VARIABLE_DATA_MEDIUM_HEAT_COOL: u8 = 0x0D;
pub const MBUS_VARIABLE_DATA_MEDIUM_BUS: u8 = 0x0E;
pub const MBUS_VARIABLE_DATA_MEDIUM_UNKNOWN: u8 = 0x0F;
pub const MBUS_VARIABLE_DATA_MEDIUM_COLD_WATER: u8 = 0x16;
pub const MBUS_VARIABLE_DATA_MEDIUM_DUAL_WATER: u8 = 0x17;
pub const MBUS_VARIABLE_DATA_MEDIUM_PRESSURE: u8 = 0x18;
pub const MBUS_VARIABLE_DATA_MEDIUM_ADC: u8 = 0x19;
