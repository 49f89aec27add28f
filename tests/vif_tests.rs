//! Tests for the VIF/VIFE normalization tables.

use mbus_master::payload::record::MBusValueInformationBlock;
use mbus_master::payload::vif::{mbus_vif_unit_normalize, normalize_vib};
use mbus_master::payload::vif_maps::{vif_lookup, FIXED_TABLE, VIF_TABLE};

fn vib(vif: u8, vife: &[u8]) -> MBusValueInformationBlock {
    let mut out = MBusValueInformationBlock::default();
    out.vif = vif;
    out.nvife = vife.len();
    out.vife[..vife.len()].copy_from_slice(vife);
    out
}

#[test]
fn test_every_table_entry_normalizes() {
    for entry in VIF_TABLE {
        let normalized = mbus_vif_unit_normalize(entry.vif, 1.0)
            .unwrap_or_else(|e| panic!("code 0x{:03X}: {e}", entry.vif));
        assert_eq!(normalized.unit, entry.unit);
        assert_eq!(normalized.quantity, entry.quantity);
    }
}

#[test]
fn test_exponent_application_is_exact() {
    // for power-of-ten exponents the ratio must be exact
    for entry in VIF_TABLE {
        if entry.exponent == 0.0 {
            continue;
        }
        let exp10 = entry.exponent.log10();
        if exp10.fract() != 0.0 || exp10.abs() > 9.0 {
            continue;
        }
        let normalized = mbus_vif_unit_normalize(entry.vif, 1.0).unwrap();
        let ratio = normalized.value / entry.exponent;
        assert_eq!(ratio, 1.0, "code 0x{:03X}", entry.vif);
    }
}

#[test]
fn test_primary_lookup_ignores_extension_bit() {
    let plain = vif_lookup(0x13).unwrap();
    let extended = vif_lookup(0x93).unwrap();
    assert_eq!(plain.vif, extended.vif);
}

#[test]
fn test_energy_scale_ladder() {
    // VIF 0x00..0x07: energy 10^(n-3) Wh
    for n in 0u16..8 {
        let normalized = mbus_vif_unit_normalize(n, 1.0).unwrap();
        assert_eq!(normalized.unit, "Wh");
        let expected = 10f64.powi(n as i32 - 3);
        assert_eq!(normalized.value, expected);
    }
}

#[test]
fn test_volume_and_temperature_units() {
    assert_eq!(mbus_vif_unit_normalize(0x13, 1.0).unwrap().unit, "m^3");
    assert_eq!(
        mbus_vif_unit_normalize(0x5B, 1.0).unwrap().quantity,
        "Flow temperature"
    );
    assert_eq!(mbus_vif_unit_normalize(0x5B, 1.0).unwrap().unit, "°C");
}

#[test]
fn test_extension_namespaces_are_distinct() {
    // 0x00 means energy in the primary table, credit under 0xFD and
    // large-scale energy under 0xFB
    assert_eq!(vif_lookup(0x000).unwrap().quantity, "Energy");
    assert_eq!(vif_lookup(0x100).unwrap().quantity, "Credit");
    assert_eq!(vif_lookup(0x200).unwrap().quantity, "Energy");
    assert_eq!(vif_lookup(0x200).unwrap().exponent, 1.0e5);
}

#[test]
fn test_fd_extension_through_vib() {
    let n = normalize_vib(&vib(0xFD, &[0x17]), 0x42 as f64).unwrap();
    assert_eq!(n.quantity, "Error flags");

    let n = normalize_vib(&vib(0xFD, &[0x5C]), 13.0).unwrap();
    assert_eq!(n.unit, "A");
    assert_eq!(n.value, 13.0);
}

#[test]
fn test_unknown_codes_rejected() {
    // plain-text VIF (0x7C) resolves outside the table
    assert!(vif_lookup(0x7C).is_none());
    assert!(vif_lookup(0x300).is_none());
    assert!(mbus_vif_unit_normalize(0x37B, 1.0).is_err());
}

#[test]
fn test_fixed_table_covers_counter_codes() {
    for entry in FIXED_TABLE {
        assert!(entry.vif >= 0x02 && entry.vif <= 0x3F);
    }
}

#[test]
fn test_vife_corrections() {
    // multiplicative 10^(n-6)
    let n = normalize_vib(&vib(0x83, &[0x70]), 5.0).unwrap();
    assert!((n.value - 5.0e-6).abs() < 1e-18);

    // fixed factor 10^3
    let n = normalize_vib(&vib(0x83, &[0x7D]), 5.0).unwrap();
    assert_eq!(n.value, 5000.0);

    // additive 10^(n-3)
    let n = normalize_vib(&vib(0x83, &[0x78]), 5.0).unwrap();
    assert!((n.value - 5.001).abs() < 1e-12);
}
