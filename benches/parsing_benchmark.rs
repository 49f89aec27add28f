use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mbus_master::mbus::frame::{pack_frame, parse_frame, MBusFrame, MBusFrameType};
use mbus_master::payload::data::mbus_data_variable_parse;
use mbus_master::payload::record::{mbus_data_record_normalize, mbus_data_records_parse};

fn sample_long_frame() -> Vec<u8> {
    let mut frame = MBusFrame::new(MBusFrameType::Long);
    frame.control = 0x08;
    frame.address = 0x01;
    frame.control_information = 0x72;
    frame.data = vec![
        0x78, 0x56, 0x34, 0x12, 0x77, 0x04, 0x0A, 0x07, 0x01, 0x00, 0x00, 0x00, // header
        0x0C, 0x06, 0x27, 0x04, 0x85, 0x02, // energy, 8 digit BCD
        0x0A, 0x5A, 0x91, 0x05, // flow temperature
        0x0A, 0x5E, 0x80, 0x04, // return temperature
        0x02, 0x2B, 0x2C, 0x01, // power, 16 bit int
    ];
    frame.update_checksum();
    pack_frame(&frame).to_vec()
}

fn benchmark_frame_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_parsing");

    let ack = vec![0xE5u8];
    group.bench_function("ack_frame", |b| {
        b.iter(|| parse_frame(black_box(&ack)))
    });

    let short = vec![0x10, 0x5B, 0x01, 0x5C, 0x16];
    group.bench_function("short_frame", |b| {
        b.iter(|| parse_frame(black_box(&short)))
    });

    let long = sample_long_frame();
    group.bench_function("long_frame", |b| {
        b.iter(|| parse_frame(black_box(&long)))
    });

    group.finish();
}

fn benchmark_record_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_decoding");
    let bytes = sample_long_frame();
    let frame = match parse_frame(&bytes).unwrap() {
        mbus_master::mbus::frame::FrameParseOutcome::Complete { frame, .. } => frame,
        _ => unreachable!(),
    };

    group.bench_function("variable_payload", |b| {
        b.iter(|| mbus_data_variable_parse(black_box(&frame)))
    });

    let epoch = Utc.timestamp_opt(0, 0).unwrap();
    let (records, _) = mbus_data_records_parse(&frame.data[12..], epoch).unwrap();
    group.bench_function("normalize_records", |b| {
        b.iter(|| {
            for record in &records {
                let _ = mbus_data_record_normalize(black_box(record));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_frame_parsing, benchmark_record_decoding);
criterion_main!(benches);
