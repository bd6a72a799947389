#![allow(dead_code, reason = "not every test binary uses every helper")]
#![allow(unused_crate_dependencies, reason = "these are tests, not the main crate")]

use std::num::NonZeroU8;

use anchored_listfile::{CompressMethod, Corruption, ListReader, ListWriter, WriterOptions};


pub const BLOCK_SIZE: usize = 65536;

/// 64 KiB blocks, no compression.
pub fn plain_options() -> WriterOptions {
    WriterOptions {
        use_compression: false,
        ..WriterOptions::default()
    }
}

pub fn lz4_options() -> WriterOptions {
    WriterOptions {
        use_compression: true,
        compress_method: CompressMethod::Lz4,
        ..WriterOptions::default()
    }
}

pub fn zlib_options() -> WriterOptions {
    WriterOptions {
        use_compression: true,
        compress_method: CompressMethod::Zlib,
        compress_level:  6,
        ..WriterOptions::default()
    }
}

pub fn with_multiplier(mut options: WriterOptions, multiplier: u8) -> WriterOptions {
    options.block_size_multiplier = NonZeroU8::new(multiplier).unwrap();
    options
}

/// Write `records` (with optional metadata) to an in-memory file.
pub fn write_to_vec(
    options: WriterOptions,
    meta:    &[(&str, &[u8])],
    records: &[Vec<u8>],
) -> Vec<u8> {
    let mut file = Vec::new();

    let mut writer = ListWriter::new(&mut file, options);
    for (key, value) in meta {
        writer.add_meta(*key, *value).unwrap();
    }
    writer.init().unwrap();
    for record in records {
        writer.add_record(record).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    file
}

/// Read every record of an in-memory file, panicking on any reported corruption.
pub fn read_all(file: &[u8]) -> Vec<Vec<u8>> {
    let reader = ListReader::with_reporter(
        file,
        true,
        |bytes_dropped: usize, cause: Corruption| {
            panic!("unexpected corruption ({bytes_dropped} bytes dropped): {cause}");
        },
    );
    collect_records(reader)
}

/// Read every record, collecting corruption events instead of failing on them.
pub fn read_all_lossy(file: &[u8]) -> (Vec<Vec<u8>>, Vec<(usize, String)>) {
    use std::{cell::RefCell, rc::Rc};

    let events = Rc::new(RefCell::new(Vec::new()));
    let events_in_reporter = Rc::clone(&events);

    let reader = ListReader::with_reporter(
        file,
        true,
        move |bytes_dropped: usize, cause: Corruption| {
            events_in_reporter.borrow_mut().push((bytes_dropped, format!("{cause}")));
        },
    );
    let records = collect_records(reader);

    let events = Rc::try_unwrap(events).unwrap().into_inner();
    (records, events)
}

pub fn collect_records(mut reader: ListReader<'_, &[u8]>) -> Vec<Vec<u8>> {
    let mut scratch = Vec::new();
    let mut records = Vec::new();

    while let Some(record) = reader.read_record(&mut scratch) {
        records.push(record.to_vec());
    }
    records
}

/// Deterministic pseudorandom bytes, compressible enough to exercise both the
/// kept-compressed and fallback block paths depending on `spread`.
pub fn patterned_record(rng: &mut oorandom::Rand32, len: usize, spread: u32) -> Vec<u8> {
    (0..len)
        .map(|_| u8::try_from(rng.rand_range(0..spread.max(1)) % 256).unwrap())
        .collect()
}
