#![allow(unused_crate_dependencies, reason = "these are tests, not the main crate")]

mod common;

use anchored_listfile::{
    Error, ListReader, ListWriter, MetaMap, UsageError, WriterOptions,
};

use self::common::{
    BLOCK_SIZE, collect_records, lz4_options, patterned_record, plain_options, read_all,
    with_multiplier, write_to_vec, zlib_options,
};


// ================================
//  Scenarios
// ================================

#[test]
fn empty_file() {
    let mut file = Vec::new();

    let mut writer = ListWriter::new(&mut file, plain_options());
    writer.init().unwrap();
    writer.flush().unwrap();
    assert_eq!(writer.records_added(), 0);
    assert_eq!(writer.bytes_added(), 0);
    drop(writer);

    let mut reader = ListReader::new(file.as_slice(), true);
    let mut scratch = Vec::new();
    assert_eq!(reader.read_record(&mut scratch), None);
    assert_eq!(reader.read_header_bytes(), 0);
    assert_eq!(reader.read_data_bytes(), 0);
}

#[test]
fn single_record() {
    let mut file = Vec::new();

    let mut writer = ListWriter::new(&mut file, plain_options());
    writer.init().unwrap();
    writer.add_record(b"hello").unwrap();
    writer.flush().unwrap();
    assert_eq!(writer.records_added(), 1);
    assert_eq!(writer.bytes_added(), 5);
    drop(writer);

    assert_eq!(read_all(&file), [b"hello".to_vec()]);
}

/// Three small records become exactly one physical array record, with the packed
/// payload `03 01 'a' 01 'b' 01 'c'`.
#[test]
fn small_records_pack_into_one_array_record() {
    let records = [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    let file = write_to_vec(plain_options(), &[], &records);

    // 10-byte header, then a single physical record: 7 bytes of framing plus the
    // 7-byte packed payload.
    assert_eq!(file.len(), 10 + 7 + 7);
    let record_len = u16::from_le_bytes([file[14], file[15]]);
    assert_eq!(record_len, 7);
    let record_type = file[16];
    assert_eq!(record_type, 5);
    assert_eq!(&file[17..], &[3, 1, b'a', 1, b'b', 1, b'c']);

    assert_eq!(read_all(&file), records);
}

/// A record one hundred bytes longer than a block fragments into First (payload
/// `B - 7`) and Last (payload 107) physical records.
#[test]
fn oversized_record_fragments_across_blocks() {
    let mut rng = oorandom::Rand32::new(4);
    let record = patterned_record(&mut rng, BLOCK_SIZE + 100, 256);
    let file = write_to_vec(plain_options(), &[], std::slice::from_ref(&record));

    // First block is full: 7 + 65529 payload bytes. The Last fragment follows in the
    // second block.
    assert_eq!(file.len(), 10 + BLOCK_SIZE + 7 + 107);
    let first_len = u16::from_le_bytes([file[14], file[15]]);
    assert_eq!(usize::from(first_len), BLOCK_SIZE - 7);
    assert_eq!(file[16], 2, "expected a First record");
    let last_header = 10 + BLOCK_SIZE;
    assert_eq!(file[last_header + 6], 4, "expected a Last record");

    assert_eq!(read_all(&file), [record]);
}

#[test]
fn metadata_round_trips() {
    let meta: &[(&str, &[u8])] = &[("owner", b"alice"), ("schema", b"v2")];
    let file = write_to_vec(plain_options(), meta, &[b"data".to_vec()]);

    let mut reader = ListReader::new(file.as_slice(), true);
    let recovered = reader.metadata().unwrap();
    let expected = MetaMap::from([
        ("owner".to_owned(), b"alice".to_vec()),
        ("schema".to_owned(), b"v2".to_vec()),
    ]);
    assert_eq!(*recovered, expected);

    let mut scratch = Vec::new();
    assert_eq!(reader.read_record(&mut scratch), Some(&b"data"[..]));
    assert_eq!(reader.read_record(&mut scratch), None);
}

// ================================
//  Round-trip properties
// ================================

/// Lengths straddling every interesting boundary: empty, header-sized, one byte less
/// than the block's record capacity, exactly at it, just past it, and multiples of the
/// block size.
#[test]
fn block_boundary_lengths_round_trip() {
    let lengths = [
        0,
        1,
        7,
        BLOCK_SIZE - 7,
        BLOCK_SIZE - 6,
        BLOCK_SIZE,
        BLOCK_SIZE + 1,
        3 * BLOCK_SIZE,
        10 * BLOCK_SIZE,
    ];

    let mut rng = oorandom::Rand32::new(17);
    let records: Vec<Vec<u8>> = lengths
        .iter()
        .map(|&len| patterned_record(&mut rng, len, 256))
        .collect();

    for options in [plain_options(), lz4_options()] {
        let file = write_to_vec(options, &[], &records);
        assert_eq!(read_all(&file), records);
    }
}

#[test]
fn randomized_records_round_trip() {
    let mut rng = oorandom::Rand32::new(99);

    let mut records = Vec::new();
    for _ in 0..400 {
        let len = match rng.rand_range(0..10) {
            0..=5 => rng.rand_range(0..64),
            6..=8 => rng.rand_range(64..4096),
            _     => rng.rand_range(4096..3 * BLOCK_SIZE as u32),
        };
        records.push(patterned_record(&mut rng, len as usize, 256));
    }

    for options in [plain_options(), lz4_options(), zlib_options()] {
        let file = write_to_vec(options, &[], &records);
        assert_eq!(read_all(&file), records);
    }
}

/// Reading a compressed file yields the same records as reading an uncompressed file
/// of the same input, for both compressible and incompressible payloads.
#[test]
fn compression_equivalence() {
    let mut rng = oorandom::Rand32::new(7);

    // `spread` 4 compresses well (blocks stay compressed); 256 usually does not
    // (blocks fall back to raw even with compression enabled).
    for spread in [4, 256] {
        let records: Vec<Vec<u8>> = (0..80)
            .map(|_| {
                let len = rng.rand_range(1..40_000) as usize;
                patterned_record(&mut rng, len, spread)
            })
            .collect();

        let baseline = read_all(&write_to_vec(plain_options(), &[], &records));
        assert_eq!(baseline, records);

        for options in [lz4_options(), zlib_options()] {
            let file = write_to_vec(options, &[], &records);
            assert_eq!(read_all(&file), records);
        }
    }
}

#[test]
fn compression_saves_bytes_on_compressible_blocks() {
    let mut file = Vec::new();
    let mut writer = ListWriter::new(&mut file, lz4_options());
    writer.init().unwrap();

    // Three blocks of highly compressible data.
    let record = vec![42_u8; 8192];
    for _ in 0..((3 * BLOCK_SIZE) / record.len()) {
        writer.add_record(&record).unwrap();
    }
    writer.flush().unwrap();

    assert!(writer.compression_savings() > 0);
    drop(writer);

    let records = read_all(&file);
    assert!(records.iter().all(|rec| rec == &vec![42_u8; 8192]));
}

#[test]
fn larger_block_multiplier_round_trips() {
    let mut rng = oorandom::Rand32::new(23);
    let records: Vec<Vec<u8>> = (0..40)
        .map(|_| {
            let len = rng.rand_range(0..200_000) as usize;
            patterned_record(&mut rng, len, 8)
        })
        .collect();

    for options in [with_multiplier(plain_options(), 3), with_multiplier(lz4_options(), 3)] {
        let file = write_to_vec(options, &[], &records);
        assert_eq!(read_all(&file), records);
    }
}

#[test]
fn counter_law() {
    let mut rng = oorandom::Rand32::new(31);
    let records: Vec<Vec<u8>> = (0..100)
        .map(|_| {
            let len = rng.rand_range(0..5000) as usize;
            patterned_record(&mut rng, len, 256)
        })
        .collect();
    let total_len: u64 = records.iter().map(|rec| rec.len() as u64).sum();

    let mut file = Vec::new();
    let mut writer = ListWriter::new(&mut file, plain_options());
    writer.init().unwrap();
    for record in &records {
        writer.add_record(record).unwrap();
    }
    writer.flush().unwrap();

    assert_eq!(writer.records_added(), 100);
    assert_eq!(writer.bytes_added(), total_len);
    drop(writer);

    let mut reader = ListReader::new(file.as_slice(), true);
    let collected = collect_records(ListReader::new(file.as_slice(), true));
    assert_eq!(collected, records);

    let mut scratch = Vec::new();
    while reader.read_record(&mut scratch).is_some() {}
    assert_eq!(reader.read_data_bytes(), total_len);
    assert!(reader.read_header_bytes() > 0);
}

#[test]
fn many_tiny_records_round_trip() {
    let records: Vec<Vec<u8>> = (0_u32..40_000)
        .map(|n| n.to_le_bytes().to_vec())
        .collect();

    let file = write_to_vec(plain_options(), &[], &records);
    // Array packing must keep framing overhead well under 7 bytes per record.
    assert!(file.len() < records.len() * 11);
    assert_eq!(read_all(&file), records);
}

#[test]
fn reset_rewinds_to_first_record() {
    let records: Vec<Vec<u8>> = (0..10).map(|n| vec![n; 5000]).collect();
    let file = write_to_vec(plain_options(), &[], &records);

    let mut reader = ListReader::new(file.as_slice(), true);
    let mut scratch = Vec::new();
    while reader.read_record(&mut scratch).is_some() {}

    reader.reset();
    let mut rewound = Vec::new();
    while let Some(record) = reader.read_record(&mut scratch) {
        rewound.push(record.to_vec());
    }
    assert_eq!(rewound, records);
}

#[test]
fn records_iterator_yields_all() {
    let records: Vec<Vec<u8>> = (0..50).map(|n| vec![n; usize::from(n) * 10]).collect();
    let file = write_to_vec(lz4_options(), &[], &records);

    let mut iterated = Vec::new();
    let mut records_iter = ListReader::new(file.as_slice(), true).records();
    while let Some(record) = records_iter.next_record() {
        iterated.push(record.to_vec());
    }
    assert_eq!(iterated, records);
}

// ================================
//  Lifecycle misuse
// ================================

#[test]
fn lifecycle_violations_are_rejected() {
    let mut file = Vec::new();
    let mut writer = ListWriter::new(&mut file, plain_options());

    assert!(matches!(
        writer.add_record(b"too early"),
        Err(Error::InvalidUsage(UsageError::NotInitialized)),
    ));
    assert!(matches!(
        writer.flush(),
        Err(Error::InvalidUsage(UsageError::NotInitialized)),
    ));

    writer.add_meta("key", "value").unwrap();
    writer.init().unwrap();

    assert!(matches!(
        writer.add_meta("late", "value"),
        Err(Error::InvalidUsage(UsageError::MetaAfterInit)),
    ));
    assert!(matches!(
        writer.init(),
        Err(Error::InvalidUsage(UsageError::AlreadyInitialized)),
    ));

    writer.add_record(b"fine").unwrap();
    writer.flush().unwrap();

    assert!(matches!(
        writer.add_record(b"after flush"),
        Err(Error::InvalidUsage(UsageError::AlreadyFlushed)),
    ));
    assert!(matches!(
        writer.flush(),
        Err(Error::InvalidUsage(UsageError::AlreadyFlushed)),
    ));
}

#[test]
fn empty_meta_keys_are_rejected() {
    let mut file = Vec::new();
    let mut writer = ListWriter::new(&mut file, plain_options());

    assert!(matches!(writer.add_meta("", "value"), Err(Error::InvalidHeader(_))));
}

#[test]
fn unflushed_partial_block_is_lost() {
    let mut file = Vec::new();

    let mut writer = ListWriter::new(&mut file, plain_options());
    writer.init().unwrap();
    writer.add_record(b"doomed").unwrap();
    drop(writer);

    // Without `flush`, the buffered partial block never reached the sink.
    assert_eq!(read_all(&file), Vec::<Vec<u8>>::new());
}

#[test]
fn default_options() {
    let options = WriterOptions::default();
    assert_eq!(options.block_size_multiplier.get(), 1);
    assert!(options.use_compression);
    assert_eq!(options.block_size(), BLOCK_SIZE);
    assert!(!options.append);
}
