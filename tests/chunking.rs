mod common;

use common::{encode_filter, split_at_points};
use crlfilter::{scan_chunks, Config, CrlFilter, IssuerId, Record};
use proptest::prelude::*;

fn sample_filter() -> Vec<u8> {
    encode_filter(
        3,
        5,
        &[
            (common::issuer(1), vec![6, 108, 300]),
            (common::issuer(2), vec![]),
            (common::issuer(3), (0..500).map(|i| i * 17).collect()),
            (common::issuer(4), vec![1]),
        ],
    )
}

fn boundaries<P>(records: &[Record<P>]) -> Vec<(IssuerId, u32, u64)> {
    records
        .iter()
        .map(|r| (r.issuer, r.payload_length, r.offset))
        .collect()
}

fn materialized_boundaries(data: &[u8]) -> Vec<(IssuerId, u32, u64)> {
    let filter = CrlFilter::from_bytes(data, &Config::default()).unwrap();
    let mut offset = crlfilter::HEADER_LEN as u64;
    filter
        .issuers()
        .map(|id| {
            let len = filter.payload(id).unwrap().len() as u32;
            let entry = (*id, len, offset);
            offset += 24 + len as u64;
            entry
        })
        .collect()
}

#[test]
fn one_byte_chunks_match_whole_buffer() {
    let data = sample_filter();
    let config = Config::default();
    let (whole, whole_summary) = scan_chunks([data.as_slice()], &config).unwrap();
    let (bytes, bytes_summary) = scan_chunks(data.chunks(1), &config).unwrap();
    assert_eq!(whole, bytes);
    assert_eq!(whole_summary, bytes_summary);
    assert_eq!(whole_summary.bytes_consumed, data.len() as u64);
    assert_eq!(boundaries(&whole), materialized_boundaries(&data));
}

#[test]
fn every_fixed_chunk_size_agrees() {
    let data = sample_filter();
    let expected = materialized_boundaries(&data);
    for size in 1..=64 {
        let (records, summary) = scan_chunks(data.chunks(size), &Config::default()).unwrap();
        assert_eq!(boundaries(&records), expected, "chunk size {size}");
        assert_eq!(summary.records, expected.len() as u64);
    }
}

#[test]
fn first_chunk_shorter_than_header() {
    let data = sample_filter();
    let chunks = split_at_points(&data, &[1, 3, 4, 6, 25]);
    let (records, summary) = scan_chunks(chunks, &Config::default()).unwrap();
    assert_eq!(summary.header.version, 3);
    assert_eq!(summary.header.log_p, 5);
    assert_eq!(boundaries(&records), materialized_boundaries(&data));
}

proptest! {
    #[test]
    fn arbitrary_splits_agree(
        cuts in proptest::collection::vec(0usize..2000, 0..40),
    ) {
        let data = sample_filter();
        let (records, summary) =
            scan_chunks(split_at_points(&data, &cuts), &Config::default()).unwrap();
        prop_assert_eq!(boundaries(&records), materialized_boundaries(&data));
        prop_assert_eq!(summary.bytes_consumed, data.len() as u64);
    }

    #[test]
    fn random_filters_split_anywhere(
        log_p in 0u8..12,
        sets in proptest::collection::vec(
            proptest::collection::vec(0u64..4096, 0..40), 0..6),
        cuts in proptest::collection::vec(0usize..4096, 0..20),
    ) {
        let sets: Vec<([u8; 20], Vec<u64>)> = sets
            .into_iter()
            .enumerate()
            .map(|(i, mut v)| {
                v.sort_unstable();
                (common::issuer(i as u8), v)
            })
            .collect();
        let data = encode_filter(1, log_p, &sets);
        let (records, _) =
            scan_chunks(split_at_points(&data, &cuts), &Config::default()).unwrap();
        prop_assert_eq!(boundaries(&records), materialized_boundaries(&data));
        let filter = CrlFilter::from_bytes(&data, &Config::default()).unwrap();
        for (id, values) in &sets {
            let set = filter.decode(&IssuerId::new(*id)).unwrap().unwrap();
            prop_assert_eq!(set.as_slice(), values.as_slice());
        }
    }
}
