//! Test-only filter producer. The library only decodes.
#![allow(dead_code)]

/// Golomb-code ascending `values` with Rice parameter `log_p`, remainder
/// bits MSB first, zero padded to a whole byte.
pub fn gcs_encode(values: &[u64], log_p: u8) -> Vec<u8> {
    let mut bits = Vec::new();
    let mut previous = 0u64;
    for &v in values {
        let delta = v - previous;
        previous = v;
        for _ in 0..(delta >> log_p) {
            bits.push(false);
        }
        bits.push(true);
        for i in (0..log_p).rev() {
            bits.push((delta >> i) & 1 == 1);
        }
    }
    pack_bits(&bits)
}

pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut byte = 0u8;
    let mut used = 0u8;
    for &b in bits {
        byte = (byte << 1) | b as u8;
        used += 1;
        if used == 8 {
            out.push(byte);
            byte = 0;
            used = 0;
        }
    }
    if used > 0 {
        byte <<= 8 - used;
        out.push(byte);
    }
    out
}

pub fn issuer(n: u8) -> [u8; 20] {
    let mut id = [0u8; 20];
    id[0] = n;
    id[19] = n.wrapping_mul(31);
    id
}

/// Serialize a whole filter from raw payloads.
pub fn filter_bytes(version: u32, log_p: u8, records: &[([u8; 20], Vec<u8>)]) -> Vec<u8> {
    let mut out = version.to_le_bytes().to_vec();
    out.push(log_p);
    for (id, payload) in records {
        out.extend_from_slice(id);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
    }
    out
}

/// Serialize a filter from per-issuer value sets.
pub fn encode_filter(version: u32, log_p: u8, sets: &[([u8; 20], Vec<u64>)]) -> Vec<u8> {
    let records: Vec<_> = sets
        .iter()
        .map(|(id, values)| (*id, gcs_encode(values, log_p)))
        .collect();
    filter_bytes(version, log_p, &records)
}

/// Split `data` at the given cut points (any order, out of range ignored).
pub fn split_at_points<'a>(data: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = cuts.iter().copied().filter(|&c| c <= data.len()).collect();
    points.sort_unstable();
    points.dedup();
    let mut chunks = Vec::new();
    let mut start = 0;
    for p in points {
        chunks.push(&data[start..p]);
        start = p;
    }
    chunks.push(&data[start..]);
    chunks
}
