use crlfilter::{scan_chunks, Config, CrlFilter};
use honggfuzz::fuzz;

// First byte picks the chunk size; the rest is the filter.
fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Some((&size, filter)) = data.split_first() else {
                return;
            };
            let size = size as usize + 1;
            let config = Config::default();
            let streamed = scan_chunks(filter.chunks(size), &config);
            let materialized = CrlFilter::from_bytes(filter, &config);
            assert_eq!(streamed.is_ok(), materialized.is_ok());
            if let (Ok((records, _)), Ok(filter)) = (streamed, materialized) {
                assert_eq!(records.len(), filter.len());
            }
        });
    }
}
