use crlfilter::decode_gcs;
use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Some((&log_p, payload)) = data.split_first() else {
                return;
            };
            if let Ok(set) = decode_gcs(payload, log_p % 64) {
                assert!(set.as_slice().windows(2).all(|w| w[0] <= w[1]));
            }
        });
    }
}
