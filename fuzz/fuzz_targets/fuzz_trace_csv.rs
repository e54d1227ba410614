#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(rows) = sorter_config::read_trace(data) {
        assert!(rows.windows(2).all(|w| w[0].position <= w[1].position));
    }
});
