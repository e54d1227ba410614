#![no_main]
use libfuzzer_sys::fuzz_target;
use sorter_hardware::codec::CodeDecoder;
use std::collections::VecDeque;

fuzz_target!(|data: &[u8]| {
    let mut decoder = CodeDecoder::new();
    let mut out = VecDeque::new();
    decoder.decode_into(data, &mut out);
    let _ = decoder.flush();
    assert!(!decoder.has_pending());
    // Never more codes than digit runs.
    let runs = data
        .split(|b| !b.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .count();
    assert!(out.len() <= runs);
});
