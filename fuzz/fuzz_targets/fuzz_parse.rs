#![no_main]
use domtrip::{Config, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Byte input goes through encoding detection; neither path may panic.
    let _ = Document::parse_bytes(data);
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Document::parse_str_with_config(s, &Config::lenient());
    }
});
