#![no_main]
use domtrip::serial::serialize;
use domtrip::{Config, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(doc) = Document::parse_str(s) {
            // Unchanged documents serialize to their input.
            assert_eq!(serialize(&doc, &Config::defaults()), s);
            // Pretty output must parse again.
            let pretty = serialize(&doc, &Config::pretty_print());
            let _ = Document::parse_str(&pretty);
        }
    }
});
