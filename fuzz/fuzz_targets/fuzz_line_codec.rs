#![no_main]

use libfuzzer_sys::fuzz_target;
use vedirect_bridge::vedirect::codec::{parse_int, parse_onoff, split_line};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);

    if let Some((tag, value)) = split_line(&line) {
        assert!(!tag.is_empty() && !value.is_empty());
        assert!(!tag.contains('\t'));
        let _ = parse_int(value);
        let _ = parse_onoff(value);
    }
});
