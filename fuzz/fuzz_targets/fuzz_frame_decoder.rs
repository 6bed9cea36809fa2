#![no_main]

use libfuzzer_sys::fuzz_target;
use vedirect_bridge::vedirect::frame::{DecodeEvent, FrameDecoder};
use vedirect_bridge::vedirect::{FieldRegistry, BMV_FIELDS};

fuzz_target!(|data: &[u8]| {
    // Small buffer so overruns are reached quickly
    let mut decoder = FrameDecoder::new(128);
    let mut registry = FieldRegistry::new(&BMV_FIELDS);

    for &byte in data {
        match decoder.process_byte(byte) {
            DecodeEvent::LineReady(line) => {
                registry.load_key_value(&line, 1);
            }
            DecodeEvent::FrameComplete(_) => registry.reset(),
            DecodeEvent::Continue => {}
        }
        assert!(decoder.buffered() <= decoder.capacity());
    }
});
