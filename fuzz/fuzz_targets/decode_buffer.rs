//! Any input must decode or fail with a structured error, never panic.
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = baseline_jpeg::Decoder::new().decode_buffer(data);
});
