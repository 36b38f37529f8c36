#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((original, sanitized, size)) = endpoint_probe::fuzzing::sanitize_json_input(data) {
        let again = endpoint_probe::telemetry::sanitize(&sanitized);
        debug_assert_eq!(again, sanitized);
        let expected = match original.as_str() {
            Some(text) => text.len(),
            None => serde_json::to_vec(&original).map_or(0, |bytes| bytes.len()),
        };
        debug_assert_eq!(size, expected as u64);
    }
});
