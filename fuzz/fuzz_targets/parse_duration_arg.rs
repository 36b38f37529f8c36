#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(duration) = endpoint_probe::fuzzing::parse_duration_arg_input(input) {
            debug_assert!(!duration.is_zero());
        }
    }
});
