#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = endpoint_probe::fuzzing::apply_config_from_json(data);
});
