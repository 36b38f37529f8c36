#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(document) = endpoint_probe::fuzzing::parse_workflow_input(input) {
            debug_assert!(!document.workflow_id.trim().is_empty());
            debug_assert!(document.definition.is_object());
        }
    }
});
