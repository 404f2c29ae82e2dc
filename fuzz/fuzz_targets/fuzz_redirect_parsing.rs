#![no_main]

use libfuzzer_sys::fuzz_target;

use pollbridge::auth::{parse_redirect, timing_safe_eq};

fuzz_target!(|data: &str| {
    // Arbitrary redirect URLs must never panic the parser.
    if let Ok(params) = parse_redirect(data) {
        if let Some(state) = params.state.as_deref() {
            assert!(timing_safe_eq(state, state));
        }
    }
});
