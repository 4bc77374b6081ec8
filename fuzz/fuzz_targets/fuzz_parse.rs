#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whole-file parsing must never panic, only return Ok/Err.
    let _ = mdasm_syntax::parse_bytes("fuzz.asm", data);

    // Same input under fail-fast with tight limits.
    let mut fe = mdasm_syntax::FrontEnd::new();
    fe.error_policy(mdasm_syntax::ErrorPolicy::FailFast)
        .limits(mdasm_syntax::ResourceLimits {
            max_source_bytes: 4096,
            max_line_bytes: 256,
            max_errors: 1,
        });
    let _ = fe.parse_source("fuzz.asm", data);
});
