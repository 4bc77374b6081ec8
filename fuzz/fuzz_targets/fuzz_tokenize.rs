#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Every span the lexer returns must slice the line cleanly.
    if let Ok(spans) = mdasm_syntax::lexer::tokenize(data) {
        for span in &spans {
            let _ = span.text(data);
        }
        let _ = mdasm_syntax::grouper::group(data, &spans)
            .map(mdasm_syntax::reducer::reduce);
    }
});
