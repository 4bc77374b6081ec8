//! Basic front-end example: demonstrates the one-shot and builder APIs.
//!
//! Run with: `cargo run --example basic`

use mdasm_syntax::{parse, parse_line, AsmError, ErrorPolicy, FrontEnd, SourceCache};

fn main() {
    println!("=== mdasm_syntax basic example ===\n");

    // --- One-shot parsing ---
    println!("1. One-shot parsing:");
    let statements = parse(
        r#"
; sprite table
count = 4
start:
 move.l d0, (a0)
.loop: dbra d7, .loop
 dc.w $10, count * 2, "end"
"#,
    )
    .unwrap();
    for statement in &statements {
        println!("   {statement}");
    }

    // --- Single line ---
    println!("\n2. Single line:");
    let node = parse_line(" x = (1 + 2) * -y").unwrap();
    println!("   {node:?}");

    // --- Builder API with error collection ---
    println!("\n3. Error collection:");
    let mut fe = FrontEnd::new();
    fe.error_policy(ErrorPolicy::Collect);
    match fe.parse_str("broken.asm", " a)\n ok\n 1 2\n") {
        Ok(_) => println!("   unexpectedly parsed"),
        Err(err) => {
            for e in err.into_errors() {
                println!("   {e}");
            }
        }
    }

    // --- Cache ---
    println!("\n4. Source cache:");
    let mut cache = SourceCache::with_frontend(fe);
    for _ in 0..2 {
        let file = cache
            .get_or_create_with("consts.i", |name| {
                println!("   loading {name}");
                Ok::<_, AsmError>(" width = 320\n height = 224\n")
            })
            .unwrap();
        println!("   {} has {} statements", file.name, file.len());
    }
}
