//! # mdasm-syntax: macro-assembler front end
//!
//! `mdasm-syntax` turns assembly-style source text into a per-line abstract
//! syntax tree. It covers the front half of a macro assembler: no code is
//! generated and no symbols are resolved.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdasm_syntax::parse;
//!
//! let statements = parse("start: dc.w $10, 2 * (size + 1)\n").unwrap();
//! assert_eq!(statements[0].node.to_string(), "start: dc.w($10, (2 * (size + 1)))");
//! ```
//!
//! ## Pipeline
//!
//! Each logical line passes through four stages:
//!
//! 1. [`source`]: bytes to logical lines (comments removed, strings may
//!    span physical lines).
//! 2. [`lexer`]: a line to classified spans.
//! 3. [`grouper`]: spans to a tree of nested scopes.
//! 4. [`reducer`]: scopes to one [`AstNode`] by precedence.
//!
//! [`FrontEnd`] drives the stages over a whole file and attaches file and
//! line information to every [`Statement`] and every error.
//!
//! ## Features
//!
//! - **`no_std` + `alloc`**: the `std` feature (default) only adds
//!   `std::error::Error` impls.
//! - **`serde`**: serialization for the AST, statements and errors.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Offsets are tracked as `usize` and reported as 1-based `u32` columns, so a
// handful of narrowing casts are expected.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::single_match_else,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::return_self_not_must_use,
    clippy::needless_continue
)]

extern crate alloc;

/// Syntax tree: nodes, literals and operator kinds.
pub mod ast;
/// Caller-owned cache of parsed files.
pub mod cache;
/// Error types and source-span diagnostics.
pub mod error;
/// Pipeline driver: builder pattern, resource limits, error policy.
pub mod frontend;
/// Span-to-scope-tree grouping.
pub mod grouper;
/// Line tokenizer with span tracking.
pub mod lexer;
/// Numeric literal parsing.
pub mod number;
/// Precedence-driven reduction of scope trees.
pub mod reducer;
/// Logical line assembly from raw bytes.
pub mod source;

// Re-exports
pub use ast::{AstNode, BlockDelimiter, Literal, Number, OperatorKind};
pub use cache::SourceCache;
pub use error::{AsmError, LexError, LineError, Span, SyntaxError};
pub use frontend::{ErrorPolicy, FrontEnd, ParsedFile, ResourceLimits, Statement};
pub use grouper::{ScopeKind, ScopeNode};
pub use lexer::{SpanKind, TokenSpan};
pub use number::{NumberError, NumberParser, NumericKind, NumericValue};
pub use source::{LineAssembler, SourceLine};

use alloc::vec::Vec;

/// Parse source text into statements.
///
/// Errors on every line are collected (see [`ErrorPolicy::Collect`]).
///
/// # Errors
///
/// Returns [`AsmError`] if any line fails to lex or reduce, or if the input
/// exceeds the default [`ResourceLimits`].
///
/// # Examples
///
/// ```rust
/// use mdasm_syntax::parse;
///
/// let statements = parse(" x = 1 + 2 * 3\n").unwrap();
/// assert_eq!(statements[0].line, 1);
/// assert_eq!(statements[0].node.to_string(), "(x = (1 + (2 * 3)))");
/// ```
pub fn parse(source: &str) -> Result<Vec<Statement>, AsmError> {
    Ok(parse_bytes("<input>", source.as_bytes())?.statements)
}

/// Parse raw bytes under a file identifier.
///
/// # Errors
///
/// Returns [`AsmError`] on failure (see [`parse`] for details).
///
/// # Examples
///
/// ```rust
/// use mdasm_syntax::parse_bytes;
///
/// let err = parse_bytes("main.asm", b" nop\n (1 + 2\n").unwrap_err();
/// assert_eq!(err.to_string(), "main.asm:2:2: '(' is never closed");
/// ```
pub fn parse_bytes(name: &str, bytes: &[u8]) -> Result<ParsedFile, AsmError> {
    FrontEnd::new().parse_source(name, bytes)
}

/// Parse a single logical line.
///
/// Returns `Ok(None)` for a line with nothing in it.
///
/// # Errors
///
/// Returns the first [`LineError`] raised by any stage.
///
/// # Examples
///
/// ```rust
/// use mdasm_syntax::{parse_line, AstNode};
///
/// let node = parse_line(" move.l d0, (a0)").unwrap().unwrap();
/// assert!(matches!(node, AstNode::MacroCall { .. }));
/// assert_eq!(parse_line("   ").unwrap(), None);
/// ```
pub fn parse_line(text: &str) -> Result<Option<AstNode>, LineError> {
    FrontEnd::new().parse_line(text)
}
