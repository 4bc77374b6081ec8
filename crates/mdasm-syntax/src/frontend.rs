//! Pipeline driver: bytes in, located statements out.
//!
//! [`FrontEnd`] runs the four stages over every logical line of a source
//! file and attaches the file identifier and line number to each result.
//! Configuration follows a builder pattern:
//!
//! ```rust
//! use mdasm_syntax::{ErrorPolicy, FrontEnd, ResourceLimits};
//!
//! let mut fe = FrontEnd::new();
//! fe.error_policy(ErrorPolicy::FailFast).limits(ResourceLimits {
//!     max_line_bytes: 4096,
//!     ..ResourceLimits::default()
//! });
//! let file = fe.parse_source("main.asm", b" dc.b 1, 2\n").unwrap();
//! assert_eq!(file.statements.len(), 1);
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::ast::AstNode;
use crate::error::{AsmError, LexError, LineError};
use crate::grouper::group_with;
use crate::lexer::tokenize;
use crate::number::{parse_number, NumberParser};
use crate::reducer::reduce;
use crate::source;

/// Configurable resource limits for defense against pathological input.
///
/// All limits default to generous values that are sufficient for any
/// reasonable source file. Nesting depth is deliberately not limited; the
/// stages do not recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLimits {
    /// Maximum input bytes per [`FrontEnd::parse_source`] call. Default: 64 MiB.
    pub max_source_bytes: usize,
    /// Maximum bytes in one logical line. Default: 1 MiB.
    pub max_line_bytes: usize,
    /// Maximum collected errors before bailing. Default: 64.
    pub max_errors: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 64 * 1024 * 1024,
            max_line_bytes: 1024 * 1024,
            max_errors: 64,
        }
    }
}

/// What to do when a line fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorPolicy {
    /// Return the first line error immediately.
    FailFast,
    /// Keep going and report every line error together.
    #[default]
    Collect,
}

/// One reduced source line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statement {
    /// Originating file identifier.
    pub file: String,
    /// 1-based line the statement started on.
    pub line: u32,
    /// The reduced line.
    pub node: AstNode,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.node)
    }
}

/// Every statement of one source file, in order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedFile {
    /// File identifier.
    pub name: String,
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

impl ParsedFile {
    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the file produced no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Iterate over the reduced nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &AstNode> {
        self.statements.iter().map(|s| &s.node)
    }
}

/// Builder-pattern front end.
#[derive(Clone, Copy)]
pub struct FrontEnd {
    limits: ResourceLimits,
    policy: ErrorPolicy,
    number_parser: NumberParser,
}

impl fmt::Debug for FrontEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontEnd")
            .field("limits", &self.limits)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for FrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontEnd {
    /// Create a front end with default limits, the [`ErrorPolicy::Collect`]
    /// policy and the built-in numeric literal parser.
    pub fn new() -> Self {
        Self {
            limits: ResourceLimits::default(),
            policy: ErrorPolicy::default(),
            number_parser: parse_number,
        }
    }

    /// Set resource limits.
    pub fn limits(&mut self, limits: ResourceLimits) -> &mut Self {
        self.limits = limits;
        self
    }

    /// Set the error policy.
    pub fn error_policy(&mut self, policy: ErrorPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Replace the numeric literal parser.
    pub fn number_parser(&mut self, parser: NumberParser) -> &mut Self {
        self.number_parser = parser;
        self
    }

    /// The configured limits.
    pub fn resource_limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Run the lexer, grouper and reducer over one logical line.
    ///
    /// # Errors
    ///
    /// Returns the first [`LineError`] raised by any stage.
    pub fn parse_line(&self, text: &str) -> Result<Option<AstNode>, LineError> {
        let spans = tokenize(text)?;
        log::trace!("{} spans", spans.len());
        let root = group_with(text, &spans, self.number_parser)?;
        Ok(reduce(root)?)
    }

    /// Parse a whole source file.
    ///
    /// Bytes are widened to characters one by one, so non-ASCII input is
    /// read as Latin-1.
    ///
    /// # Errors
    ///
    /// - [`AsmError::ResourceLimitExceeded`] if the source, a line, or the
    ///   number of collected errors exceeds its limit.
    /// - Under [`ErrorPolicy::FailFast`], the first located line error.
    /// - Under [`ErrorPolicy::Collect`], the only error, or
    ///   [`AsmError::Multiple`] holding every error in source order.
    pub fn parse_source(&self, name: &str, bytes: &[u8]) -> Result<ParsedFile, AsmError> {
        if bytes.len() > self.limits.max_source_bytes {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("source bytes"),
                limit: self.limits.max_source_bytes,
            });
        }

        let mut statements = Vec::new();
        let mut errors = Vec::new();
        let mut lines = 0usize;

        for line in source::lines(bytes) {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let at = match e {
                        LexError::UnterminatedString { opened_at_line } => opened_at_line,
                        LexError::UnrecognizedCharacter { .. } => 0,
                    };
                    self.record(LineError::from(e).at(name, at), &mut errors)?;
                    break;
                }
            };
            lines += 1;

            if line.text.len() > self.limits.max_line_bytes {
                return Err(AsmError::ResourceLimitExceeded {
                    resource: String::from("line bytes"),
                    limit: self.limits.max_line_bytes,
                });
            }

            match self.parse_line(&line.text) {
                Ok(Some(node)) => {
                    log::trace!("{}:{}: {}", name, line.line, node);
                    statements.push(Statement {
                        file: String::from(name),
                        line: line.line,
                        node,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    // A quote left open inside a single line is reported
                    // against that line.
                    let e = match e {
                        LineError::Lex(LexError::UnterminatedString { .. }) => {
                            LineError::Lex(LexError::UnterminatedString {
                                opened_at_line: line.line,
                            })
                        }
                        e => e,
                    };
                    self.record(e.at(name, line.line), &mut errors)?;
                }
            }
        }

        log::debug!(
            "{}: {} lines, {} statements, {} errors",
            name,
            lines,
            statements.len(),
            errors.len()
        );

        if errors.len() > 1 {
            return Err(AsmError::Multiple { errors });
        }
        if let Some(e) = errors.pop() {
            return Err(e);
        }
        Ok(ParsedFile {
            name: String::from(name),
            statements,
        })
    }

    /// Parse source text. See [`parse_source`](Self::parse_source).
    ///
    /// # Errors
    ///
    /// Same as [`parse_source`](Self::parse_source).
    pub fn parse_str(&self, name: &str, source: &str) -> Result<ParsedFile, AsmError> {
        self.parse_source(name, source.as_bytes())
    }

    fn record(&self, error: AsmError, errors: &mut Vec<AsmError>) -> Result<(), AsmError> {
        log::debug!("{}", error);
        match self.policy {
            ErrorPolicy::FailFast => Err(error),
            ErrorPolicy::Collect => {
                errors.push(error);
                if errors.len() >= self.limits.max_errors {
                    return Err(AsmError::ResourceLimitExceeded {
                        resource: String::from("errors"),
                        limit: self.limits.max_errors,
                    });
                }
                Ok(())
            }
        }
    }
}
