//! Error types and source span tracking for diagnostics.
//!
//! Each stage reports failures relative to the single logical line it is
//! working on ([`LexError`], [`SyntaxError`], wrapped together as
//! [`LineError`]). The [`FrontEnd`](crate::frontend::FrontEnd) driver then
//! attaches the file identifier and line number, producing an [`AsmError`].

use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::number::NumberError;

/// Source location for diagnostics.
///
/// Tracks the line, column and length of a construct in the source text.
/// Columns are counted in bytes within the logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, or 0 when the error has no position in the line.
    pub col: u32,
    /// Byte length of the spanned region.
    pub len: usize,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub fn new(line: u32, col: u32, len: usize) -> Self {
        Self { line, col, len }
    }

    /// A span covering a whole line, used when a stage has no finer position.
    #[must_use]
    pub fn line(line: u32) -> Self {
        Self {
            line,
            col: 0,
            len: 0,
        }
    }

    /// A span at a 0-based byte offset within `line`.
    #[must_use]
    pub fn at(line: u32, offset: usize, len: usize) -> Self {
        Self {
            line,
            col: offset as u32 + 1,
            len,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col == 0 {
            write!(f, "{}", self.line)
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

/// Character-level failure while assembling or tokenizing a line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LexError {
    /// A character that cannot start any token, outside strings and runs.
    UnrecognizedCharacter {
        /// The offending character.
        ch: char,
        /// 0-based byte offset within the line.
        offset: usize,
    },

    /// A quoted string still open at the end of input.
    UnterminatedString {
        /// 1-based line on which the string was opened.
        opened_at_line: u32,
    },
}

impl LexError {
    /// Byte offset within the line, when the error has one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            LexError::UnrecognizedCharacter { offset, .. } => Some(*offset),
            LexError::UnterminatedString { .. } => None,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnrecognizedCharacter { ch, .. } => {
                write!(f, "character '{}' not recognized", ch.escape_default())
            }
            LexError::UnterminatedString { opened_at_line } => {
                write!(f, "string starting at line {} not terminated", opened_at_line)
            }
        }
    }
}

/// Structural failure while lexing, grouping or reducing a line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyntaxError {
    /// A label operator with nothing before it.
    EmptyLabel {
        /// 0-based byte offset of the `:`.
        offset: usize,
    },

    /// A second label operator on the same line.
    MultipleLabels {
        /// 0-based byte offset of the second `:`.
        offset: usize,
    },

    /// A `)` with no matching `(` (including one that would close a `[`).
    UnmatchedCloseParen {
        /// 0-based byte offset of the `)`.
        offset: usize,
    },

    /// A `]` with no matching `[` (including one that would close a `(`).
    UnmatchedCloseBracket {
        /// 0-based byte offset of the `]`.
        offset: usize,
    },

    /// An operator span that maps to no known operator.
    UnknownOperator {
        /// The operator text.
        operator: String,
        /// 0-based byte offset of the operator.
        offset: usize,
    },

    /// A scope whose children could not be collapsed into a single node.
    UnresolvedExpression,

    /// A misplaced comma or an argument that is not a complete expression.
    InvalidMacroArgument {
        /// What was wrong with the argument.
        detail: String,
        /// 0-based byte offset, when known.
        offset: Option<usize>,
    },

    /// A `(` or `[` still open at the end of the line.
    UnclosedDelimiter {
        /// The opening delimiter.
        delimiter: char,
        /// 0-based byte offset of the opening delimiter.
        offset: usize,
    },

    /// A number span rejected by the numeric literal parser.
    InvalidNumber {
        /// The literal text.
        text: String,
        /// Why it was rejected.
        error: NumberError,
        /// 0-based byte offset of the literal.
        offset: usize,
    },
}

impl SyntaxError {
    /// Byte offset within the line, when the error has one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            SyntaxError::EmptyLabel { offset }
            | SyntaxError::MultipleLabels { offset }
            | SyntaxError::UnmatchedCloseParen { offset }
            | SyntaxError::UnmatchedCloseBracket { offset }
            | SyntaxError::UnknownOperator { offset, .. }
            | SyntaxError::UnclosedDelimiter { offset, .. }
            | SyntaxError::InvalidNumber { offset, .. } => Some(*offset),
            SyntaxError::InvalidMacroArgument { offset, .. } => *offset,
            SyntaxError::UnresolvedExpression => None,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::EmptyLabel { .. } => write!(f, "invalid empty label"),
            SyntaxError::MultipleLabels { .. } => {
                write!(f, "can not have multiple labels on a line")
            }
            SyntaxError::UnmatchedCloseParen { .. } => {
                write!(f, "unexpected closing parenthesis")
            }
            SyntaxError::UnmatchedCloseBracket { .. } => {
                write!(f, "unexpected closing square bracket")
            }
            SyntaxError::UnknownOperator { operator, .. } => {
                write!(f, "unexpected operator encountered: '{}'", operator)
            }
            SyntaxError::UnresolvedExpression => {
                write!(f, "expression could not be resolved to a single value")
            }
            SyntaxError::InvalidMacroArgument { detail, .. } => {
                write!(f, "invalid macro argument: {}", detail)
            }
            SyntaxError::UnclosedDelimiter { delimiter, .. } => {
                write!(f, "'{}' is never closed", delimiter)
            }
            SyntaxError::InvalidNumber { text, error, .. } => {
                write!(f, "invalid number '{}': {}", text, error)
            }
        }
    }
}

/// The first error raised while processing one logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineError {
    /// Character-level failure.
    Lex(LexError),
    /// Structural failure.
    Syntax(SyntaxError),
}

impl LineError {
    /// Byte offset within the line, when the error has one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            LineError::Lex(e) => e.offset(),
            LineError::Syntax(e) => e.offset(),
        }
    }

    /// Attach the originating file and line.
    #[must_use]
    pub fn at(self, file: &str, line: u32) -> AsmError {
        let span = match self.offset() {
            Some(offset) => Span::at(line, offset, 1),
            None => Span::line(line),
        };
        match self {
            LineError::Lex(error) => AsmError::Lex {
                error,
                file: String::from(file),
                span,
            },
            LineError::Syntax(error) => AsmError::Syntax {
                error,
                file: String::from(file),
                span,
            },
        }
    }
}

impl From<LexError> for LineError {
    fn from(e: LexError) -> Self {
        LineError::Lex(e)
    }
}

impl From<SyntaxError> for LineError {
    fn from(e: SyntaxError) -> Self {
        LineError::Syntax(e)
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Lex(e) => write!(f, "{}", e),
            LineError::Syntax(e) => write!(f, "{}", e),
        }
    }
}

/// Located front-end error with file identifier and source position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmError {
    /// Character-level failure on a line.
    Lex {
        /// The lexer error.
        error: LexError,
        /// Originating file identifier.
        file: String,
        /// Source location.
        span: Span,
    },

    /// Structural failure on a line.
    Syntax {
        /// The syntax error.
        error: SyntaxError,
        /// Originating file identifier.
        file: String,
        /// Source location.
        span: Span,
    },

    /// A configurable resource limit was exceeded.
    ResourceLimitExceeded {
        /// Human-readable name of the resource (e.g. "source bytes").
        resource: String,
        /// The configured limit that was exceeded.
        limit: usize,
    },

    /// Multiple errors collected across lines.
    Multiple {
        /// The collected errors, in source order.
        errors: Vec<AsmError>,
    },
}

impl AsmError {
    /// The originating file identifier, if the error is tied to one.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        match self {
            AsmError::Lex { file, .. } | AsmError::Syntax { file, .. } => Some(file),
            AsmError::Multiple { errors } => errors.first().and_then(AsmError::file),
            AsmError::ResourceLimitExceeded { .. } => None,
        }
    }

    /// The 1-based line number, if the error is tied to one.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            AsmError::Lex { span, .. } | AsmError::Syntax { span, .. } => Some(span.line),
            AsmError::Multiple { errors } => errors.first().and_then(AsmError::line),
            AsmError::ResourceLimitExceeded { .. } => None,
        }
    }

    /// Flatten into individual errors, expanding `Multiple`.
    #[must_use]
    pub fn into_errors(self) -> Vec<AsmError> {
        match self {
            AsmError::Multiple { errors } => errors,
            other => vec![other],
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::Lex { error, file, span } => write!(f, "{}:{}: {}", file, span, error),
            AsmError::Syntax { error, file, span } => {
                write!(f, "{}:{}: {}", file, span, error)
            }
            AsmError::ResourceLimitExceeded { resource, limit } => {
                write!(
                    f,
                    "resource limit exceeded: {} (limit: {})",
                    resource, limit
                )
            }
            AsmError::Multiple { errors } => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AsmError {}

#[cfg(feature = "std")]
impl std::error::Error for LineError {}
