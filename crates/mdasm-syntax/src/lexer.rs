//! Lexer for one logical source line.
//!
//! The lexer makes a single pass over the line and produces a flat list of
//! [`TokenSpan`]s: half-open byte ranges into the line, each tagged with a
//! coarse [`SpanKind`]. No text is copied; the grouper slices the line with
//! [`TokenSpan::text`] when it needs the characters.
//!
//! Multi-character operators are built by look-back: when an operator
//! character directly follows an operator span that it can extend, the
//! previous span grows instead of a new one being pushed. That is how
//! `<` `<` `<` becomes one `<<<` span while `<<` followed by `=` stays two.

use alloc::vec::Vec;
use core::iter::Peekable;
use core::str::CharIndices;

use crate::error::{LexError, LineError, SyntaxError};

/// Coarse classification of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Whitespace between tokens (never two in a row).
    Separator,
    /// Quoted string contents, quotes excluded, escapes unresolved.
    String,
    /// Identifier run starting with `_` or a letter.
    Text,
    /// Numeric run starting with `$` or a digit.
    Number,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `{`
    BlockStart,
    /// `}`
    BlockEnd,
    /// One to three operator characters.
    MathOperator,
    /// `:` ending a label.
    LabelOperator,
    /// Whitespace after an identifier at the start of the line, which makes
    /// the identifier a label unless a real `:` turns up later.
    LabelOperatorMaybe,
    /// `::`
    CastOperator,
    /// `.`
    Dot,
    /// `,`
    Comma,
}

/// A tagged half-open byte range within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    /// Classification.
    pub kind: SpanKind,
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl TokenSpan {
    fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// The characters this span covers in `line`.
    #[inline]
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }

    /// Everything except separators and speculative label markers.
    #[inline]
    pub fn is_significant(&self) -> bool {
        !matches!(
            self.kind,
            SpanKind::Separator | SpanKind::LabelOperatorMaybe
        )
    }
}

/// Split one logical line into spans.
///
/// # Errors
///
/// - [`LexError::UnrecognizedCharacter`] for a character that cannot start
///   a token outside of a string or run.
/// - [`LexError::UnterminatedString`] if a quote is still open at the end
///   of the line. The line assembler normally catches this first; the
///   reported line is 1, relative to `text`.
/// - [`SyntaxError::EmptyLabel`] / [`SyntaxError::MultipleLabels`] for
///   misplaced `:`.
pub fn tokenize(text: &str) -> Result<Vec<TokenSpan>, LineError> {
    let mut lexer = Lexer {
        text,
        chars: text.char_indices().peekable(),
        spans: Vec::with_capacity(text.len() / 2 + 1),
        run: None,
        string: None,
        escaped: false,
        label_candidate: false,
        label_seen: false,
        maybe: None,
    };
    lexer.scan()?;
    Ok(lexer.spans)
}

struct Lexer<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    spans: Vec<TokenSpan>,
    /// Open `Text`/`Number` run and where it started.
    run: Option<(SpanKind, usize)>,
    /// Open string: quote character and offset of the first content byte.
    string: Option<(char, usize)>,
    escaped: bool,
    /// The open run is a `Text` run at offset 0.
    label_candidate: bool,
    label_seen: bool,
    /// Index of the `LabelOperatorMaybe` span, if one was emitted.
    maybe: Option<usize>,
}

impl Lexer<'_> {
    fn scan(&mut self) -> Result<(), LineError> {
        let len = self.text.len();
        loop {
            let (i, ch) = match self.chars.next() {
                Some((i, ch)) => (i, Some(ch)),
                None => (len, None),
            };

            if let Some((quote, start)) = self.string {
                match ch {
                    None => {
                        return Err(LexError::UnterminatedString { opened_at_line: 1 }.into())
                    }
                    Some('\\') => self.escaped = !self.escaped,
                    Some(c) if c == quote && !self.escaped => {
                        self.spans.push(TokenSpan::new(SpanKind::String, start, i));
                        self.string = None;
                    }
                    Some(_) => self.escaped = false,
                }
                continue;
            }

            let ch = match ch {
                Some(ch) => ch,
                None => {
                    self.whitespace(len, len);
                    return Ok(());
                }
            };

            match ch {
                ' ' | '\t' | '\r' | '\0' => self.whitespace(i, i + 1),
                '\'' | '"' => {
                    self.close_run(i);
                    self.string = Some((ch, i + 1));
                    self.escaped = false;
                }
                ':' => {
                    self.close_run(i);
                    if !self.spans.iter().any(TokenSpan::is_significant) {
                        return Err(SyntaxError::EmptyLabel { offset: i }.into());
                    }
                    if matches!(self.chars.peek(), Some((_, ':'))) {
                        self.chars.next();
                        self.push(SpanKind::CastOperator, i, i + 2);
                    } else {
                        self.label(i)?;
                    }
                }
                '=' | '<' | '>' => {
                    if !self.extend_operator(i, ch) {
                        self.single(SpanKind::MathOperator, i);
                    }
                }
                '!' | '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '~' => {
                    self.single(SpanKind::MathOperator, i);
                }
                '(' => self.single(SpanKind::OpenParen, i),
                ')' => self.single(SpanKind::CloseParen, i),
                '[' => self.single(SpanKind::OpenBracket, i),
                ']' => self.single(SpanKind::CloseBracket, i),
                '{' => self.single(SpanKind::BlockStart, i),
                '}' => self.single(SpanKind::BlockEnd, i),
                '.' => self.single(SpanKind::Dot, i),
                ',' => self.single(SpanKind::Comma, i),
                _ => {
                    if self.run.is_some() {
                        continue;
                    }
                    if ch == '$' || ch.is_ascii_digit() {
                        self.run = Some((SpanKind::Number, i));
                    } else if ch == '_' || is_ascii_letter(ch) {
                        self.run = Some((SpanKind::Text, i));
                        self.label_candidate = i == 0;
                    } else {
                        return Err(LexError::UnrecognizedCharacter { ch, offset: i }.into());
                    }
                }
            }
        }
    }

    fn push(&mut self, kind: SpanKind, start: usize, end: usize) {
        self.spans.push(TokenSpan::new(kind, start, end));
    }

    /// Close any open run, then push a one-character span.
    fn single(&mut self, kind: SpanKind, i: usize) {
        self.close_run(i);
        self.push(kind, i, i + 1);
    }

    fn close_run(&mut self, end: usize) {
        if let Some((kind, start)) = self.run.take() {
            self.push(kind, start, end);
        }
        self.label_candidate = false;
    }

    /// Whitespace or end of line at `[i, end)`.
    fn whitespace(&mut self, i: usize, end: usize) {
        let candidate = self.label_candidate;
        self.close_run(i);
        if candidate {
            self.maybe = Some(self.spans.len());
            self.push(SpanKind::LabelOperatorMaybe, i, end);
        } else if self.spans.last().map_or(false, TokenSpan::is_significant) {
            self.push(SpanKind::Separator, i, end);
        }
    }

    fn label(&mut self, i: usize) -> Result<(), SyntaxError> {
        if self.label_seen {
            return Err(SyntaxError::MultipleLabels { offset: i });
        }
        self.label_seen = true;
        if let Some(idx) = self.maybe.take() {
            self.spans[idx].kind = SpanKind::Separator;
        }
        self.push(SpanKind::LabelOperator, i, i + 1);
        Ok(())
    }

    /// Grow the previous operator span over `ch` at `i` when they form a
    /// longer operator: `!= == <= >=`, `<< >>`, `<<< >>>`.
    fn extend_operator(&mut self, i: usize, ch: char) -> bool {
        let last = match self.spans.last_mut() {
            Some(last) if last.kind == SpanKind::MathOperator && last.end == i => last,
            _ => return false,
        };
        let prev = &self.text[last.start..last.end];
        let extends = match ch {
            '=' => matches!(prev, "!" | "=" | "<" | ">"),
            _ => prev.len() <= 2 && prev.chars().all(|c| c == ch),
        };
        if extends {
            last.end = i + 1;
        }
        extends
    }
}

/// ASCII letter test by case-folding mask.
#[inline]
fn is_ascii_letter(ch: char) -> bool {
    ch.is_ascii() && (b'A'..=b'Z').contains(&(ch as u8 & 0xDF))
}
