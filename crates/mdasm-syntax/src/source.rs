//! Line assembly: raw bytes to logical source lines.
//!
//! Bytes are widened to characters one at a time. Comments (`;` outside a
//! string) are dropped up to the end of the physical line, and a newline
//! inside an open string does not end the logical line.

use alloc::string::String;
use core::mem;
use core::slice;

use crate::error::LexError;

/// One logical line of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Decoded characters, comment stripped, without the line break.
    pub text: String,
    /// 1-based physical line the logical line started on.
    pub line: u32,
}

/// Push-driven state machine that accumulates logical lines.
///
/// Feed bytes with [`push`](Self::push); every completed line is returned as
/// soon as its terminating newline arrives. Call [`finish`](Self::finish)
/// once the input is exhausted.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    buffer: String,
    quote: Option<char>,
    quote_line: u32,
    escaped: bool,
    writing: bool,
    line: u32,
    start_line: u32,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create an assembler positioned at line 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            quote: None,
            quote_line: 0,
            escaped: false,
            writing: true,
            line: 1,
            start_line: 1,
        }
    }

    /// Current 1-based physical line.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Feed one byte, returning a line if this byte completed one.
    pub fn push(&mut self, byte: u8) -> Option<SourceLine> {
        let ch = byte as char;

        if ch == '\n' {
            self.line += 1;
            self.escaped = false;
            if self.quote.is_some() {
                return None;
            }
            self.writing = true;
            return self.flush();
        }

        if !self.writing {
            return None;
        }

        match self.quote {
            None => match ch {
                ';' => {
                    self.writing = false;
                    return None;
                }
                '\'' | '"' => {
                    self.quote = Some(ch);
                    self.quote_line = self.line;
                }
                _ => {}
            },
            Some(open) => {
                if ch == '\\' {
                    self.escaped = !self.escaped;
                } else {
                    if ch == open && !self.escaped {
                        self.quote = None;
                    }
                    self.escaped = false;
                }
            }
        }

        self.buffer.push(ch);
        None
    }

    /// Signal end of input.
    ///
    /// # Errors
    ///
    /// Returns [`LexError::UnterminatedString`] if a quote is still open.
    pub fn finish(mut self) -> Result<Option<SourceLine>, LexError> {
        if self.quote.is_some() {
            return Err(LexError::UnterminatedString {
                opened_at_line: self.quote_line,
            });
        }
        Ok(self.flush())
    }

    fn flush(&mut self) -> Option<SourceLine> {
        let start = mem::replace(&mut self.start_line, self.line);
        if self.buffer.is_empty() {
            return None;
        }
        Some(SourceLine {
            text: mem::take(&mut self.buffer),
            line: start,
        })
    }
}

/// Iterator over the logical lines of a byte slice.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    bytes: slice::Iter<'a, u8>,
    assembler: Option<LineAssembler>,
}

impl Iterator for Lines<'_> {
    type Item = Result<SourceLine, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let assembler = self.assembler.as_mut()?;
        for &byte in self.bytes.by_ref() {
            if let Some(line) = assembler.push(byte) {
                return Some(Ok(line));
            }
        }
        self.assembler.take()?.finish().transpose()
    }
}

/// Split raw bytes into logical lines.
#[must_use]
pub fn lines(bytes: &[u8]) -> Lines<'_> {
    Lines {
        bytes: bytes.iter(),
        assembler: Some(LineAssembler::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn collect(src: &str) -> Result<Vec<(String, u32)>, LexError> {
        lines(src.as_bytes())
            .map(|r| r.map(|l| (l.text, l.line)))
            .collect()
    }

    fn l(text: &str, line: u32) -> (String, u32) {
        (String::from(text), line)
    }

    fn texts(src: &str) -> Vec<String> {
        collect(src).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn splits_on_newlines() {
        let got = collect("a\nb\n\nc").unwrap();
        assert_eq!(got, [l("a", 1), l("b", 2), l("c", 4)]);
    }

    #[test]
    fn trailing_newline_yields_no_empty_line() {
        assert_eq!(texts("nop\n"), ["nop"]);
        assert!(texts("").is_empty());
        assert!(texts("\n\n").is_empty());
    }

    #[test]
    fn strips_comments() {
        assert_eq!(texts("move d0, d1 ; copy\nrts"), ["move d0, d1 ", "rts"]);
        assert!(texts("; only a comment\n").is_empty());
    }

    #[test]
    fn semicolon_inside_string_is_content() {
        assert_eq!(texts("dc.b 'a;b' ; note"), ["dc.b 'a;b' "]);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        assert_eq!(texts(r#"x = "a\"b" ; c"#), [r#"x = "a\"b" "#]);
    }

    #[test]
    fn double_backslash_then_quote_closes() {
        assert_eq!(texts(r#"x = "a\\" ; c"#), [r#"x = "a\\" "#]);
    }

    #[test]
    fn mismatched_quote_is_content() {
        assert_eq!(texts(r#"x = "it's" ; c"#), [r#"x = "it's" "#]);
    }

    #[test]
    fn newline_inside_string_continues_line() {
        let got = collect("x = 'ab\ncd'\ny").unwrap();
        assert_eq!(got, [l("x = 'abcd'", 1), l("y", 3)]);
    }

    #[test]
    fn unterminated_string_reports_opening_line() {
        let err = collect("nop\nx = 'abc\nmore").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { opened_at_line: 2 });
    }

    #[test]
    fn error_ends_iteration() {
        let mut it = lines(b"a\n'b");
        assert!(matches!(it.next(), Some(Ok(_))));
        assert!(matches!(it.next(), Some(Err(_))));
        assert!(it.next().is_none());
    }

    #[test]
    fn bytes_are_widened() {
        let got: Vec<_> = lines(&[b'a', 0xE9, b'\n'])
            .map(|r| r.unwrap().text)
            .collect();
        assert_eq!(got, ["a\u{e9}"]);
    }

    #[test]
    fn push_api() {
        let mut asm = LineAssembler::new();
        assert!(asm.push(b'x').is_none());
        let line = asm.push(b'\n').unwrap();
        assert_eq!(line.text, "x");
        assert_eq!(asm.line(), 2);
        assert!(asm.push(b'y').is_none());
        assert_eq!(asm.finish().unwrap().unwrap().line, 2);
    }
}
