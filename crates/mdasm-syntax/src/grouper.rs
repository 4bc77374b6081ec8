//! Grouping: flat spans to a tree of scopes.
//!
//! The grouper walks the spans of one line left to right and nests them by
//! `( )`, `[ ]` and macro-call boundaries. Leaves carry their literal or
//! raw operator as an [`AstNode`]; scopes are collapsed later by the
//! [reducer](crate::reducer).
//!
//! Macro calls come in two shapes:
//!
//! - `name(a, b)`: the `(` must directly follow the name (or its `.size`
//!   suffix).
//! - `name a, b`: a *bare* call. Only the first name of a statement in the
//!   root scope qualifies, and only when whitespace and then something that
//!   can start an operand follow it. Its arguments run to the end of the
//!   line.
//!
//! Either way the call scope holds one argument scope per comma-separated
//! argument.

use alloc::string::String;
use alloc::vec::Vec;

use crate::ast::{AstNode, BlockDelimiter, Literal, Number, OperatorKind};
use crate::error::SyntaxError;
use crate::lexer::{SpanKind, TokenSpan};
use crate::number::{parse_number, NumberParser};

/// What a [`ScopeNode`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopeKind {
    /// A plain scope: the line root, parentheses, or one macro argument.
    None,
    /// A raw operator leaf, or a `[ ]` scope holding `ArraySubscript`.
    Operator,
    /// String literal leaf.
    String,
    /// Identifier leaf.
    Text,
    /// Numeric literal leaf.
    Number,
    /// Label marker leaf (no value).
    Label,
    /// Macro call scope; its children are argument scopes.
    MacroCall,
    /// `{` leaf.
    BlockStart,
    /// `}` leaf.
    BlockEnd,
}

/// One node of the scope tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeNode {
    /// What the node holds.
    pub kind: ScopeKind,
    /// Nesting depth; the root is 0.
    pub depth: usize,
    /// Leaf value, or the operator / macro call a scope collapses into.
    pub value: Option<AstNode>,
    /// Nested nodes in source order.
    pub children: Vec<ScopeNode>,
}

impl ScopeNode {
    fn new(kind: ScopeKind, depth: usize, value: Option<AstNode>) -> Self {
        Self {
            kind,
            depth,
            value,
            children: Vec::new(),
        }
    }

    /// Whether the node is a scope (to be reduced) rather than a leaf.
    #[must_use]
    pub fn is_scope(&self) -> bool {
        match self.kind {
            ScopeKind::None | ScopeKind::MacroCall => true,
            ScopeKind::Operator => matches!(
                self.value,
                Some(AstNode::Operator {
                    op: OperatorKind::ArraySubscript,
                    ..
                })
            ),
            _ => false,
        }
    }
}

/// Group spans with the default numeric literal parser.
///
/// # Errors
///
/// See [`group_with`].
pub fn group(line: &str, spans: &[TokenSpan]) -> Result<ScopeNode, SyntaxError> {
    group_with(line, spans, parse_number)
}

/// Group spans into a scope tree rooted at a [`ScopeKind::None`] node.
///
/// # Errors
///
/// - [`SyntaxError::UnmatchedCloseParen`] / [`SyntaxError::UnmatchedCloseBracket`]
///   when a closer does not match the innermost open scope.
/// - [`SyntaxError::UnclosedDelimiter`] for a `(` or `[` still open at the end.
/// - [`SyntaxError::InvalidMacroArgument`] for a comma outside a macro call.
/// - [`SyntaxError::UnknownOperator`] for an unmapped operator or stray `.`.
/// - [`SyntaxError::InvalidNumber`] when `parser` rejects a numeric span.
pub fn group_with(
    line: &str,
    spans: &[TokenSpan],
    parser: NumberParser,
) -> Result<ScopeNode, SyntaxError> {
    Grouper {
        line,
        spans,
        parser,
        root: ScopeNode::new(ScopeKind::None, 0, None),
        stack: Vec::new(),
        at_head: true,
    }
    .run()
}

/// Why a scope was opened, and where.
#[derive(Debug, Clone, Copy)]
enum Opener {
    Paren { offset: usize },
    Bracket { offset: usize },
    Macro { bare: bool, offset: usize },
    Argument { bare: bool, offset: usize },
}

#[derive(Debug)]
struct Open {
    node: ScopeNode,
    opener: Opener,
}

struct Grouper<'a> {
    line: &'a str,
    spans: &'a [TokenSpan],
    parser: NumberParser,
    root: ScopeNode,
    /// Open scopes below the root, innermost last.
    stack: Vec<Open>,
    /// Nothing but labels seen so far in this statement.
    at_head: bool,
}

impl Grouper<'_> {
    fn run(mut self) -> Result<ScopeNode, SyntaxError> {
        let mut i = 0;
        while i < self.spans.len() {
            let span = self.spans[i];
            let mut head = false;
            match span.kind {
                SpanKind::Separator => {
                    i += 1;
                    continue;
                }
                SpanKind::LabelOperator | SpanKind::LabelOperatorMaybe => {
                    self.leaf(ScopeKind::Label, None);
                    head = true;
                }
                SpanKind::CastOperator => {
                    self.leaf(
                        ScopeKind::Operator,
                        Some(AstNode::operator(OperatorKind::Cast)),
                    );
                }
                SpanKind::BlockStart => {
                    self.leaf(
                        ScopeKind::BlockStart,
                        Some(AstNode::Block(BlockDelimiter::Start)),
                    );
                }
                SpanKind::BlockEnd => {
                    self.leaf(
                        ScopeKind::BlockEnd,
                        Some(AstNode::Block(BlockDelimiter::End)),
                    );
                }
                SpanKind::OpenParen => {
                    self.open(
                        ScopeKind::None,
                        None,
                        Opener::Paren { offset: span.start },
                    );
                }
                SpanKind::OpenBracket => {
                    self.open(
                        ScopeKind::Operator,
                        Some(AstNode::operator(OperatorKind::ArraySubscript)),
                        Opener::Bracket { offset: span.start },
                    );
                }
                SpanKind::CloseParen => self.close_paren(span.start)?,
                SpanKind::CloseBracket => self.close_bracket(span.start)?,
                SpanKind::Comma => self.comma(span.start)?,
                SpanKind::String => {
                    let value = unescape(span.text(self.line));
                    self.leaf(ScopeKind::String, Some(AstNode::string(value)));
                }
                SpanKind::Number => i = self.number(i)?,
                SpanKind::MathOperator => {
                    let symbol = span.text(self.line);
                    let op = OperatorKind::from_symbol(symbol).ok_or_else(|| {
                        SyntaxError::UnknownOperator {
                            operator: String::from(symbol),
                            offset: span.start,
                        }
                    })?;
                    self.leaf(ScopeKind::Operator, Some(AstNode::operator(op)));
                }
                SpanKind::Text => i = self.text(i, span.start)?,
                SpanKind::Dot => i = self.dot(i)?,
            }
            self.at_head = head;
            i += 1;
        }
        self.finish()
    }

    fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    fn children(&mut self) -> &mut Vec<ScopeNode> {
        match self.stack.last_mut() {
            Some(open) => &mut open.node.children,
            None => &mut self.root.children,
        }
    }

    fn kind_at(&self, i: usize) -> Option<SpanKind> {
        self.spans.get(i).map(|s| s.kind)
    }

    fn leaf(&mut self, kind: ScopeKind, value: Option<AstNode>) {
        let node = ScopeNode::new(kind, self.depth(), value);
        self.children().push(node);
    }

    fn open(&mut self, kind: ScopeKind, value: Option<AstNode>, opener: Opener) {
        let node = ScopeNode::new(kind, self.depth(), value);
        self.stack.push(Open { node, opener });
    }

    /// Pop the innermost scope into its parent.
    fn close(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.children().push(open.node);
        }
    }

    fn top(&self) -> Option<Opener> {
        self.stack.last().map(|open| open.opener)
    }

    fn close_paren(&mut self, offset: usize) -> Result<(), SyntaxError> {
        match self.top() {
            Some(Opener::Paren { .. }) => self.close(),
            Some(Opener::Argument { bare: false, .. }) => {
                self.close();
                self.close();
            }
            _ => return Err(SyntaxError::UnmatchedCloseParen { offset }),
        }
        Ok(())
    }

    fn close_bracket(&mut self, offset: usize) -> Result<(), SyntaxError> {
        match self.top() {
            Some(Opener::Bracket { .. }) => {
                self.close();
                Ok(())
            }
            _ => Err(SyntaxError::UnmatchedCloseBracket { offset }),
        }
    }

    fn comma(&mut self, at: usize) -> Result<(), SyntaxError> {
        match self.top() {
            Some(Opener::Argument { bare, offset }) => {
                self.close();
                self.open(ScopeKind::None, None, Opener::Argument { bare, offset });
                Ok(())
            }
            _ => Err(SyntaxError::InvalidMacroArgument {
                detail: String::from("',' outside of a macro call"),
                offset: Some(at),
            }),
        }
    }

    fn open_macro(&mut self, name: &str, size: Option<&str>, bare: bool, offset: usize) {
        let call = AstNode::MacroCall {
            name: String::from(name),
            size_suffix: size.map(String::from),
            args: Vec::new(),
        };
        self.open(ScopeKind::MacroCall, Some(call), Opener::Macro { bare, offset });
        self.open(ScopeKind::None, None, Opener::Argument { bare, offset });
    }

    /// A `Number` span, merged with a following `.digits` into a float.
    /// Returns the index of the last span consumed.
    fn number(&mut self, i: usize) -> Result<usize, SyntaxError> {
        let span = self.spans[i];
        let mut last = i;
        let mut end = span.end;
        if let (Some(dot), Some(frac)) = (self.spans.get(i + 1), self.spans.get(i + 2)) {
            if dot.kind == SpanKind::Dot
                && frac.kind == SpanKind::Number
                && dot.start == span.end
                && frac.start == dot.end
            {
                end = frac.end;
                last = i + 2;
            }
        }

        let text = &self.line[span.start..end];
        let (value, kind) = (self.parser)(text).map_err(|error| SyntaxError::InvalidNumber {
            text: String::from(text),
            error,
            offset: span.start,
        })?;
        let number = Number {
            text: String::from(text),
            value,
            kind,
        };
        self.leaf(
            ScopeKind::Number,
            Some(AstNode::Literal(Literal::Number(number))),
        );
        Ok(last)
    }

    /// A `Text` span at `i` whose name starts at `start` (earlier than the
    /// span itself for a `.local` name). Returns the index of the last span
    /// consumed.
    fn text(&mut self, i: usize, start: usize) -> Result<usize, SyntaxError> {
        let line = self.line;
        let name = &line[start..self.spans[i].end];

        let mut last = i;
        let mut suffix = None;
        if self.kind_at(last + 1) == Some(SpanKind::Dot) {
            last += 1;
            match self.spans.get(last + 1) {
                Some(s) if matches!(s.kind, SpanKind::Text | SpanKind::Number) => {
                    suffix = Some(s.text(line));
                    last += 1;
                }
                _ => suffix = Some(""),
            }
        }

        let next = self.kind_at(last + 1);
        if next == Some(SpanKind::OpenParen) {
            let offset = self.spans[last + 1].start;
            self.open_macro(name, suffix, false, offset);
            return Ok(last + 1);
        }

        if self.at_head
            && self.stack.is_empty()
            && next == Some(SpanKind::Separator)
            && self.starts_operand(last + 2)
        {
            self.open_macro(name, suffix, true, start);
            return Ok(last);
        }

        match suffix {
            Some(field) => self.leaf(
                ScopeKind::Operator,
                Some(AstNode::binary(
                    OperatorKind::FieldAccess,
                    AstNode::text(name),
                    AstNode::text(field),
                )),
            ),
            None => self.leaf(ScopeKind::Text, Some(AstNode::text(name))),
        }
        Ok(last)
    }

    /// Whether the first significant span at or after `i` can begin an
    /// operand of a bare macro call.
    ///
    /// A `-` or `+` only counts when it is glued to what follows, so
    /// ` a -b` is a call while ` a - b` stays a subtraction.
    fn starts_operand(&self, i: usize) -> bool {
        let line = self.line;
        let rest = match self.spans.get(i..) {
            Some(rest) => rest,
            None => return false,
        };
        let at = match rest.iter().position(|s| s.is_significant()) {
            Some(at) => at,
            None => return false,
        };
        let span = rest[at];
        match span.kind {
            SpanKind::MathOperator => match span.text(line) {
                "~" | "!" => true,
                "-" | "+" => rest
                    .get(at + 1)
                    .map_or(false, |next| next.start == span.end && opens_value(next.kind)),
                _ => false,
            },
            kind => opens_value(kind),
        }
    }

    /// A `.` not consumed as a name suffix or float point.
    fn dot(&mut self, i: usize) -> Result<usize, SyntaxError> {
        let span = self.spans[i];
        let after_value = i > 0 && {
            let prev = self.spans[i - 1];
            prev.end == span.start
                && matches!(
                    prev.kind,
                    SpanKind::Text
                        | SpanKind::Number
                        | SpanKind::String
                        | SpanKind::CloseParen
                        | SpanKind::CloseBracket
                )
        };
        if after_value {
            self.leaf(
                ScopeKind::Operator,
                Some(AstNode::operator(OperatorKind::FieldAccess)),
            );
            return Ok(i);
        }
        if self.kind_at(i + 1) == Some(SpanKind::Text) {
            return self.text(i + 1, span.start);
        }
        Err(SyntaxError::UnknownOperator {
            operator: String::from("."),
            offset: span.start,
        })
    }

    fn finish(mut self) -> Result<ScopeNode, SyntaxError> {
        while let Some(opener) = self.top() {
            match opener {
                Opener::Macro { bare: true, .. } | Opener::Argument { bare: true, .. } => {
                    self.close();
                }
                Opener::Paren { offset }
                | Opener::Macro { offset, .. }
                | Opener::Argument { offset, .. } => {
                    return Err(SyntaxError::UnclosedDelimiter {
                        delimiter: '(',
                        offset,
                    })
                }
                Opener::Bracket { offset } => {
                    return Err(SyntaxError::UnclosedDelimiter {
                        delimiter: '[',
                        offset,
                    })
                }
            }
        }
        Ok(self.root)
    }
}

/// Resolve backslash escapes in string contents. Unknown escapes are kept
/// as written.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Span kinds that can open a value.
fn opens_value(kind: SpanKind) -> bool {
    matches!(
        kind,
        SpanKind::Text
            | SpanKind::Number
            | SpanKind::String
            | SpanKind::OpenParen
            | SpanKind::OpenBracket
            | SpanKind::Dot
            | SpanKind::BlockStart
    )
}
