//! Numeric literal decoding.
//!
//! The grouper hands every `Number` span to a [`NumberParser`]; this module
//! provides the default one. Recognized forms:
//!
//! | Form        | Radix | Example     |
//! |-------------|-------|-------------|
//! | `$` prefix  | 16    | `$FF00`     |
//! | `0x` prefix | 16    | `0x1F`      |
//! | `0b` prefix | 2     | `0b1010`    |
//! | `0o` prefix | 8     | `0o777`     |
//! | `h` suffix  | 16    | `0FFh`      |
//! | plain       | 10    | `1234`      |
//! | with `.`    | float | `1.5`       |
//!
//! `_` may be used as a digit separator anywhere after the prefix.

use core::fmt;

/// Decoded value of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumericValue {
    /// An integer literal. Literals are never negative; `-` is an operator.
    Integer(u64),
    /// A decimal floating-point literal.
    Float(f64),
}

/// The narrowest storage class that holds a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumericKind {
    /// Floating point.
    Float,
    /// Fits in 8 bits.
    U8,
    /// Fits in 16 bits.
    U16,
    /// Fits in 32 bits.
    U32,
    /// Needs 64 bits.
    U64,
}

impl NumericKind {
    /// Classify an integer by the narrowest width it fits in.
    #[must_use]
    pub fn for_integer(value: u64) -> Self {
        if value <= u64::from(u8::MAX) {
            NumericKind::U8
        } else if value <= u64::from(u16::MAX) {
            NumericKind::U16
        } else if value <= u64::from(u32::MAX) {
            NumericKind::U32
        } else {
            NumericKind::U64
        }
    }
}

/// Why a numeric literal was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberError {
    /// No digits after the prefix (or an empty span).
    Empty,
    /// A character that is not a digit in the literal's radix.
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// Radix the literal was decoded in.
        radix: u32,
    },
    /// The value does not fit in 64 bits.
    Overflow,
    /// A malformed floating-point literal.
    InvalidFloat,
}

impl fmt::Display for NumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberError::Empty => write!(f, "expected digits"),
            NumberError::InvalidDigit { digit, radix } => {
                write!(f, "'{}' is not a base-{} digit", digit, radix)
            }
            NumberError::Overflow => write!(f, "value does not fit in 64 bits"),
            NumberError::InvalidFloat => write!(f, "malformed floating-point literal"),
        }
    }
}

/// Signature of a numeric literal decoder.
pub type NumberParser = fn(&str) -> Result<(NumericValue, NumericKind), NumberError>;

/// Decode a numeric literal span.
///
/// # Errors
///
/// Returns [`NumberError`] for empty literals, digits outside the radix,
/// malformed floats, or values wider than 64 bits.
pub fn parse_number(text: &str) -> Result<(NumericValue, NumericKind), NumberError> {
    let (digits, radix) = if let Some(rest) = text.strip_prefix('$') {
        (rest, 16)
    } else if let Some(rest) = strip_hex_suffix(text) {
        (rest, 16)
    } else if let Some(rest) = strip_radix_prefix(text, b'x') {
        (rest, 16)
    } else if let Some(rest) = strip_radix_prefix(text, b'b') {
        (rest, 2)
    } else if let Some(rest) = strip_radix_prefix(text, b'o') {
        (rest, 8)
    } else if text.contains('.') {
        return parse_float(text);
    } else {
        (text, 10)
    };

    let value = parse_integer(digits, radix)?;
    Ok((NumericValue::Integer(value), NumericKind::for_integer(value)))
}

/// `NNh` (either case), where the body starts with a decimal digit. Checked
/// before radix prefixes so `0BEh` is hex rather than binary.
fn strip_hex_suffix(text: &str) -> Option<&str> {
    let rest = text.strip_suffix(['h', 'H'])?;
    if rest.as_bytes().first().map_or(false, u8::is_ascii_digit) {
        Some(rest)
    } else {
        None
    }
}

/// `0x…`, `0b…`, `0o…` (either case), as long as something follows the prefix.
fn strip_radix_prefix(text: &str, marker: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' && bytes[1].to_ascii_lowercase() == marker {
        Some(&text[2..])
    } else {
        None
    }
}

fn parse_integer(digits: &str, radix: u32) -> Result<u64, NumberError> {
    let mut value: u64 = 0;
    let mut seen = false;
    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let digit = ch
            .to_digit(radix)
            .ok_or(NumberError::InvalidDigit { digit: ch, radix })?;
        value = value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(NumberError::Overflow)?;
        seen = true;
    }
    if seen {
        Ok(value)
    } else {
        Err(NumberError::Empty)
    }
}

fn parse_float(text: &str) -> Result<(NumericValue, NumericKind), NumberError> {
    let mut buf = alloc::string::String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '_' => {}
            '0'..='9' | '.' => buf.push(ch),
            _ => return Err(NumberError::InvalidDigit { digit: ch, radix: 10 }),
        }
    }
    if !buf.bytes().any(|b| b.is_ascii_digit()) {
        return Err(NumberError::Empty);
    }
    buf.parse::<f64>()
        .map(|v| (NumericValue::Float(v), NumericKind::Float))
        .map_err(|_| NumberError::InvalidFloat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(text: &str) -> (u64, NumericKind) {
        match parse_number(text).unwrap() {
            (NumericValue::Integer(v), kind) => (v, kind),
            other => panic!("expected integer, got {:?}", other),
        }
    }

    #[test]
    fn decimal() {
        assert_eq!(int("0"), (0, NumericKind::U8));
        assert_eq!(int("255"), (255, NumericKind::U8));
        assert_eq!(int("256"), (256, NumericKind::U16));
        assert_eq!(int("70000"), (70000, NumericKind::U32));
    }

    #[test]
    fn dollar_hex() {
        assert_eq!(int("$FF"), (0xFF, NumericKind::U8));
        assert_eq!(int("$ff00"), (0xFF00, NumericKind::U16));
        assert_eq!(int("$FFFF0000"), (0xFFFF_0000, NumericKind::U32));
    }

    #[test]
    fn c_style_prefixes() {
        assert_eq!(int("0x1F"), (0x1F, NumericKind::U8));
        assert_eq!(int("0X1f"), (0x1F, NumericKind::U8));
        assert_eq!(int("0b1010"), (10, NumericKind::U8));
        assert_eq!(int("0o777"), (0o777, NumericKind::U16));
    }

    #[test]
    fn hex_suffix() {
        assert_eq!(int("0FFh"), (0xFF, NumericKind::U8));
        assert_eq!(int("1234H"), (0x1234, NumericKind::U16));
    }

    #[test]
    fn hex_suffix_wins_over_radix_prefix() {
        assert_eq!(int("0BEh"), (0xBE, NumericKind::U8));
        assert_eq!(int("0B0h"), (0xB0, NumericKind::U8));
        assert_eq!(int("0x10"), (0x10, NumericKind::U8));
        assert_eq!(int("0b101"), (0b101, NumericKind::U8));
    }

    #[test]
    fn digit_separators() {
        assert_eq!(int("1_000_000"), (1_000_000, NumericKind::U32));
        assert_eq!(int("$FF_FF"), (0xFFFF, NumericKind::U16));
    }

    #[test]
    fn sixty_four_bit() {
        assert_eq!(
            int("$FFFFFFFFFFFFFFFF"),
            (u64::MAX, NumericKind::U64)
        );
    }

    #[test]
    fn overflow() {
        assert_eq!(
            parse_number("$1FFFFFFFFFFFFFFFF"),
            Err(NumberError::Overflow)
        );
        assert_eq!(
            parse_number("99999999999999999999"),
            Err(NumberError::Overflow)
        );
    }

    #[test]
    fn float() {
        assert_eq!(
            parse_number("1.5"),
            Ok((NumericValue::Float(1.5), NumericKind::Float))
        );
        assert_eq!(
            parse_number("0.25"),
            Ok((NumericValue::Float(0.25), NumericKind::Float))
        );
    }

    #[test]
    fn empty_and_bare_prefix() {
        assert_eq!(parse_number(""), Err(NumberError::Empty));
        assert_eq!(parse_number("$"), Err(NumberError::Empty));
        assert_eq!(parse_number("$_"), Err(NumberError::Empty));
    }

    #[test]
    fn invalid_digits() {
        assert_eq!(
            parse_number("12ab"),
            Err(NumberError::InvalidDigit { digit: 'a', radix: 10 })
        );
        assert_eq!(
            parse_number("$FG"),
            Err(NumberError::InvalidDigit { digit: 'G', radix: 16 })
        );
        assert_eq!(
            parse_number("0b102"),
            Err(NumberError::InvalidDigit { digit: '2', radix: 2 })
        );
    }

    #[test]
    fn zero_followed_by_radix_letter_alone_is_decimal_error() {
        // "0x" has nothing after the prefix, so it is read as a decimal.
        assert_eq!(
            parse_number("0x"),
            Err(NumberError::InvalidDigit { digit: 'x', radix: 10 })
        );
    }
}
