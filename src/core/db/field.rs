/// Typed Field Decoding Module
///
/// A `Field` is one cell of a buffered row, captured as text at execute time.
/// Numeric decoders are permissive: they follow scanf rules and yield zero
/// for text that does not start with a number. Strict `try_*` variants are
/// available for callers that want malformed data reported.

use std::num::IntErrorKind;
use thiserror::Error;

/// Failure of a strict field decoder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldDecodeError {
    #[error("field is NULL")]
    Null,
    #[error("'{0}' is not a number")]
    Malformed(String),
    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

/// One cell of a result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    value: Option<String>,
    raw_len: usize,
}

impl Field {
    /// Creates a text field
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        Field {
            raw_len: value.len(),
            value: Some(value),
        }
    }

    /// Creates a NULL field
    pub fn null() -> Self {
        Field {
            value: None,
            raw_len: 0,
        }
    }

    /// Creates a field from a binary payload
    ///
    /// The text form is a lossy UTF-8 view; `raw_len` keeps the payload size.
    pub fn binary(bytes: &[u8]) -> Self {
        Field {
            value: Some(String::from_utf8_lossy(bytes).into_owned()),
            raw_len: bytes.len(),
        }
    }

    /// Returns true for SQL NULL
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Length in bytes of the value as delivered by the database
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// Raw value; NULL reads as an empty string
    pub fn as_text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// Raw value, None for NULL
    pub fn as_opt_text(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Signed integer value, zero when the text is not numeric
    pub fn as_integer(&self) -> i64 {
        leading_integer(self.as_text())
            .map(|digits| match digits.parse::<i64>() {
                Ok(v) => v,
                Err(e) => saturate(&e, digits.starts_with('-'), i64::MIN, i64::MAX),
            })
            .unwrap_or(0)
    }

    /// Unsigned integer value, zero when the text is not numeric or negative
    pub fn as_unsigned(&self) -> u64 {
        match leading_integer(self.as_text()) {
            Some(digits) if digits.starts_with('-') => 0,
            Some(digits) => digits
                .trim_start_matches('+')
                .parse::<u64>()
                .unwrap_or_else(|e| saturate(&e, false, 0, u64::MAX)),
            None => 0,
        }
    }

    /// Floating point value, zero when the text is not numeric
    pub fn as_float(&self) -> f64 {
        leading_float(self.as_text())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// True iff the integer value is nonzero
    pub fn as_bool(&self) -> bool {
        self.as_integer() != 0
    }

    /// Integer value if it belongs to `valid`, otherwise `default`
    ///
    /// Lets each caller decode its own enumeration (account levels, flags)
    /// without the field knowing about it.
    pub fn as_enumerated<T>(&self, valid: &[T], default: T) -> T
    where
        T: Copy + Into<i64>,
    {
        let value = self.as_integer();
        valid
            .iter()
            .copied()
            .find(|candidate| (*candidate).into() == value)
            .unwrap_or(default)
    }

    /// Strict signed decode: the whole trimmed text must be an integer
    pub fn try_integer(&self) -> Result<i64, FieldDecodeError> {
        let text = self.strict_text()?;
        text.parse::<i64>().map_err(|e| strict_error(&e, text))
    }

    /// Strict unsigned decode: the whole trimmed text must be an unsigned integer
    pub fn try_unsigned(&self) -> Result<u64, FieldDecodeError> {
        let text = self.strict_text()?;
        text.parse::<u64>().map_err(|e| strict_error(&e, text))
    }

    /// Strict float decode: the whole trimmed text must be a number
    pub fn try_float(&self) -> Result<f64, FieldDecodeError> {
        let text = self.strict_text()?;
        text.parse::<f64>()
            .map_err(|_| FieldDecodeError::Malformed(text.to_string()))
    }

    fn strict_text(&self) -> Result<&str, FieldDecodeError> {
        self.value
            .as_deref()
            .map(str::trim)
            .ok_or(FieldDecodeError::Null)
    }
}

/// Leading whitespace, optional sign, then the longest run of digits
fn leading_integer(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let sign = usize::from(text.starts_with(&['+', '-'][..]));
    let digits = text[sign..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    (digits > 0).then(|| &text[..sign + digits])
}

/// Leading decimal number with optional fraction and exponent
fn leading_float(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(text.starts_with(&['+', '-'][..]));
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    Some(&text[..end])
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn saturate<T>(err: &std::num::ParseIntError, negative: bool, min: T, max: T) -> T
where
    T: Default,
{
    match err.kind() {
        IntErrorKind::PosOverflow => max,
        IntErrorKind::NegOverflow => min,
        _ if negative => min,
        _ => T::default(),
    }
}

fn strict_error(err: &std::num::ParseIntError, text: &str) -> FieldDecodeError {
    match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            FieldDecodeError::OutOfRange(text.to_string())
        }
        _ => FieldDecodeError::Malformed(text.to_string()),
    }
}
