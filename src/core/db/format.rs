/// Query Formatting Module
///
/// Expands printf-style templates into query strings inside a bounded buffer.
/// The formatter performs no SQL parsing; untrusted text must go through
/// `escape_literal` (or `Database::escape`) before it is passed as an argument.
///
/// ## Conversions
///
/// `%s` text, `%d`/`%i` signed integer, `%u` unsigned integer, `%f` float,
/// `%%` a literal percent sign. Each may carry a `-` (left align) flag, a `0`
/// (zero pad) flag, a width, and a `.precision` that truncates `%s` or sets
/// the decimals of `%f`.

use crate::core::{PanelDbError, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

/// Default query buffer capacity in bytes
pub const DEFAULT_QUERY_CAPACITY: usize = 512;

static SPECIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(-)?(0)?(\d+)?(?:\.(\d+))?([sdiuf%])").expect("valid conversion pattern")
});

/// A single argument for a query template
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArg {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl fmt::Display for QueryArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryArg::Text(s) => f.write_str(s),
            QueryArg::Signed(i) => write!(f, "{}", i),
            QueryArg::Unsigned(u) => write!(f, "{}", u),
            QueryArg::Float(x) => write!(f, "{:.6}", x),
        }
    }
}

macro_rules! impl_query_arg_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for QueryArg {
                fn from(value: $source) -> Self {
                    QueryArg::$variant(value as $target)
                }
            }
        )+
    };
}

impl_query_arg_from!(Signed as i64: i8, i16, i32, i64, isize);
impl_query_arg_from!(Unsigned as u64: u8, u16, u32, u64, usize);
impl_query_arg_from!(Float as f64: f32, f64);

impl From<bool> for QueryArg {
    fn from(value: bool) -> Self {
        QueryArg::Unsigned(value as u64)
    }
}

impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        QueryArg::Text(value.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        QueryArg::Text(value)
    }
}

impl From<&String> for QueryArg {
    fn from(value: &String) -> Self {
        QueryArg::Text(value.clone())
    }
}

/// Builds a `Vec<QueryArg>` from heterogeneous values
///
/// ```
/// use panel_db::query_args;
/// let args = query_args!["alice", 7u32];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! query_args {
    () => {
        ::std::vec::Vec::<$crate::core::db::QueryArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::core::db::QueryArg::from($arg)),+]
    };
}

/// Expands templates into queries of bounded size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFormatter {
    capacity: usize,
}

impl Default for QueryFormatter {
    fn default() -> Self {
        QueryFormatter::new(DEFAULT_QUERY_CAPACITY)
    }
}

impl QueryFormatter {
    /// Creates a formatter whose buffer holds `capacity` bytes
    ///
    /// As with a C buffer, one byte is reserved for the terminator, so the
    /// longest query is `capacity - 1` bytes.
    pub fn new(capacity: usize) -> Self {
        QueryFormatter { capacity }
    }

    /// Buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Expands `template` against `args`
    ///
    /// # Errors
    ///
    /// `PanelDbError::Overflow` when the expansion does not fit the buffer,
    /// `PanelDbError::Format` for unknown conversions or argument mismatches.
    pub fn format(&self, template: &str, args: &[QueryArg]) -> Result<String> {
        let mut out = String::with_capacity(template.len().min(self.capacity));
        let mut remaining = args.iter();
        let mut last = 0;

        for caps in SPECIFIER.captures_iter(template) {
            let whole = caps.get(0).expect("group 0 always matches");
            push_literal(&mut out, &template[last..whole.start()])?;
            last = whole.end();

            let spec = Spec::from_captures(&caps);
            if spec.conversion == '%' {
                out.push('%');
                continue;
            }

            // Padding is bounded by the buffer before any of it is built
            let floor = out.len().saturating_add(spec.min_len());
            if floor >= self.capacity {
                return Err(PanelDbError::Overflow {
                    required: floor.saturating_add(1),
                    capacity: self.capacity,
                });
            }

            let arg = remaining.next().ok_or_else(|| {
                PanelDbError::Format(format!(
                    "Missing argument for '{}' at byte {}",
                    whole.as_str(),
                    whole.start()
                ))
            })?;
            out.push_str(&spec.render(arg)?);
        }
        push_literal(&mut out, &template[last..])?;

        if remaining.next().is_some() {
            return Err(PanelDbError::Format(format!(
                "Too many arguments: template uses fewer than {}",
                args.len()
            )));
        }

        if out.len() >= self.capacity {
            return Err(PanelDbError::Overflow {
                required: out.len() + 1,
                capacity: self.capacity,
            });
        }

        Ok(out)
    }
}

/// Copies template text between conversions, rejecting stray `%`
fn push_literal(out: &mut String, literal: &str) -> Result<()> {
    if let Some(pos) = literal.find('%') {
        let rest: String = literal[pos..].chars().take(2).collect();
        return Err(PanelDbError::Format(format!(
            "Unsupported conversion '{}'",
            rest
        )));
    }
    out.push_str(literal);
    Ok(())
}

/// One parsed conversion
struct Spec {
    left_align: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

impl Spec {
    fn from_captures(caps: &Captures<'_>) -> Self {
        // Digit runs too long for usize can never fit a buffer
        let number = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().parse::<usize>().unwrap_or(usize::MAX))
        };
        Spec {
            left_align: caps.get(1).is_some(),
            zero_pad: caps.get(2).is_some(),
            width: number(3).unwrap_or(0),
            precision: number(4),
            conversion: caps
                .get(5)
                .and_then(|m| m.as_str().chars().next())
                .unwrap_or('s'),
        }
    }

    /// Fewest bytes this conversion can expand to
    fn min_len(&self) -> usize {
        match (self.conversion, self.precision) {
            ('f', Some(p)) => self.width.max(p),
            _ => self.width,
        }
    }

    fn render(&self, arg: &QueryArg) -> Result<String> {
        let body = match (self.conversion, arg) {
            ('s', QueryArg::Text(s)) => match self.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.clone(),
            },
            ('s', other) => other.to_string(),
            ('d' | 'i', QueryArg::Signed(i)) => i.to_string(),
            ('d' | 'i', QueryArg::Unsigned(u)) => i64::try_from(*u)
                .map_err(|_| self.mismatch(arg))?
                .to_string(),
            ('u', QueryArg::Unsigned(u)) => u.to_string(),
            ('u', QueryArg::Signed(i)) => u64::try_from(*i)
                .map_err(|_| self.mismatch(arg))?
                .to_string(),
            ('f', QueryArg::Float(x)) => self.float(*x),
            ('f', QueryArg::Signed(i)) => self.float(*i as f64),
            ('f', QueryArg::Unsigned(u)) => self.float(*u as f64),
            _ => return Err(self.mismatch(arg)),
        };
        Ok(self.pad(body))
    }

    fn float(&self, x: f64) -> String {
        format!("{:.*}", self.precision.unwrap_or(6), x)
    }

    fn pad(&self, body: String) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = self.width - len;
        if self.left_align {
            format!("{}{}", body, " ".repeat(fill))
        } else if self.zero_pad && self.conversion != 's' {
            match body.strip_prefix('-') {
                Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
                None => format!("{}{}", "0".repeat(fill), body),
            }
        } else {
            format!("{}{}", " ".repeat(fill), body)
        }
    }

    fn mismatch(&self, arg: &QueryArg) -> PanelDbError {
        PanelDbError::Format(format!(
            "Argument {:?} does not match conversion '%{}'",
            arg, self.conversion
        ))
    }
}
