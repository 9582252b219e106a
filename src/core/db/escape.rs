/// String Escaping Module
///
/// Escapes untrusted text for interpolation between single quotes in a query
/// template. This is the layer's only injection defense: every untrusted
/// value must be escaped before it reaches `QueryFormatter::format`.

/// Splice used in place of an embedded NUL, which would otherwise end the
/// statement text early
const NUL_SPLICE: &str = "'||char(0)||'";

/// Escapes `raw` for use inside a single-quoted SQL string literal
///
/// Single quotes are doubled. Backslashes and multi-byte text need no
/// treatment under SQLite's quoting rules and pass through unchanged.
///
/// # Examples
///
/// ```
/// use panel_db::core::db::escape_literal;
/// assert_eq!(escape_literal("O'Brien"), "O''Brien");
/// ```
pub fn escape_literal(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        match c {
            '\'' => escaped.push_str("''"),
            '\0' => escaped.push_str(NUL_SPLICE),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_literal("alice"), "alice");
        assert_eq!(escape_literal(""), "");
    }

    #[test]
    fn test_quotes_doubled() {
        assert_eq!(escape_literal("it's"), "it''s");
        assert_eq!(escape_literal("''"), "''''");
        assert_eq!(escape_literal("x' OR '1'='1"), "x'' OR ''1''=''1");
    }

    #[test]
    fn test_backslash_and_multibyte_pass_through() {
        assert_eq!(escape_literal(r"C:\temp\"), r"C:\temp\");
        assert_eq!(escape_literal("héllo wörld ✓"), "héllo wörld ✓");
    }

    #[test]
    fn test_nul_spliced_out() {
        assert_eq!(escape_literal("a\0b"), "a'||char(0)||'b");
    }
}
