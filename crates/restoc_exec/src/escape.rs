//! MySQL-compatible string escaping.

/// Escapes `raw` the way `mysql_real_escape_string` does for the
/// single-byte-safe charsets.
///
/// The result is meant to be placed between single quotes.
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}
