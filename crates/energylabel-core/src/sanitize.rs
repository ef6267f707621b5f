//! Literal escaping for the emitted SQL text.
//!
//! Pure functions, no I/O. The emitters call these on every leaf value before
//! it is spliced into a statement string.

use crate::schema::RecordValue;

/// Escape a single SQL string literal's body by backslash-escaping `'`.
/// Backslashes themselves are left alone — the driver never runs these
/// statements through a backslash-sensitive parser step of its own, and
/// doubling them would change what the stored text looks like.
pub fn escape_text(value: &str) -> String {
    value.replace('\'', "\\'")
}

/// Render a value as the literal that belongs inside the generated
/// statement text: a quoted, escaped string for `Text`, a bare digit
/// sequence for `Int`, and the `NULL` keyword for an absent optional value.
pub fn render_literal(value: Option<&RecordValue>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(RecordValue::Int(n)) => n.to_string(),
        Some(RecordValue::Text(s)) => format!("'{}'", escape_text(s)),
    }
}
