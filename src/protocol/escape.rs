// Escaper - turns arbitrary text into a service message literal
// https://www.jetbrains.com/help/teamcity/service-messages.html#Escaped+values

use once_cell::sync::Lazy;
use regex::Regex;

/// ANSI colour/cursor sequences: ESC up to the first `m`.
static ANSI_SEQUENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(ANSI_SEQUENCE_PATTERN).expect("invalid ansi sequence regex"));

const ANSI_SEQUENCE_PATTERN: &str = r"\x1B.*?m";

/// Escape text so it can be embedded between single quotes in a service message.
///
/// The escape character is doubled before anything else introduces a `|`.
pub fn escape(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let stripped = ANSI_SEQUENCE_REGEX.replace_all(text, "");

    let mut escaped = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            '\u{0085}' => escaped.push_str("|x"),
            '\u{2028}' => escaped.push_str("|l"),
            '\u{2029}' => escaped.push_str("|p"),
            '\'' => escaped.push_str("|'"),
            other => escaped.push(other),
        }
    }
    escaped
}
