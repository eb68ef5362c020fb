//! Sanitization primitives.
//!
//! These run before any value is considered safe to persist. HTML escaping
//! is the one exception: it belongs at render boundaries, not at storage.

use serde_json::Value;

/// Sanitize a single-line string value.
///
/// Non-string input coerces to the empty string. String input is stripped of
/// NUL and all other control characters (newlines included), trimmed, and
/// runs of whitespace are collapsed to a single space.
///
/// Multi-line text (notes, bio, comments) must use
/// [`sanitize_multiline`] instead, which preserves newlines.
pub fn sanitize_string(input: &Value) -> String {
    let Some(s) = input.as_str() else {
        return String::new();
    };
    let stripped: String = s.chars().filter(|c| !c.is_control()).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a multi-line string value.
///
/// Strips NUL bytes and trims, preserving interior newlines and spacing.
pub fn sanitize_multiline(input: &Value) -> String {
    let Some(s) = input.as_str() else {
        return String::new();
    };
    s.replace('\u{0}', "").trim().to_string()
}

/// Parse and clamp a numeric value.
///
/// Accepts numbers and numeric strings. Returns `None` for empty,
/// non-numeric, or non-finite input; otherwise clamps into `[min, max]` and
/// floors to an integer.
pub fn sanitize_number(input: &Value, min: i64, max: i64) -> Option<i64> {
    let parsed = match input {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }?;

    if !parsed.is_finite() {
        return None;
    }
    Some(parsed.clamp(min as f64, max as f64).floor() as i64)
}

/// Entity-encode characters with meaning in HTML: `& < > " ' /`.
///
/// For display contexts only; stored values stay unescaped.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_string_strips_nul_and_trims() {
        assert_eq!(sanitize_string(&json!("  a\u{0}b  ")), "ab");
    }

    #[test]
    fn test_sanitize_string_collapses_whitespace() {
        assert_eq!(sanitize_string(&json!("a   b\t\tc")), "a b c");
    }

    #[test]
    fn test_sanitize_string_strips_newlines() {
        assert_eq!(sanitize_string(&json!("line1\nline2")), "line1 line2");
        assert_eq!(sanitize_string(&json!("a\r\nb")), "a b");
    }

    #[test]
    fn test_sanitize_string_strips_control_characters() {
        assert_eq!(sanitize_string(&json!("a\u{1}\u{2}\u{1f}b")), "ab");
    }

    #[test]
    fn test_sanitize_string_non_string_input() {
        assert_eq!(sanitize_string(&json!(42)), "");
        assert_eq!(sanitize_string(&json!(null)), "");
        assert_eq!(sanitize_string(&json!(["a"])), "");
    }

    #[test]
    fn test_sanitize_string_idempotent() {
        let once = sanitize_string(&json!("  a\u{0}  b \n c "));
        let twice = sanitize_string(&json!(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sanitize_multiline_preserves_newlines() {
        assert_eq!(
            sanitize_multiline(&json!("  line1\nline2\u{0}  ")),
            "line1\nline2"
        );
    }

    #[test]
    fn test_sanitize_multiline_non_string_input() {
        assert_eq!(sanitize_multiline(&json!(7)), "");
    }

    #[test]
    fn test_sanitize_number_clamps() {
        assert_eq!(sanitize_number(&json!("12.9"), 0, 10), Some(10));
        assert_eq!(sanitize_number(&json!(-5), 0, 10), Some(0));
        assert_eq!(sanitize_number(&json!(7.8), 0, 10), Some(7));
    }

    #[test]
    fn test_sanitize_number_rejects_non_numeric() {
        assert_eq!(sanitize_number(&json!("abc"), 0, 10), None);
        assert_eq!(sanitize_number(&json!(""), 0, 10), None);
        assert_eq!(sanitize_number(&json!("   "), 0, 10), None);
        assert_eq!(sanitize_number(&json!(null), 0, 10), None);
        assert_eq!(sanitize_number(&json!({"n": 1}), 0, 10), None);
    }

    #[test]
    fn test_sanitize_number_numeric_string() {
        assert_eq!(sanitize_number(&json!(" 5 "), 0, 10), Some(5));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;&#x2F;script&gt;"
        );
        assert_eq!(escape_html("it's"), "it&#x27;s");
        assert_eq!(escape_html("plain"), "plain");
    }
}
