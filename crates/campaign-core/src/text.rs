//! Text cleanup applied to user input before it is sent to the remote API.

/// Escape HTML special characters
pub fn esc_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Strip tags and control whitespace, collapse runs of spaces and trim
pub fn sanitize_text_field(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '\n' | '\r' | '\t' => stripped.push(' '),
            other => stripped.push(other),
        }
    }
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the backslashes added by the host's magic quoting
pub fn unslash(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esc_html() {
        assert_eq!(esc_html("Tom & Jerry's <b>"), "Tom &amp; Jerry&#039;s &lt;b&gt;");
    }

    #[test]
    fn test_sanitize_text_field() {
        assert_eq!(
            sanitize_text_field("  <em>Spring</em>\tSale \n 2024  "),
            "Spring Sale 2024"
        );
    }

    #[test]
    fn test_unslash() {
        assert_eq!(unslash(r#"It\'s \"on\""#), r#"It's "on""#);
    }
}
