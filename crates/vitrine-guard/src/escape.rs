//! HTML escaping.

/// Escape `& < > " ' /` for safe insertion into HTML text or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }

    out
}

/// Escape text the way a DOM text node serializes it: `&`, `<` and `>` only.
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());

    for c in html.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }

    out
}

/// Whether `content` looks like markup.
pub fn contains_markup(content: &str) -> bool {
    content.contains(['<', '>'])
}

/// Content ready to be placed into an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeContent {
    /// Plain text, to be set as text content
    Text(String),

    /// Sanitized markup, to be set as inner HTML
    Markup(String),
}

/// Decide how `content` may be inserted into the page.
pub fn safe_content(content: &str) -> SafeContent {
    if contains_markup(content) {
        SafeContent::Markup(sanitize_html(content))
    } else {
        SafeContent::Text(content.to_string())
    }
}
