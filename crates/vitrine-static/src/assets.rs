//! Asset pipeline for HTML processing.

use std::sync::LazyLock;

use regex::{Captures, Regex};

// Elements whose content is whitespace-sensitive or not HTML.
static RAW_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
    )
    .expect("Invalid raw block regex")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").expect("Invalid comment regex"));

static BETWEEN_TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("Invalid whitespace regex"));

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Minify HTML.
    ///
    /// Strips comments (conditional comments survive) and removes whitespace
    /// between tags. `pre`, `textarea`, `script` and `style` elements are
    /// left untouched.
    pub fn minify_html(html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for m in RAW_BLOCK_RE.find_iter(html) {
            out.push_str(&minify_markup(&html[last..m.start()], last > 0, true));
            out.push_str(m.as_str());
            last = m.end();
        }
        out.push_str(&minify_markup(&html[last..], last > 0, false));

        out.trim().to_string()
    }
}

/// Minify markup outside raw blocks. The flags say whether a raw block sits
/// right before or after this segment, so whitespace at that seam is
/// inter-tag too.
fn minify_markup(markup: &str, after_raw: bool, before_raw: bool) -> String {
    let without_comments = COMMENT_RE.replace_all(markup, |caps: &Captures| {
        let body = &caps[1];
        if body.starts_with("[if") || body.starts_with("<![endif]") {
            caps[0].to_string()
        } else {
            String::new()
        }
    });

    let collapsed = BETWEEN_TAGS_RE.replace_all(&without_comments, "><");

    let mut segment: &str = &collapsed;
    if after_raw && (segment.trim_start().starts_with('<') || segment.trim().is_empty()) {
        segment = segment.trim_start();
    }
    if before_raw && (segment.trim_end().ends_with('>') || segment.trim().is_empty()) {
        segment = segment.trim_end();
    }
    segment.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_comments() {
        let html = "<p>a</p><!-- note --><p>b</p>";

        assert_eq!(AssetPipeline::minify_html(html), "<p>a</p><p>b</p>");
    }

    #[test]
    fn collapses_whitespace_between_tags() {
        let html = "<ul>\n    <li>one</li>\n    <li>two</li>\n</ul>\n";

        assert_eq!(
            AssetPipeline::minify_html(html),
            "<ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn keeps_text_spacing() {
        let html = "<p>hello   world</p>";

        assert_eq!(AssetPipeline::minify_html(html), html);
    }

    #[test]
    fn keeps_conditional_comments() {
        let html = "<!--[if IE]><p>old</p><![endif]-->";

        assert_eq!(AssetPipeline::minify_html(html), html);
    }

    #[test]
    fn leaves_raw_blocks_alone() {
        let html = "<div>\n  <pre>\n  keep <!-- this -->\n  </pre>\n  <script>\n  if (a > b) {}\n  </script>\n</div>";
        let minified = AssetPipeline::minify_html(html);

        assert!(minified.contains("<pre>\n  keep <!-- this -->\n  </pre>"));
        assert!(minified.contains("<script>\n  if (a > b) {}\n  </script>"));
        assert!(minified.starts_with("<div><pre>"));
    }
}
