//! Placing the runtime configuration into HTML pages.
//!
//! Pages are handled as raw bytes: a page in a legacy encoding passes through
//! untouched apart from the spliced-in tags.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::{NoExpand, Regex};

/// Marker comment that pages use to say where the configuration goes.
pub const CONFIG_MARKER: &str = "<!-- vitrine:config -->";

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<!--\s*vitrine:config\s*-->").expect("Invalid marker regex")
});

// <script src="config.js"></script>, any quote style, optional path prefix,
// other attributes allowed.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i-u)<script\b[^>]*?\bsrc\s*=\s*["'](?:[^"'>]*/)?config\.js["'][^>]*>\s*</script\s*>"#,
    )
    .expect("Invalid placeholder regex")
});

static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("Invalid head regex"));

/// Where the configuration script ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    /// Replaced the `<!-- vitrine:config -->` marker
    Marker,

    /// Replaced a `<script src="config.js">` tag
    Placeholder,

    /// Inserted before `</head>`
    HeadClose,

    /// Page has no head; prepended to the document
    DocumentStart,
}

impl InjectionPoint {
    /// Whether the page lacked an explicit injection point.
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::HeadClose | Self::DocumentStart)
    }
}

/// An HTML page with the configuration script placed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injected {
    pub html: Vec<u8>,
    pub point: InjectionPoint,
}

/// Place `script` into `html`.
///
/// The first marker wins, then the first placeholder tag, then `</head>`,
/// then the start of the document. Leftover markers and placeholder tags are
/// removed so the page never asks for an external `config.js`.
pub fn inject_script(html: &[u8], script: &str) -> Injected {
    let script = script.as_bytes();

    let (html, point) = if let Some(m) = MARKER_RE.find(html) {
        (splice(html, m.range(), script), InjectionPoint::Marker)
    } else if let Some(m) = PLACEHOLDER_RE.find(html) {
        (splice(html, m.range(), script), InjectionPoint::Placeholder)
    } else if let Some(m) = HEAD_CLOSE_RE.find(html) {
        let at = m.start();
        let mut line = script.to_vec();
        line.push(b'\n');
        (splice(html, at..at, &line), InjectionPoint::HeadClose)
    } else {
        let mut out = Vec::with_capacity(script.len() + 1 + html.len());
        out.extend_from_slice(script);
        out.push(b'\n');
        out.extend_from_slice(html);
        (out, InjectionPoint::DocumentStart)
    };

    let html = MARKER_RE.replace_all(&html, &b""[..]);
    let html = PLACEHOLDER_RE.replace_all(&html, &b""[..]).into_owned();

    Injected { html, point }
}

/// Resolve the marker to a `<script src>` tag loading `file_name`.
///
/// Used when the configuration is delivered as a file. Pages without a marker
/// are returned unchanged.
pub fn link_config_file<'a>(html: &'a [u8], file_name: &str) -> Cow<'a, [u8]> {
    if !MARKER_RE.is_match(html) {
        return Cow::Borrowed(html);
    }

    let tag = format!(r#"<script src="{}"></script>"#, file_name);
    let linked = MARKER_RE.replacen(html, 1, NoExpand(tag.as_bytes()));
    Cow::Owned(MARKER_RE.replace_all(&linked, &b""[..]).into_owned())
}

fn splice(html: &[u8], range: std::ops::Range<usize>, insert: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(html.len() + insert.len());
    out.extend_from_slice(&html[..range.start]);
    out.extend_from_slice(insert);
    out.extend_from_slice(&html[range.end..]);
    out
}
