//! HTML → Markdown via `html2md`.

use once_cell::sync::Lazy;
use regex::Regex;

use docmark_core::{Error, Result};

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

pub fn to_markdown(bytes: &[u8]) -> Result<String> {
    let html = String::from_utf8_lossy(bytes);
    let html = html.trim_start_matches('\u{feff}');
    if html.trim().is_empty() {
        return Err(Error::Conversion("empty HTML document".into()));
    }

    let html = SCRIPT_RE.replace_all(html, "");
    let html = STYLE_RE.replace_all(&html, "");
    let html = COMMENT_RE.replace_all(&html, "");

    Ok(html2md::parse_html(&html))
}
