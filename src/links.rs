//! Root-relative link fixing for relocated pages.
//!
//! A page copied from `page123.html` to `about/index.html` sits one directory
//! deeper, so its relative references (`css/grid.css`, `page456.html`) now
//! resolve under `/about/`. Prefixing them with `/` restores the original
//! targets.
//!
//! The document is parsed with `tl` to find the attributes to fix:
//!
//! | Element | Attributes |
//! |---------|------------|
//! | `a`, `link` | `href` |
//! | `img`, `script` | `href`, `src` |
//!
//! Attribute names match in any case (`HREF`, `Src`). Tags that only exist
//! inside the text of `script`, `style` or `textarea` are skipped.
//!
//! Edits are inserted at the attribute value positions the parser reports,
//! leaving the rest of the document byte-for-byte intact. `tl`'s serializer is
//! not used because it drops the doctype and closes void elements.

use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTML parse error: {0}")]
    Parse(String),
}

const HREF_TAGS: &[&str] = &["a", "img", "script", "link"];
const SRC_TAGS: &[&str] = &["img", "script"];

/// Start tag of an element whose contents are text, not markup.
static RAW_TEXT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(script|style|textarea)\b[^>]*>").unwrap());

/// A document with its links rewritten.
#[derive(Debug)]
pub struct FixedLinks {
    pub html: String,
    /// Number of attribute values that gained a leading `/`.
    pub edits: usize,
}

/// Whether `value` is a relative reference that should become root-relative.
///
/// Already-rooted paths (including protocol-relative `//host`), empty values,
/// fragment- and query-only references, and anything with a scheme
/// (`https:`, `mailto:`, `data:`) are left alone. Leading whitespace is
/// ignored.
pub fn needs_root(value: &str) -> bool {
    let value = value.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if value.is_empty() || value.starts_with(['/', '#', '?']) {
        return false;
    }
    Url::parse(value).is_err()
}

/// Make the relative references in `html` root-relative.
///
/// Markup that only appears inside the text of `script`, `style` and
/// `textarea` elements is not touched.
///
/// Returns `Ok(None)` when nothing needs fixing.
pub fn root_relative_links(html: &str) -> Result<Option<FixedLinks>, LinkError> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| LinkError::Parse(format!("{e:?}")))?;
    let opaque = raw_text_bodies(html);

    let mut inserts = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        let name = tag.name().as_utf8_str();
        for (key, value) in tag.attributes().iter() {
            let Some(value) = value else {
                continue;
            };
            let fixable = (key.eq_ignore_ascii_case("href") && is_one_of(&name, HREF_TAGS))
                || (key.eq_ignore_ascii_case("src") && is_one_of(&name, SRC_TAGS));
            if !fixable || !needs_root(&value) {
                continue;
            }
            let Some(start) = span_offset(html, value.as_bytes()) else {
                continue;
            };
            let offset = start + leading_whitespace(&value);
            if !opaque.iter().any(|body| body.contains(&offset)) {
                inserts.push(offset);
            }
        }
    }

    if inserts.is_empty() {
        return Ok(None);
    }
    inserts.sort_unstable();
    inserts.dedup();

    let mut out = String::with_capacity(html.len() + inserts.len());
    let mut last = 0;
    for &offset in &inserts {
        out.push_str(&html[last..offset]);
        out.push('/');
        last = offset;
    }
    out.push_str(&html[last..]);

    Ok(Some(FixedLinks {
        html: out,
        edits: inserts.len(),
    }))
}

fn is_one_of(name: &str, tags: &[&str]) -> bool {
    tags.iter().any(|t| name.eq_ignore_ascii_case(t))
}

fn leading_whitespace(value: &str) -> usize {
    value.len() - value.trim_start_matches(|c: char| c.is_ascii_whitespace()).len()
}

/// Byte ranges of the contents of `script`, `style` and `textarea` elements.
///
/// `tl` parses tags inside these bodies as if they were markup, so fake
/// elements built by inline JavaScript show up among the nodes. An HTML
/// tokenizer ends such a body at the first matching close tag, and so does
/// this scan. An unclosed body runs to the end of the document.
fn raw_text_bodies(html: &str) -> Vec<Range<usize>> {
    let mut bodies = Vec::new();
    let mut pos = 0;
    while let Some(caps) = RAW_TEXT_OPEN.captures_at(html, pos) {
        let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let start = open.end();
        let close = format!("</{}", name.as_str());
        let end = find_ignore_case(&html[start..], &close).map_or(html.len(), |i| start + i);
        bodies.push(start..end);
        pos = end;
    }
    bodies
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Byte offset of `value` inside `html`, if it is a borrowed slice of it.
fn span_offset(html: &str, value: &[u8]) -> Option<usize> {
    let start = (value.as_ptr() as usize).checked_sub(html.as_ptr() as usize)?;
    let end = start.checked_add(value.len())?;
    let in_place = html.as_bytes().get(start..end) == Some(value);
    (in_place && html.is_char_boundary(start)).then_some(start)
}

/// Rewrite the links of the HTML file at `path` in place.
///
/// Returns the number of edits; the file is only written when it changed.
pub fn fix_links(path: &Path) -> Result<usize, LinkError> {
    let html = fs::read_to_string(path)?;
    match root_relative_links(&html)? {
        Some(fixed) => {
            fs::write(path, &fixed.html)?;
            Ok(fixed.edits)
        }
        None => Ok(0),
    }
}
