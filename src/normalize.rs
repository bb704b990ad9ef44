//! Absolute CDN URL rewriting.
//!
//! Stage 2 of the migration. Builder exports reference their own assets with
//! absolute CDN URLs such as `"https://static.tildacdn.com/js/tilda-scripts.js"`.
//! Served from another host those keep loading from the builder, so every
//! quoted absolute URL that
//!
//! 1. contains one of the fixable path prefixes (`/js`, `/css`, `/images`), and
//! 2. points at a trusted host (one whose name contains a configured marker)
//!
//! is rewritten to root-relative form starting at the prefix:
//!
//! ```text
//! "https://static.tildacdn.com/js/tilda-scripts.js"  →  "/js/tilda-scripts.js"
//! 'https://static.tildacdn.com/css/grid.css?v=3'     →  '/css/grid.css?v=3'
//! "https://cdn.jsdelivr.net/npm/x/js/x.js"           →  unchanged (untrusted host)
//! ```
//!
//! Replacement is textual over the whole file: once a URL qualifies, every
//! occurrence of that exact string is replaced, quoted or not.

use crate::config::UrlConfig;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Outcome of a normalization pass.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    /// Files whose content changed, in processing order.
    pub rewritten: Vec<PathBuf>,
    /// Distinct URLs rewritten, summed over all files.
    pub urls: usize,
}

/// Text after rewriting, with the number of distinct URLs replaced.
#[derive(Debug)]
pub struct Rewritten {
    pub text: String,
    pub urls: usize,
}

/// Compiled rewriting rules for one [`UrlConfig`].
pub struct UrlRewriter {
    pattern: Regex,
    prefixes: Vec<String>,
    trusted_hosts: Vec<String>,
}

impl UrlRewriter {
    pub fn new(config: &UrlConfig) -> Result<Self, NormalizeError> {
        let alternatives = config
            .fixable_prefixes
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(
            r#"["'](https?://[^"']*({alternatives})[^"']*)["']"#
        ))?;
        Ok(Self {
            pattern,
            prefixes: config.fixable_prefixes.clone(),
            trusted_hosts: config
                .trusted_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
        })
    }

    /// Rewrite every qualifying URL in `text`.
    ///
    /// Returns `None` when nothing qualifies, so callers can leave the file
    /// untouched.
    pub fn rewrite(&self, text: &str) -> Option<Rewritten> {
        if !self.prefixes.iter().any(|p| text.contains(p.as_str())) {
            return None;
        }

        let mut replacements: BTreeMap<&str, String> = BTreeMap::new();
        for caps in self.pattern.captures_iter(text) {
            let (Some(url), Some(prefix)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if replacements.contains_key(url.as_str()) {
                continue;
            }
            if let Some(relative) = self.root_relative(url.as_str(), prefix.as_str()) {
                replacements.insert(url.as_str(), relative);
            }
        }
        if replacements.is_empty() {
            return None;
        }

        // Longest first: a URL that prefixes another must not clip it
        let mut ordered: Vec<(&str, String)> = replacements.into_iter().collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        let urls = ordered.len();
        let mut out = text.to_string();
        for (from, to) in &ordered {
            out = out.replace(*from, to);
        }
        Some(Rewritten { text: out, urls })
    }

    /// Root-relative form of `url` starting at `prefix`, if `url` is internal.
    ///
    /// Only the path/query/fragment part is searched for the prefix, so a
    /// host like `jsdelivr.net` can never be mistaken for a `/js` path.
    pub fn root_relative(&self, url: &str, prefix: &str) -> Option<String> {
        if !self.is_trusted(url) {
            return None;
        }
        let tail = path_tail(url)?;
        let start = tail.find(prefix)?;
        Some(tail[start..].to_string())
    }

    /// Whether the URL's host contains a trusted host marker.
    pub fn is_trusted(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.trusted_hosts.iter().any(|marker| host.contains(marker.as_str()))
    }
}

/// The raw text of `url` from the end of its authority onward.
fn path_tail(url: &str) -> Option<&str> {
    let after_scheme = &url[url.find("://")? + 3..];
    let start = after_scheme.find(['/', '?', '#'])?;
    Some(&after_scheme[start..])
}

/// Rewrite internal absolute URLs in every page, in place.
///
/// Non-UTF-8 files are skipped. A file is written at most once, and only
/// when its content changed.
pub fn normalize_urls(
    pages: &[PathBuf],
    config: &UrlConfig,
) -> Result<NormalizeReport, NormalizeError> {
    let rewriter = UrlRewriter::new(config)?;
    let mut report = NormalizeReport::default();

    for page in pages {
        let bytes = fs::read(page)?;
        let Ok(text) = String::from_utf8(bytes) else {
            debug!("Skipping non-text file {}", page.display());
            continue;
        };
        if let Some(rewritten) = rewriter.rewrite(&text) {
            fs::write(page, &rewritten.text)?;
            info!(
                urls = rewritten.urls,
                "Rewrote absolute URLs to root-relative in {}",
                page.display()
            );
            report.urls += rewritten.urls;
            report.rewritten.push(page.clone());
        }
    }

    Ok(report)
}
