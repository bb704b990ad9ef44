//! Rewrite-rule manifest parsing.
//!
//! Builder exports ship an Apache-style manifest (`htaccess`) that maps pretty
//! folder URLs onto flat page files:
//!
//! ```text
//! RewriteEngine On
//! RewriteRule ^about$ page123.html [NC]       # relocate → about/index.html
//! RewriteRule ^about/$ page123.html [NC]      # end-anchor, skipped
//! RewriteRule /contacts/ page456.html [L]     # relocate → contacts/index.html
//! RewriteRule /robots/ robots.txt [L]         # not a page, skipped
//! ```
//!
//! Only the first two whitespace-separated tokens after `RewriteRule` matter;
//! flags and anything else on the line are ignored. Lines that are not rewrite
//! directives are dropped without error.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static RULE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RewriteRule\s+(\S+)\s+(\S+)").unwrap());

/// One `RewriteRule` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRule {
    /// 1-based line number in the manifest.
    pub line: usize,
    /// Folder pattern, e.g. `/about/` or `^about$`.
    pub target: String,
    /// Flat file the folder should serve, e.g. `page123.html`.
    pub source: String,
}

/// What the relocator should do with a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleAction {
    /// Copy the source into `folder` (relative to the export root).
    Relocate { folder: String },
    /// Target ends in `/$`: the URL already resolves, nothing to move.
    EndAnchor,
    /// Source is not an HTML page.
    NotHtml,
    /// Target cleans to nothing; relocating would replace the root index.
    EmptyFolder,
    /// Target contains `.`/`..` segments or backslashes.
    UnsafeFolder,
    /// Source is absolute or climbs out of the export root.
    UnsafeSource,
}

impl RewriteRule {
    pub fn action(&self) -> RuleAction {
        if self.target.ends_with("/$") {
            return RuleAction::EndAnchor;
        }
        if !self.source.contains(".html") {
            return RuleAction::NotHtml;
        }
        if self.source.starts_with('/') || !is_plain_relative(&self.source) {
            return RuleAction::UnsafeSource;
        }
        let folder = clean_folder(&self.target);
        if folder.is_empty() {
            return RuleAction::EmptyFolder;
        }
        if !is_plain_relative(folder) {
            return RuleAction::UnsafeFolder;
        }
        RuleAction::Relocate {
            folder: folder.to_string(),
        }
    }
}

/// No backslashes and no `.`/`..` segments.
fn is_plain_relative(path: &str) -> bool {
    !path.contains('\\') && !path.split('/').any(|seg| seg == "." || seg == "..")
}

/// Strip regex anchors and surrounding slashes from a target folder pattern.
///
/// - `/about/` → `about`
/// - `^about$` → `about`
/// - `/blog/2024/` → `blog/2024`
pub fn clean_folder(target: &str) -> &str {
    let target = target.strip_prefix('^').unwrap_or(target);
    let target = target.strip_suffix('$').unwrap_or(target);
    target.trim_matches('/')
}

/// Parse every rewrite directive in a manifest, in file order.
pub fn parse_rules(manifest: &str) -> Vec<RewriteRule> {
    let mut rules = Vec::new();
    for (index, line) in manifest.lines().enumerate() {
        match RULE_LINE.captures(line) {
            Some(caps) => rules.push(RewriteRule {
                line: index + 1,
                target: caps[1].to_string(),
                source: caps[2].to_string(),
            }),
            None if line.trim_start().starts_with("RewriteRule") => {
                debug!("Ignoring malformed rewrite rule on line {}: {line:?}", index + 1);
            }
            None => {}
        }
    }
    rules
}
