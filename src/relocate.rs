//! Rewrite-rule relocation.
//!
//! Stage 3 of the migration. Every actionable rule in the manifest turns a
//! flat page into a folder index, so a plain file server can answer the pretty
//! URL without rewrite support:
//!
//! ```text
//! RewriteRule /about/ page123.html [L]
//!
//! export/page123.html  ──copy──▶  export/about/index.html  (links made root-relative)
//! ```
//!
//! Sources are copied, never moved: the flat page stays where it was, so
//! several rules may point at the same source and old links keep working.
//! Rules run in manifest order, and a later rule with the same folder
//! overwrites an earlier one.
//!
//! A rule whose source is missing is logged and skipped. I/O failures and a
//! missing manifest abort the run.

use crate::config::RulesConfig;
use crate::links::{self, LinkError};
use crate::rules::{self, RewriteRule, RuleAction};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Rewrite-rule manifest not found: {0}")]
    ManifestMissing(PathBuf),
    #[error("Link fixing failed: {0}")]
    Links(#[from] LinkError),
}

/// One applied rule.
#[derive(Debug)]
pub struct Relocation {
    pub rule: RewriteRule,
    /// Clean folder relative to the export root, e.g. `about`.
    pub folder: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// References made root-relative in the copied page.
    pub link_edits: usize,
}

/// Outcome of a relocation pass.
#[derive(Debug, Default)]
pub struct RelocationReport {
    pub relocated: Vec<Relocation>,
    /// Rules whose source file does not exist.
    pub missing: Vec<RewriteRule>,
    /// Rules that were not actionable, with the reason.
    pub skipped: Vec<(RewriteRule, RuleAction)>,
}

/// Apply every rule of the manifest at `root`.
pub fn relocate_pages(
    root: &Path,
    config: &RulesConfig,
) -> Result<RelocationReport, RelocateError> {
    let manifest_path = root.join(&config.manifest);
    if !manifest_path.is_file() {
        return Err(RelocateError::ManifestMissing(manifest_path));
    }
    let manifest = fs::read_to_string(&manifest_path)?;

    let mut report = RelocationReport::default();
    // Destinations written by this run; anything else already there predates it
    let mut written: HashSet<PathBuf> = HashSet::new();

    for rule in rules::parse_rules(&manifest) {
        let folder = match rule.action() {
            RuleAction::Relocate { folder } => folder,
            action @ (RuleAction::EndAnchor | RuleAction::NotHtml) => {
                debug!(
                    "Skipping rule on line {} ({} → {}): {action:?}",
                    rule.line, rule.target, rule.source
                );
                report.skipped.push((rule, action));
                continue;
            }
            action @ (RuleAction::EmptyFolder
            | RuleAction::UnsafeFolder
            | RuleAction::UnsafeSource) => {
                warn!(
                    "Refusing rule on line {} ({} → {}): {action:?}",
                    rule.line, rule.target, rule.source
                );
                report.skipped.push((rule, action));
                continue;
            }
        };

        let source = root.join(&rule.source);
        if !source.is_file() {
            error!(
                "File {} not found, cannot relocate it to {folder}/ (line {})",
                rule.source, rule.line
            );
            report.missing.push(rule);
            continue;
        }

        let dir = root.join(&folder);
        fs::create_dir_all(&dir)?;
        let destination = dir.join(&config.index_name);
        if destination.exists() && !written.contains(&destination) {
            warn!(
                "{} already exists and will be replaced; re-running over a migrated export is unsupported",
                destination.display()
            );
        }

        fs::copy(&source, &destination)?;
        let link_edits = links::fix_links(&destination)?;
        written.insert(destination.clone());
        info!(
            links = link_edits,
            "Copied {} → {folder}/{}",
            rule.source,
            config.index_name
        );

        report.relocated.push(Relocation {
            rule,
            folder,
            source,
            destination,
            link_edits,
        });
    }

    Ok(report)
}
