//! Migration configuration.
//!
//! Every stage of the pipeline reads its tunables from [`MigrateConfig`]. The
//! stock defaults match a typical site builder export; a TOML file passed with
//! `--config` overrides any subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scan]
//! excluded_dir = "images"                        # Directory name never scanned
//!
//! [urls]
//! fixable_prefixes = ["/js", "/css", "/images"]  # Paths rewritten to root-relative
//! trusted_hosts = ["tilda"]                      # Host markers of the builder's own CDN
//!
//! [rules]
//! manifest = "htaccess"                          # Rewrite-rule manifest at the export root
//! index_name = "index.html"                      # Name of relocated pages
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [urls]
//! trusted_hosts = ["tildacdn", "tilda.ws"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Migration configuration.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Export tree traversal settings.
    pub scan: ScanConfig,
    /// Absolute URL rewriting settings.
    pub urls: UrlConfig,
    /// Rewrite-rule relocation settings.
    pub rules: RulesConfig,
}

impl MigrateConfig {
    /// Validate config values are usable by the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_plain_name(&self.scan.excluded_dir) {
            return Err(ConfigError::Validation(
                "scan.excluded_dir must be a non-empty directory name without '/'".into(),
            ));
        }
        if self.urls.fixable_prefixes.is_empty() {
            return Err(ConfigError::Validation(
                "urls.fixable_prefixes must not be empty".into(),
            ));
        }
        for prefix in &self.urls.fixable_prefixes {
            if !prefix.starts_with('/') || prefix.len() < 2 {
                return Err(ConfigError::Validation(format!(
                    "urls.fixable_prefixes entry {prefix:?} must look like \"/name\""
                )));
            }
        }
        if self.urls.trusted_hosts.is_empty()
            || self.urls.trusted_hosts.iter().any(|h| h.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "urls.trusted_hosts must list at least one non-empty host marker".into(),
            ));
        }
        if !is_plain_name(&self.rules.manifest) {
            return Err(ConfigError::Validation(
                "rules.manifest must be a non-empty file name without '/'".into(),
            ));
        }
        if !is_plain_name(&self.rules.index_name) {
            return Err(ConfigError::Validation(
                "rules.index_name must be a non-empty file name without '/'".into(),
            ));
        }
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\')
}

/// Export tree traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Directory name whose subtree is never scanned (binary image assets).
    pub excluded_dir: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            excluded_dir: "images".to_string(),
        }
    }
}

/// Absolute URL rewriting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlConfig {
    /// Path prefixes whose absolute URLs are rewritten to root-relative form.
    pub fixable_prefixes: Vec<String>,
    /// Substrings identifying the builder's own hosts. A URL is internal
    /// when its host contains one of them (case-insensitive).
    pub trusted_hosts: Vec<String>,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            fixable_prefixes: vec!["/js".into(), "/css".into(), "/images".into()],
            trusted_hosts: vec!["tilda".into()],
        }
    }
}

/// Rewrite-rule relocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// File name of the rule manifest at the export root.
    pub manifest: String,
    /// Name given to every relocated page inside its new folder.
    pub index_name: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            manifest: "htaccess".to_string(),
            index_name: "index.html".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MigrateConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MigrateConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MigrateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// Without a path the stock defaults are used. A given path must exist; its
/// values are merged on top of the defaults and the result validated.
pub fn load_config(path: Option<&Path>) -> Result<MigrateConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Printed by `--print-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# site-export-fix configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Export scanning
# ---------------------------------------------------------------------------
[scan]
# Directory name whose subtree is skipped entirely (binary image assets).
excluded_dir = "images"

# ---------------------------------------------------------------------------
# Absolute URL rewriting
# ---------------------------------------------------------------------------
[urls]
# Quoted http(s) URLs containing one of these path prefixes are rewritten
# to root-relative form, e.g. "https://static.cdn.example/js/app.js" -> "/js/app.js".
fixable_prefixes = ["/js", "/css", "/images"]

# Only URLs whose host contains one of these markers are rewritten.
# Anything else is treated as a genuinely external URL and left alone.
trusted_hosts = ["tilda"]

# ---------------------------------------------------------------------------
# Rewrite-rule relocation
# ---------------------------------------------------------------------------
[rules]
# Rule manifest at the export root, one "RewriteRule <folder> <page>" per line.
manifest = "htaccess"

# File name each relocated page gets inside its folder.
index_name = "index.html"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_url_settings() {
        let config = MigrateConfig::default();
        assert_eq!(config.urls.fixable_prefixes, vec!["/js", "/css", "/images"]);
        assert_eq!(config.urls.trusted_hosts, vec!["tilda"]);
    }

    #[test]
    fn default_config_has_rule_settings() {
        let config = MigrateConfig::default();
        assert_eq!(config.scan.excluded_dir, "images");
        assert_eq!(config.rules.manifest, "htaccess");
        assert_eq!(config.rules.index_name, "index.html");
    }

    #[test]
    fn default_config_is_valid() {
        assert!(MigrateConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[urls]
trusted_hosts = ["tildacdn", "tilda.ws"]
"##;
        let config: MigrateConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.urls.trusted_hosts, vec!["tildacdn", "tilda.ws"]);
        // Default values preserved
        assert_eq!(config.urls.fixable_prefixes, vec!["/js", "/css", "/images"]);
        assert_eq!(config.rules.manifest, "htaccess");
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r##"
[rules]
manifest = "htaccess"
index = "index.htm"
"##;
        let result: Result<MigrateConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn prefix_without_leading_slash_rejected() {
        let mut config = MigrateConfig::default();
        config.urls.fixable_prefixes = vec!["js".into()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("fixable_prefixes")
        ));
    }

    #[test]
    fn bare_slash_prefix_rejected() {
        let mut config = MigrateConfig::default();
        config.urls.fixable_prefixes = vec!["/".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_trusted_hosts_rejected() {
        let mut config = MigrateConfig::default();
        config.urls.trusted_hosts.clear();
        assert!(config.validate().is_err());

        config.urls.trusted_hosts = vec!["  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn nested_index_name_rejected() {
        let mut config = MigrateConfig::default();
        config.rules.index_name = "sub/index.html".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("index_name")
        ));
    }

    #[test]
    fn empty_excluded_dir_rejected() {
        let mut config = MigrateConfig::default();
        config.scan.excluded_dir = String::new();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml / load_config
    // =========================================================================

    #[test]
    fn merge_toml_overrides_nested_keys_only() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[rules]\nmanifest = \".htaccess\"\n").unwrap();
        let merged = merge_toml(base, overlay);

        let rules = merged.get("rules").unwrap();
        assert_eq!(rules.get("manifest").unwrap().as_str(), Some(".htaccess"));
        assert_eq!(rules.get("index_name").unwrap().as_str(), Some("index.html"));
    }

    #[test]
    fn load_config_returns_default_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.rules.manifest, "htaccess");
        assert_eq!(config.scan.excluded_dir, "images");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("fix.toml");
        fs::write(
            &config_path,
            r##"
[scan]
excluded_dir = "img"

[urls]
fixable_prefixes = ["/js", "/fonts"]
"##,
        )
        .unwrap();

        let config = load_config(Some(config_path.as_path())).unwrap();
        assert_eq!(config.scan.excluded_dir, "img");
        assert_eq!(config.urls.fixable_prefixes, vec!["/js", "/fonts"]);
        // Unspecified values should be defaults
        assert_eq!(config.urls.trusted_hosts, vec!["tilda"]);
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(tmp.path().join("absent.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("fix.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = load_config(Some(config_path.as_path()));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_merged_result() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("fix.toml");
        fs::write(&config_path, "[urls]\ntrusted_hosts = []\n").unwrap();

        let result = load_config(Some(config_path.as_path()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: MigrateConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = MigrateConfig::default();
        assert_eq!(config.scan.excluded_dir, defaults.scan.excluded_dir);
        assert_eq!(config.urls.fixable_prefixes, defaults.urls.fixable_prefixes);
        assert_eq!(config.urls.trusted_hosts, defaults.urls.trusted_hosts);
        assert_eq!(config.rules.manifest, defaults.rules.manifest);
        assert_eq!(config.rules.index_name, defaults.rules.index_name);
    }
}
