//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the site's `config.toml`, which is in turn overridden by a
//! couple of environment variables for values that should stay out of
//! version control.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Site config (optional)
//! └── assets/                  # Copied to the output root (logo, favicon)
//!     └── images/
//!         └── logo.svg
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "spacetraveling"
//! lang = "pt-BR"
//! logo = "/images/logo.svg"
//! date_locale = "pt_BR"     # pt_BR | en_US
//! load_more_label = "Carregar mais posts"
//! footer = ""
//!
//! [cms]
//! endpoint = ""             # e.g. https://my-repo.cdn.prismic.io/api/v2
//! document_type = "posts"
//! page_size = 20            # Posts per listing batch (1-100)
//! max_pages = 0             # Stop after N listing requests (0 = no limit)
//! timeout_secs = 30
//!
//! [reading]
//! words_per_minute = 200
//!
//! [cache]
//! revalidate_secs = 86400   # Reuse cached API responses younger than this
//!
//! [colors.light]
//! background = "#ffffff"
//! ...
//!
//! [processing]
//! max_processes = 4         # Max parallel render workers (omit for auto = CPU cores)
//! ```
//!
//! ## Environment
//!
//! - `PRISMIC_API_ENDPOINT` overrides `cms.endpoint`
//! - `PRISMIC_ACCESS_TOKEN` sets `cms.access_token`
//!
//! Unknown keys are rejected to catch typos early.

use crate::reading::DEFAULT_WORDS_PER_MINUTE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Titles, labels and locale of the rendered site.
    pub site: SiteSettings,
    /// Where and how to query the CMS.
    pub cms: CmsConfig,
    /// Reading-time estimate settings.
    pub reading: ReadingConfig,
    /// API response cache settings.
    pub cache: CacheConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cms.page_size == 0 || self.cms.page_size > 100 {
            return Err(ConfigError::Validation(
                "cms.page_size must be 1-100".into(),
            ));
        }
        if self.cms.document_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cms.document_type must not be empty".into(),
            ));
        }
        if self.cms.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "cms.timeout_secs must be non-zero".into(),
            ));
        }
        if self.reading.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "reading.words_per_minute must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Presentation settings for the rendered pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    /// Site name, used in page titles.
    pub title: String,
    /// Value of the `<html lang>` attribute.
    pub lang: String,
    /// Path of the header logo, relative to the output root.
    pub logo: String,
    /// Locale for month names in publication dates.
    pub date_locale: DateLocale,
    /// Text of the link to the next listing page.
    pub load_more_label: String,
    /// Footer text; no footer is rendered when empty.
    pub footer: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            lang: "pt-BR".to_string(),
            logo: "/images/logo.svg".to_string(),
            date_locale: DateLocale::default(),
            load_more_label: "Carregar mais posts".to_string(),
            footer: String::new(),
        }
    }
}

/// Locales available for publication dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateLocale {
    #[default]
    #[serde(rename = "pt_BR")]
    PtBr,
    #[serde(rename = "en_US")]
    EnUs,
}

impl DateLocale {
    pub fn chrono_locale(self) -> chrono::Locale {
        match self {
            DateLocale::PtBr => chrono::Locale::pt_BR,
            DateLocale::EnUs => chrono::Locale::en_US,
        }
    }
}

/// CMS connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CmsConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub endpoint: String,
    /// Access token for private repositories. Prefer the environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Custom type of the post documents.
    pub document_type: String,
    /// Posts per listing batch.
    pub page_size: u32,
    /// Stop after this many listing requests (the first page included),
    /// even if the cursor is still live. Zero means follow it to the end.
    pub max_pages: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 20,
            max_pages: 0,
            timeout_secs: 30,
        }
    }
}

impl CmsConfig {
    /// Request limit as an option: `None` when unlimited.
    pub fn page_limit(&self) -> Option<u32> {
        (self.max_pages > 0).then_some(self.max_pages)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadingConfig {
    /// Reading speed for the estimate shown on post pages.
    pub words_per_minute: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum age of a cached API response before it is fetched again.
    pub revalidate_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            revalidate_secs: 24 * 60 * 60,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Background color.
    pub background: String,
    /// Primary text color.
    pub text: String,
    /// Muted/secondary text color (post info, subtitles).
    pub text_muted: String,
    /// Border color.
    pub border: String,
    /// Link color.
    pub link: String,
    /// Link hover color.
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1a1d23".to_string(),
            text_muted: "#6b7280".to_string(),
            border: "#e5e7eb".to_string(),
            link: "#ff57b2".to_string(),
            link_hover: "#d43f91".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1a1d23".to_string(),
            text: "#f8f8f8".to_string(),
            text_muted: "#bbbbbb".to_string(),
            border: "#2f3340".to_string(),
            link: "#ff57b2".to_string(),
            link_hover: "#ff8fcb".to_string(),
        }
    }
}

impl ColorScheme {
    /// `(name, value)` pairs, named as `static/style.css` reads them
    /// (`var(--color-<name>)`).
    pub fn css_variables(&self) -> [(&'static str, &str); 6] {
        [
            ("bg", self.background.as_str()),
            ("text", self.text.as_str()),
            ("text-muted", self.text_muted.as_str()),
            ("border", self.border.as_str()),
            ("link", self.link.as_str()),
            ("link-hover", self.link_hover.as_str()),
        ]
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value and deserialize.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Apply environment overrides. `lookup` is `std::env::var` in production.
pub fn apply_env_overrides(config: &mut SiteConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
        config.cms.endpoint = endpoint;
    }
    if let Some(token) = lookup(ACCESS_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
        config.cms.access_token = Some(token);
    }
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// applies environment overrides, and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    let mut config = resolve_config(base, overlay)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Inkpress Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Site name, shown in every page title.
title = "spacetraveling"

# Language of the generated pages (<html lang="...">).
lang = "pt-BR"

# Header logo, relative to the output root. Put the file under assets/.
logo = "/images/logo.svg"

# Month names in publication dates: "pt_BR" (15 mar 2022) or "en_US" (15 Mar 2022).
date_locale = "pt_BR"

# Label of the link to the next listing page.
load_more_label = "Carregar mais posts"

# Footer text. Leave empty for no footer.
footer = ""

# ---------------------------------------------------------------------------
# CMS
# ---------------------------------------------------------------------------
[cms]
# API root of the repository. Can also be set with PRISMIC_API_ENDPOINT.
endpoint = ""

# Access token for private repositories. Prefer PRISMIC_ACCESS_TOKEN.
# access_token = ""

# Custom type of the post documents.
document_type = "posts"

# Posts per listing batch (1-100). Each batch is one home page.
page_size = 20

# Stop after this many listing requests, the first page included
# (0 = no limit). Empty pages count too.
max_pages = 0

# Per-request timeout in seconds.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Reading time
# ---------------------------------------------------------------------------
[reading]
# Words per minute used for the "N min" estimate on post pages.
words_per_minute = 200

# ---------------------------------------------------------------------------
# API response cache
# ---------------------------------------------------------------------------
[cache]
# Cached responses younger than this are reused (seconds). Pass --no-cache
# to refetch everything.
revalidate_secs = 86400

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1a1d23"
text_muted = "#6b7280"    # Post info, subtitles
border = "#e5e7eb"
link = "#ff57b2"
link_hover = "#d43f91"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#1a1d23"
text = "#f8f8f8"
text_muted = "#bbbbbb"
border = "#2f3340"
link = "#ff57b2"
link_hover = "#ff8fcb"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel page-rendering workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// CSS custom properties for both color schemes; dark applies through
/// `prefers-color-scheme`.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    let declarations = |scheme: &ColorScheme, indent: &str| {
        scheme
            .css_variables()
            .iter()
            .map(|(name, value)| format!("{indent}--color-{name}: {value};\n"))
            .collect::<String>()
    };
    format!(
        ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}",
        declarations(&colors.light, "    "),
        declarations(&colors.dark, "        "),
    )
}
