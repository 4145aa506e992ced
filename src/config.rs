//! Site configuration module.
//!
//! Configuration is layered. Stock defaults are overridden by the user's
//! config file, which is in turn overridden by environment variables:
//!
//! ```text
//! stock defaults  →  cmsgen.toml  →  environment  →  validate  →  BuildSettings
//! ```
//!
//! Each layer is a sparse TOML table merged on top of the previous one, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! service_domain = ""            # CMS service subdomain (required for `build`)
//! api_key = ""                   # CMS API key (required for `build`)
//! endpoint_items = "article"     # List endpoint for articles
//! endpoint_categories = "category"
//! timeout_secs = 30              # Per-request timeout
//!
//! [paths]
//! resources = "resources"        # Root of the user's templates and assets
//! export = "output"              # Recreated from scratch on every build
//! # templates = "resources/templates"
//! # blog_templates = "resources/templates/blog"
//! # singles_templates = "resources/templates/singles"
//! # components = "resources/templates/components"
//! # static_assets = "resources/static"
//!
//! [pagination]
//! page_show_limit = 10           # Items per listing page
//! latest_articles = 5            # Items in the "latest" snapshot
//! free_contents_limit = 10000    # Cap for unpaginated list calls
//!
//! [render]
//! timezone = "UTC"               # IANA name used for date formatting
//! category_tag_name = "Category" # Prefix of category listing titles
//! webp_asset_prefix = "https://images.microcms-assets.io/assets/"
//!
//! [processing]
//! max_workers = 4                # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable                 | Key                             |
//! |--------------------------|---------------------------------|
//! | `MICROCMS_API_KEY`       | `source.api_key`                |
//! | `SERVICE_DOMAIN`         | `source.service_domain`         |
//! | `RESOURCES_PATH`         | `paths.resources`               |
//! | `EXPORT_PATH`            | `paths.export`                  |
//! | `TEMPLATES_PATH`         | `paths.templates`               |
//! | `BLOG_TEMPLATES_PATH`    | `paths.blog_templates`          |
//! | `SINGLES_TEMPLATES_PATH` | `paths.singles_templates`       |
//! | `COMPONENTS_PATH`        | `paths.components`              |
//! | `STATIC_PATH`            | `paths.static_assets`           |
//! | `PAGE_SHOW_LIMIT`        | `pagination.page_show_limit`    |
//! | `LATEST_ARTICLES`        | `pagination.latest_articles`    |
//! | `TIMEZONE`               | `render.timezone`               |
//! | `CATEGORY_TAG_NAME`      | `render.category_tag_name`      |
//!
//! Unknown keys in the file are rejected to catch typos early. Counts that
//! are not positive fall back to their default with a warning rather than
//! failing the build.

use crate::source::QueryPlan;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("missing required setting `{key}` (set it in the config file or via {env})")]
    Missing {
        key: &'static str,
        env: &'static str,
    },
    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("failed to parse {}: {source}", path.display())]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

pub const DEFAULT_DOTENV_FILE: &str = ".env";

pub const DEFAULT_CONFIG_FILE: &str = "cmsgen.toml";
pub const DEFAULT_PAGE_SHOW_LIMIT: i64 = 10;
pub const DEFAULT_LATEST_ARTICLES: i64 = 5;
pub const DEFAULT_FREE_CONTENTS_LIMIT: i64 = 10_000;

/// Site configuration as written in `cmsgen.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where content comes from.
    pub source: SourceConfig,
    /// Input and output directories.
    pub paths: PathsConfig,
    /// Page sizes and list caps.
    pub pagination: PaginationConfig,
    /// Template-facing settings (timezone, labels, image rewriting).
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub service_domain: String,
    pub api_key: String,
    pub endpoint_items: String,
    pub endpoint_categories: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            service_domain: String::new(),
            api_key: String::new(),
            endpoint_items: "article".to_string(),
            endpoint_categories: "category".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Directory layout. Unset derived paths follow their parent directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub resources: PathBuf,
    pub export: PathBuf,
    pub templates: Option<PathBuf>,
    pub blog_templates: Option<PathBuf>,
    pub singles_templates: Option<PathBuf>,
    pub components: Option<PathBuf>,
    pub static_assets: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            resources: PathBuf::from("resources"),
            export: PathBuf::from("output"),
            templates: None,
            blog_templates: None,
            singles_templates: None,
            components: None,
            static_assets: None,
        }
    }
}

impl PathsConfig {
    pub fn resolve(&self) -> ResolvedPaths {
        let templates = self
            .templates
            .clone()
            .unwrap_or_else(|| self.resources.join("templates"));
        ResolvedPaths {
            resources: self.resources.clone(),
            export: self.export.clone(),
            blog_templates: self
                .blog_templates
                .clone()
                .unwrap_or_else(|| templates.join("blog")),
            singles_templates: self
                .singles_templates
                .clone()
                .unwrap_or_else(|| templates.join("singles")),
            components: self
                .components
                .clone()
                .unwrap_or_else(|| templates.join("components")),
            static_assets: self
                .static_assets
                .clone()
                .unwrap_or_else(|| self.resources.join("static")),
            templates,
        }
    }
}

/// Page sizes and list caps. Signed so that bad values can be reported
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub page_show_limit: i64,
    pub latest_articles: i64,
    pub free_contents_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_show_limit: DEFAULT_PAGE_SHOW_LIMIT,
            latest_articles: DEFAULT_LATEST_ARTICLES,
            free_contents_limit: DEFAULT_FREE_CONTENTS_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub timezone: String,
    pub category_tag_name: String,
    pub webp_asset_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            category_tag_name: "Category".to_string(),
            webp_asset_prefix: "https://images.microcms-assets.io/assets/".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
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
        .max_workers
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Concrete directories derived from [`PathsConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub resources: PathBuf,
    pub export: PathBuf,
    pub templates: PathBuf,
    pub blog_templates: PathBuf,
    pub singles_templates: PathBuf,
    pub components: PathBuf,
    pub static_assets: PathBuf,
}

/// Validated settings threaded through a build.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub service_domain: String,
    pub api_key: String,
    pub endpoint_items: String,
    pub endpoint_categories: String,
    pub timeout: Duration,
    pub paths: ResolvedPaths,
    pub page_size: usize,
    pub latest_count: usize,
    pub free_contents_limit: usize,
    pub timezone: Tz,
    pub category_tag_name: String,
    pub webp_asset_prefix: String,
    pub processing: ProcessingConfig,
}

impl BuildSettings {
    /// Service domain and API key, both required to talk to the CMS.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        if self.service_domain.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "source.service_domain",
                env: "SERVICE_DOMAIN",
            });
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "source.api_key",
                env: "MICROCMS_API_KEY",
            });
        }
        Ok((&self.service_domain, &self.api_key))
    }

    pub fn query_plan(&self) -> QueryPlan {
        QueryPlan {
            items_endpoint: self.endpoint_items.clone(),
            categories_endpoint: self.endpoint_categories.clone(),
            page_size: self.page_size,
            latest_count: self.latest_count,
            free_contents_limit: self.free_contents_limit,
        }
    }
}

impl SiteConfig {
    /// Validate values that have no sensible fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.endpoint_items.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source.endpoint_items must not be empty".into(),
            ));
        }
        if self.source.endpoint_categories.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source.endpoint_categories must not be empty".into(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "source.timeout_secs must be non-zero".into(),
            ));
        }
        if self.pagination.free_contents_limit <= 0 {
            return Err(ConfigError::Validation(
                "pagination.free_contents_limit must be positive".into(),
            ));
        }
        if self.paths.export.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "paths.export must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Validate and resolve into [`BuildSettings`].
    ///
    /// Returns the settings plus any warnings about values that were
    /// replaced by their defaults.
    pub fn resolve(&self) -> Result<(BuildSettings, Vec<String>), ConfigError> {
        self.validate()?;
        let mut warnings = Vec::new();

        let timezone: Tz = self
            .render
            .timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.render.timezone.clone()))?;

        let page_size = positive_or_default(
            self.pagination.page_show_limit,
            DEFAULT_PAGE_SHOW_LIMIT,
            "pagination.page_show_limit",
            &mut warnings,
        );
        let latest_count = positive_or_default(
            self.pagination.latest_articles,
            DEFAULT_LATEST_ARTICLES,
            "pagination.latest_articles",
            &mut warnings,
        );

        let settings = BuildSettings {
            service_domain: self.source.service_domain.clone(),
            api_key: self.source.api_key.clone(),
            endpoint_items: self.source.endpoint_items.clone(),
            endpoint_categories: self.source.endpoint_categories.clone(),
            timeout: Duration::from_secs(self.source.timeout_secs),
            paths: self.paths.resolve(),
            page_size,
            latest_count,
            free_contents_limit: self.pagination.free_contents_limit as usize,
            timezone,
            category_tag_name: self.render.category_tag_name.clone(),
            webp_asset_prefix: self.render.webp_asset_prefix.clone(),
            processing: self.processing.clone(),
        };
        Ok((settings, warnings))
    }
}

fn positive_or_default(value: i64, default: i64, key: &str, warnings: &mut Vec<String>) -> usize {
    if value > 0 {
        value as usize
    } else {
        warnings.push(format!(
            "{key} must be positive (got {value}); using default {default}"
        ));
        default as usize
    }
}

// =============================================================================
// Config loading, merging, and environment overrides
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

enum EnvKind {
    Text,
    Integer,
}

const ENV_OVERRIDES: &[(&str, &str, &str, EnvKind)] = &[
    ("MICROCMS_API_KEY", "source", "api_key", EnvKind::Text),
    ("SERVICE_DOMAIN", "source", "service_domain", EnvKind::Text),
    ("RESOURCES_PATH", "paths", "resources", EnvKind::Text),
    ("EXPORT_PATH", "paths", "export", EnvKind::Text),
    ("TEMPLATES_PATH", "paths", "templates", EnvKind::Text),
    ("BLOG_TEMPLATES_PATH", "paths", "blog_templates", EnvKind::Text),
    ("SINGLES_TEMPLATES_PATH", "paths", "singles_templates", EnvKind::Text),
    ("COMPONENTS_PATH", "paths", "components", EnvKind::Text),
    ("STATIC_PATH", "paths", "static_assets", EnvKind::Text),
    ("PAGE_SHOW_LIMIT", "pagination", "page_show_limit", EnvKind::Integer),
    ("LATEST_ARTICLES", "pagination", "latest_articles", EnvKind::Integer),
    ("TIMEZONE", "render", "timezone", EnvKind::Text),
    ("CATEGORY_TAG_NAME", "render", "category_tag_name", EnvKind::Text),
];

/// Build an overlay table from environment variables.
///
/// `lookup` is usually `|key| std::env::var(key).ok()`. Integer variables
/// that do not parse are skipped with a warning, leaving the lower layers'
/// value in place.
pub fn env_overlay(lookup: impl Fn(&str) -> Option<String>) -> (toml::Value, Vec<String>) {
    let mut root = toml::Table::new();
    let mut warnings = Vec::new();

    for (var, section, key, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else { continue };
        let value = match kind {
            EnvKind::Text => toml::Value::String(raw),
            EnvKind::Integer => match raw.trim().parse::<i64>() {
                Ok(n) => toml::Value::Integer(n),
                Err(_) => {
                    warnings.push(format!("{var}='{raw}' is not an integer; ignoring it"));
                    continue;
                }
            },
        };
        if let toml::Value::Table(table) = root
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        {
            table.insert(key.to_string(), value);
        }
    }

    (toml::Value::Table(root), warnings)
}

/// Merge overlays onto a base value, then deserialize.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (missing file = stock defaults) with environment
/// overrides applied on top. Returns the config and any env warnings.
pub fn load_config(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(SiteConfig, Vec<String>), ConfigError> {
    let base = stock_defaults_value()?;
    let file = load_raw_config(path)?;
    let (env, warnings) = env_overlay(lookup);
    let config = resolve_config(base, file.into_iter().chain(std::iter::once(env)))?;
    Ok((config, warnings))
}

/// Read `KEY=value` pairs from a dotenv file. A missing file yields no pairs.
///
/// Nothing is written to the process environment; callers consult the
/// returned map after the real environment via [`env_lookup`].
pub fn load_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let dotenv_error = |source| ConfigError::Dotenv {
        path: path.to_path_buf(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(dotenv_error)?
        .map(|pair| pair.map_err(dotenv_error))
        .collect()
}

/// Environment lookup: `process` first, then `dotenv`.
pub fn env_lookup<'a>(
    process: impl Fn(&str) -> Option<String> + 'a,
    dotenv: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| process(key).or_else(|| dotenv.get(key).cloned())
}

/// Returns a fully-commented stock `cmsgen.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cmsgen Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Every key can also be overridden from the environment; see
# `cmsgen --help` for the variable names. Environment values win.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content source
# ---------------------------------------------------------------------------
[source]
# Service subdomain: https://<service_domain>.microcms.io/api/v1/...
# Required for `cmsgen build` (env: SERVICE_DOMAIN).
service_domain = ""

# API key sent as X-MICROCMS-API-KEY. Prefer the MICROCMS_API_KEY
# environment variable over committing it here.
api_key = ""

# List endpoints for articles and categories.
endpoint_items = "article"
endpoint_categories = "category"

# Per-request timeout in seconds.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Directories
# ---------------------------------------------------------------------------
[paths]
# User templates and static assets. Created with an empty skeleton on the
# first run if it does not exist.
resources = "resources"

# Output directory. Deleted and recreated on every build.
export = "output"

# Derived directories; each defaults to a path under its parent.
# templates = "resources/templates"
# blog_templates = "resources/templates/blog"           # index.html, article.html
# singles_templates = "resources/templates/singles"     # one page per *.html
# components = "resources/templates/components"         # shared partials
# static_assets = "resources/static"                    # copied verbatim

# ---------------------------------------------------------------------------
# Pagination
# ---------------------------------------------------------------------------
[pagination]
# Articles per listing page. Non-positive values fall back to 10.
page_show_limit = 10

# Articles in latest.json and the `latest` list given to single pages.
latest_articles = 5

# Upper bound for list calls that are not paginated (categories, probes).
free_contents_limit = 10000

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# IANA timezone used by the format_time filter.
timezone = "UTC"

# Category listings get archiveName = "<category_tag_name>: <name>".
category_tag_name = "Category"

# <img> sources under this prefix ending in .jpg/.png get "?fm=webp".
webp_asset_prefix = "https://images.microcms-assets.io/assets/"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers. Omit to use all CPU cores.
# Values larger than the number of cores are clamped down.
# max_workers = 4
"##
}
