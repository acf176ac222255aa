// File: src/config.rs
// Purpose: Route tree configuration, parsed from the [routetree] TOML file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Route tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTreeConfig {
    /// Locales every node is generated for unless narrowed
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,

    /// Locale used by `no_locale_prefix` nodes and as request fallback
    /// (default: first entry of `locales`)
    #[serde(default)]
    pub default_locale: Option<String>,

    /// Locales whose paths are generated without a locale prefix
    #[serde(default)]
    pub no_prefix_locales: Vec<String>,

    /// Whether generated URLs include `base_url` by default
    #[serde(default = "default_false")]
    pub absolute_urls: bool,

    /// Scheme and host used for absolute URLs
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base path of the translation files used for auto-translation
    #[serde(default = "default_translation_base")]
    pub translation_base: String,

    #[serde(default)]
    pub sitemap: SitemapConfig,
}

/// Sitemap generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Priority used for nodes without an explicit one
    #[serde(default)]
    pub default_priority: Option<f32>,

    /// Change frequency token used for nodes without an explicit one
    #[serde(default)]
    pub default_change_frequency: Option<String>,

    /// Whether redirect actions are left out of the sitemap
    #[serde(default = "default_true")]
    pub exclude_redirects: bool,
}

// Default values
fn default_locales() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

fn default_translation_base() -> String {
    "pages".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for RouteTreeConfig {
    fn default() -> Self {
        Self {
            locales: default_locales(),
            default_locale: None,
            no_prefix_locales: Vec::new(),
            absolute_urls: false,
            base_url: default_base_url(),
            translation_base: default_translation_base(),
            sitemap: SitemapConfig::default(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            default_priority: None,
            default_change_frequency: None,
            exclude_redirects: true,
        }
    }
}

impl RouteTreeConfig {
    /// Creates a configuration for the given locales
    pub fn with_locales<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn with_no_prefix_locale(mut self, locale: impl Into<String>) -> Self {
        self.no_prefix_locales.push(locale.into());
        self
    }

    pub fn with_absolute_urls(mut self, absolute: bool) -> Self {
        self.absolute_urls = absolute;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The default locale, falling back to the first configured locale
    pub fn default_locale(&self) -> &str {
        self.default_locale
            .as_deref()
            .or_else(|| self.locales.first().map(String::as_str))
            .unwrap_or("en")
    }

    /// Whether only a single locale is configured
    pub fn is_single_locale(&self) -> bool {
        self.locales.len() <= 1
    }

    /// Whether paths for this locale carry no locale prefix
    pub fn is_prefix_exempt(&self, locale: &str) -> bool {
        self.no_prefix_locales.iter().any(|l| l == locale)
    }

    /// Load configuration from a TOML file
    ///
    /// A missing or empty file yields the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read route tree config: {:?}", path))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse route tree config: {:?}", path))
    }

    /// Parse configuration from TOML source
    pub fn from_toml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: RouteTreeConfig = toml::from_str(content)?;

        if config.locales.is_empty() {
            anyhow::bail!("At least one locale must be configured");
        }
        if let Some(ref default_locale) = config.default_locale {
            if !config.locales.contains(default_locale) {
                anyhow::bail!(
                    "Default locale '{}' is not one of the configured locales",
                    default_locale
                );
            }
        }

        Ok(config)
    }

    /// Load configuration from the default path (./routetree.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routetree.toml")
    }
}
