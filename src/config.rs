//! Configuration loaded from environment variables
//!
//! Every setting has a default matching the production site, so an empty
//! environment yields a working (read-only, published content) configuration.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::cache::DEFAULT_TTL;
use crate::retry::RetryPolicy;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// The dotenv file could not be read
    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Which document versions queries see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Perspective {
    /// Only published documents
    #[default]
    Published,
    /// Drafts overlaid on published documents
    Drafts,
    /// Everything, drafts and published side by side
    Raw,
    /// Legacy name for drafts on older API versions
    PreviewDrafts,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::Published => "published",
            Perspective::Drafts => "drafts",
            Perspective::Raw => "raw",
            Perspective::PreviewDrafts => "previewDrafts",
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Perspective {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Perspective::Published),
            "drafts" => Ok(Perspective::Drafts),
            "raw" => Ok(Perspective::Raw),
            "previewDrafts" => Ok(Perspective::PreviewDrafts),
            _ => Err(()),
        }
    }
}

/// Connection settings for the Sanity project
#[derive(Debug, Clone, PartialEq)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    /// Dated API version, e.g. "2024-01-01"
    pub api_version: String,
    /// Read token; required only for private datasets and drafts
    pub token: Option<String>,
    /// Use the edge-cached API host
    pub use_cdn: bool,
    pub perspective: Perspective,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            project_id: "wtlgwnno".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            token: None,
            use_cdn: false,
            perspective: Perspective::Published,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub sanity: SanityConfig,
    /// How long query results stay in the cache
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            sanity: SanityConfig::default(),
            cache_ttl: DEFAULT_TTL,
            retry: RetryPolicy::default(),
        }
    }
}

impl SiteConfig {
    /// Loads configuration from the process environment, after reading `.env`
    /// from the working directory if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from a dotenv file, falling back to the process
    /// environment for variables the file does not set.
    ///
    /// The file is read without modifying the process environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path.as_ref())? {
            let (key, value) = item?;
            vars.insert(key, value);
        }
        tracing::debug!(path = %path.as_ref().display(), vars = vars.len(), "Loaded env file");

        Self::from_lookup(|key| vars.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = SanityConfig::default();

        let sanity = SanityConfig {
            project_id: get("SANITY_PROJECT_ID").unwrap_or(defaults.project_id),
            dataset: get("SANITY_DATASET").unwrap_or(defaults.dataset),
            api_version: get("SANITY_API_VERSION").unwrap_or(defaults.api_version),
            token: get("SANITY_API_TOKEN"),
            use_cdn: parse_var(&get, "SANITY_USE_CDN", parse_bool)?.unwrap_or(defaults.use_cdn),
            perspective: parse_var(&get, "SANITY_PERSPECTIVE", |s| s.parse::<Perspective>().ok())?
                .unwrap_or(defaults.perspective),
        };

        let cache_ttl = parse_var(&get, "FOLIO_CACHE_TTL_SECS", |s| s.parse::<u64>().ok())?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL);

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_var(&get, "FOLIO_RETRY_ATTEMPTS", |s| {
                s.parse::<u32>().ok().filter(|n| *n >= 1)
            })?
            .unwrap_or(default_retry.max_attempts),
            initial_delay: parse_var(&get, "FOLIO_RETRY_DELAY_MS", |s| s.parse::<u64>().ok())?
                .map(Duration::from_millis)
                .unwrap_or(default_retry.initial_delay),
            ..default_retry
        };

        Ok(Self {
            sanity,
            cache_ttl,
            retry,
        })
    }
}

/// Reads and parses an optional variable, reporting unparseable values
fn parse_var<G, P, T>(get: &G, key: &str, parse: P) -> Result<Option<T>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => parse(raw.trim())
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
