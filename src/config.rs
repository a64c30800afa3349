//! TOML configuration for the gallery.
//!
//! Every key is optional. A missing file means defaults; a present file that
//! fails to parse or validate is an error, never silently ignored.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::collection::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, HttpSettings, REQUEST_TIMEOUT_SECS, RecordId,
};
use crate::query::{DEFAULT_PAGE_SIZE, DEFAULT_RESOLVE_CAP, PipelineSettings};
use crate::resolve::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PACING, ResolverSettings, ResultOrder, RetryPolicy,
};
use crate::sample::DEFAULT_SAMPLE_SIZE;

/// Landing-page selection used when the config names none.
pub const DEFAULT_FEATURED_IDS: [RecordId; 18] = [
    199_313, 436_105, 435_702, 437_473, 437_327, 438_417, 435_813, 204_758, 204_812, 193_628,
    250_748, 248_146, 24_320, 24_671, 22_364, 23_939, 22_239, 24_693,
];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn out_of_range(field: &str, value: impl std::fmt::Display, range: &str) -> Self {
        Self::Validation {
            message: format!("`{field}` = {value}, expected range {range}"),
        }
    }
}

/// File-backed settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Root of the collection API.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Wait before each record fetch in a batch. 0 disables pacing.
    pub pacing_ms: u64,
    /// Hard cap on identifiers resolved per search.
    pub resolve_cap: usize,
    pub page_size: usize,
    /// Records drawn for the random view.
    pub sample_size: usize,
    pub result_order: ResultOrder,
    /// Attempts per record; 1 never retries.
    pub max_attempts: u32,
    pub featured_ids: Vec<RecordId>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            pacing_ms: u64::try_from(DEFAULT_PACING.as_millis()).unwrap_or(100),
            resolve_cap: DEFAULT_RESOLVE_CAP,
            page_size: DEFAULT_PAGE_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            result_order: ResultOrder::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            featured_ids: DEFAULT_FEATURED_IDS.to_vec(),
        }
    }
}

impl GalleryConfig {
    /// Parses `raw` TOML and validates it. `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Validation`].
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Validation {
                message: format!("`base_url` = {base:?}, expected an http(s) URL"),
            });
        }
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        validate_range("request_timeout_secs", self.request_timeout_secs, 1, 3600)?;
        validate_range("pacing_ms", self.pacing_ms, 0, 60_000)?;
        validate_range("resolve_cap", self.resolve_cap, 1, 500)?;
        validate_range("page_size", self.page_size, 1, 100)?;
        validate_range("sample_size", self.sample_size, 1, 200)?;
        validate_range("max_attempts", self.max_attempts, 1, 10)?;
        Ok(())
    }

    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..HttpSettings::default()
        }
    }

    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            pacing: Duration::from_millis(self.pacing_ms),
            order: self.result_order,
            retry: RetryPolicy::with_max_attempts(self.max_attempts),
        }
    }

    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            resolve_cap: self.resolve_cap,
            page_size: self.page_size,
        }
    }
}

fn validate_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::out_of_range(
            field,
            value,
            &format!("{min}..={max}"),
        ));
    }
    Ok(())
}

/// Reads and validates the config at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] when the file cannot be read, otherwise the
/// errors of [`GalleryConfig::from_toml_str`].
pub fn load(path: &Path) -> Result<GalleryConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = GalleryConfig::from_toml_str(&raw, path)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Loads the config at the default path, or defaults when no file exists.
///
/// # Errors
///
/// Same as [`load`] when the default file exists but is invalid.
pub fn load_default() -> Result<GalleryConfig, ConfigError> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load(&path),
        _ => Ok(GalleryConfig::default()),
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/gallery/config.toml`
/// 2. `$HOME/.config/gallery/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("gallery").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("gallery")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn parse(raw: &str) -> Result<GalleryConfig, ConfigError> {
        GalleryConfig::from_toml_str(raw, Path::new("test.toml"))
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, GalleryConfig::default());
        assert_eq!(config.pacing_ms, 100);
        assert_eq!(config.resolve_cap, 15);
        assert_eq!(config.page_size, 6);
        assert_eq!(config.featured_ids.len(), 18);
    }

    #[test]
    fn test_values_override_defaults() {
        let config = parse(
            r#"
base_url = "http://localhost:9000/v1"
pacing_ms = 0
resolve_cap = 50
page_size = 12
result_order = "listing"
max_attempts = 3
featured_ids = [1, 2, 3]
"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.result_order, ResultOrder::Listing);
        assert_eq!(config.featured_ids, vec![1, 2, 3]);

        let resolver = config.resolver_settings();
        assert_eq!(resolver.pacing, Duration::ZERO);
        assert_eq!(resolver.retry.max_attempts(), 3);
        assert_eq!(config.pipeline_settings().resolve_cap, 50);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let error = parse("concurrency = 4").unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().contains("test.toml"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for raw in [
            "pacing_ms = 60001",
            "resolve_cap = 0",
            "page_size = 101",
            "sample_size = 0",
            "max_attempts = 11",
            "request_timeout_secs = 0",
            "base_url = \"ftp://example.test\"",
        ] {
            let error = parse(raw).unwrap_err();
            assert!(
                matches!(error, ConfigError::Validation { .. }),
                "{raw} should fail validation, got {error}"
            );
        }
    }

    #[test]
    fn test_bad_result_order_is_parse_error() {
        let error = parse("result_order = \"random\"").unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 9").unwrap();
        let config = load(file.path()).unwrap();
        assert_eq!(config.page_size, 9);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn test_http_settings_use_configured_timeouts() {
        let config = parse("connect_timeout_secs = 3\nrequest_timeout_secs = 20").unwrap();
        let http = config.http_settings();
        assert_eq!(http.connect_timeout, Duration::from_secs(3));
        assert_eq!(http.request_timeout, Duration::from_secs(20));
        assert!(http.user_agent.starts_with("gallery/"));
    }
}
