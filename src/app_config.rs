//! Site settings: built-in defaults, overlaid by `config.toml`, overlaid by
//! `BANDTOGETHER_*` environment variables (`__` separates section and key).
//!
//! `DATABASE_URL` and `SECRET_KEY` are read by the binary straight from the
//! environment and never appear here.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub tagline: String,
    pub base_url: String,
    pub bind_address: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "BandTogether".to_string(),
            tagline: "Connect and Make Music".to_string(),
            base_url: "http://localhost:8080".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Send the session cookie over HTTPS only
    pub cookie_secure: bool,
    /// Session lifetime in days
    pub session_days: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            session_days: 14,
        }
    }
}

/// Raw numbers behind [`crate::rate_limit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login attempts per window
    pub login_max_attempts: u32,
    /// Login rate limit window in seconds
    pub login_window_seconds: u32,
    /// Sign ups per hour per IP
    pub registration_per_hour: u32,
    /// Inbox messages per minute per profile
    pub messages_per_minute: u32,
    /// Reports per 5 minutes per profile
    pub reports_per_5_minutes: u32,
    /// Feedback submissions per hour per IP
    pub feedback_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max_attempts: 5,
            login_window_seconds: 300,
            registration_per_hour: 3,
            messages_per_minute: 10,
            reports_per_5_minutes: 5,
            feedback_per_hour: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Items per listing page and infinite-scroll fetch
    pub page_size: u32,
    /// Maximum comment length in characters
    pub comment_max_length: u32,
    /// Minimum report description length in characters
    pub report_min_length: u32,
    /// Profiles returned by the inbox recipient search
    pub inbox_search_limit: u32,
    /// Cities returned by location autocomplete
    pub location_search_limit: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            comment_max_length: 150,
            report_min_length: 10,
            inbox_search_limit: 5,
            location_search_limit: 10,
        }
    }
}

/// Where uploaded pictures go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded pictures are written to
    pub local_path: String,
    /// URL prefix the directory is served under
    pub public_url: String,
    /// Maximum upload size in MB
    pub max_upload_size_mb: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: "./media".to_string(),
            public_url: "/media".to_string(),
            max_upload_size_mb: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g. BANDTOGETHER_LIMITS__PAGE_SIZE=20
            .add_source(
                Environment::with_prefix("BANDTOGETHER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Triggers the lazy load of the config file and logs the result.
pub fn init() {
    let config = get_config();
    log::info!("Configuration loaded: site.name = {}", config.site.name);
}

/// A snapshot; falls back to defaults if the lock was poisoned.
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

pub fn site() -> SiteConfig {
    get_config().site
}

pub fn security() -> SecurityConfig {
    get_config().security
}

pub fn rate_limit() -> RateLimitConfig {
    get_config().rate_limit
}

pub fn limits() -> LimitsConfig {
    get_config().limits
}

pub fn storage() -> StorageConfig {
    get_config().storage
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.site.name, "BandTogether");
        assert_eq!(config.limits.page_size, 10);
        assert_eq!(config.limits.comment_max_length, 150);
        assert_eq!(config.limits.report_min_length, 10);
        assert_eq!(config.limits.inbox_search_limit, 5);
        assert_eq!(config.rate_limit.login_max_attempts, 5);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[site]
name = "Test Jam"
base_url = "https://jam.example.com"

[limits]
page_size = 24

[storage]
local_path = "/var/lib/bandtogether/media"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.site.name, "Test Jam");
        assert_eq!(config.site.base_url, "https://jam.example.com");
        assert_eq!(config.limits.page_size, 24);
        assert_eq!(config.storage.local_path, "/var/lib/bandtogether/media");
        // untouched keys keep their defaults
        assert_eq!(config.limits.comment_max_length, 150);
        assert_eq!(config.site.tagline, "Connect and Make Music");
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.site.name, "BandTogether");
        assert_eq!(config.storage.public_url, "/media");
    }
}
