//! Configuration management for the portal services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data source configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Login configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Presentation limits for profile and ranking views
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

/// Where the JSON exports and photo folders live.
///
/// Every file name is resolved relative to `base_dir`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_academicians_file")]
    pub academicians_file: String,

    #[serde(default = "default_projects_file")]
    pub projects_file: String,

    #[serde(default = "default_matches_file")]
    pub matches_file: String,

    #[serde(default = "default_decisions_file")]
    pub decisions_file: String,

    #[serde(default = "default_logs_file")]
    pub logs_file: String,

    #[serde(default = "default_announcements_file")]
    pub announcements_file: String,

    #[serde(default = "default_messages_file")]
    pub messages_file: String,

    #[serde(default = "default_passwords_file")]
    pub passwords_file: String,

    #[serde(default = "default_web_data_file")]
    pub web_data_file: String,

    /// Folder scanned for academician photos by email prefix
    #[serde(default = "default_photo_folder")]
    pub photo_folder: String,

    /// Folders exposed for static image serving
    #[serde(default = "default_image_folders")]
    pub image_folders: Vec<String>,

    /// Public origin prepended to image paths in profile responses
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Access log entries kept on disk
    #[serde(default = "default_max_access_logs")]
    pub max_access_logs: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Display name returned for the admin login
    #[serde(default = "default_admin_display_name")]
    pub admin_display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    /// Characters of the project objective shown before the ellipsis
    #[serde(default = "default_objective_preview")]
    pub objective_preview_chars: usize,

    /// Projects returned by the top-projects ranking
    #[serde(default = "default_top_projects")]
    pub top_projects_limit: usize,

    /// Access log entries shown on the admin dashboard
    #[serde(default = "default_dashboard_logs")]
    pub dashboard_log_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_concurrent() -> usize { 100 }
fn default_base_dir() -> PathBuf { PathBuf::from(".") }
fn default_academicians_file() -> String { "academicians_merged.json".to_string() }
fn default_projects_file() -> String { "eu_projects_merged_tum.json".to_string() }
fn default_matches_file() -> String { "n8n_akademisyen_proje_onerileri.json".to_string() }
fn default_decisions_file() -> String { "decisions.json".to_string() }
fn default_logs_file() -> String { "access_logs.json".to_string() }
fn default_announcements_file() -> String { "announcements.json".to_string() }
fn default_messages_file() -> String { "messages.json".to_string() }
fn default_passwords_file() -> String { "passwords.json".to_string() }
fn default_web_data_file() -> String { "web_data.json".to_string() }
fn default_photo_folder() -> String { "akademisyen_fotograflari".to_string() }
fn default_image_folders() -> Vec<String> {
    vec!["images".to_string(), "akademisyen_fotograflari".to_string()]
}
fn default_public_base_url() -> String { "http://localhost:8000".to_string() }
fn default_max_access_logs() -> usize { 1000 }
fn default_admin_username() -> String { "admin".to_string() }
fn default_admin_password() -> String { "12345".to_string() }
fn default_admin_display_name() -> String { "Yönetici".to_string() }
fn default_objective_preview() -> usize { crate::DEFAULT_OBJECTIVE_PREVIEW }
fn default_top_projects() -> usize { crate::DEFAULT_TOP_PROJECTS }
fn default_dashboard_logs() -> usize { 200 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 0 }
fn default_service_name() -> String { "portal".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__DATA__BASE_DIR=/srv/portal
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl DataConfig {
    /// Configuration rooted at `base_dir` with default file names
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Absolute path of a data file
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.base_dir.join(&self.photo_folder)
    }

    /// Whether `folder` is one of the folders exposed for image serving
    pub fn serves_folder(&self, folder: &str) -> bool {
        self.image_folders.iter().any(|f| f == folder)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            academicians_file: default_academicians_file(),
            projects_file: default_projects_file(),
            matches_file: default_matches_file(),
            decisions_file: default_decisions_file(),
            logs_file: default_logs_file(),
            announcements_file: default_announcements_file(),
            messages_file: default_messages_file(),
            passwords_file: default_passwords_file(),
            web_data_file: default_web_data_file(),
            photo_folder: default_photo_folder(),
            image_folders: default_image_folders(),
            public_base_url: default_public_base_url(),
            max_access_logs: default_max_access_logs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
            admin_display_name: default_admin_display_name(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            objective_preview_chars: default_objective_preview(),
            top_projects_limit: default_top_projects(),
            dashboard_log_limit: default_dashboard_logs(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            auth: AuthConfig::default(),
            profile: ProfileConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.profile.top_projects_limit, 50);
        assert_eq!(config.data.decisions_file, "decisions.json");
    }

    #[test]
    fn test_data_paths_are_rooted_at_base_dir() {
        let data = DataConfig::with_base_dir("/srv/portal");
        assert_eq!(
            data.path_of(&data.projects_file),
            PathBuf::from("/srv/portal/eu_projects_merged_tum.json")
        );
        assert_eq!(data.photo_dir(), PathBuf::from("/srv/portal/akademisyen_fotograflari"));
    }

    #[test]
    fn test_served_folders() {
        let data = DataConfig::default();
        assert!(data.serves_folder("images"));
        assert!(!data.serves_folder("../etc"));
    }
}
