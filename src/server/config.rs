//! Server configuration parsing.

use serde::Deserialize;
use std::path::Path;

use crate::worker::InterceptConfig;

/// Server configuration loaded from TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Bind settings.
    pub server: ServerConfig,
    /// Upstream vault server, if any.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Durable storage paths.
    pub store: StoreConfig,
    /// Worker revision and intercept settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server bind settings.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1" or "0.0.0.0").
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

/// Upstream vault server the gateway forwards to.
#[derive(Debug, Deserialize, Default)]
pub struct UpstreamConfig {
    /// Base URL, e.g. "https://vault.example.net". Absent means fully
    /// offline operation: every policy falls through to its cache path.
    pub base_url: Option<String>,
}

/// Durable storage paths.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Path to the vault store directory (queued files + config).
    pub path: String,
    /// Path to the cache-generation database directory.
    pub cache_path: String,
}

/// Worker revision and intercept settings.
#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    /// Revision tag embedded in the cache generation name. Changing it
    /// forces a reinstall and marks all older generations for deletion.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,
    /// Application-shell URLs precached during install.
    #[serde(default)]
    pub shell_urls: Vec<String>,
    /// Intercept paths (share endpoint, review page, API prefix, offline
    /// page).
    #[serde(flatten)]
    pub intercept: InterceptConfig,
}

fn default_version_tag() -> String {
    "v2".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version_tag: default_version_tag(),
            shell_urls: Vec::new(),
            intercept: InterceptConfig::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Env-filter style level directive.
    #[serde(default = "default_level")]
    pub level: String,
    /// Text or JSON lines.
    #[serde(default)]
    pub format: LogFormat,
    /// "stdout", "stderr", or a file path.
    #[serde(default = "default_output")]
    pub output: String,
    /// ANSI colors for terminal output.
    #[serde(default = "default_true")]
    pub color: bool,
    /// Include the event target (module path).
    #[serde(default)]
    pub target: bool,
    /// Include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            output: default_output(),
            color: true,
            target: false,
            timestamps: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Get the socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(String, std::io::Error),
    /// TOML parse error.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read config file '{}': {}", path, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
bind = "127.0.0.1"
port = 8080

[upstream]
base_url = "https://vault.example.net"

[store]
path = ".filevault/store"
cache_path = ".filevault/cache"

[worker]
version_tag = "v13"
shell_urls = ["/", "/static/js/main.js", "/static/offline.html"]
share_path = "/static/share.html"

[logging]
level = "debug"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.upstream.base_url.as_deref(),
            Some("https://vault.example.net")
        );
        assert_eq!(config.worker.version_tag, "v13");
        assert_eq!(config.worker.shell_urls.len(), 3);
        assert_eq!(config.worker.intercept.share_path, "/static/share.html");
        // Unset intercept paths keep their defaults.
        assert_eq!(config.worker.intercept.api_prefix, "/api/");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml = r#"
[server]
bind = "0.0.0.0"
port = 9000

[store]
path = "/var/lib/filevault/store"
cache_path = "/var/lib/filevault/cache"
"#;
        let config = Config::from_str(toml).unwrap();
        assert!(config.upstream.base_url.is_none());
        assert_eq!(config.worker.version_tag, "v2");
        assert_eq!(config.worker.intercept.share_path, "/share");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }
}
