use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin for the dashboard frontend. `None` allows any origin.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5340
}

/// Where the gallery REST API lives. `base_url` is the origin; `/api/...` is appended per call.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_ranking_limit")]
    pub ranking_limit: u32,
    /// Developer/name pattern excluded from the secondary download ranking.
    #[serde(default)]
    pub ranking_exclude_pattern: Option<String>,
    /// Detail sessions idle longer than this are dropped.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            ranking_limit: default_ranking_limit(),
            ranking_exclude_pattern: None,
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_ranking_limit() -> u32 {
    20
}

fn default_session_idle_secs() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    1024
}

impl AppConfig {
    /// Validate the upstream URL and dashboard limits.
    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.upstream.base_url)
            .map_err(|e| format!("upstream.base_url is not a valid URL: {e}"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(format!(
                    "upstream.base_url has unsupported scheme: {scheme}"
                ))
            }
        }
        if parsed.host_str().is_none() {
            return Err("upstream.base_url must include a host".to_string());
        }
        if self.upstream.timeout_secs == 0 {
            return Err("upstream.timeout_secs must be greater than zero".to_string());
        }
        if self.dashboard.page_size == 0 || self.dashboard.page_size > 1000 {
            return Err("dashboard.page_size must be between 1 and 1000".to_string());
        }
        if self.dashboard.max_sessions == 0 {
            return Err("dashboard.max_sessions must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // Load from config file
        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (APPDASH__UPSTREAM__BASE_URL=..., etc.)
        builder = builder.add_source(
            Environment::with_prefix("APPDASH")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut cfg = AppConfig::default();
        cfg.upstream.base_url = "ftp://gallery.example.com".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("unsupported scheme"));
    }

    #[test]
    fn test_rejects_unparseable_url() {
        let mut cfg = AppConfig::default();
        cfg.upstream.base_url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut cfg = AppConfig::default();
        cfg.dashboard.page_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = AppConfig::load(Some("definitely-not-here.toml")).unwrap();
        assert_eq!(cfg.dashboard.page_size, 100);
        assert_eq!(cfg.upstream.timeout_secs, 10);
        assert_eq!(cfg.dashboard.max_sessions, 1024);
    }

    #[test]
    fn test_rejects_zero_max_sessions() {
        let mut cfg = AppConfig::default();
        cfg.dashboard.max_sessions = 0;
        assert!(cfg.validate().is_err());
    }
}
