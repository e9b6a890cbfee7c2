//! Application configuration. LLM credentials, database path, server binding.

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const DEFAULT_SITE_URL: &str = "http://localhost:5173";
pub const DEFAULT_APP_NAME: &str = "Social OS";
pub const DEFAULT_DATABASE_PATH: &str = "./social_os.db";
/// Upper bound on one gateway call. Covers a slow long-form completion.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Provider credentials. `Unconfigured` is a normal state: the API still serves
/// profiles, extraction fails with `GatewayUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCredentials {
    ApiKey(String),
    Unconfigured,
}

/// Everything the LLM gateway needs at construction.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub credentials: GatewayCredentials,
    pub api_url: String,
    pub default_model: String,
    /// Sent as `HTTP-Referer` for provider attribution.
    pub site_url: String,
    /// Sent as `X-Title` for provider attribution.
    pub app_name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Provider API key. Read from SOCIAL_OS_LLM_API_KEY or OPENROUTER_API_KEY.
    #[serde(default)]
    pub llm_api_key: Option<String>,

    /// Chat-completions endpoint. Read from SOCIAL_OS_LLM_API_URL or OPENROUTER_API_URL.
    #[serde(default)]
    pub llm_api_url: Option<String>,

    /// Default model. Read from SOCIAL_OS_LLM_MODEL or OPENROUTER_MODEL_NAME.
    #[serde(default)]
    pub llm_model: Option<String>,

    /// Gateway call timeout in seconds (default 120). Read from SOCIAL_OS_LLM_TIMEOUT_SECS.
    #[serde(default)]
    pub llm_timeout_secs: Option<u64>,

    /// Read from SOCIAL_OS_SITE_URL or YOUR_SITE_URL.
    #[serde(default)]
    pub site_url: Option<String>,

    /// Read from SOCIAL_OS_APP_NAME or YOUR_APP_NAME.
    #[serde(default)]
    pub app_name: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Storage & Server
    // ─────────────────────────────────────────────────────────────────────────
    /// SQLite file path. Read from SOCIAL_OS_DATABASE_PATH or DATABASE_URL.
    #[serde(default)]
    pub database_path: Option<String>,

    #[serde(default)]
    pub bind_host: Option<String>,

    /// Read from SOCIAL_OS_PORT or PORT.
    #[serde(default)]
    pub port: Option<u16>,

    /// Allowed CORS origin for the frontend.
    #[serde(default)]
    pub cors_origin: Option<String>,

    /// Tracing filter used when RUST_LOG is unset.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("SOCIAL_OS"));
        if let Ok(path) = std::env::var("SOCIAL_OS_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // DATABASE_URL is read directly so existing .env files keep working.
        if cfg.database_path.is_none() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                cfg.database_path = Some(database_path_from_url(&url));
            }
        }
        if cfg.port.is_none() {
            if let Ok(s) = std::env::var("PORT") {
                if let Ok(port) = s.parse::<u16>() {
                    cfg.port = Some(port);
                }
            }
        }
        Ok(cfg)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // LLM Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the API key if configured. Blank keys count as unset.
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm_api_key
            .clone()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn llm_api_url_or_default(&self) -> String {
        self.llm_api_url
            .clone()
            .or_else(|| std::env::var("OPENROUTER_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn llm_model_or_default(&self) -> String {
        self.llm_model
            .clone()
            .or_else(|| std::env::var("OPENROUTER_MODEL_NAME").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS))
    }

    pub fn site_url_or_default(&self) -> String {
        self.site_url
            .clone()
            .or_else(|| std::env::var("YOUR_SITE_URL").ok())
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
    }

    pub fn app_name_or_default(&self) -> String {
        self.app_name
            .clone()
            .or_else(|| std::env::var("YOUR_APP_NAME").ok())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
    }

    /// Returns true if an API key is present.
    pub fn is_llm_configured(&self) -> bool {
        self.llm_api_key().is_some()
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            credentials: match self.llm_api_key() {
                Some(key) => GatewayCredentials::ApiKey(key),
                None => GatewayCredentials::Unconfigured,
            },
            api_url: self.llm_api_url_or_default(),
            default_model: self.llm_model_or_default(),
            site_url: self.site_url_or_default(),
            app_name: self.app_name_or_default(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Storage & Server Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn database_path_or_default(&self) -> String {
        self.database_path
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
    }

    /// `host:port` to bind the HTTP server to. Defaults to 0.0.0.0:8000.
    pub fn bind_addr(&self) -> String {
        format!(
            "{}:{}",
            self.bind_host.as_deref().unwrap_or("0.0.0.0"),
            self.port.unwrap_or(8000)
        )
    }

    pub fn cors_origin_or_default(&self) -> String {
        self.cors_origin
            .clone()
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
    }

    pub fn log_level_or_default(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "info".to_string())
    }
}

/// Strip a SQLAlchemy-style `sqlite:///` prefix so the rest is a file path.
pub fn database_path_from_url(url: &str) -> String {
    url.strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_from_url() {
        assert_eq!(database_path_from_url("sqlite:///./app.db"), "./app.db");
        assert_eq!(database_path_from_url("file:data/x.db"), "data/x.db");
        assert_eq!(database_path_from_url("/var/lib/x.db"), "/var/lib/x.db");
    }

    #[test]
    fn test_explicit_key_configures_gateway() {
        let cfg = AppConfig {
            llm_api_key: Some("sk-test".to_string()),
            llm_model: Some("openai/gpt-4o-mini".to_string()),
            llm_api_url: Some("http://localhost:9/v1/chat/completions".to_string()),
            site_url: Some("http://example.test".to_string()),
            app_name: Some("Test".to_string()),
            ..Default::default()
        };
        let settings = cfg.gateway_settings();
        assert_eq!(
            settings.credentials,
            GatewayCredentials::ApiKey("sk-test".to_string())
        );
        assert_eq!(settings.default_model, "openai/gpt-4o-mini");
        assert_eq!(settings.app_name, "Test");
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let cfg = AppConfig {
            llm_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!cfg.is_llm_configured());
        assert_eq!(
            cfg.gateway_settings().credentials,
            GatewayCredentials::Unconfigured
        );
    }

    #[test]
    fn test_server_defaults() {
        let cfg = AppConfig {
            port: Some(9001),
            ..Default::default()
        };
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9001");
        assert_eq!(cfg.llm_timeout(), Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS));
    }
}
