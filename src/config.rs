use std::env;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    /// Whether to set the `Secure` flag on cookies.
    /// If `None`, the application infers this from `frontend_url` (e.g. `https` -> true).
    /// Read from env var `COOKIE_SECURE` (accepted values: "true"/"false", "1"/"0", "yes"/"no").
    pub cookie_secure: Option<bool>,
    /// Preferred SameSite value for cookies. Read from env var `COOKIE_SAMESITE`
    /// (accepted values: "Lax", "Strict", "None").
    pub cookie_same_site: Option<String>,
}

/// Remote booking API. Every page talks to the same base address.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for mutating page actions
    pub actions_per_second: u32,
    /// Burst size for mutating page actions
    pub actions_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub lang: String,
    /// Default availability window starts this many minutes from now.
    pub availability_lead_minutes: i64,
    pub availability_span_minutes: i64,
    pub booking_span_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("BOOKING_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());
        Url::parse(&base_url)
            .map_err(|_| ConfigError::InvalidValue("BOOKING_API_BASE_URL".to_string()))?;

        let lang = env::var("UI_LANG").unwrap_or_else(|_| crate::i18n::DEFAULT_LANG.to_string());
        let lang = crate::i18n::normalize_language(&lang);
        if !crate::i18n::is_supported_language(&lang) {
            return Err(ConfigError::InvalidValue("UI_LANG".to_string()));
        }

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string()),
                cookie_secure: match env::var("COOKIE_SECURE") {
                    Ok(v) => match v.to_lowercase().as_str() {
                        "1" | "true" | "yes" => Some(true),
                        "0" | "false" | "no" => Some(false),
                        _ => None,
                    },
                    Err(_) => None,
                },
                cookie_same_site: env::var("COOKIE_SAMESITE").ok(),
            },
            api: ApiConfig {
                base_url,
                timeout_seconds: env::var("BOOKING_API_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            rate_limit: RateLimitConfig {
                actions_per_second: env::var("RATE_LIMIT_ACTIONS_PER_SECOND")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                actions_burst: env::var("RATE_LIMIT_ACTIONS_BURST")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
            },
            ui: UiConfig {
                lang,
                availability_lead_minutes: env::var("AVAILABILITY_LEAD_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
                availability_span_minutes: env::var("AVAILABILITY_SPAN_MINUTES")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .unwrap_or(120),
                booking_span_minutes: env::var("BOOKING_SPAN_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            },
        })
    }
}

impl ServerConfig {
    /// Resolve the `Secure` cookie flag, falling back to the scheme of `frontend_url`.
    pub fn secure_cookies(&self) -> bool {
        self.cookie_secure
            .unwrap_or_else(|| self.frontend_url.starts_with("https://"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                frontend_url: "http://localhost:5173".to_string(),
                cookie_secure: None,
                cookie_same_site: None,
            },
            api: ApiConfig {
                base_url: "http://localhost:8080/api".to_string(),
                timeout_seconds: 30,
            },
            rate_limit: RateLimitConfig {
                actions_per_second: 5,
                actions_burst: 20,
            },
            ui: UiConfig {
                lang: crate::i18n::DEFAULT_LANG.to_string(),
                availability_lead_minutes: 60,
                availability_span_minutes: 120,
                booking_span_minutes: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_cookies_follow_frontend_scheme() {
        let mut config = Config::default();
        assert!(!config.server.secure_cookies());

        config.server.frontend_url = "https://booking.example.com".to_string();
        assert!(config.server.secure_cookies());

        config.server.cookie_secure = Some(false);
        assert!(!config.server.secure_cookies());
    }
}
