use crate::auth::{api_key::KeyOwner, StaticApiKeyStore};
use dotenv::dotenv;
use secrecy::SecretString;
use std::{env, fmt};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be true or false, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("GATEWAY_API_KEYS entry #{position} must look like key=tenant:user")]
    InvalidApiKeyEntry { position: usize },

    #[error("LOG_FORMAT must be compact or json, got {0:?}")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

pub struct AppConfig {
    pub port: u16,
    pub host: String,
    pub worker_threads: usize,
    pub jwt_secret: Option<SecretString>,
    pub api_keys: StaticApiKeyStore,
    pub trust_authorizer_headers: bool,
    pub chat_backend_url: String,
    pub log_format: LogFormat,
    pub telemetry: TelemetryConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_threads", &self.worker_threads)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("api_keys", &self.api_keys)
            .field("trust_authorizer_headers", &self.trust_authorizer_headers)
            .field("chat_backend_url", &self.chat_backend_url)
            .field("log_format", &self.log_format)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub debug_mode: bool,
    pub enable_metrics: bool,
    pub metrics_namespace: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            enable_metrics: false,
            metrics_namespace: "chat_gateway".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            debug_mode: bool_var("DEBUG_MODE", defaults.debug_mode)?,
            enable_metrics: bool_var("ENABLE_METRICS", defaults.enable_metrics)?,
            metrics_namespace: env::var("METRICS_NAMESPACE")
                .unwrap_or(defaults.metrics_namespace),
        })
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: number_var("PORT", 3000)?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            worker_threads: number_var("WORKER_THREADS", num_cpus::get())?,
            jwt_secret: env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            api_keys: parse_api_keys(&env::var("GATEWAY_API_KEYS").unwrap_or_default())?,
            trust_authorizer_headers: bool_var("TRUST_AUTHORIZER_HEADERS", false)?,
            chat_backend_url: env::var("CHAT_BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080/chat".to_string()),
            log_format: match env::var("LOG_FORMAT") {
                Err(_) => LogFormat::Compact,
                Ok(value) => match value.to_ascii_lowercase().as_str() {
                    "" | "compact" => LogFormat::Compact,
                    "json" => LogFormat::Json,
                    _ => return Err(ConfigError::InvalidLogFormat(value)),
                },
            },
            telemetry: TelemetryConfig::from_env()?,
        })
    }
}

fn number_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

fn bool_var(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidBool { name, value }),
        },
        Err(_) => Ok(default),
    }
}

/// Parses `key=tenant:user` entries separated by commas.
pub fn parse_api_keys(raw: &str) -> Result<StaticApiKeyStore, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(position, entry)| {
            // The entry holds a key, so only its position is reported.
            let invalid = || ConfigError::InvalidApiKeyEntry {
                position: position + 1,
            };
            let (key, owner) = entry.split_once('=').ok_or_else(invalid)?;
            let (tenant_id, user_id) = owner.split_once(':').ok_or_else(invalid)?;
            let (key, tenant_id, user_id) = (key.trim(), tenant_id.trim(), user_id.trim());
            if key.is_empty() || tenant_id.is_empty() || user_id.is_empty() {
                return Err(invalid());
            }
            Ok((
                key.to_string(),
                KeyOwner {
                    tenant_id: tenant_id.to_string(),
                    user_id: user_id.to_string(),
                },
            ))
        })
        .collect()
}
