//! Configuration loading for precisd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.precis/config.toml` (user)
//! 3. `/etc/precis/config.toml` (system)
//!
//! With no file, built-in defaults apply. Environment variables are applied
//! on top of whichever source was used (see [`Config::apply_env`]).
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.precis/secrets.toml` (user, must be 0600)
//! 2. `/etc/precis/secrets.toml` (system, must be 0600)
//!
//! and fall back to `OPENAI_API_KEY` / `API_KEYS_ALLOWED`.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::providers::RetryConfig;
use crate::types::Language;
use crate::{PrecisError, Result};

/// Part of the request timeout reserved for the extractive fallback.
pub const FALLBACK_HEADROOM: Duration = Duration::from_millis(500);

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8000).
    #[serde(default = "default_address")]
    pub address: String,
    /// Overall per-request timeout in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum input length in characters (default: 50000).
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Language assumed when a request omits it (default: auto).
    #[serde(default = "default_lang")]
    pub lang_default: String,
    /// Comma-separated CORS origins, or `*` (default: `*`).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            request_timeout_ms: default_request_timeout_ms(),
            max_text_length: default_max_text_length(),
            lang_default: default_lang(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_text_length() -> usize {
    crate::types::DEFAULT_MAX_TEXT_LENGTH
}

fn default_lang() -> String {
    "auto".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

/// OpenAI provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Model id (default: gpt-5-nano).
    #[serde(default = "default_model")]
    pub model: String,
    /// API base URL (default: the public endpoint).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout in milliseconds (default: 4000).
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
    /// Attempts per request, 0 meaning 1 (default: 2).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_ms: default_llm_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_model() -> String {
    crate::providers::openai::DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    crate::providers::openai::DEFAULT_BASE_URL.to_string()
}

fn default_llm_timeout_ms() -> u64 {
    4_000
}

fn default_max_retries() -> u32 {
    2
}

/// Which store backs the cache and the rate limiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

/// Shared store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// When false, caching and rate limiting are off (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: StoreBackend,
    /// Redis URL (default: redis://redis:6379/0).
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Per-operation timeout in milliseconds (default: 2000).
    #[serde(default = "default_store_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: StoreBackend::default(),
            redis_url: default_redis_url(),
            op_timeout_ms: default_store_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_redis_url() -> String {
    "redis://redis:6379/0".to_string()
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

/// Summary cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Entry lifetime in seconds (default: 3600).
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    3600
}

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    /// Requests per credential per window (default: 100).
    #[serde(default = "default_rate_limit_requests")]
    pub requests: u64,
    /// Window length in seconds (default: 60).
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            requests: default_rate_limit_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_rate_limit_requests() -> u64 {
    100
}

fn default_window_seconds() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// One of DEBUG, INFO, WARNING, ERROR, CRITICAL (default: INFO).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "INFO".to_string()
}

const LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

impl LoggingConfig {
    /// `tracing` filter directive for the configured level.
    pub fn filter_directive(&self) -> &'static str {
        match self.level.to_uppercase().as_str() {
            "DEBUG" => "debug",
            "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}

impl Config {
    /// Load configuration from the standard locations, then apply
    /// environment overrides and validate.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.precis/config.toml`
    /// 3. `/etc/precis/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PrecisError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PrecisError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `None` means use defaults.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(PrecisError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".precis").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/precis/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply 12-factor environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("SERVER_ADDRESS") {
            self.server.address = v;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_MS") {
            self.server.request_timeout_ms = parse_env("REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("MAX_TEXT_LENGTH") {
            self.server.max_text_length = parse_env("MAX_TEXT_LENGTH", &v)?;
        }
        if let Some(v) = lookup("LANG_DEFAULT") {
            self.server.lang_default = v;
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = v;
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            self.openai.model = v;
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = lookup("LLM_TIMEOUT_MS") {
            self.openai.timeout_ms = parse_env("LLM_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("MAX_RETRIES") {
            self.openai.max_retries = parse_env("MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("ENABLE_REDIS") {
            self.store.enabled = parse_bool("ENABLE_REDIS", &v)?;
        }
        if let Some(v) = lookup("REDIS_URL") {
            self.store.redis_url = v;
        }
        if let Some(v) = lookup("CACHE_TTL_SECONDS") {
            self.cache.ttl_seconds = parse_env("CACHE_TTL_SECONDS", &v)?;
        }
        if let Some(v) = lookup("RATE_LIMIT_REQUESTS") {
            self.rate_limit.requests = parse_env("RATE_LIMIT_REQUESTS", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v;
        }
        Ok(())
    }

    /// Reject out-of-range or inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        check_range("openai.timeout_ms", self.openai.timeout_ms, 1_000, 30_000)?;
        check_range(
            "server.request_timeout_ms",
            self.server.request_timeout_ms,
            1_000,
            60_000,
        )?;
        if self.openai.timeout_ms >= self.server.request_timeout_ms {
            return Err(PrecisError::Configuration(format!(
                "openai.timeout_ms ({}) must be lower than server.request_timeout_ms ({})",
                self.openai.timeout_ms, self.server.request_timeout_ms
            )));
        }
        check_range("openai.max_retries", self.openai.max_retries, 0, 5)?;
        let worst_case = self.worst_case_primary();
        if worst_case + FALLBACK_HEADROOM > self.request_timeout() {
            return Err(PrecisError::Configuration(format!(
                "{} attempts of openai.timeout_ms ({}) plus backoff take up to {}ms, \
                 which leaves no room for the fallback within server.request_timeout_ms ({})",
                self.retry().max_attempts,
                self.openai.timeout_ms,
                worst_case.as_millis(),
                self.server.request_timeout_ms
            )));
        }
        check_range(
            "server.max_text_length",
            self.server.max_text_length,
            100,
            100_000,
        )?;
        check_range("cache.ttl_seconds", self.cache.ttl_seconds, 60, 86_400)?;
        check_range("rate_limit.requests", self.rate_limit.requests, 10, 1_000)?;
        if self.rate_limit.window_seconds == 0 {
            return Err(PrecisError::Configuration(
                "rate_limit.window_seconds must be positive".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_uppercase().as_str()) {
            return Err(PrecisError::Configuration(format!(
                "logging.level must be one of {LOG_LEVELS:?}, got '{}'",
                self.logging.level
            )));
        }
        self.lang_default()?;
        Ok(())
    }

    /// Parsed default request language.
    pub fn lang_default(&self) -> Result<Language> {
        Language::from_str(&self.server.lang_default).map_err(|e| {
            PrecisError::Configuration(format!("server.lang_default: {e}"))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.openai.timeout_ms)
    }

    /// Retry policy for the primary provider.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new().max_attempts(self.openai.max_retries)
    }

    /// Longest the primary stage can take: every attempt timing out, with
    /// the scheduled backoff between attempts.
    pub fn worst_case_primary(&self) -> Duration {
        let retry = self.retry();
        let attempts = retry.max_attempts.max(1);
        let backoff: Duration = (0..attempts - 1)
            .map(|attempt| retry.delay_for_attempt(attempt))
            .sum();
        self.llm_timeout() * attempts + backoff
    }

    /// Bound on the primary stage: the request timeout minus
    /// [`FALLBACK_HEADROOM`].
    pub fn primary_budget(&self) -> Duration {
        self.request_timeout().saturating_sub(FALLBACK_HEADROOM)
    }

    /// CORS origins as a list; `["*"]` allows any origin.
    pub fn cors_origins(&self) -> Vec<String> {
        let raw = self.server.cors_origins.trim();
        if raw == "*" {
            return vec!["*".to_string()];
        }
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PrecisError::Configuration(format!("{name}: invalid value '{value}': {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PrecisError::Configuration(format!(
            "{name}: expected a boolean, got '{value}'"
        ))),
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PrecisError::Configuration(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
    #[serde(default)]
    pub clients: Option<ClientKeys>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Bearer keys accepted from clients.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientKeys {
    pub api_keys: Vec<String>,
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.precis/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/precis/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (env vars are used then).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".precis").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_path(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/precis/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_path(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a specific secrets file after checking its permissions.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            PrecisError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PrecisError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            PrecisError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(PrecisError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// OpenAI key from the secrets file, else `OPENAI_API_KEY`.
    pub fn openai_api_key(&self) -> Result<String> {
        self.openai_api_key_with(|name| std::env::var(name).ok())
    }

    /// Like [`openai_api_key`](Self::openai_api_key) with a custom env lookup.
    pub fn openai_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        let key = self
            .openai
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| lookup("OPENAI_API_KEY"))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PrecisError::Configuration("OPENAI_API_KEY is required".to_string()))?;
        if !key.starts_with("sk-") {
            return Err(PrecisError::Configuration(
                "OPENAI_API_KEY must start with 'sk-'".to_string(),
            ));
        }
        Ok(key)
    }

    /// Client bearer keys from the secrets file, else comma-separated
    /// `API_KEYS_ALLOWED`.
    pub fn allowed_api_keys(&self) -> Result<Vec<String>> {
        self.allowed_api_keys_with(|name| std::env::var(name).ok())
    }

    /// Like [`allowed_api_keys`](Self::allowed_api_keys) with a custom env lookup.
    pub fn allowed_api_keys_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<String>> {
        let keys: Vec<String> = match &self.clients {
            Some(clients) => clients
                .api_keys
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            None => lookup("API_KEYS_ALLOWED")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect(),
        };
        if keys.is_empty() {
            return Err(PrecisError::Configuration(
                "API_KEYS_ALLOWED must not be empty".to_string(),
            ));
        }
        Ok(keys)
    }
}
