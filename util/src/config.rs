//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// Base URL of the REST backend, without a trailing slash.
    pub api_base_url: String,
    /// Where the session (bearer token + selected course) is persisted.
    pub session_file: String,
    pub request_timeout_secs: u64,
    /// Extra attempts for idempotent GET requests.
    pub request_retries: u32,
    pub analysis_debounce_ms: u64,
    pub min_analysis_chars: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every key has a default, so a missing `.env` yields a usable
    /// development configuration. Unparseable numbers fall back to their default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "campus.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            session_file: env::var("SESSION_FILE").unwrap_or_else(|_| "data/session.json".into()),
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 30),
            request_retries: parse_or("REQUEST_RETRIES", 2),
            analysis_debounce_ms: parse_or("ANALYSIS_DEBOUNCE_MS", 2000),
            min_analysis_chars: parse_or("MIN_ANALYSIS_CHARS", 50),
        }
    }

    /// Returns a shared reference to the global configuration.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_api_base_url(value: impl Into<String>) {
        let value = value.into();
        AppConfig::set_field(|cfg| cfg.api_base_url = value.trim_end_matches('/').to_string());
    }

    pub fn set_session_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.session_file = value.into());
    }

    pub fn set_request_timeout_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.request_timeout_secs = value);
    }

    pub fn set_request_retries(value: u32) {
        AppConfig::set_field(|cfg| cfg.request_retries = value);
    }

    pub fn set_analysis_debounce_ms(value: u64) {
        AppConfig::set_field(|cfg| cfg.analysis_debounce_ms = value);
    }

    pub fn set_min_analysis_chars(value: usize) {
        AppConfig::set_field(|cfg| cfg.min_analysis_chars = value);
    }
}

// --- Free getters, cloned out of the lock ---

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn api_base_url() -> String {
    AppConfig::global().api_base_url.clone()
}

pub fn session_file() -> String {
    AppConfig::global().session_file.clone()
}

pub fn request_timeout_secs() -> u64 {
    AppConfig::global().request_timeout_secs
}

pub fn request_retries() -> u32 {
    AppConfig::global().request_retries
}

pub fn analysis_debounce_ms() -> u64 {
    AppConfig::global().analysis_debounce_ms
}

pub fn min_analysis_chars() -> usize {
    AppConfig::global().min_analysis_chars
}
