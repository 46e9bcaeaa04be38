//! Configuration management for coupon-audit
//!
//! Values come from environment variables (with `.env` support) or from a
//! TOML file. Missing credentials are not an error: the affected calls fail
//! at runtime and are logged like any other failure.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::generator::{Alphabet, CodeGenerator};
use crate::worker::DelayPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
    pub redeem: RedeemConfig,
    pub notify: NotifyConfig,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

/// Status server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub enable_cors: bool,
    pub enable_request_logging: bool,
}

/// Candidate code shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub prefix: String,
    pub alphabet: Alphabet,
    pub suffix_len: usize,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

/// Redemption endpoint and coupon book settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedeemConfig {
    /// Redemption URL; `None` targets this process's own `/api/redeem`
    pub url: Option<String>,
    /// Bearer key shared by the client and the coupon book
    pub api_key: Option<String>,
    pub product_id: String,
    pub plan_code: String,
    pub timeout_secs: u64,
    /// Codes issued into the coupon book at startup
    pub seed_codes: usize,
    /// Redemptions allowed per code
    pub max_redemptions: u32,
}

/// Operator notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Owner identity for the start endpoint
    pub owner_id: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

/// Worker loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub delay: DelayPolicy,
    /// Stop after this many attempts; unbounded when absent
    pub max_attempts: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (text, json)
    pub format: String,
    /// Append-only attempt journal
    pub journal_path: PathBuf,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            prefix: String::from("K6GLNG7"),
            alphabet: Alphabet::Upper,
            suffix_len: 5,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn build(&self) -> CodeGenerator {
        let generator = CodeGenerator::new(self.prefix.clone(), self.alphabet, self.suffix_len);
        match self.seed {
            Some(seed) => generator.with_seed(seed),
            None => generator,
        }
    }
}

impl Default for RedeemConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            product_id: String::from("audit-product"),
            plan_code: String::from("audit-plan"),
            timeout_secs: 10,
            seed_codes: 20,
            max_redemptions: 1,
        }
    }
}

impl RedeemConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Redemption URL, falling back to the coupon book served on `local`
    pub fn resolved_url(&self, local: SocketAddr) -> String {
        self.url.clone().unwrap_or_else(|| local_redeem_url(local))
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            owner_id: None,
            api_base: String::from("https://api.telegram.org"),
            timeout_secs: 10,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            delay: DelayPolicy::default(),
            max_attempts: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
            journal_path: PathBuf::from("logs/attempts.log"),
        }
    }
}

/// URL of the coupon book served on `addr`
///
/// Wildcard bind addresses are rewritten to loopback.
pub fn local_redeem_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://127.0.0.1:{}/api/redeem", addr.port())
    } else {
        format!("http://{addr}/api/redeem")
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{raw}'"))),
        None => Ok(None),
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_var(key).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first; variables
    /// already set in the environment win.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();

        let mut config = Self::default();

        if let Some(addr) = env_parse::<SocketAddr>("COUPON_AUDIT_BIND")? {
            config.server.bind_address = addr;
        }
        if let Some(cors) = env_bool("COUPON_AUDIT_CORS") {
            config.server.enable_cors = cors;
        }

        if let Some(prefix) = env_var("COUPON_PREFIX") {
            config.generator.prefix = prefix.trim().to_string();
        }
        if let Some(raw) = env_var("COUPON_ALPHABET") {
            config.generator.alphabet = raw
                .parse()
                .map_err(|e: String| ConfigError::invalid("COUPON_ALPHABET", e))?;
        }
        if let Some(len) = env_parse("COUPON_SUFFIX_LEN")? {
            config.generator.suffix_len = len;
        }
        config.generator.seed = env_parse("COUPON_SEED")?;

        config.redeem.url = env_var("REDEEM_URL");
        config.redeem.api_key = env_var("REDEEM_API_KEY");
        if let Some(product) = env_var("REDEEM_PRODUCT_ID") {
            config.redeem.product_id = product;
        }
        if let Some(plan) = env_var("REDEEM_PLAN_CODE") {
            config.redeem.plan_code = plan;
        }
        if let Some(timeout) = env_parse("REDEEM_TIMEOUT_SECS")? {
            config.redeem.timeout_secs = timeout;
        }
        if let Some(count) = env_parse("REDEEM_SEED_CODES")? {
            config.redeem.seed_codes = count;
        }
        if let Some(max) = env_parse("REDEEM_MAX_REDEMPTIONS")? {
            config.redeem.max_redemptions = max;
        }

        config.notify.bot_token = env_var("BOT_TOKEN");
        config.notify.chat_id = env_var("CHAT_ID");
        config.notify.owner_id = env_var("OWNER_ID");
        if let Some(base) = env_var("BOT_API_BASE") {
            config.notify.api_base = base.trim_end_matches('/').to_string();
        }

        if let Some(ms) = env_parse::<u64>("WORKER_DELAY_MS")? {
            config.worker.delay = DelayPolicy::Fixed { ms };
        } else {
            let min_ms = env_parse::<u64>("WORKER_DELAY_MIN_MS")?;
            let max_ms = env_parse::<u64>("WORKER_DELAY_MAX_MS")?;
            if min_ms.is_some() || max_ms.is_some() {
                config.worker.delay = DelayPolicy::Uniform {
                    min_ms: min_ms.unwrap_or(DelayPolicy::DEFAULT_MIN_MS),
                    max_ms: max_ms.unwrap_or(DelayPolicy::DEFAULT_MAX_MS),
                };
            }
        }
        config.worker.max_attempts = env_parse("WORKER_MAX_ATTEMPTS")?;

        if let Some(level) = env_var("COUPON_AUDIT_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = env_var("COUPON_AUDIT_LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Some(path) = env_var("COUPON_AUDIT_JOURNAL") {
            config.logging.journal_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid("generator.prefix", "must not contain whitespace"));
        }

        if self.redeem.timeout_secs == 0 {
            return Err(ConfigError::invalid("redeem.timeout_secs", "must be greater than 0"));
        }

        if let Some(url) = &self.redeem.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::invalid(
                    "redeem.url",
                    "must start with http:// or https://",
                ));
            }
        }

        if self.notify.timeout_secs == 0 {
            return Err(ConfigError::invalid("notify.timeout_secs", "must be greater than 0"));
        }

        if let DelayPolicy::Uniform { min_ms, max_ms } = self.worker.delay {
            if min_ms > max_ms {
                return Err(ConfigError::invalid(
                    "worker.delay",
                    format!("min ({min_ms}ms) exceeds max ({max_ms}ms)"),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "COUPON_AUDIT_BIND",
        "COUPON_PREFIX",
        "COUPON_ALPHABET",
        "COUPON_SUFFIX_LEN",
        "COUPON_SEED",
        "REDEEM_URL",
        "REDEEM_API_KEY",
        "WORKER_DELAY_MS",
        "WORKER_DELAY_MIN_MS",
        "WORKER_DELAY_MAX_MS",
        "WORKER_MAX_ATTEMPTS",
        "OWNER_ID",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.redeem.resolved_url(config.server.bind_address),
            "http://127.0.0.1:8080/api/redeem"
        );
        assert_eq!(config.generator.build().code_len(), 12);
    }

    #[test]
    fn test_invalid_delay_range() {
        let mut config = Config::default();
        config.worker.delay = DelayPolicy::Uniform { min_ms: 500, max_ms: 100 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redeem_url_must_be_http() {
        let mut config = Config::default();
        config.redeem.url = Some("localhost:8080/api/redeem".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.redeem.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_redeem_url_for_wildcard() {
        let addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        assert_eq!(local_redeem_url(addr), "http://127.0.0.1:9000/api/redeem");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("COUPON_AUDIT_BIND", "127.0.0.1:9100");
        std::env::set_var("COUPON_PREFIX", "SPRING");
        std::env::set_var("COUPON_ALPHABET", "upper_digits");
        std::env::set_var("COUPON_SUFFIX_LEN", "6");
        std::env::set_var("WORKER_DELAY_MS", "250");
        std::env::set_var("OWNER_ID", "owner-1");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.generator.prefix, "SPRING");
        assert_eq!(config.generator.alphabet, Alphabet::UpperDigits);
        assert_eq!(config.generator.suffix_len, 6);
        assert!(config.redeem.url.is_none());
        assert_eq!(
            config.redeem.resolved_url(config.server.bind_address),
            "http://127.0.0.1:9100/api/redeem"
        );
        assert_eq!(config.worker.delay, DelayPolicy::Fixed { ms: 250 });
        assert_eq!(config.notify.owner_id.as_deref(), Some("owner-1"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_number() {
        clear_env();
        std::env::set_var("COUPON_SUFFIX_LEN", "five");
        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.toml");
        std::fs::write(
            &path,
            r#"
[generator]
prefix = "WINTER"
alphabet = "upper_digits"
suffix_len = 4

[worker.delay]
kind = "fixed"
ms = 10
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.generator.prefix, "WINTER");
        assert_eq!(config.generator.suffix_len, 4);
        assert_eq!(config.worker.delay, DelayPolicy::Fixed { ms: 10 });
        assert_eq!(config.redeem.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }
}
