use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Short-circuits authentication to a fixed account id. Development
    /// and test use only; must never be set in production.
    pub auth_bypass_subject: Option<String>,
    /// Credentials for seeding the initial super-admin on first boot.
    pub bootstrap: Option<BootstrapAdmin>,
    pub node: NodeConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    pub tokens: TokenConfig,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub cleanup_interval_seconds: u64,
    pub reset_token_ttl_seconds: u64,
    pub session_idle_timeout_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: 60,
            reset_token_ttl_seconds: 3600,         // 60 minutes
            session_idle_timeout_seconds: 3600,    // 60 minutes
        }
    }
}

impl TokenConfig {
    /// Sliding idle window applied to sessions
    pub fn idle_timeout(&self) -> Duration {
        Duration::seconds(self.session_idle_timeout_seconds as i64)
    }

    /// Fixed expiry window applied to reset tokens
    pub fn reset_ttl(&self) -> Duration {
        Duration::seconds(self.reset_token_ttl_seconds as i64)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let auth_bypass_subject = std::env::var("AUTH_BYPASS_SUBJECT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let bootstrap = match (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::ValidationError(
                    "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                        .to_string(),
                ))
            }
        };

        let mut tokens = TokenConfig::default();
        if let Some(v) = parse_env("SESSION_IDLE_TIMEOUT_SECONDS") {
            tokens.session_idle_timeout_seconds = v;
        }
        if let Some(v) = parse_env("RESET_TOKEN_TTL_SECONDS") {
            tokens.reset_token_ttl_seconds = v;
        }
        if let Some(v) = parse_env("CLEANUP_INTERVAL_SECONDS") {
            tokens.cleanup_interval_seconds = v;
        }

        let config = Config {
            auth_bypass_subject,
            bootstrap,
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            test_mode,
            tokens,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.session_idle_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "SESSION_IDLE_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }
        if self.tokens.reset_token_ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "RESET_TOKEN_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }
        if self.tokens.cleanup_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "CLEANUP_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
