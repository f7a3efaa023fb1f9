//! Bot configuration: TOML file plus `BACKPORT_*` environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BOT_LOGIN: &str = "BACKPORT_BOT_LOGIN";
pub const ENV_INTEGRATE_COMMAND: &str = "BACKPORT_INTEGRATE_COMMAND";
pub const ENV_REPOSITORY: &str = "BACKPORT_REPOSITORY";
pub const ENV_STORE_DIR: &str = "BACKPORT_STORE_DIR";
pub const ENV_POLL_INTERVAL_SECS: &str = "BACKPORT_POLL_INTERVAL_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration shared by the CLI and the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// Login the bot posts comments as; only its comments carry markers.
    pub bot_login: String,
    /// Comment body that requests integration.
    pub integrate_command: String,
    /// Local mirror searched for original commits.
    pub repository: PathBuf,
    /// Directory of JSON pull request documents.
    pub store_dir: PathBuf,
    pub poll_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_login: "backport-bot".to_string(),
            integrate_command: "/integrate".to_string(),
            repository: PathBuf::from("."),
            store_dir: PathBuf::from(".backport/prs"),
            poll_interval_secs: 60,
        }
    }
}

impl BotConfig {
    /// Load from `path` (when given), apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from `lookup`, usually the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(login) = lookup(ENV_BOT_LOGIN) {
            self.bot_login = login;
        }
        if let Some(command) = lookup(ENV_INTEGRATE_COMMAND) {
            self.integrate_command = command;
        }
        if let Some(repository) = lookup(ENV_REPOSITORY) {
            self.repository = PathBuf::from(repository);
        }
        if let Some(store_dir) = lookup(ENV_STORE_DIR) {
            self.store_dir = PathBuf::from(store_dir);
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_SECS) {
            self.poll_interval_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_POLL_INTERVAL_SECS.to_string(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_login.trim().is_empty() {
            return Err(ConfigError::Invalid("bot_login must not be empty".to_string()));
        }
        if self.integrate_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "integrate_command must not be empty".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = BotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.integrate_command, "/integrate");
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BotConfig::from_toml_str(
            r#"
            bot_login = "skara-bot"
            poll_interval_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.bot_login, "skara-bot");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.integrate_command, "/integrate");
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BOT_LOGIN, "env-bot"),
            (ENV_POLL_INTERVAL_SECS, "15"),
            (ENV_STORE_DIR, "/tmp/prs"),
        ]);
        let mut config = BotConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bot_login, "env-bot");
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.store_dir, PathBuf::from("/tmp/prs"));
    }

    #[test]
    fn bad_interval_override_is_rejected() {
        let mut config = BotConfig::default();
        let err = config
            .apply_overrides(|k| (k == ENV_POLL_INTERVAL_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_SECS));
    }

    #[test]
    fn validation_rejects_empty_login_and_zero_interval() {
        let mut config = BotConfig {
            bot_login: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.bot_login = "bot".to_string();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn mistyped_value_is_a_parse_error() {
        assert!(matches!(
            BotConfig::from_toml_str("poll_interval_secs = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn misspelled_key_is_a_parse_error() {
        let err = BotConfig::from_toml_str("bot_logn = \"skara-bot\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("bot_logn"));
    }
}
