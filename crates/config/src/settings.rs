//! Main settings module.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Resource caps and timeouts from spec.md §5, environment-overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapsConfig {
    #[serde(default = "default_max_active_rooms")]
    pub max_active_rooms: usize,
    #[serde(default = "default_max_memory_usage_gb")]
    pub max_memory_usage_gb: f64,
    #[serde(default = "default_memory_check_interval_mins")]
    pub memory_check_interval_mins: u64,
    #[serde(default = "default_max_rounds_interactive")]
    pub max_rounds_interactive: u32,
    #[serde(default = "default_summary_every_n_rounds")]
    pub summary_every_n_rounds: u32,
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    #[serde(default = "default_per_room_max_in_flight")]
    pub per_room_max_in_flight: usize,
}

fn default_max_active_rooms() -> usize {
    50
}
fn default_max_memory_usage_gb() -> f64 {
    8.0
}
fn default_memory_check_interval_mins() -> u64 {
    1
}
fn default_max_rounds_interactive() -> u32 {
    4
}
fn default_summary_every_n_rounds() -> u32 {
    2
}
fn default_subscriber_buffer() -> usize {
    256
}
fn default_per_room_max_in_flight() -> usize {
    2
}

impl Default for CapsConfig {
    fn default() -> Self {
        Self {
            max_active_rooms: default_max_active_rooms(),
            max_memory_usage_gb: default_max_memory_usage_gb(),
            memory_check_interval_mins: default_memory_check_interval_mins(),
            max_rounds_interactive: default_max_rounds_interactive(),
            summary_every_n_rounds: default_summary_every_n_rounds(),
            subscriber_buffer: default_subscriber_buffer(),
            per_room_max_in_flight: default_per_room_max_in_flight(),
        }
    }
}

impl CapsConfig {
    pub fn caps_for(&self, env: RuntimeEnvironment) -> Self {
        if env.is_production() {
            CapsConfig { max_active_rooms: 100, max_memory_usage_gb: 12.0, ..self.clone() }
        } else {
            self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default = "default_rag_per_source_timeout_secs")]
    pub rag_per_source_timeout_secs: u64,
    #[serde(default = "default_rag_combined_timeout_secs")]
    pub rag_combined_timeout_secs: u64,
    #[serde(default = "default_user_turn_timeout_secs")]
    pub user_turn_timeout_secs: u64,
}

fn default_llm_timeout_secs() -> u64 {
    30
}
fn default_rag_per_source_timeout_secs() -> u64 {
    8
}
fn default_rag_combined_timeout_secs() -> u64 {
    15
}
fn default_user_turn_timeout_secs() -> u64 {
    180
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_secs: default_llm_timeout_secs(),
            rag_per_source_timeout_secs: default_rag_per_source_timeout_secs(),
            rag_combined_timeout_secs: default_rag_combined_timeout_secs(),
            user_turn_timeout_secs: default_user_turn_timeout_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn rag_per_source_timeout(&self) -> Duration {
        Duration::from_secs(self.rag_per_source_timeout_secs)
    }

    pub fn rag_combined_timeout(&self) -> Duration {
        Duration::from_secs(self.rag_combined_timeout_secs)
    }

    pub fn user_turn_timeout(&self) -> Duration {
        Duration::from_secs(self.user_turn_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CataloguePaths {
    #[serde(default = "default_philosophers_path")]
    pub philosophers: String,
    #[serde(default = "default_strategies_path")]
    pub strategies: String,
    #[serde(default = "default_rag_weights_path")]
    pub rag_weights: String,
}

fn default_philosophers_path() -> String {
    "config/philosophers.yaml".to_string()
}
fn default_strategies_path() -> String {
    "config/strategies.yaml".to_string()
}
fn default_rag_weights_path() -> String {
    "config/rag_weights.yaml".to_string()
}

impl Default for CataloguePaths {
    fn default() -> Self {
        Self {
            philosophers: default_philosophers_path(),
            strategies: default_strategies_path(),
            rag_weights: default_rag_weights_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub json_logs: bool,
    #[serde(default)]
    pub metrics_enabled: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Top-level settings struct, loaded layered (defaults -> env file -> env
/// vars), the way the teacher's `Settings` is composed in `settings.rs`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub caps: CapsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub catalogues: CataloguePaths,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.caps.max_active_rooms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "caps.max_active_rooms".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.timeouts.llm_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeouts.llm_timeout_secs".to_string(),
                message: "must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}

/// Layered load: `config/default.{toml,yaml}` -> `config/{env}.{toml,yaml}`
/// -> `DEBATE_*` environment variables, matching the teacher's
/// `load_settings`. Fatal errors here should abort startup in strict
/// environments (spec.md §6.6/§7 `CONFIG_INVALID`).
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(Environment::with_prefix("DEBATE").separator("__").try_parsing(true));

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.caps.max_active_rooms, 50);
        assert_eq!(settings.caps.max_rounds_interactive, 4);
    }

    #[test]
    fn production_caps_escalate() {
        let caps = CapsConfig::default().caps_for(RuntimeEnvironment::Production);
        assert_eq!(caps.max_active_rooms, 100);
        assert_eq!(caps.max_memory_usage_gb, 12.0);
    }

    #[test]
    fn zero_caps_fail_validation() {
        let mut settings = Settings::default();
        settings.caps.max_active_rooms = 0;
        assert!(settings.validate().is_err());
    }
}
