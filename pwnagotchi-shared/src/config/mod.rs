#![allow(clippy::missing_errors_doc)]

mod ai;
mod debug;
mod log;
mod main;
mod personality;

use std::{fmt::Display, path::Path, sync::OnceLock};

pub use ai::AiConfig;
pub use debug::DebugConfig;
pub use log::LogConfig;
pub use main::MainConfig;
pub use personality::PersonalityConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub main: MainConfig,
  pub personality: PersonalityConfig,
  pub ai: AiConfig,
  pub log: LogConfig,
  pub debug: DebugConfig,
}

impl Display for Config {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", toml::to_string(self).unwrap_or_default())
  }
}

impl Config {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
    let config_str =
      std::fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {e}"))?;
    Self::parse(&config_str)
  }

  pub fn parse(config_str: &str) -> Result<Self, String> {
    toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}"))
  }

  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
    let config_str =
      toml::to_string(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
    std::fs::write(path, config_str).map_err(|e| format!("Failed to write config file: {e}"))?;
    Ok(())
  }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn init_config_with(config: Config) {
  let _ = CONFIG.set(config);
}

/// Returns a reference to the global configuration.
///
/// # Panics
/// Panics if the configuration has not been initialized.
#[allow(clippy::expect_used)]
pub fn config() -> &'static Config {
  CONFIG.get().expect("Config not initialized")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = Config::parse("").expect("empty config parses");
    assert!(cfg.ai.enabled);
    assert_eq!(cfg.ai.epochs_per_episode, 50);
    assert_eq!(cfg.personality.sad_num_epochs, 25);
    assert_eq!(cfg.personality.bored_num_epochs, 15);
  }

  #[test]
  fn ai_params_are_kept_verbatim() {
    let cfg = Config::parse(
      r#"
      [ai]
      enabled = false
      path = "/tmp/brain.json"

      [ai.params]
      gamma = 0.5
      policy = "mlp"
      layers = [64, 64]
      "#,
    )
    .expect("config parses");

    assert!(!cfg.ai.enabled);
    assert_eq!(cfg.ai.path, "/tmp/brain.json");
    assert_eq!(cfg.ai.params.len(), 3);
    assert_eq!(cfg.ai.params["policy"].as_str(), Some("mlp"));
    assert_eq!(cfg.ai.params["layers"].as_array().map(Vec::len), Some(2));
  }

  #[test]
  fn save_then_load_preserves_sections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");

    let mut cfg = Config::default();
    cfg.main.name = "gotchi".into();
    cfg.personality.channels = vec![1, 6, 11];
    cfg.save(&path).expect("save");

    let loaded = Config::load(&path).expect("load");
    assert_eq!(loaded.main.name, "gotchi");
    assert_eq!(loaded.personality.channels, vec![1, 6, 11]);
    assert_eq!(loaded.ai.params, cfg.ai.params);
  }

  #[test]
  fn malformed_file_is_reported() {
    let err = Config::parse("[ai\nenabled = ").expect_err("malformed config");
    assert!(err.starts_with("Failed to parse config file"));
  }
}
