use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::models::agent::RunningMode;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MainConfig {
  pub name: Cow<'static, str>,
  pub mode: RunningMode,
  pub no_restart: bool,
}

impl Default for MainConfig {
  fn default() -> Self {
    Self {
      name: "pwnagotchi".into(),
      mode: RunningMode::Auto,
      no_restart: false,
    }
  }
}
