use std::borrow::Cow;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LogConfig {
  pub path: Cow<'static, str>,
  pub path_debug: Cow<'static, str>,
  /// Mirror every entry to stderr as well
  pub stderr: bool,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      path: "/etc/pwnagotchi/log/pwnagotchi.log".into(),
      path_debug: "/etc/pwnagotchi/log/pwnagotchi_debug.log".into(),
      stderr: false,
    }
  }
}
