use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningMode {
  #[default]
  Auto,
  Manual,
  Ai,
}

impl RunningMode {
  /// Marker file read by the service wrapper to pick the mode after a restart.
  pub const fn marker_file(self) -> &'static str {
    match self {
      Self::Auto | Self::Ai => "/root/.pwnagotchi-auto",
      Self::Manual => "/root/.pwnagotchi-manual",
    }
  }
}

impl Display for RunningMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Auto => "AUTO",
      Self::Manual => "MANU",
      Self::Ai => "AI",
    };
    write!(f, "{s}")
  }
}
