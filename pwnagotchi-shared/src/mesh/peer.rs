use serde::{Deserialize, Serialize};

/// Another unit seen over the mesh advertisement channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Peer {
  pub session_id: String,
  pub name: String,
  pub encounters: u32,
  pub last_channel: u16,
  pub rssi: i16,
}
