use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Station {
  pub mac: String,
  pub hostname: String,
  pub rssi: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPoint {
  pub mac: String,
  pub hostname: String,
  pub frequency: u32,
  pub channel: u16,
  pub rssi: i32,
  pub encryption: String,
  pub clients: Vec<Station>,
}
