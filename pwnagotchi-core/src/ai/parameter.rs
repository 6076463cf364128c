use std::collections::BTreeMap;

use pwnagotchi_shared::{config::PersonalityConfig, utils::wifi::NUM_CHANNELS};
use serde::{Deserialize, Serialize};

/// A discrete knob the policy can turn. Index `i` of an action maps to
/// `min + i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
  pub name: String,
  pub min: i64,
  pub max: i64,
  /// Set for the per channel on/off switches
  pub channel: Option<u16>,
}

impl Parameter {
  pub fn new(name: &str, min: i64, max: i64) -> Self {
    Self { name: name.to_string(), min, max, channel: None }
  }

  pub fn channel(channel: u16) -> Self {
    Self { name: format!("_channel_{channel}"), min: 0, max: 1, channel: Some(channel) }
  }

  /// Number of distinct values.
  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  pub const fn cardinality(&self) -> u32 {
    (self.max - self.min + 1) as u32
  }

  pub fn value(&self, index: u32) -> i64 {
    (self.min + i64::from(index)).min(self.max)
  }
}

/// One index per [`Parameter`], in action space order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Action(pub Vec<u32>);

/// What the agent should run with for the next epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
  pub personality: PersonalityConfig,
  /// Channels switched on, empty means all supported channels
  pub channels: Vec<u16>,
  pub values: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpace {
  params: Vec<Parameter>,
}

fn clamp_u32(v: i64) -> u32 {
  u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

impl ActionSpace {
  /// Personality knobs followed by one switch per channel in `channels`, or
  /// per channel of the whole channel space when empty.
  pub fn new(channels: &[u16]) -> Self {
    let mut params = vec![
      Parameter::new("min_rssi", -200, -50),
      Parameter::new("ap_ttl", 30, 600),
      Parameter::new("sta_ttl", 60, 300),
      Parameter::new("recon_time", 5, 60),
      Parameter::new("max_inactive_scale", 3, 10),
      Parameter::new("recon_inactive_multiplier", 1, 3),
      Parameter::new("hop_recon_time", 5, 60),
      Parameter::new("min_recon_time", 1, 30),
      Parameter::new("max_interactions", 1, 25),
      Parameter::new("max_misses_for_recon", 3, 10),
      Parameter::new("excited_num_epochs", 5, 30),
      Parameter::new("bored_num_epochs", 5, 30),
      Parameter::new("sad_num_epochs", 5, 30),
    ];

    if channels.is_empty() {
      params.extend((1..=NUM_CHANNELS).map(Parameter::channel));
    } else {
      params.extend(channels.iter().copied().map(Parameter::channel));
    }

    Self { params }
  }

  pub fn params(&self) -> &[Parameter] {
    &self.params
  }

  pub fn len(&self) -> usize {
    self.params.len()
  }

  pub fn is_empty(&self) -> bool {
    self.params.is_empty()
  }

  /// Cardinality of every dimension, the shape a backend samples from.
  pub fn dims(&self) -> Vec<u32> {
    self.params.iter().map(Parameter::cardinality).collect()
  }

  pub fn contains(&self, action: &Action) -> bool {
    action.0.len() == self.params.len()
      && action.0.iter().zip(&self.params).all(|(i, p)| *i < p.cardinality())
  }

  /// Applies `action` on top of `base`. Dimensions the action lacks keep the
  /// base value, indices past a parameter's range saturate at its max.
  pub fn decode(&self, action: &Action, base: &PersonalityConfig) -> PolicyDecision {
    let mut personality = base.clone();
    let mut channels = Vec::new();
    let mut values = BTreeMap::new();

    for (param, index) in self.params.iter().zip(&action.0) {
      let value = param.value(*index);

      if let Some(channel) = param.channel {
        if value == 1 {
          channels.push(channel);
        }
        continue;
      }

      match param.name.as_str() {
        "min_rssi" => personality.min_rssi = i16::try_from(value).unwrap_or(i16::MIN),
        "ap_ttl" => personality.ap_ttl = clamp_u32(value),
        "sta_ttl" => personality.sta_ttl = clamp_u32(value),
        "recon_time" => personality.recon_time = clamp_u32(value),
        "max_inactive_scale" => personality.max_inactive_scale = clamp_u32(value),
        "recon_inactive_multiplier" => personality.recon_inactive_multiplier = clamp_u32(value),
        "hop_recon_time" => personality.hop_recon_time = clamp_u32(value),
        "min_recon_time" => personality.min_recon_time = clamp_u32(value),
        "max_interactions" => personality.max_interactions = clamp_u32(value),
        "max_misses_for_recon" => personality.max_misses_for_recon = clamp_u32(value),
        "excited_num_epochs" => personality.excited_num_epochs = clamp_u32(value),
        "bored_num_epochs" => personality.bored_num_epochs = clamp_u32(value),
        "sad_num_epochs" => personality.sad_num_epochs = clamp_u32(value),
        _ => {}
      }
      values.insert(param.name.clone(), value);
    }

    personality.channels.clone_from(&channels);
    PolicyDecision { personality, channels, values }
  }
}
