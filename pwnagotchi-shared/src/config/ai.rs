use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AiConfig {
  pub enabled: bool,
  /// Checkpoint location, owned by the policy backend
  pub path: Cow<'static, str>,
  pub epochs_per_episode: u32,
  /// Handed to the policy backend untouched
  pub params: Table,
}

impl AiConfig {
  pub fn default_params() -> Table {
    let mut params = Table::new();
    params.insert("gamma".into(), Value::Float(0.99));
    params.insert("n_steps".into(), Value::Integer(1));
    params.insert("vf_coef".into(), Value::Float(0.25));
    params.insert("ent_coef".into(), Value::Float(0.01));
    params.insert("max_grad_norm".into(), Value::Float(0.5));
    params.insert("learning_rate".into(), Value::Float(0.001));
    params.insert("alpha".into(), Value::Float(0.99));
    params.insert("epsilon".into(), Value::Float(1e-5));
    params.insert("verbose".into(), Value::Integer(1));
    params.insert("lr_schedule".into(), Value::String("constant".into()));
    params
  }
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: "/root/brain.json".into(),
      epochs_per_episode: 50,
      params: Self::default_params(),
    }
  }
}
