//! The seam to the policy-gradient library. This crate never trains anything
//! itself: it hands observations, actions and rewards to a [`PolicyModel`] and
//! lets a [`PolicyBackend`] build or restore one.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::ai::{env::VecEnv, parameter::Action};

/// Free form hyperparameters from the `[ai.params]` table, passed through as is.
pub type Hyperparameters = toml::Table;

/// One transition the model learns from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
  pub epoch_n: u64,
  pub observation: Vec<f32>,
  pub action: Action,
  pub reward: f64,
}

pub trait PolicyModel: Send + Sync {
  fn predict(&self, observation: &[f32]) -> Action;
  fn train_step(&mut self, sample: &Sample) -> Result<()>;
  fn save(&self, path: &Path) -> Result<()>;
  fn hyperparameters(&self) -> &Hyperparameters;
  /// Training steps taken over the model's whole life, restored checkpoints included.
  fn timesteps(&self) -> u64;
}

pub trait PolicyBackend: Send + Sync {
  fn name(&self) -> &'static str;
  fn create(&self, env: &VecEnv, params: &Hyperparameters) -> Result<Box<dyn PolicyModel>>;
  fn load(&self, path: &Path, env: &VecEnv) -> Result<Box<dyn PolicyModel>>;
}

const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
  version: u32,
  dims: Vec<u32>,
  timesteps: u64,
  mean_reward: f64,
  params: Hyperparameters,
}

/// Baseline backend: samples every dimension uniformly and keeps a running
/// reward mean. Useful to collect experience before a real learner is plugged
/// in, and as the stand-in for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplorationBackend;

pub struct ExplorationPolicy {
  dims: Vec<u32>,
  params: Hyperparameters,
  rng: Mutex<fastrand::Rng>,
  timesteps: u64,
  mean_reward: f64,
}

impl ExplorationPolicy {
  fn new(dims: Vec<u32>, params: Hyperparameters, timesteps: u64, mean_reward: f64) -> Self {
    let rng = params
      .get("seed")
      .and_then(toml::Value::as_integer)
      .map_or_else(fastrand::Rng::new, |seed| fastrand::Rng::with_seed(seed.unsigned_abs()));

    Self { dims, params, rng: Mutex::new(rng), timesteps, mean_reward }
  }
}

impl PolicyModel for ExplorationPolicy {
  fn predict(&self, _observation: &[f32]) -> Action {
    let mut rng = self.rng.lock();
    Action(self.dims.iter().map(|n| rng.u32(..(*n).max(1))).collect())
  }

  fn train_step(&mut self, sample: &Sample) -> Result<()> {
    if !sample.reward.is_finite() {
      bail!("non-finite reward {} for epoch {}", sample.reward, sample.epoch_n);
    }
    self.timesteps += 1;
    #[allow(clippy::cast_precision_loss)]
    {
      self.mean_reward += (sample.reward - self.mean_reward) / self.timesteps as f64;
    }
    Ok(())
  }

  fn save(&self, path: &Path) -> Result<()> {
    let checkpoint = Checkpoint {
      version: CHECKPOINT_VERSION,
      dims: self.dims.clone(),
      timesteps: self.timesteps,
      mean_reward: self.mean_reward,
      params: self.params.clone(),
    };

    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)
        .with_context(|| format!("creating checkpoint dir {}", parent.display()))?;
    }

    // Write then rename so a crash mid-save leaves the old checkpoint intact
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&checkpoint)?)
      .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
  }

  fn hyperparameters(&self) -> &Hyperparameters {
    &self.params
  }

  fn timesteps(&self) -> u64 {
    self.timesteps
  }
}

impl PolicyBackend for ExplorationBackend {
  fn name(&self) -> &'static str {
    "exploration"
  }

  fn create(&self, env: &VecEnv, params: &Hyperparameters) -> Result<Box<dyn PolicyModel>> {
    let dims = env.action_space().dims();
    if dims.is_empty() {
      bail!("environment has an empty action space");
    }
    Ok(Box::new(ExplorationPolicy::new(dims, params.clone(), 0, 0.0)))
  }

  fn load(&self, path: &Path, env: &VecEnv) -> Result<Box<dyn PolicyModel>> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let checkpoint: Checkpoint = serde_json::from_slice(&raw)
      .with_context(|| format!("parsing checkpoint {}", path.display()))?;

    if checkpoint.version != CHECKPOINT_VERSION {
      bail!("unsupported checkpoint version {}", checkpoint.version);
    }

    let dims = env.action_space().dims();
    if checkpoint.dims.len() != dims.len() {
      bail!(
        "checkpoint action space has {} dimensions, environment has {}",
        checkpoint.dims.len(),
        dims.len()
      );
    }
    if checkpoint.dims != dims {
      bail!(
        "checkpoint action cardinalities {:?} differ from the environment's {:?}",
        checkpoint.dims,
        dims
      );
    }

    Ok(Box::new(ExplorationPolicy::new(
      checkpoint.dims,
      checkpoint.params,
      checkpoint.timesteps,
      checkpoint.mean_reward,
    )))
  }
}
