use std::{mem, path::PathBuf, sync::Arc};

use pwnagotchi_shared::{
  events::{AiEvent, EventBus, emit_serialized},
  logger::LOGGER,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{
  bootstrap::LoadedModel,
  env::{EnvError, Step, VecEnv},
  parameter::Action,
  policy::{PolicyModel, Sample},
};

#[derive(Debug, Error)]
pub enum TrainerError {
  #[error("epoch {got} arrived after epoch {last}")]
  OutOfOrder { last: u64, got: u64 },
  #[error("epochs {} to {} never reached the trainer", .last + 1, .got - 1)]
  Missed { last: u64, got: u64 },
  #[error(transparent)]
  Env(#[from] EnvError),
  #[error("training step failed: {0:#}")]
  Model(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
  /// Training steps taken by this process
  pub epochs: u64,
  /// Steps into the current episode
  pub train_epochs: u32,
  pub episodes: u64,
  pub last_reward: f64,
  pub min_reward: f64,
  pub max_reward: f64,
  pub avg_reward: f64,
  pub best_reward: Option<f64>,
  pub worst_reward: Option<f64>,
}

impl TrainingStats {
  /// Returns whether `reward` is a new best and a new worst.
  fn record(&mut self, reward: f64) -> (bool, bool) {
    if self.train_epochs == 0 {
      self.min_reward = reward;
      self.max_reward = reward;
      self.avg_reward = 0.0;
    }

    self.epochs += 1;
    self.train_epochs += 1;
    self.last_reward = reward;
    self.min_reward = self.min_reward.min(reward);
    self.max_reward = self.max_reward.max(reward);
    self.avg_reward += (reward - self.avg_reward) / f64::from(self.train_epochs);

    let best = self.best_reward.is_none_or(|best| reward > best);
    let worst = self.worst_reward.is_none_or(|worst| reward < worst);
    if best {
      self.best_reward = Some(reward);
    }
    if worst {
      self.worst_reward = Some(reward);
    }
    (best, worst)
  }
}

/// Drives the policy one completed epoch at a time: predict, apply, wait for
/// the epoch, train on its reward.
pub struct Trainer {
  model: Box<dyn PolicyModel>,
  env: VecEnv,
  bus: Arc<dyn EventBus>,
  checkpoint: PathBuf,
  stats: TrainingStats,
  last_epoch: Option<u64>,
  observation: Vec<f32>,
}

impl Trainer {
  pub fn new(loaded: LoadedModel, checkpoint: impl Into<PathBuf>, bus: Arc<dyn EventBus>) -> Self {
    let LoadedModel { model, env } = loaded;
    Self {
      model,
      env,
      bus,
      checkpoint: checkpoint.into(),
      stats: TrainingStats::default(),
      last_epoch: None,
      observation: Vec::new(),
    }
  }

  pub const fn stats(&self) -> &TrainingStats {
    &self.stats
  }

  pub fn model(&self) -> &dyn PolicyModel {
    self.model.as_ref()
  }

  /// Trains until the agent stops producing epochs. A checkpoint is written
  /// at the end of every episode and on the way out.
  pub async fn run(&mut self) -> Result<TrainingStats, TrainerError> {
    emit_serialized(&*self.bus, AiEvent::Ready, &self.model.timesteps()).await;
    LOGGER.log_info("AI", &format!("ready, {} timesteps so far", self.model.timesteps()));

    loop {
      match self.train_epoch().await {
        Ok(_) => {}
        Err(TrainerError::Env(EnvError::AgentStopped)) => break,
        Err(e) => return Err(e),
      }
    }

    if self.stats.train_epochs > 0 {
      self.save();
    }
    LOGGER.log_info("AI", &format!("stopped after {} training epochs", self.stats.epochs));
    Ok(self.stats.clone())
  }

  /// Exactly one training step per completed epoch, in epoch order.
  pub async fn train_epoch(&mut self) -> Result<Step, TrainerError> {
    if self.stats.train_epochs == 0 {
      self.observation = self.env.reset().pop().unwrap_or_default();
      emit_serialized(&*self.bus, AiEvent::TrainingStart, &self.stats.episodes).await;
    }

    let action = self.model.predict(&self.observation);
    emit_serialized(&*self.bus, AiEvent::Policy, &action).await;

    let step = self.step(&action).await?;

    if let Some(last) = self.last_epoch {
      if step.epoch_n <= last {
        return Err(TrainerError::OutOfOrder { last, got: step.epoch_n });
      }
      if step.epoch_n > last + 1 {
        return Err(TrainerError::Missed { last, got: step.epoch_n });
      }
    }

    emit_serialized(&*self.bus, AiEvent::Epoch, &(step.epoch_n, &step.data)).await;

    let sample = Sample {
      epoch_n: step.epoch_n,
      observation: mem::replace(&mut self.observation, step.observation.clone()),
      action,
      reward: step.reward,
    };
    self.model.train_step(&sample)?;
    self.last_epoch = Some(step.epoch_n);

    let (best, worst) = self.stats.record(step.reward);
    LOGGER.log_info(
      "AI",
      &format!(
        "training epoch {} ({}) reward={:.4} avg={:.4}",
        self.stats.train_epochs, step.epoch_n, step.reward, self.stats.avg_reward
      ),
    );

    emit_serialized(&*self.bus, AiEvent::TrainingStep, &self.stats).await;
    if best {
      emit_serialized(&*self.bus, AiEvent::BestReward, &step.reward).await;
    }
    if worst {
      emit_serialized(&*self.bus, AiEvent::WorstReward, &step.reward).await;
    }

    if step.done {
      self.save();
      emit_serialized(&*self.bus, AiEvent::TrainingEnd, &self.stats).await;
      self.stats.train_epochs = 0;
      self.stats.episodes += 1;
    }

    Ok(step)
  }

  async fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
    let mut steps = self.env.step(std::slice::from_ref(action)).await?;
    let got = steps.len();
    steps.pop().ok_or(EnvError::BatchSize { expected: 1, got })
  }

  fn save(&self) {
    match self.model.save(&self.checkpoint) {
      Ok(()) => LOGGER.log_debug("AI", &format!("saved {}", self.checkpoint.display())),
      Err(e) => LOGGER.log_error("AI", &format!("saving {}: {e:#}", self.checkpoint.display())),
    }
  }
}
