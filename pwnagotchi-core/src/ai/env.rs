//! Wraps the agent and the reward function into something a policy learner can
//! step through: act, wait for the epoch to complete, read back a reward.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use pwnagotchi_shared::{
  ai::reward::RewardFunction,
  config::PersonalityConfig,
  logger::LOGGER,
  models::epoch::{EpochData, StatisticsError},
};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::ai::{
  epoch::{EpochFeed, EpochSample},
  featurizer::{OBSERVATION_SIZE, Observation, featurize},
  parameter::{Action, ActionSpace, PolicyDecision},
};

/// What the environment needs from the agent loop.
#[async_trait]
pub trait EnvAgent: Send + Sync {
  /// Blocks until the next epoch completes. `None` once the agent stopped.
  async fn get_statistics(&self) -> Option<EpochSample>;
  fn apply_action(&self, decision: &PolicyDecision);
  /// Personality the decoded actions are applied on top of.
  fn personality(&self) -> PersonalityConfig;
}

#[derive(Debug, Error)]
pub enum EnvError {
  #[error("agent stopped producing epochs")]
  AgentStopped,
  #[error("expected {expected} action(s), got {got}")]
  BatchSize { expected: usize, got: usize },
  #[error(transparent)]
  Statistics(#[from] StatisticsError),
}

/// Result of one completed epoch.
#[derive(Debug, Clone)]
pub struct Step {
  pub observation: Vec<f32>,
  pub reward: f64,
  pub done: bool,
  pub epoch_n: u64,
  pub data: EpochData,
}

pub struct Environment {
  agent: Arc<dyn EnvAgent>,
  space: ActionSpace,
  epochs_per_episode: u32,
  steps: u32,
  epoch_n: u64,
  last_observation: Observation,
  last_data: EpochData,
}

impl Environment {
  pub fn new(
    agent: Arc<dyn EnvAgent>,
    space: ActionSpace,
    epoch_n: u64,
    epochs_per_episode: u32,
  ) -> Self {
    Self {
      agent,
      space,
      epochs_per_episode: epochs_per_episode.max(1),
      steps: 0,
      epoch_n,
      last_observation: Observation::default(),
      last_data: EpochData::default(),
    }
  }

  pub const fn action_space(&self) -> &ActionSpace {
    &self.space
  }

  /// Epochs completed when the last step returned, or the start index.
  pub const fn epoch_n(&self) -> u64 {
    self.epoch_n
  }

  /// Starts a new episode from whatever the agent saw last.
  pub fn reset(&mut self) -> Vec<f32> {
    self.steps = 0;
    featurize(&self.last_observation, &self.last_data, self.epoch_n)
  }

  pub async fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
    let decision = self.space.decode(action, &self.agent.personality());
    self.agent.apply_action(&decision);

    let sample = self.agent.get_statistics().await.ok_or(EnvError::AgentStopped)?;

    #[allow(clippy::cast_precision_loss)]
    let reward = RewardFunction::call(sample.epoch_n as f64, &sample.data)?;

    if let Some(observation) = sample.observation {
      self.last_observation = observation;
    }
    self.last_data = sample.data;
    self.epoch_n = sample.epoch_n;
    self.steps += 1;

    let done = self.steps >= self.epochs_per_episode;
    if done {
      LOGGER.log_debug("Env", &format!("episode done after {} epochs", self.steps));
    }

    Ok(Step {
      observation: featurize(&self.last_observation, &self.last_data, self.epoch_n),
      reward,
      done,
      epoch_n: self.epoch_n,
      data: self.last_data.clone(),
    })
  }
}

/// Vector wrapper around exactly one [`Environment`], the shape policy
/// learners expect.
pub struct VecEnv {
  env: Environment,
}

impl VecEnv {
  pub const fn new(env: Environment) -> Self {
    Self { env }
  }

  pub const fn num_envs(&self) -> usize {
    1
  }

  pub const fn observation_size(&self) -> usize {
    OBSERVATION_SIZE
  }

  pub const fn action_space(&self) -> &ActionSpace {
    self.env.action_space()
  }

  pub const fn epoch_n(&self) -> u64 {
    self.env.epoch_n()
  }

  pub fn reset(&mut self) -> Vec<Vec<f32>> {
    vec![self.env.reset()]
  }

  pub async fn step(&mut self, actions: &[Action]) -> Result<Vec<Step>, EnvError> {
    let [action] = actions else {
      return Err(EnvError::BatchSize { expected: self.num_envs(), got: actions.len() });
    };
    Ok(vec![self.env.step(action).await?])
  }
}

/// [`EnvAgent`] over the epoch collector. Decisions land in a shared
/// personality the recon loop reads back before each epoch.
pub struct CollectorAgent {
  feed: Mutex<EpochFeed>,
  personality: Arc<RwLock<PersonalityConfig>>,
}

impl CollectorAgent {
  pub fn new(feed: EpochFeed, personality: Arc<RwLock<PersonalityConfig>>) -> Self {
    Self { feed: Mutex::new(feed), personality }
  }
}

#[async_trait]
impl EnvAgent for CollectorAgent {
  async fn get_statistics(&self) -> Option<EpochSample> {
    self.feed.lock().await.wait_for_epoch_data(None).await
  }

  fn apply_action(&self, decision: &PolicyDecision) {
    LOGGER.log_debug(
      "Env",
      &format!("applying {:?} on channels {:?}", decision.values, decision.channels),
    );
    *self.personality.write() = decision.personality.clone();
  }

  fn personality(&self) -> PersonalityConfig {
    self.personality.read().clone()
  }
}
