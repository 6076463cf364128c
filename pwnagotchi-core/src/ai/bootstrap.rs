use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use pwnagotchi_shared::{config::AiConfig, logger::LOGGER};

use crate::ai::{
  env::{EnvAgent, Environment, VecEnv},
  parameter::ActionSpace,
  policy::{PolicyBackend, PolicyModel},
  recovery::RecoveryPolicy,
};

/// A ready policy and the environment it was built against.
pub struct LoadedModel {
  pub model: Box<dyn PolicyModel>,
  pub env: VecEnv,
}

/// Builds the policy, restoring it from `config.path` when `from_disk` is set
/// and a checkpoint is there.
///
/// `None` means no AI for this run: either it is disabled, or building the
/// policy failed and `recovery` has already been told about it.
pub fn load(
  config: &AiConfig,
  agent: Arc<dyn EnvAgent>,
  epoch_n: u64,
  from_disk: bool,
  backend: &dyn PolicyBackend,
  recovery: &dyn RecoveryPolicy,
) -> Option<LoadedModel> {
  if !config.enabled {
    LOGGER.log_info("AI", "AI disabled");
    return None;
  }

  match try_load(config, agent, epoch_n, from_disk, backend) {
    Ok(loaded) => Some(loaded),
    Err(e) => {
      LOGGER.log_error("AI", &format!("failed to bootstrap the policy: {e:#}"));
      recovery.on_fatal_error(&e);
      None
    }
  }
}

fn try_load(
  config: &AiConfig,
  agent: Arc<dyn EnvAgent>,
  epoch_n: u64,
  from_disk: bool,
  backend: &dyn PolicyBackend,
) -> Result<LoadedModel> {
  let space = ActionSpace::new(&agent.personality().channels);
  let env = VecEnv::new(Environment::new(agent, space, epoch_n, config.epochs_per_episode));

  LOGGER.log_info(
    "AI",
    &format!(
      "creating {} model, {} observations x {} action dimensions",
      backend.name(),
      env.observation_size(),
      env.action_space().len()
    ),
  );
  let mut model = backend.create(&env, &config.params).context("creating the policy")?;

  let path = Path::new(&*config.path);
  if from_disk && path.exists() {
    LOGGER.log_info("AI", &format!("loading {}", path.display()));
    model = backend.load(path, &env).with_context(|| format!("loading {}", path.display()))?;
    LOGGER.log_info("AI", &format!("resumed at {} timesteps", model.timesteps()));
  } else {
    let params = model.hyperparameters();
    LOGGER.log_info("AI", &format!("no checkpoint at {}, fresh model with {params:?}", path.display()));
  }

  Ok(LoadedModel { model, env })
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;
  use crate::ai::{
    env::test_support::{ScriptedAgent, samples},
    policy::{ExplorationBackend, Sample},
    recovery::test_support::RecordingRecovery,
  };

  fn config(path: &Path, enabled: bool) -> AiConfig {
    AiConfig { enabled, path: path.display().to_string().into(), ..AiConfig::default() }
  }

  fn agent() -> Arc<ScriptedAgent> {
    Arc::new(ScriptedAgent::new(samples(1..=3)))
  }

  #[test]
  fn disabled_returns_none_without_touching_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("brain.json");
    let agent = agent();
    let recovery = RecordingRecovery::default();

    let loaded =
      load(&config(&path, false), agent.clone(), 0, true, &ExplorationBackend, &recovery);

    assert!(loaded.is_none());
    assert!(!path.exists());
    assert!(agent.decisions.lock().is_empty());
    assert!(recovery.errors.lock().is_empty());
    assert_eq!(fs::read_dir(dir.path()).expect("read_dir").count(), 0);
  }

  #[test]
  fn missing_checkpoint_builds_a_fresh_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("brain.json");
    let recovery = RecordingRecovery::default();

    let loaded = load(&config(&path, true), agent(), 12, true, &ExplorationBackend, &recovery)
      .expect("fresh model");

    assert_eq!(loaded.model.timesteps(), 0);
    assert_eq!(loaded.model.hyperparameters(), &AiConfig::default_params());
    assert_eq!(loaded.env.num_envs(), 1);
    assert_eq!(loaded.env.epoch_n(), 12);
    assert!(recovery.errors.lock().is_empty());
  }

  #[test]
  fn existing_checkpoint_is_restored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("brain.json");
    let recovery = RecordingRecovery::default();
    let cfg = config(&path, true);

    let mut first = load(&cfg, agent(), 0, true, &ExplorationBackend, &recovery).expect("model");
    let sample = Sample {
      epoch_n: 1,
      observation: vec![],
      action: first.model.predict(&[]),
      reward: 0.25,
    };
    first.model.train_step(&sample).expect("train");
    first.model.save(&path).expect("save");

    let second = load(&cfg, agent(), 1, true, &ExplorationBackend, &recovery).expect("model");
    assert_eq!(second.model.timesteps(), 1);

    let ignored = load(&cfg, agent(), 1, false, &ExplorationBackend, &recovery).expect("model");
    assert_eq!(ignored.model.timesteps(), 0);
    assert!(recovery.errors.lock().is_empty());
  }

  #[test]
  fn corrupt_checkpoint_hands_over_to_recovery() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("brain.json");
    fs::write(&path, b"\x00\x01 definitely not a policy").expect("write");
    let recovery = RecordingRecovery::default();

    let loaded = load(&config(&path, true), agent(), 0, true, &ExplorationBackend, &recovery);

    assert!(loaded.is_none());
    let errors = recovery.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("brain.json"), "{}", errors[0]);
  }
}
