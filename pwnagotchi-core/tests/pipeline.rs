use std::sync::Arc;

use parking_lot::RwLock;
use pwnagotchi_core::ai::{
  Epoch,
  bootstrap,
  env::CollectorAgent,
  policy::{ExplorationBackend, PolicyBackend},
  recovery::NoRecovery,
  trainer::Trainer,
};
use pwnagotchi_shared::{
  config::{AiConfig, PersonalityConfig},
  events::LogEventBus,
  models::epoch::Activity,
};

#[tokio::test]
async fn collector_epochs_train_the_policy_and_land_in_the_checkpoint() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("brain.json");
  let config = AiConfig {
    path: path.display().to_string().into(),
    epochs_per_episode: 3,
    ..AiConfig::default()
  };

  let personality =
    Arc::new(RwLock::new(PersonalityConfig { channels: vec![1, 6, 11], ..Default::default() }));
  let mut epoch = Epoch::new(&personality.read());
  let feed = epoch.take_feed().expect("feed");
  let agent = Arc::new(CollectorAgent::new(feed, Arc::clone(&personality)));

  let loaded =
    bootstrap::load(&config, agent, epoch.epoch, true, &ExplorationBackend, &NoRecovery)
      .expect("policy");
  assert_eq!(loaded.env.action_space().len(), 13 + 3);

  let mut trainer = Trainer::new(loaded, &path, Arc::new(LogEventBus));
  let training = tokio::spawn(async move { trainer.run().await });

  for i in 0..7 {
    epoch.track(Activity::Deauth, Some(2));
    if i % 2 == 0 {
      epoch.track(Activity::Handshake, None);
    }
    epoch.next();
  }
  drop(epoch);

  let stats = training.await.expect("join").expect("training");
  assert_eq!(stats.epochs, 7);
  assert_eq!(stats.episodes, 2);
  assert!(stats.best_reward.is_some_and(|r| r > 0.0));

  let channels = personality.read().channels.clone();
  assert!(channels.iter().all(|c| [1, 6, 11].contains(c)), "{channels:?}");

  // The restored checkpoint carries every step, including the unfinished episode.
  // The action space comes from the configured channels, not the last decision.
  let configured =
    Arc::new(RwLock::new(PersonalityConfig { channels: vec![1, 6, 11], ..Default::default() }));
  let agent =
    Arc::new(CollectorAgent::new(Epoch::default().take_feed().expect("feed"), configured));
  let reloaded =
    bootstrap::load(&config, agent, 7, true, &ExplorationBackend, &NoRecovery).expect("reload");
  assert_eq!(reloaded.model.timesteps(), 7);
  assert!(ExplorationBackend.load(&path, &reloaded.env).is_ok());
}
