use std::{sync::Arc, time::Duration};

use parking_lot::RwLock;
use pwnagotchi_core::ai::Epoch;
use pwnagotchi_shared::{config::PersonalityConfig, logger::LOGGER};

/// Closes an epoch every `period`. Whatever drives the capture backend tracks
/// activity on the same collector in between.
pub struct EpochClock {
  epoch: Epoch,
  personality: Arc<RwLock<PersonalityConfig>>,
  period: Duration,
}

impl EpochClock {
  pub fn new(epoch: Epoch, personality: Arc<RwLock<PersonalityConfig>>, period: Duration) -> Self {
    Self { epoch, personality, period }
  }

  pub const fn epoch(&self) -> &Epoch {
    &self.epoch
  }

  /// Picks up thresholds the policy may have changed, then closes the epoch.
  pub fn tick(&mut self) {
    self.epoch.set_personality(&self.personality.read());
    self.epoch.next();
  }

  /// Runs until `limit` epochs are done, or forever. Dropping the collector on
  /// return is what tells the trainer to stop.
  pub async fn run(mut self, limit: Option<u64>) -> u64 {
    LOGGER.log_info("Clock", &format!("closing an epoch every {:?}", self.period));

    let mut ticker = tokio::time::interval(self.period);
    // first tick completes immediately
    ticker.tick().await;

    while limit.is_none_or(|n| self.epoch.epoch < n) {
      ticker.tick().await;
      self.tick();
    }
    self.epoch.epoch
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn stops_after_limit_and_closes_the_feed() {
    let personality = Arc::new(RwLock::new(PersonalityConfig::default()));
    let mut epoch = Epoch::new(&personality.read());
    let mut feed = epoch.take_feed().expect("feed");

    let clock = EpochClock::new(epoch, personality, Duration::from_millis(1));
    assert_eq!(clock.run(Some(3)).await, 3);

    let mut seen = Vec::new();
    while let Some(sample) = feed.wait_for_epoch_data(None).await {
      seen.push(sample.epoch_n);
    }
    assert_eq!(seen, vec![1, 2, 3]);
  }

  #[test]
  fn tick_applies_the_current_personality() {
    let personality = Arc::new(RwLock::new(PersonalityConfig::default()));
    let mut clock =
      EpochClock::new(Epoch::new(&personality.read()), personality.clone(), Duration::ZERO);

    personality.write().bored_num_epochs = 1;
    personality.write().sad_num_epochs = 100;
    clock.tick();

    assert_eq!(clock.epoch().bored_for, 1);
    assert_eq!(clock.epoch().sad_for, 0);
  }
}
