#![allow(clippy::cast_precision_loss, clippy::struct_excessive_bools)]

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use pwnagotchi_hw::sysinfo::SysInfo;
use pwnagotchi_shared::{
  ai::reward::RewardFunction,
  config::PersonalityConfig,
  logger::LOGGER,
  mesh::peer::Peer,
  models::{
    epoch::{Activity, EpochData},
    net::AccessPoint,
  },
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::ai::featurizer::Observation;

/// One completed epoch as handed to the trainer.
#[derive(Debug, Clone)]
pub struct EpochSample {
  /// Epochs executed since start, this one included.
  pub epoch_n: u64,
  pub data: EpochData,
  pub observation: Option<Observation>,
}

/// Receiving half of the collector, owned by whoever trains on the epochs.
pub struct EpochFeed {
  data_rx: UnboundedReceiver<EpochSample>,
}

impl EpochFeed {
  pub async fn wait_for_epoch_data(&mut self, timeout: Option<Duration>) -> Option<EpochSample> {
    match timeout {
      Some(t) => tokio::time::timeout(t, self.data_rx.recv()).await.ok().flatten(),
      None => self.data_rx.recv().await,
    }
  }
}

pub struct Epoch {
  data_tx: UnboundedSender<EpochSample>,
  feed: Option<EpochFeed>,
  sysinfo: Option<Arc<dyn SysInfo + Send + Sync>>,
  sad_num_epochs: u32,
  bored_num_epochs: u32,
  bond_encounters_factor: u32,

  pub epoch: u64,

  pub inactive_for: u32,
  pub active_for: u32,
  pub blind_for: u32,
  pub sad_for: u32,
  pub bored_for: u32,

  pub did_deauth: bool,
  pub num_deauths: u32,
  pub did_associate: bool,
  pub num_assocs: u32,
  pub num_missed: u32,
  pub did_handshakes: bool,
  pub num_handshakes: u32,
  pub num_hops: u32,
  pub num_slept: u32,
  pub num_peers: u32,
  pub total_bond_factor: f32,
  pub avg_bond_factor: f32,
  pub any_activity: bool,

  pub epoch_start: Instant,
  pub observation: Option<Observation>,
}

impl Default for Epoch {
  fn default() -> Self {
    Self::new(&PersonalityConfig::default())
  }
}

impl Epoch {
  pub fn new(personality: &PersonalityConfig) -> Self {
    let (data_tx, data_rx) = unbounded_channel();

    Self {
      data_tx,
      feed: Some(EpochFeed { data_rx }),
      sysinfo: None,
      sad_num_epochs: personality.sad_num_epochs,
      bored_num_epochs: personality.bored_num_epochs,
      bond_encounters_factor: personality.bond_encounters_factor,
      epoch: 0,
      inactive_for: 0,
      active_for: 0,
      blind_for: 0,
      sad_for: 0,
      bored_for: 0,
      did_deauth: false,
      num_deauths: 0,
      did_associate: false,
      num_assocs: 0,
      num_missed: 0,
      did_handshakes: false,
      num_handshakes: 0,
      num_hops: 0,
      num_slept: 0,
      num_peers: 0,
      total_bond_factor: 0.0,
      avg_bond_factor: 0.0,
      any_activity: false,
      epoch_start: Instant::now(),
      observation: None,
    }
  }

  #[must_use]
  pub fn with_sysinfo(mut self, sysinfo: Arc<dyn SysInfo + Send + Sync>) -> Self {
    self.sysinfo = Some(sysinfo);
    self
  }

  /// Hands out the receiving side. Only the first caller gets it.
  pub fn take_feed(&mut self) -> Option<EpochFeed> {
    self.feed.take()
  }

  /// Applies a new personality, e.g. after the policy picked new thresholds.
  pub fn set_personality(&mut self, personality: &PersonalityConfig) {
    self.sad_num_epochs = personality.sad_num_epochs;
    self.bored_num_epochs = personality.bored_num_epochs;
    self.bond_encounters_factor = personality.bond_encounters_factor;
  }

  pub fn observe(&mut self, aps: &[AccessPoint], peers: &[Peer]) {
    if aps.is_empty() {
      self.blind_for += 1;
    } else {
      self.blind_for = 0;
    }

    let bond_unit_scale = f64::from(self.bond_encounters_factor.max(1));

    self.num_peers = u32::try_from(peers.len()).unwrap_or(u32::MAX);
    #[allow(clippy::cast_possible_truncation)]
    {
      self.total_bond_factor = peers
        .iter()
        .map(|peer| (f64::from(peer.encounters) / bond_unit_scale) as f32)
        .sum::<f32>();
    }
    self.avg_bond_factor =
      if peers.is_empty() { 0.0 } else { self.total_bond_factor / peers.len() as f32 };

    self.observation = Some(Observation::from_scan(aps, peers));
  }

  pub fn next(&mut self) {
    if !self.any_activity && !self.did_handshakes {
      self.inactive_for += 1;
      self.active_for = 0;
    } else {
      self.active_for += 1;
      self.inactive_for = 0;
      self.sad_for = 0;
      self.bored_for = 0;
    }

    if self.inactive_for >= self.sad_num_epochs {
      self.bored_for = 0;
      self.sad_for += 1;
    } else if self.inactive_for >= self.bored_num_epochs {
      self.sad_for = 0;
      self.bored_for += 1;
    } else {
      self.sad_for = 0;
      self.bored_for = 0;
    }

    let (cpu_load, mem_usage, temperature) = self.sysinfo.as_ref().map_or((0.0, 0.0, 0.0), |s| {
      (
        s.get_cpu_usage().unwrap_or_default(),
        s.get_memory_usage().unwrap_or_default(),
        s.get_temperature(None).unwrap_or_default(),
      )
    });

    let epoch_n = self.epoch + 1;
    let mut data = EpochData {
      duration_secs: self.epoch_start.elapsed().as_secs_f64(),
      slept_for_secs: f64::from(self.num_slept),
      blind_for_epochs: self.blind_for,
      inactive_for_epochs: self.inactive_for,
      active_for_epochs: self.active_for,
      sad_for_epochs: self.sad_for,
      bored_for_epochs: self.bored_for,
      missed_interactions: self.num_missed,
      num_hops: self.num_hops,
      num_peers: self.num_peers,
      tot_bond: self.total_bond_factor,
      avg_bond: self.avg_bond_factor,
      num_deauths: self.num_deauths,
      num_associations: self.num_assocs,
      num_handshakes: self.num_handshakes,
      cpu_load,
      mem_usage,
      temperature,
      reward: 0.0,
    };
    data.reward = RewardFunction::for_epoch(epoch_n, &data);

    LOGGER.log_info(
      &format!("Epoch {}", self.epoch),
      &format!(
        "duration={:.2} slept_for={} blind={} sad={} bored={} inactive={} active={} peers={} tot_bond={:.2} avg_bond={:.2} hops={} missed={} deauths={} assocs={} handshakes={} cpu={:.2} mem={:.2} temperature={:.1} reward={}",
        data.duration_secs,
        data.slept_for_secs,
        data.blind_for_epochs,
        data.sad_for_epochs,
        data.bored_for_epochs,
        data.inactive_for_epochs,
        data.active_for_epochs,
        data.num_peers,
        data.tot_bond,
        data.avg_bond,
        data.num_hops,
        data.missed_interactions,
        data.num_deauths,
        data.num_associations,
        data.num_handshakes,
        data.cpu_load,
        data.mem_usage,
        data.temperature,
        data.reward,
      ),
    );

    let sample = EpochSample { epoch_n, data, observation: self.observation.take() };
    // Fails only when nobody trains on this run
    let _ = self.data_tx.send(sample);

    self.epoch += 1;
    self.epoch_start = Instant::now();
    self.did_deauth = false;
    self.num_deauths = 0;
    self.num_peers = 0;
    self.total_bond_factor = 0.0;
    self.avg_bond_factor = 0.0;
    self.did_associate = false;
    self.num_assocs = 0;
    self.num_missed = 0;
    self.did_handshakes = false;
    self.num_handshakes = 0;
    self.num_hops = 0;
    self.num_slept = 0;
    self.any_activity = false;
  }

  pub fn track(&mut self, activity: Activity, increment: Option<u32>) {
    let inc = increment.unwrap_or(1);
    match activity {
      Activity::Deauth => {
        self.did_deauth = true;
        self.num_deauths = self.num_deauths.saturating_add(inc);
        self.any_activity = true;
      }
      Activity::Association => {
        self.did_associate = true;
        self.num_assocs = self.num_assocs.saturating_add(inc);
        self.any_activity = true;
      }
      Activity::Miss => {
        self.num_missed = self.num_missed.saturating_add(inc);
      }
      Activity::Hop => {
        self.num_hops = self.num_hops.saturating_add(inc);
        self.did_deauth = false;
        self.did_associate = false;
      }
      Activity::Handshake => {
        self.num_handshakes = self.num_handshakes.saturating_add(inc);
        self.did_handshakes = true;
      }
      Activity::Sleep => {
        self.num_slept = self.num_slept.saturating_add(inc);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use pwnagotchi_hw::sysinfo::DevSysInfo;

  use super::*;

  fn personality(bored: u32, sad: u32) -> PersonalityConfig {
    PersonalityConfig { bored_num_epochs: bored, sad_num_epochs: sad, ..PersonalityConfig::default() }
  }

  #[tokio::test]
  async fn next_publishes_counters_and_resets_them() {
    let mut epoch = Epoch::new(&personality(15, 25));
    let mut feed = epoch.take_feed().expect("feed");

    epoch.track(Activity::Deauth, Some(3));
    epoch.track(Activity::Association, None);
    epoch.track(Activity::Handshake, Some(2));
    epoch.track(Activity::Hop, Some(11));
    epoch.track(Activity::Miss, None);
    epoch.next();

    let sample = feed.wait_for_epoch_data(Some(Duration::from_secs(1))).await.expect("sample");
    assert_eq!(sample.epoch_n, 1);
    assert_eq!(sample.data.num_deauths, 3);
    assert_eq!(sample.data.num_associations, 1);
    assert_eq!(sample.data.num_handshakes, 2);
    assert_eq!(sample.data.num_hops, 11);
    assert_eq!(sample.data.missed_interactions, 1);
    assert_eq!(sample.data.active_for_epochs, 1);
    assert!((sample.data.reward - RewardFunction::for_epoch(1, &sample.data)).abs() < 1e-12);

    assert_eq!(epoch.epoch, 1);
    assert_eq!(epoch.num_deauths, 0);
    assert_eq!(epoch.num_hops, 0);
    assert!(!epoch.any_activity);
  }

  #[tokio::test]
  async fn inactivity_turns_bored_then_sad() {
    let mut epoch = Epoch::new(&personality(2, 4));
    let mut feed = epoch.take_feed().expect("feed");

    let mut streaks = Vec::new();
    for _ in 0..5 {
      epoch.next();
      let sample = feed.wait_for_epoch_data(None).await.expect("sample");
      streaks.push((
        sample.data.inactive_for_epochs,
        sample.data.bored_for_epochs,
        sample.data.sad_for_epochs,
      ));
    }

    assert_eq!(streaks, vec![(1, 0, 0), (2, 1, 0), (3, 2, 0), (4, 0, 1), (5, 0, 2)]);
  }

  #[tokio::test]
  async fn activity_clears_mood_streaks() {
    let mut epoch = Epoch::new(&personality(1, 2));
    let mut feed = epoch.take_feed().expect("feed");

    epoch.next();
    epoch.next();
    epoch.track(Activity::Handshake, None);
    epoch.next();

    let last = {
      let mut last = None;
      while let Some(sample) = feed.wait_for_epoch_data(Some(Duration::from_millis(50))).await {
        last = Some(sample);
      }
      last.expect("samples")
    };

    assert_eq!(last.epoch_n, 3);
    assert_eq!(last.data.inactive_for_epochs, 0);
    assert_eq!(last.data.sad_for_epochs, 0);
    assert_eq!(last.data.bored_for_epochs, 0);
    assert_eq!(last.data.active_for_epochs, 1);
  }

  #[test]
  fn observe_tracks_blindness_and_bonds() {
    let mut epoch = Epoch::default();

    epoch.observe(&[], &[]);
    epoch.observe(&[], &[]);
    assert_eq!(epoch.blind_for, 2);

    let aps = vec![AccessPoint { channel: 6, ..AccessPoint::default() }];
    let peers = vec![
      Peer { encounters: 20000, last_channel: 6, ..Peer::default() },
      Peer { encounters: 10000, last_channel: 1, ..Peer::default() },
    ];
    epoch.observe(&aps, &peers);

    assert_eq!(epoch.blind_for, 0);
    assert_eq!(epoch.num_peers, 2);
    assert!((epoch.total_bond_factor - 1.5).abs() < f32::EPSILON);
    assert!((epoch.avg_bond_factor - 0.75).abs() < f32::EPSILON);
    assert!(epoch.observation.is_some());
  }

  #[tokio::test]
  async fn host_readings_are_attached() {
    let mut epoch = Epoch::default().with_sysinfo(Arc::new(DevSysInfo));
    let mut feed = epoch.take_feed().expect("feed");

    epoch.next();
    let sample = feed.wait_for_epoch_data(None).await.expect("sample");
    assert!((sample.data.temperature - 42.0).abs() < f32::EPSILON);
  }

  #[tokio::test]
  async fn slow_trainer_still_gets_every_epoch() {
    let mut epoch = Epoch::default();
    let mut feed = epoch.take_feed().expect("feed");

    for _ in 0..100 {
      epoch.track(Activity::Hop, None);
      epoch.next();
    }

    let mut delivered = Vec::new();
    while let Some(sample) = feed.wait_for_epoch_data(Some(Duration::from_millis(50))).await {
      delivered.push(sample.epoch_n);
    }
    assert_eq!(delivered, (1..=100).collect::<Vec<_>>());
  }

  #[test]
  fn large_increments_saturate() {
    let mut epoch = Epoch::default();
    epoch.track(Activity::Deauth, Some(u32::MAX));
    epoch.track(Activity::Deauth, Some(7));
    epoch.track(Activity::Sleep, Some(u32::MAX));
    epoch.track(Activity::Sleep, None);

    assert_eq!(epoch.num_deauths, u32::MAX);
    assert_eq!(epoch.num_slept, u32::MAX);
  }

  #[test]
  fn feed_is_handed_out_once() {
    let mut epoch = Epoch::default();
    assert!(epoch.take_feed().is_some());
    assert!(epoch.take_feed().is_none());
    // No receiver left, next() must not panic
    epoch.next();
    assert_eq!(epoch.epoch, 1);
  }
}
