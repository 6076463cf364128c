#![allow(clippy::cast_precision_loss)]

use pwnagotchi_shared::{
  mesh::peer::Peer,
  models::{epoch::EpochData, net::AccessPoint},
  utils::wifi::{NUM_CHANNELS, freq_to_channel},
};
use serde::{Deserialize, Serialize};

const HISTOGRAM_WIDTH: usize = NUM_CHANNELS as usize;
const NUM_EPOCH_FEATURES: usize = 10;

/// Length of every vector [`featurize`] produces.
pub const OBSERVATION_SIZE: usize = 3 * HISTOGRAM_WIDTH + NUM_EPOCH_FEATURES;

/// Per channel distribution of what the last scan saw. Each histogram sums to
/// one, or is all zero when nothing was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  pub aps: Vec<f32>,
  pub sta: Vec<f32>,
  pub peers: Vec<f32>,
}

impl Default for Observation {
  fn default() -> Self {
    Self {
      aps: vec![0.0; HISTOGRAM_WIDTH],
      sta: vec![0.0; HISTOGRAM_WIDTH],
      peers: vec![0.0; HISTOGRAM_WIDTH],
    }
  }
}

fn channel_index(channel: u16) -> Option<usize> {
  (1..=NUM_CHANNELS).contains(&channel).then(|| usize::from(channel) - 1)
}

fn normalize(histogram: &mut [f32]) {
  let total: f32 = histogram.iter().sum();
  if total > 0.0 {
    for bucket in histogram {
      *bucket /= total;
    }
  }
}

impl Observation {
  /// Buckets access points, their clients and peers by channel. An access
  /// point without a channel is placed by its frequency. Entries on channels
  /// outside the channel space are ignored.
  pub fn from_scan(aps: &[AccessPoint], peers: &[Peer]) -> Self {
    let mut obs = Self::default();

    for ap in aps {
      let channel = match ap.channel {
        0 => freq_to_channel(ap.frequency).unwrap_or(0),
        ch => ch,
      };
      if let Some(idx) = channel_index(channel) {
        obs.aps[idx] += 1.0;
        obs.sta[idx] += ap.clients.len() as f32;
      }
    }

    for peer in peers {
      if let Some(idx) = channel_index(peer.last_channel) {
        obs.peers[idx] += 1.0;
      }
    }

    normalize(&mut obs.aps);
    normalize(&mut obs.sta);
    normalize(&mut obs.peers);
    obs
  }
}

/// Flattens an observation and the epoch counters into the policy input.
pub fn featurize(obs: &Observation, data: &EpochData, epoch_n: u64) -> Vec<f32> {
  let tot_epochs = epoch_n as f64 + 1e-10;
  let tot_interactions = (f64::from(data.num_deauths) + f64::from(data.num_associations))
    .max(f64::from(data.num_handshakes))
    + 1e-10;

  let per_epoch = |v: u32| (f64::from(v) / tot_epochs).clamp(0.0, 1.0);
  let per_interaction = |v: u32| (f64::from(v) / tot_interactions).clamp(0.0, 1.0);

  let stats = [
    (f64::from(data.num_hops) / f64::from(NUM_CHANNELS)).clamp(0.0, 1.0),
    per_epoch(data.blind_for_epochs),
    per_epoch(data.inactive_for_epochs),
    per_epoch(data.active_for_epochs),
    per_epoch(data.sad_for_epochs),
    per_epoch(data.bored_for_epochs),
    per_interaction(data.missed_interactions),
    per_interaction(data.num_deauths),
    per_interaction(data.num_associations),
    per_interaction(data.num_handshakes),
  ];

  let mut features = Vec::with_capacity(OBSERVATION_SIZE);
  features.extend_from_slice(&obs.aps);
  features.extend_from_slice(&obs.sta);
  features.extend_from_slice(&obs.peers);
  #[allow(clippy::cast_possible_truncation)]
  features.extend(stats.iter().map(|v| *v as f32));
  features
}

#[cfg(test)]
mod tests {
  use pwnagotchi_shared::models::net::Station;

  use super::*;

  fn ap(channel: u16, clients: usize) -> AccessPoint {
    AccessPoint { channel, clients: vec![Station::default(); clients], ..AccessPoint::default() }
  }

  #[test]
  fn histograms_are_normalized_per_kind() {
    let aps = vec![ap(1, 2), ap(1, 0), ap(6, 2)];
    let peers = vec![Peer { last_channel: 11, ..Peer::default() }];

    let obs = Observation::from_scan(&aps, &peers);
    assert!((obs.aps[0] - 2.0 / 3.0).abs() < 1e-6);
    assert!((obs.aps[5] - 1.0 / 3.0).abs() < 1e-6);
    assert!((obs.sta[0] - 0.5).abs() < 1e-6);
    assert!((obs.sta[5] - 0.5).abs() < 1e-6);
    assert!((obs.peers[10] - 1.0).abs() < 1e-6);
  }

  #[test]
  fn out_of_range_channels_are_skipped() {
    let obs = Observation::from_scan(&[ap(0, 1), ap(NUM_CHANNELS + 1, 1)], &[]);
    assert!(obs.aps.iter().all(|v| *v == 0.0));
    assert!(obs.sta.iter().all(|v| *v == 0.0));

    let obs = Observation::from_scan(&[ap(NUM_CHANNELS, 0)], &[]);
    assert!((obs.aps[HISTOGRAM_WIDTH - 1] - 1.0).abs() < 1e-6);
  }

  #[test]
  fn frequency_places_aps_without_a_channel() {
    let aps = vec![
      AccessPoint { frequency: 2437, ..AccessPoint::default() },
      AccessPoint { frequency: 5180, channel: 0, ..AccessPoint::default() },
      AccessPoint { frequency: 2437, channel: 11, ..AccessPoint::default() },
      AccessPoint { frequency: 9000, ..AccessPoint::default() },
    ];

    let obs = Observation::from_scan(&aps, &[]);
    assert!((obs.aps[5] - 1.0 / 3.0).abs() < 1e-6, "2437 MHz is channel 6");
    assert!((obs.aps[35] - 1.0 / 3.0).abs() < 1e-6, "5180 MHz is channel 36");
    assert!((obs.aps[10] - 1.0 / 3.0).abs() < 1e-6, "explicit channel wins");
  }

  #[test]
  fn features_have_fixed_size_and_are_bounded() {
    let data = EpochData {
      num_hops: 1000,
      num_deauths: 2,
      num_handshakes: 9,
      blind_for_epochs: 50,
      ..EpochData::default()
    };

    let features = featurize(&Observation::default(), &data, 0);
    assert_eq!(features.len(), OBSERVATION_SIZE);
    assert!(features.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));

    let tail = &features[3 * HISTOGRAM_WIDTH..];
    assert!((tail[0] - 1.0).abs() < 1e-6, "hops are clipped");
    assert!((tail[9] - 1.0).abs() < 1e-6, "handshake share");
  }

  #[test]
  fn saturated_counters_do_not_overflow() {
    let data = EpochData {
      num_deauths: u32::MAX,
      num_associations: 1,
      num_handshakes: u32::MAX,
      missed_interactions: u32::MAX,
      ..EpochData::default()
    };

    let features = featurize(&Observation::default(), &data, u64::MAX);
    assert!(features.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));

    let tail = &features[3 * HISTOGRAM_WIDTH..];
    assert!((tail[7] - 1.0).abs() < 1e-6, "deauth share");
    assert!(tail[8] < 1e-6, "association share");
  }
}
