//! The per-epoch statistics contract shared by the collector, the reward
//! function and the trainer.

use std::{
  collections::{BTreeMap, HashMap},
  fmt::Display,
  str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
  Deauth,
  Association,
  Miss,
  Hop,
  Handshake,
  Sleep,
}

/// The ten counters every epoch must report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
  NumDeauths,
  NumAssociations,
  NumHandshakes,
  NumHops,
  MissedInteractions,
  ActiveForEpochs,
  BlindForEpochs,
  InactiveForEpochs,
  SadForEpochs,
  BoredForEpochs,
}

impl StatField {
  pub const ALL: [Self; 10] = [
    Self::NumDeauths,
    Self::NumAssociations,
    Self::NumHandshakes,
    Self::NumHops,
    Self::MissedInteractions,
    Self::ActiveForEpochs,
    Self::BlindForEpochs,
    Self::InactiveForEpochs,
    Self::SadForEpochs,
    Self::BoredForEpochs,
  ];

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::NumDeauths => "num_deauths",
      Self::NumAssociations => "num_associations",
      Self::NumHandshakes => "num_handshakes",
      Self::NumHops => "num_hops",
      Self::MissedInteractions => "missed_interactions",
      Self::ActiveForEpochs => "active_for_epochs",
      Self::BlindForEpochs => "blind_for_epochs",
      Self::InactiveForEpochs => "inactive_for_epochs",
      Self::SadForEpochs => "sad_for_epochs",
      Self::BoredForEpochs => "bored_for_epochs",
    }
  }
}

impl Display for StatField {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StatField {
  type Err = StatisticsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|field| field.as_str() == s)
      .ok_or_else(|| StatisticsError::UnknownStatistic(s.to_string()))
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
  /// The collector handed over a mapping without one of the required counters.
  #[error("missing statistic `{0}`")]
  MissingStatistic(StatField),
  #[error("statistic `{field}` has invalid value {value}")]
  InvalidStatistic { field: StatField, value: f64 },
  #[error("unknown statistic `{0}`")]
  UnknownStatistic(String),
}

/// Anything the reward function can read the ten epoch counters from.
pub trait EpochStatistics {
  fn stat(&self, field: StatField) -> Result<f64, StatisticsError>;
}

fn checked(field: StatField, value: Option<f64>) -> Result<f64, StatisticsError> {
  match value {
    None => Err(StatisticsError::MissingStatistic(field)),
    Some(value) if !value.is_finite() => Err(StatisticsError::InvalidStatistic { field, value }),
    Some(value) => Ok(value),
  }
}

impl EpochStatistics for HashMap<String, f64> {
  fn stat(&self, field: StatField) -> Result<f64, StatisticsError> {
    checked(field, self.get(field.as_str()).copied())
  }
}

impl EpochStatistics for HashMap<&str, f64> {
  fn stat(&self, field: StatField) -> Result<f64, StatisticsError> {
    checked(field, self.get(field.as_str()).copied())
  }
}

impl EpochStatistics for BTreeMap<String, f64> {
  fn stat(&self, field: StatField) -> Result<f64, StatisticsError> {
    checked(field, self.get(field.as_str()).copied())
  }
}

impl EpochStatistics for BTreeMap<StatField, f64> {
  fn stat(&self, field: StatField) -> Result<f64, StatisticsError> {
    checked(field, self.get(&field).copied())
  }
}

/// Fills absent counters with zero. This is the collector's job, the reward
/// function never defaults anything.
pub fn fill_missing_statistics(stats: &mut HashMap<String, f64>) -> usize {
  let mut filled = 0;
  for field in StatField::ALL {
    stats.entry(field.as_str().to_string()).or_insert_with(|| {
      filled += 1;
      0.0
    });
  }
  filled
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochData {
  pub duration_secs: f64,
  pub slept_for_secs: f64,
  pub blind_for_epochs: u32,
  pub inactive_for_epochs: u32,
  pub active_for_epochs: u32,
  pub sad_for_epochs: u32,
  pub bored_for_epochs: u32,
  pub missed_interactions: u32,
  pub num_hops: u32,
  pub num_peers: u32,
  pub tot_bond: f32,
  pub avg_bond: f32,
  pub num_deauths: u32,
  pub num_associations: u32,
  pub num_handshakes: u32,
  pub cpu_load: f32,
  pub mem_usage: f32,
  pub temperature: f32,
  pub reward: f64,
}

impl EpochData {
  pub const fn counter(&self, field: StatField) -> u32 {
    match field {
      StatField::NumDeauths => self.num_deauths,
      StatField::NumAssociations => self.num_associations,
      StatField::NumHandshakes => self.num_handshakes,
      StatField::NumHops => self.num_hops,
      StatField::MissedInteractions => self.missed_interactions,
      StatField::ActiveForEpochs => self.active_for_epochs,
      StatField::BlindForEpochs => self.blind_for_epochs,
      StatField::InactiveForEpochs => self.inactive_for_epochs,
      StatField::SadForEpochs => self.sad_for_epochs,
      StatField::BoredForEpochs => self.bored_for_epochs,
    }
  }

  fn counter_mut(&mut self, field: StatField) -> &mut u32 {
    match field {
      StatField::NumDeauths => &mut self.num_deauths,
      StatField::NumAssociations => &mut self.num_associations,
      StatField::NumHandshakes => &mut self.num_handshakes,
      StatField::NumHops => &mut self.num_hops,
      StatField::MissedInteractions => &mut self.missed_interactions,
      StatField::ActiveForEpochs => &mut self.active_for_epochs,
      StatField::BlindForEpochs => &mut self.blind_for_epochs,
      StatField::InactiveForEpochs => &mut self.inactive_for_epochs,
      StatField::SadForEpochs => &mut self.sad_for_epochs,
      StatField::BoredForEpochs => &mut self.bored_for_epochs,
    }
  }

  /// Exports the ten counters as a name keyed mapping.
  pub fn statistics(&self) -> BTreeMap<String, f64> {
    StatField::ALL
      .into_iter()
      .map(|field| (field.as_str().to_string(), f64::from(self.counter(field))))
      .collect()
  }

  /// Builds the counters from a mapping. Every field must be present and hold
  /// a non-negative whole number; extra keys are ignored.
  pub fn from_statistics<S: EpochStatistics + ?Sized>(stats: &S) -> Result<Self, StatisticsError> {
    let mut data = Self::default();
    for field in StatField::ALL {
      let value = stats.stat(field)?;
      if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(StatisticsError::InvalidStatistic { field, value });
      }
      #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
      {
        *data.counter_mut(field) = value as u32;
      }
    }
    Ok(data)
  }
}

impl EpochStatistics for EpochData {
  fn stat(&self, field: StatField) -> Result<f64, StatisticsError> {
    Ok(f64::from(self.counter(field)))
  }
}
