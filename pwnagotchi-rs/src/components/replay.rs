use std::{
  collections::{HashMap, VecDeque},
  io::{self, Read},
  path::Path,
};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use pwnagotchi_core::ai::{EpochSample, env::EnvAgent, parameter::PolicyDecision};
use pwnagotchi_shared::{
  config::PersonalityConfig,
  logger::LOGGER,
  models::epoch::{EpochData, StatField, fill_missing_statistics},
};
use serde_json::Value;

/// Feeds recorded epochs to the trainer, one JSON object of statistics per
/// line. Blank lines and `#` comments are skipped, extra keys are ignored and
/// missing counters are read as zero. A counter that is not a number rejects
/// the recording.
pub struct ReplayAgent {
  epochs: Mutex<VecDeque<EpochSample>>,
  personality: RwLock<PersonalityConfig>,
  decisions: Mutex<u64>,
}

impl ReplayAgent {
  /// Reads the whole recording up front. `-` reads stdin.
  pub fn open(path: &Path, personality: PersonalityConfig) -> Result<Self> {
    let input = if path.as_os_str() == "-" {
      let mut buf = String::new();
      io::stdin().read_to_string(&mut buf).context("reading epochs from stdin")?;
      buf
    } else {
      std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };

    let agent = Self::parse(&input, personality)?;
    LOGGER.log_info("Replay", &format!("{} epochs from {}", agent.remaining(), path.display()));
    Ok(agent)
  }

  pub fn parse(input: &str, personality: PersonalityConfig) -> Result<Self> {
    let mut epochs = VecDeque::new();

    for (idx, line) in input.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let lineno = idx + 1;

      let value: Value =
        serde_json::from_str(line).with_context(|| format!("line {lineno}: invalid JSON"))?;
      let Value::Object(fields) = value else {
        bail!("line {lineno}: expected an object of statistics");
      };

      let not_numeric = |f: &StatField| fields.get(f.as_str()).is_some_and(|v| !v.is_number());
      if let Some(field) = StatField::ALL.into_iter().find(not_numeric) {
        bail!("line {lineno}: {} is not a number", field.as_str());
      }

      let mut stats: HashMap<String, f64> =
        fields.iter().filter_map(|(k, v)| Some((k.clone(), v.as_f64()?))).collect();

      let filled = fill_missing_statistics(&mut stats);
      if filled > 0 {
        LOGGER.log_warning(
          "Replay",
          &format!("line {lineno}: {filled} statistics missing, using 0"),
        );
      }

      let data = EpochData::from_statistics(&stats).with_context(|| format!("line {lineno}"))?;
      let epoch_n = u64::try_from(epochs.len()).unwrap_or(u64::MAX).saturating_add(1);
      epochs.push_back(EpochSample { epoch_n, data, observation: None });
    }

    Ok(Self {
      epochs: Mutex::new(epochs),
      personality: RwLock::new(personality),
      decisions: Mutex::new(0),
    })
  }

  pub fn remaining(&self) -> usize {
    self.epochs.lock().len()
  }

  pub fn decisions(&self) -> u64 {
    *self.decisions.lock()
  }
}

#[async_trait]
impl EnvAgent for ReplayAgent {
  async fn get_statistics(&self) -> Option<EpochSample> {
    self.epochs.lock().pop_front()
  }

  fn apply_action(&self, decision: &PolicyDecision) {
    *self.decisions.lock() += 1;
    *self.personality.write() = decision.personality.clone();
  }

  fn personality(&self) -> PersonalityConfig {
    self.personality.read().clone()
  }
}

#[cfg(test)]
mod tests {
  use pwnagotchi_core::ai::parameter::{Action, ActionSpace};

  use super::*;

  const RECORDING: &str = r#"
# two epochs recorded on a quiet street
{"num_deauths": 3, "num_associations": 1, "num_handshakes": 2, "num_hops": 13, "active_for_epochs": 1, "blind_for_epochs": 0, "inactive_for_epochs": 0, "missed_interactions": 0, "sad_for_epochs": 0, "bored_for_epochs": 0}

{"num_hops": 13, "inactive_for_epochs": 1, "duration": "59.2s"}
"#;

  #[tokio::test]
  async fn epochs_come_back_in_order() {
    let agent = ReplayAgent::parse(RECORDING, PersonalityConfig::default()).expect("parse");
    assert_eq!(agent.remaining(), 2);

    let first = agent.get_statistics().await.expect("first");
    assert_eq!(first.epoch_n, 1);
    assert_eq!(first.data.num_handshakes, 2);

    let second = agent.get_statistics().await.expect("second");
    assert_eq!(second.epoch_n, 2);
    assert_eq!(second.data.inactive_for_epochs, 1);
    assert_eq!(second.data.num_deauths, 0);

    assert!(agent.get_statistics().await.is_none());
  }

  #[test]
  fn bad_lines_are_reported_with_their_number() {
    let err = ReplayAgent::parse("{}\n[1, 2]\n", PersonalityConfig::default())
      .err()
      .expect("array line");
    assert!(err.to_string().contains("line 2"));

    let err = ReplayAgent::parse(r#"{"num_hops": -1}"#, PersonalityConfig::default())
      .err()
      .expect("negative count");
    assert!(format!("{err:#}").contains("num_hops"));

    let err = ReplayAgent::parse(r#"{"num_handshakes": "5"}"#, PersonalityConfig::default())
      .err()
      .expect("quoted count");
    assert_eq!(err.to_string(), "line 1: num_handshakes is not a number");
  }

  #[test]
  fn decisions_update_the_personality() {
    let agent = ReplayAgent::parse("", PersonalityConfig::default()).expect("parse");
    let space = ActionSpace::new(&[1]);
    let mut idx = vec![0; space.len()];
    idx[3] = 5; // recon_time -> 10

    agent.apply_action(&space.decode(&Action(idx), &agent.personality()));
    assert_eq!(agent.personality().recon_time, 10);
    assert_eq!(agent.decisions(), 1);
  }
}
