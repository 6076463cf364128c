use std::{error::Error, fmt::Display, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::logger::LOGGER;

/// Events the AI subsystem broadcasts to whoever listens (plugins, UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiEvent {
  Ready,
  TrainingStart,
  TrainingStep,
  TrainingEnd,
  BestReward,
  WorstReward,
  Policy,
  Epoch,
}

impl AiEvent {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Ready => "ai_ready",
      Self::TrainingStart => "ai_training_start",
      Self::TrainingStep => "ai_training_step",
      Self::TrainingEnd => "ai_training_end",
      Self::BestReward => "ai_best_reward",
      Self::WorstReward => "ai_worst_reward",
      Self::Policy => "ai_policy",
      Self::Epoch => "epoch",
    }
  }
}

impl Display for AiEvent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug)]
pub struct EventPayload {
  type_name: &'static str,
  bytes: Arc<Vec<u8>>,
}

impl EventPayload {
  pub fn new<T>(value: &T) -> Result<Self>
  where
    T: Serialize,
  {
    let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard())
      .map_err(|e| anyhow!("failed to serialize event payload: {e}"))?;

    Ok(Self { type_name: std::any::type_name::<T>(), bytes: Arc::new(bytes) })
  }

  pub fn empty() -> Self {
    Self { type_name: std::any::type_name::<()>(), bytes: Arc::new(Vec::new()) }
  }

  #[must_use]
  pub const fn type_name(&self) -> &'static str {
    self.type_name
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub fn deserialize<T>(&self) -> Result<T>
  where
    T: DeserializeOwned,
  {
    let (value, _): (T, usize) =
      bincode::serde::decode_from_slice(&self.bytes, bincode::config::standard())
        .map_err(|e| anyhow!("failed to deserialize event payload: {e}"))?;
    Ok(value)
  }
}

#[async_trait]
pub trait EventBus: Send + Sync {
  async fn emit_payload(
    &self,
    event: &str,
    payload: EventPayload,
  ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Serializes `value` and emits it. Failures are logged, never propagated:
/// a broken listener must not stall training.
pub async fn emit_serialized<B, T>(bus: &B, event: AiEvent, value: &T)
where
  B: EventBus + ?Sized,
  T: Serialize + Send + Sync,
{
  let payload = match EventPayload::new(value) {
    Ok(payload) => payload,
    Err(e) => {
      LOGGER.log_error("Events", &format!("Failed to encode {event}: {e}"));
      return;
    }
  };

  if let Err(e) = bus.emit_payload(event.as_str(), payload).await {
    LOGGER.log_error("Events", &format!("Failed to emit {event}: {e}"));
  }
}

/// Bus with no listeners, every event ends up in the debug log.
pub struct LogEventBus;

#[async_trait]
impl EventBus for LogEventBus {
  async fn emit_payload(
    &self,
    event: &str,
    payload: EventPayload,
  ) -> Result<(), Box<dyn Error + Send + Sync>> {
    LOGGER.log_debug("Events", &format!("{event} ({})", payload.type_name()));
    Ok(())
  }
}
