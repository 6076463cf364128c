use std::{fs, io, path::PathBuf, sync::Arc};

use pwnagotchi_hw::syscontrol::SysControl;
use pwnagotchi_shared::{logger::LOGGER, models::agent::RunningMode};

/// What to do when the policy cannot be built or restored.
pub trait RecoveryPolicy: Send + Sync {
  fn on_fatal_error(&self, error: &anyhow::Error);
}

/// Drops the checkpoint and restarts the service so the next run trains from
/// scratch. Corruption is not diagnosed any further.
pub struct WipeAndRestart {
  pub checkpoint: PathBuf,
  pub syscontrol: Arc<dyn SysControl + Send + Sync>,
  pub mode: RunningMode,
}

impl WipeAndRestart {
  pub fn new(
    checkpoint: impl Into<PathBuf>,
    syscontrol: Arc<dyn SysControl + Send + Sync>,
    mode: RunningMode,
  ) -> Self {
    Self { checkpoint: checkpoint.into(), syscontrol, mode }
  }

  fn wipe(&self) -> io::Result<()> {
    match fs::remove_file(&self.checkpoint) {
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      other => other,
    }
  }
}

impl RecoveryPolicy for WipeAndRestart {
  fn on_fatal_error(&self, error: &anyhow::Error) {
    LOGGER.log_warning(
      "AI",
      &format!("{error:#}, deleting {} and restarting", self.checkpoint.display()),
    );

    if let Err(e) = self.wipe() {
      LOGGER.log_error("AI", &format!("could not delete {}: {e}", self.checkpoint.display()));
    }

    if let Err(e) = self.syscontrol.restart(self.mode) {
      LOGGER.log_error("AI", &format!("restart in {} mode failed: {e}", self.mode));
    }
  }
}

/// Logs and carries on without a policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecovery;

impl RecoveryPolicy for NoRecovery {
  fn on_fatal_error(&self, error: &anyhow::Error) {
    LOGGER.log_error("AI", &format!("{error:#}, continuing without AI"));
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use parking_lot::Mutex;
  use pwnagotchi_hw::syscontrol::SysResult;

  use super::*;

  #[derive(Default)]
  pub struct RecordingSysControl {
    pub restarts: Mutex<Vec<RunningMode>>,
  }

  impl SysControl for RecordingSysControl {
    fn shutdown(&self) -> SysResult<()> {
      Ok(())
    }

    fn reboot(&self, _mode: Option<RunningMode>) -> SysResult<()> {
      Ok(())
    }

    fn restart(&self, mode: RunningMode) -> SysResult<()> {
      self.restarts.lock().push(mode);
      Ok(())
    }
  }

  #[derive(Default)]
  pub struct RecordingRecovery {
    pub errors: Mutex<Vec<String>>,
  }

  impl RecoveryPolicy for RecordingRecovery {
    fn on_fatal_error(&self, error: &anyhow::Error) {
      self.errors.lock().push(format!("{error:#}"));
    }
  }
}
