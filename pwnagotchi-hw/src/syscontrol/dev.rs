use pwnagotchi_shared::{logger::LOGGER, models::agent::RunningMode};

use crate::syscontrol::{SysControl, SysResult};

/// Logs instead of touching the host.
pub struct DevSysControl;

impl SysControl for DevSysControl {
  fn shutdown(&self) -> SysResult<()> {
    LOGGER.log_warning("SysControl", "shutdown requested (dev, ignored)");
    Ok(())
  }

  fn reboot(&self, mode: Option<RunningMode>) -> SysResult<()> {
    LOGGER.log_warning("SysControl", &format!("reboot into {mode:?} requested (dev, ignored)"));
    Ok(())
  }

  fn restart(&self, mode: RunningMode) -> SysResult<()> {
    LOGGER.log_warning("SysControl", &format!("restart in {mode} mode requested (dev, ignored)"));
    Ok(())
  }
}
