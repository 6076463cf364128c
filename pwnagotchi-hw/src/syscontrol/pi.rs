use std::{fs::File, process::Command, thread::sleep, time::Duration};

use pwnagotchi_shared::{logger::LOGGER, models::agent::RunningMode};

use crate::syscontrol::{SysControl, SysResult};

pub struct PiSysControl;

fn touch_marker(mode: RunningMode) {
  if let Err(e) = File::create(mode.marker_file()) {
    LOGGER.log_error("Pwnagotchi", &format!("Failed to write {}: {e}", mode.marker_file()));
  }
}

fn run(cmd: &str, args: &[&str]) -> SysResult<()> {
  let status = Command::new(cmd).args(args).status()?;
  if status.success() {
    Ok(())
  } else {
    Err(format!("{cmd} {} exited with {status}", args.join(" ")).into())
  }
}

impl SysControl for PiSysControl {
  fn shutdown(&self) -> SysResult<()> {
    LOGGER.log_warning("Pwnagotchi", "Shutting down...");
    run("sync", &[])?;
    run("halt", &[])
  }

  fn reboot(&self, mode: Option<RunningMode>) -> SysResult<()> {
    match mode {
      Some(mode) => {
        LOGGER.log_warning("Pwnagotchi", &format!("Rebooting in {mode} mode..."));
        touch_marker(mode);
      }
      None => LOGGER.log_warning("Pwnagotchi", "Rebooting..."),
    }

    LOGGER.log_warning("Pwnagotchi", "Syncing....");
    run("sync", &[])?;
    run("shutdown", &["-r", "now"])
  }

  fn restart(&self, mode: RunningMode) -> SysResult<()> {
    LOGGER.log_warning("Pwnagotchi", &format!("Restarting in {mode} mode..."));
    touch_marker(mode);

    run("service", &["bettercap", "restart"])?;
    sleep(Duration::from_secs(1));
    run("service", &["pwnagotchi", "restart"])
  }
}
