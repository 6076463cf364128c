use std::sync::Arc;

use crate::{
  syscontrol::{DevSysControl, PiSysControl, SysControl},
  sysinfo::{DevSysInfo, PiSysInfo, SysInfo},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Pi,
  Dev,
}

pub struct Backend {
  pub sysinfo: Arc<dyn SysInfo + Send + Sync>,
  pub syscontrol: Arc<dyn SysControl + Send + Sync>,
}

impl Backend {
  pub fn new(mode: Mode) -> Self {
    match mode {
      Mode::Pi => Self { sysinfo: Arc::new(PiSysInfo), syscontrol: Arc::new(PiSysControl) },
      Mode::Dev => Self { sysinfo: Arc::new(DevSysInfo), syscontrol: Arc::new(DevSysControl) },
    }
  }
}
