use crate::sysinfo::{InfoResult, SysInfo};

pub struct DevSysInfo;

impl SysInfo for DevSysInfo {
  fn get_temperature(&self, celsius: Option<bool>) -> InfoResult<f32> {
    Ok(if celsius.unwrap_or(true) { 42.0 } else { 42.0 * 9.0 / 5.0 + 32.0 })
  }

  fn get_cpu_usage(&self) -> InfoResult<f32> {
    Ok(0.0)
  }

  fn get_memory_usage(&self) -> InfoResult<f32> {
    Ok(0.0)
  }
}
