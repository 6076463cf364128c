use std::{fs, thread::available_parallelism};

use crate::sysinfo::{InfoResult, SysInfo};

pub struct PiSysInfo;

fn meminfo_field(meminfo: &str, key: &str) -> f32 {
  meminfo
    .lines()
    .find(|line| line.starts_with(key))
    .and_then(|line| line.split_whitespace().nth(1))
    .and_then(|v| v.parse::<f32>().ok())
    .unwrap_or(0.0)
}

pub(crate) fn memory_usage_from(meminfo: &str) -> f32 {
  let total = meminfo_field(meminfo, "MemTotal:");
  if total <= 0.0 {
    return 0.0;
  }
  let free = meminfo_field(meminfo, "MemFree:");
  let buffers = meminfo_field(meminfo, "Buffers:");
  let cached = meminfo_field(meminfo, "Cached:");

  ((total - free - buffers - cached) / total).clamp(0.0, 1.0)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn cpu_usage_from(loadavg: &str, cores: usize) -> InfoResult<f32> {
  let one_min = loadavg.split_whitespace().next().ok_or("empty /proc/loadavg")?.parse::<f32>()?;
  Ok(one_min / cores.max(1) as f32)
}

impl SysInfo for PiSysInfo {
  fn get_temperature(&self, celsius: Option<bool>) -> InfoResult<f32> {
    let raw = fs::read_to_string("/sys/class/thermal/thermal_zone0/temp")?;
    let temp = raw.trim().parse::<f32>()? / 1000.0;

    Ok(if celsius.unwrap_or(true) { temp } else { temp * 9.0 / 5.0 + 32.0 })
  }

  fn get_cpu_usage(&self) -> InfoResult<f32> {
    let loadavg = fs::read_to_string("/proc/loadavg")?;
    cpu_usage_from(&loadavg, available_parallelism().map_or(1, std::num::NonZero::get))
  }

  fn get_memory_usage(&self) -> InfoResult<f32> {
    Ok(memory_usage_from(&fs::read_to_string("/proc/meminfo")?))
  }
}
