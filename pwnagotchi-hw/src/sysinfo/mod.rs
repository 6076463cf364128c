mod dev;
mod pi;

pub use dev::DevSysInfo;
pub use pi::PiSysInfo;

pub type InfoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Host readings attached to every epoch record.
pub trait SysInfo {
  fn get_temperature(&self, celsius: Option<bool>) -> InfoResult<f32>;
  /// Load average normalized by core count, 0.0..=1.0 on an idle to busy box.
  fn get_cpu_usage(&self) -> InfoResult<f32>;
  /// Used memory as a fraction of total.
  fn get_memory_usage(&self) -> InfoResult<f32>;
}
