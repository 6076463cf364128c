use pwnagotchi_shared::models::agent::RunningMode;

mod dev;
mod pi;

pub use dev::DevSysControl;
pub use pi::PiSysControl;

pub type SysResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub trait SysControl {
  fn shutdown(&self) -> SysResult<()>;
  fn reboot(&self, mode: Option<RunningMode>) -> SysResult<()>;
  /// Restarts the capture backend and this service, coming back up in `mode`.
  fn restart(&self, mode: RunningMode) -> SysResult<()>;
}
