use std::{
  fs::{self, File, OpenOptions},
  io::Write,
  path::Path,
  sync::Mutex,
};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::config::{CONFIG, LogConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Debug = 0,
  Info = 1,
  Warning = 2,
  Error = 3,
  Fatal = 4,
}

pub struct Log {
  file: Option<Mutex<File>>,
  debug_file: Option<Mutex<File>>,
  stderr: bool,
}

fn open_append(path: &str) -> Option<File> {
  let p = Path::new(path);
  if let Some(parent) = p.parent()
    && !parent.exists()
    && let Err(e) = fs::create_dir_all(parent)
  {
    eprintln!("Failed to create log dir {parent:?}: {e}");
  }

  match OpenOptions::new().create(true).append(true).open(path) {
    Ok(file) => Some(file),
    Err(e) => {
      eprintln!("Failed to open log file {path}: {e}");
      None
    }
  }
}

impl Log {
  pub fn new(cfg: &LogConfig) -> Self {
    let file = open_append(&cfg.path).map(Mutex::new);
    let debug_file = open_append(&cfg.path_debug).map(Mutex::new);

    Self { file, debug_file, stderr: cfg.stderr }
  }

  /// A logger that only writes to stderr.
  pub const fn stderr() -> Self {
    Self { file: None, debug_file: None, stderr: true }
  }

  pub fn log(&self, origin: Option<&str>, message: &str, level: LogLevel) {
    let time = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    let entry = format!(
      "[{}] [{}] {}{}\n",
      time,
      format!("{level:?}").to_uppercase(),
      origin.map_or_else(String::new, |o| format!("[{o}] ")),
      message
    );

    if self.stderr || (self.file.is_none() && self.debug_file.is_none()) {
      eprint!("{entry}");
    }

    // Everything goes to the debug log
    if let Some(debug_file) = &self.debug_file
      && let Ok(mut debug_file) = debug_file.lock()
      && let Err(e) = debug_file.write_all(entry.as_bytes())
    {
      eprintln!("Failed to write debug log entry: {e}");
    }

    if level >= LogLevel::Info
      && let Some(file) = &self.file
      && let Ok(mut file) = file.lock()
      && let Err(e) = file.write_all(entry.as_bytes())
    {
      eprintln!("Failed to write log entry: {e}");
    }
  }

  pub fn log_debug(&self, origin: &str, message: &str) {
    self.log(Some(origin), message, LogLevel::Debug);
  }

  pub fn log_info(&self, origin: &str, message: &str) {
    self.log(Some(origin), message, LogLevel::Info);
  }

  pub fn log_warning(&self, origin: &str, message: &str) {
    self.log(Some(origin), message, LogLevel::Warning);
  }

  pub fn log_error(&self, origin: &str, message: &str) {
    self.log(Some(origin), message, LogLevel::Error);
  }

  pub fn log_fatal(&self, origin: &str, message: &str) {
    self.log(Some(origin), message, LogLevel::Fatal);
  }
}

/// Process-wide logger. Uses the `[log]` section of the global config when it
/// has been initialized, stderr otherwise.
pub static LOGGER: std::sync::LazyLock<Log> = std::sync::LazyLock::new(|| {
  let log = CONFIG.get().map_or_else(Log::stderr, |cfg| Log::new(&cfg.log));
  log.log(None, "=========== STARTED ===========", LogLevel::Info);
  log
});

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn info_goes_to_both_files_debug_only_to_debug_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = LogConfig {
      path: dir.path().join("nested/main.log").to_string_lossy().into_owned().into(),
      path_debug: dir.path().join("nested/debug.log").to_string_lossy().into_owned().into(),
      stderr: false,
    };

    let log = Log::new(&cfg);
    log.log_debug("Test", "quiet detail");
    log.log_info("Test", "visible line");

    let main = fs::read_to_string(cfg.path.as_ref()).expect("main log");
    let debug = fs::read_to_string(cfg.path_debug.as_ref()).expect("debug log");

    assert!(main.contains("[INFO] [Test] visible line"));
    assert!(!main.contains("quiet detail"));
    assert!(debug.contains("[DEBUG] [Test] quiet detail"));
    assert!(debug.contains("visible line"));
  }

  #[test]
  fn levels_are_ordered() {
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Warning < LogLevel::Error);
    assert!(LogLevel::Error < LogLevel::Fatal);
  }
}
