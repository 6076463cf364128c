pub mod config;
pub mod events;
pub mod logger;

pub mod ai {
  pub mod reward;
}

pub mod mesh {
  pub mod peer;
}

pub mod models {
  pub mod agent;
  pub mod epoch;
  pub mod net;
}

pub mod utils {
  pub mod wifi;
}
