extern crate pwnagotchi_rs;

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::Parser;
use parking_lot::RwLock;
use pwnagotchi_core::ai::{
  Epoch,
  bootstrap,
  env::{CollectorAgent, EnvAgent},
  policy::ExplorationBackend,
  recovery::{NoRecovery, RecoveryPolicy, WipeAndRestart},
  trainer::Trainer,
};
use pwnagotchi_hw::backend::{Backend, Mode};
use pwnagotchi_rs::{
  components::{clock::EpochClock, replay::ReplayAgent},
  version,
};
use pwnagotchi_shared::{
  config::{Config, config, init_config_with},
  events::LogEventBus,
  logger::LOGGER,
};

#[derive(Parser, Debug)]
struct Cli {
  #[clap(
    short = 'C',
    long = "config",
    default_value = "/etc/pwnagotchi/config.toml",
    help = "The configuration file to use"
  )]
  config: PathBuf,
  #[clap(short, long = "debug", default_value = "false", help = "Enables debug mode")]
  debug: bool,
  #[clap(long = "version", help = "Prints the version information")]
  show_version: bool,
  #[clap(long = "print-config", help = "Prints the configuration")]
  print_config: bool,
  #[clap(long = "replay", value_name = "FILE", help = "Train on recorded epochs, - for stdin")]
  replay: Option<PathBuf>,
  #[clap(long = "no-restart", help = "Keep running without AI when the policy fails to load")]
  no_restart: bool,
  #[clap(long = "epochs", value_name = "N", help = "Stop after N live epochs")]
  epochs: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  if cli.show_version {
    println!("Version: {}", version());
    return ExitCode::SUCCESS;
  }

  // The logger reads the config on first use, so it has to be in place first
  let (mut cfg, load_err) = match Config::load(&cli.config) {
    Ok(cfg) => (cfg, None),
    Err(e) => (Config::default(), Some(e)),
  };
  cfg.debug.enabled |= cli.debug;
  cfg.main.no_restart |= cli.no_restart;
  init_config_with(cfg);

  if let Some(e) = load_err {
    LOGGER.log_warning("Pwnagotchi", &format!("{e}, using defaults"));
  }

  if cli.print_config {
    println!("{}", config());
    return ExitCode::SUCCESS;
  }

  LOGGER.log_info(
    "Pwnagotchi",
    &format!("Pwnagotchi {} (v{}) in {} mode", config().main.name, version(), config().main.mode),
  );

  match run(&cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      LOGGER.log_fatal("Pwnagotchi", &format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
  let cfg = config();
  let backend = Backend::new(if cfg.debug.enabled { Mode::Dev } else { Mode::Pi });

  let recovery: Box<dyn RecoveryPolicy> = if cfg.main.no_restart || cfg.debug.enabled {
    Box::new(NoRecovery)
  } else {
    Box::new(WipeAndRestart::new(
      &*cfg.ai.path,
      Arc::clone(&backend.syscontrol),
      cfg.main.mode,
    ))
  };

  let personality = Arc::new(RwLock::new(cfg.personality.clone()));
  let mut clock = None;

  let agent: Arc<dyn EnvAgent> = if let Some(path) = &cli.replay {
    Arc::new(ReplayAgent::open(path, cfg.personality.clone())?)
  } else {
    let mut epoch = Epoch::new(&cfg.personality).with_sysinfo(Arc::clone(&backend.sysinfo));
    let feed = epoch.take_feed().ok_or_else(|| anyhow::anyhow!("epoch feed already taken"))?;
    let period = Duration::from_secs(u64::from(cfg.personality.recon_time.max(1)));
    clock = Some(EpochClock::new(epoch, Arc::clone(&personality), period));
    Arc::new(CollectorAgent::new(feed, Arc::clone(&personality)))
  };

  let loaded = bootstrap::load(&cfg.ai, agent, 0, true, &ExplorationBackend, recovery.as_ref());

  let trainer = loaded.map(|loaded| {
    let mut trainer = Trainer::new(loaded, &*cfg.ai.path, Arc::new(LogEventBus));
    tokio::spawn(async move { trainer.run().await })
  });

  if let Some(clock) = clock {
    let epochs = clock.run(cli.epochs).await;
    LOGGER.log_info("Pwnagotchi", &format!("{epochs} epochs done"));
  }

  let Some(trainer) = trainer else {
    LOGGER.log_info("Pwnagotchi", "no policy, nothing to train");
    return Ok(());
  };

  let stats = trainer.await??;
  LOGGER.log_info(
    "Pwnagotchi",
    &format!(
      "trained {} epochs over {} episodes, avg reward {:.4}, best {:?}",
      stats.epochs, stats.episodes, stats.avg_reward, stats.best_reward
    ),
  );
  Ok(())
}
