use crate::{
  logger::LOGGER,
  models::epoch::{EpochData, EpochStatistics, StatField, StatisticsError},
  utils::wifi,
};

/// Scalar reward for one epoch.
///
/// The handshake rate is the only unweighted term, everything else is a
/// smaller shaping signal. Sad and bored streaks shorter than
/// [`RewardFunction::STREAK_GATE`] epochs contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardFunction;

impl RewardFunction {
  /// Documented output range. Not enforced: extreme inputs (e.g. more hops
  /// than [`wifi::NUM_CHANNELS`]) land outside of it.
  pub const RANGE: (f64, f64) = (-0.7, 1.02);
  pub const NOZERO: f64 = 1e-20;
  pub const STREAK_GATE: f64 = 5.0;

  pub fn call<S: EpochStatistics + ?Sized>(epoch_n: f64, state: &S) -> Result<f64, StatisticsError> {
    let tot_epochs = epoch_n + Self::NOZERO;

    let num_deauths = state.stat(StatField::NumDeauths)?;
    let num_associations = state.stat(StatField::NumAssociations)?;
    let num_handshakes = state.stat(StatField::NumHandshakes)?;

    let tot_interactions = (num_deauths + num_associations).max(num_handshakes) + Self::NOZERO;
    let tot_channels = f64::from(wifi::NUM_CHANNELS);

    let hs = num_handshakes / tot_interactions;
    let ac = 0.2 * (state.stat(StatField::ActiveForEpochs)? / tot_epochs);
    let chps = 0.1 * (state.stat(StatField::NumHops)? / tot_channels);

    let blind = -0.3 * (state.stat(StatField::BlindForEpochs)? / tot_epochs);
    let missed = -0.3 * (state.stat(StatField::MissedInteractions)? / tot_interactions);
    let inactive = -0.2 * (state.stat(StatField::InactiveForEpochs)? / tot_epochs);

    let sad = state.stat(StatField::SadForEpochs)?;
    let bored = state.stat(StatField::BoredForEpochs)?;

    let sad_tot = if sad >= Self::STREAK_GATE { -0.2 * (sad / tot_epochs) } else { 0.0 };
    let bored_tot = if bored >= Self::STREAK_GATE { -0.1 * (bored / tot_epochs) } else { 0.0 };

    let reward = hs + ac + chps + blind + missed + inactive + sad_tot + bored_tot;

    if !(Self::RANGE.0..=Self::RANGE.1).contains(&reward) {
      LOGGER.log_debug(
        "Reward",
        &format!("reward {reward} for epoch {epoch_n} is outside {:?}", Self::RANGE),
      );
    }

    Ok(reward)
  }

  /// Typed variant used by the collector, [`EpochData`] always carries every
  /// counter.
  #[allow(clippy::cast_precision_loss)]
  pub fn for_epoch(epoch: u64, data: &EpochData) -> f64 {
    Self::call(epoch as f64, data).unwrap_or_default()
  }
}
