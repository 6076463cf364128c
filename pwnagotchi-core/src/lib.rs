pub mod ai {
  pub mod bootstrap;
  pub mod env;
  pub mod epoch;
  pub mod featurizer;
  pub mod parameter;
  pub mod policy;
  pub mod recovery;
  pub mod trainer;

  pub use epoch::{Epoch, EpochFeed, EpochSample};
}
