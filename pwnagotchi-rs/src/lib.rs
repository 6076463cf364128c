#![warn(
  clippy::complexity,
  clippy::style,
  clippy::suspicious,
  clippy::pedantic,
  clippy::nursery,
  clippy::cargo
)]
#![deny(clippy::correctness, clippy::perf)]
#![allow(
  clippy::missing_errors_doc,
  clippy::missing_docs_in_private_items,
  reason = "Documentation will be added later as the project matures:tm:"
)]
#![allow(clippy::must_use_candidate)]
// Cant do much about that
#![allow(clippy::multiple_crate_versions)]

pub mod components {
  pub mod clock;
  pub mod replay;
}

pub const fn version() -> &'static str {
  env!("CARGO_PKG_VERSION")
}
