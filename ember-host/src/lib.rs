//! ember host library
//!
//! Startup pieces of the `ember-host` binary, exported for testing.

pub mod args;
pub mod host;
pub mod logging;

pub use args::Args;
pub use host::{load_config, Host};
