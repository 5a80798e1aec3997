//! Command-line interface.

mod args;

pub use args::{BuildArgs, Cli, Commands};
