//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod helpers;
pub mod output;
pub mod session;
pub mod wizard;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
