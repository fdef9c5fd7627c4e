//! Work log synchronizer CLI library.
//!
//! This crate provides the CLI and HTTP interfaces for the synchronizer.

mod cli;
pub mod commands;
mod config;
mod runner;
mod server;

pub use cli::{Cli, Commands};
pub use config::Config;
