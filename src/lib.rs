//! Fastfill host layer
//!
//! Configuration, the read-only profile store and the `fastfill` command line that drives the
//! fill engine against a Chromium tab.

pub mod cli;
pub mod config;
pub mod errors;
pub mod profile_store;

pub use cli::CliArgs;
pub use config::Config;
pub use errors::HostError;
pub use profile_store::ProfileStore;
