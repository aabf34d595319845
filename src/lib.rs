pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod inbound;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::adapters::github::GithubGistSource;
pub use crate::core::relay::{GistRelay, RelayResponse, RetryPolicy};
pub use crate::inbound::server::{build_app, RelayServer};
pub use crate::utils::error::{RelayError, Result};
