//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;


pub use cli::{CliArgs, Command, InitArgs, RunCommand, StartArgs};

pub(crate) use defaults::{
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_CLIENT_CERT, DEFAULT_CLIENT_IDENTIFIER,
    DEFAULT_CLIENT_KEY, DEFAULT_ENVIRONMENT, DEFAULT_SYSTEM_UNDER_TEST, DEFAULT_WORKLOAD,
    default_config_path,
};
pub use parsers::{parse_iso_minutes, parse_tags};
