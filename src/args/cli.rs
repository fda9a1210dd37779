use clap::{Args, Parser, Subcommand};

use crate::domain::run::{DeepLink, Variable};

use super::defaults::{
    DEFAULT_CONSTANT_LOAD_TIME, DEFAULT_RAMPUP_TIME, DEFAULT_RUN_VERSION, DEFAULT_TAGS,
};
use super::parsers::{parse_bool_env, parse_deep_link, parse_variable};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "perfana-cli",
    version,
    about = "Start, keep alive and complete Perfana test runs from the command line."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the profile (defaults to ~/.perfana-cli/perfana.yaml)
    #[arg(long, global = true, env = "PERFANA_CLI_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging, including request and response bodies
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true, env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Initialize configuration for Perfana
    Init(InitArgs),
    /// Manage Perfana test runs
    #[command(subcommand)]
    Run(RunCommand),
    /// Stop a Perfana run
    Stop,
}

#[derive(Debug, Subcommand, Clone)]
pub enum RunCommand {
    /// Start a Perfana run and keep it alive until the planned duration elapses
    Start(StartArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct InitArgs {
    /// Client identifier for Perfana configuration
    #[arg(long = "clientIdentifier", alias = "client-identifier")]
    pub client_identifier: Option<String>,

    /// Base URL to use for calling Perfana, e.g. http://localhost:4000
    #[arg(long = "baseUrl", alias = "base-url")]
    pub base_url: Option<String>,

    /// Perfana API key
    #[arg(long = "apiKey", alias = "api-key")]
    pub api_key: Option<String>,

    /// System under test for Perfana configuration
    #[arg(long = "systemUnderTest", alias = "system-under-test")]
    pub system_under_test: Option<String>,

    /// Environment for Perfana configuration
    #[arg(long)]
    pub environment: Option<String>,

    /// Workload for Perfana configuration
    #[arg(long)]
    pub workload: Option<String>,

    /// Path to PEM-encoded certificate file for mTLS
    #[arg(long = "clientCertPath", alias = "client-cert-path")]
    pub client_cert_path: Option<String>,

    /// Path to PEM-encoded private key file for mTLS
    #[arg(long = "clientKeyPath", alias = "client-key-path")]
    pub client_key_path: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct StartArgs {
    /// Ramp-up time period in ISO8601 format (e.g., PT5m for 5 minutes)
    #[arg(long = "rampupTime", alias = "rampup-time", default_value = DEFAULT_RAMPUP_TIME)]
    pub rampup_time: String,

    /// Constant load time period in ISO8601 format (e.g., PT15m for 15 minutes)
    #[arg(
        long = "constantLoadTime",
        alias = "constant-load-time",
        default_value = DEFAULT_CONSTANT_LOAD_TIME
    )]
    pub constant_load_time: String,

    /// Comma-separated tags for the test session
    #[arg(long, default_value = DEFAULT_TAGS)]
    pub tags: String,

    /// Annotation message for the test session
    #[arg(long)]
    pub annotation: Option<String>,

    /// Version of the test session
    #[arg(long = "version", id = "run_version", default_value = DEFAULT_RUN_VERSION)]
    pub run_version: String,

    /// URL to CI build results
    #[arg(long = "buildResultsUrl", alias = "build-results-url")]
    pub build_results_url: Option<String>,

    /// Set variables (name=value), repeatable
    #[arg(long = "variable", value_parser = parse_variable)]
    pub variables: Vec<Variable>,

    /// Add deep links (title|url or title|url|type), repeatable
    #[arg(long = "deeplink", value_parser = parse_deep_link)]
    pub deep_links: Vec<DeepLink>,

    /// Fail instead of using 0 minutes when a duration cannot be parsed
    #[arg(long = "strict-durations")]
    pub strict_durations: bool,
}
