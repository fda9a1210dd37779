mod plan;

use std::ffi::OsString;

use clap::{CommandFactory, FromArgMatches};

use crate::args::CliArgs;
use crate::error::AppResult;
use plan::{build_plan, execute_plan};

pub(crate) fn run() -> AppResult<()> {
    let args = parse_args()?;

    crate::system::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args() -> AppResult<CliArgs> {
    let raw_args: Vec<OsString> = std::env::args_os().collect();
    let matches = CliArgs::command().get_matches_from(raw_args);
    Ok(CliArgs::from_arg_matches(&matches)?)
}

async fn run_async(args: CliArgs) -> AppResult<()> {
    let plan = build_plan(args)?;
    execute_plan(plan).await
}
