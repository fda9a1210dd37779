use tracing::warn;

use crate::args::{CliArgs, Command, RunCommand, StartArgs, parse_iso_minutes, parse_tags};
use crate::config::{build_init_config, load_config, resolve_config_path};
use crate::domain::run::{RunMetadata, RunTiming};
use crate::error::{AppError, AppResult};

use super::types::{InitPlan, RunPlan, StartPlan};

pub(crate) fn build_plan(args: CliArgs) -> AppResult<RunPlan> {
    let CliArgs {
        command, config, ..
    } = args;

    match command {
        Command::Init(init_args) => {
            let path = resolve_config_path(config.as_deref())?;
            let config = build_init_config(&init_args)?;
            Ok(RunPlan::Init(InitPlan { path, config }))
        }
        Command::Run(RunCommand::Start(start_args)) => {
            let path = resolve_config_path(config.as_deref())?;
            let config = load_config(&path)?;
            config.check_mtls()?;
            let timing = build_timing(&start_args)?;
            let metadata = build_metadata(start_args, timing);
            Ok(RunPlan::Start(Box::new(StartPlan {
                config,
                timing,
                metadata,
            })))
        }
        Command::Stop => Ok(RunPlan::Stop),
    }
}

fn build_timing(args: &StartArgs) -> AppResult<RunTiming> {
    Ok(RunTiming {
        ramp_up_minutes: duration_minutes("rampupTime", &args.rampup_time, args.strict_durations)?,
        constant_load_minutes: duration_minutes(
            "constantLoadTime",
            &args.constant_load_time,
            args.strict_durations,
        )?,
    })
}

/// Unparsable durations count as zero minutes unless `strict` is set.
fn duration_minutes(flag: &str, value: &str, strict: bool) -> AppResult<u64> {
    match parse_iso_minutes(value) {
        Ok(minutes) => Ok(minutes),
        Err(err) if strict => Err(AppError::validation(err)),
        Err(err) => {
            warn!("Error parsing {}: {}; using 0 minutes", flag, err);
            Ok(0)
        }
    }
}

fn build_metadata(args: StartArgs, timing: RunTiming) -> RunMetadata {
    RunMetadata {
        version: non_empty(Some(args.run_version)),
        ci_build_results_url: non_empty(args.build_results_url),
        ramp_up_secs: Some(timing.ramp_up_secs()),
        duration_secs: Some(timing.constant_load_secs()),
        annotation: non_empty(args.annotation),
        tags: parse_tags(&args.tags),
        variables: args.variables,
        deep_links: args.deep_links,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
