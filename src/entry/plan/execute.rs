use std::sync::Arc;

use tracing::info;

use crate::application::run_lifecycle::{self, RunLifecycleCommand};
use crate::client::PerfanaClient;
use crate::config::save_config;
use crate::domain::run::{RunOutcome, RunTermination};
use crate::error::AppResult;
use crate::system::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

use super::types::{InitPlan, RunPlan, StartPlan};

pub(crate) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Init(plan) => init_profile(&plan),
        RunPlan::Start(plan) => start_run(*plan).await,
        RunPlan::Stop => {
            println!("Stopping the Perfana run...");
            info!("No stop call exists on the service; interrupt the running `run start` instead");
            Ok(())
        }
    }
}

fn init_profile(plan: &InitPlan) -> AppResult<()> {
    println!("mTLS enabled: {}", plan.config.mtls.enabled);
    save_config(&plan.path, &plan.config)?;
    println!(
        "Configuration initialized successfully at: {}",
        plan.path.display()
    );
    Ok(())
}

async fn start_run(plan: StartPlan) -> AppResult<()> {
    let StartPlan {
        config,
        timing,
        metadata,
    } = plan;

    let client = Arc::new(PerfanaClient::new(&config)?);
    println!(
        "Starting the Perfana run for {} minutes...",
        timing.total_minutes()
    );

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let command = RunLifecycleCommand::new(config.labels(), timing, metadata);
    let result = run_lifecycle::execute(command, &client, shutdown_rx).await;

    drop(shutdown_tx.send(()));
    drop(signal_handle.await);

    report_outcome(&result?);
    println!("Finished...");
    Ok(())
}

fn report_outcome(outcome: &RunOutcome) {
    match (outcome.termination, outcome.terminal_report_failed) {
        (RunTermination::Completed, false) => {
            println!("Test duration completed. Exiting gracefully...");
        }
        (RunTermination::Completed, true) => {
            println!("Test duration completed, but the completion event was not accepted.");
        }
        (RunTermination::Aborted, false) => {
            println!("Abort event sent successfully!");
        }
        (RunTermination::Aborted, true) => {
            println!("Error sending abort event.");
        }
    }
    if outcome.terminal_report_failed
        && let Some(body) = outcome.terminal_detail.as_deref()
    {
        println!("Server response: {}", body);
    }
    info!(
        test_run_id = %outcome.test_run_id,
        keep_alives = outcome.keep_alives_sent,
        "Run terminated"
    );
}
