use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::run::{
    AnnotationEvent, RunEvent, RunLabels, RunMetadata, RunOutcome, RunSession, RunState,
    RunTermination, RunTiming,
};
use crate::error::{AppError, AppResult, ClientError};
use crate::shutdown::ShutdownReceiver;

/// Spacing between keep-alive reports while a run is active.
pub(crate) const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Remote operations the coordinator needs from the Perfana service.
#[async_trait]
pub(crate) trait RunServicePort: Send + Sync {
    async fn start_run(&self, labels: &RunLabels) -> Result<String, ClientError>;
    async fn report_event(&self, event: &RunEvent) -> Result<(), ClientError>;
    async fn send_annotation(&self, event: &AnnotationEvent) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub(crate) struct RunLifecycleCommand {
    labels: RunLabels,
    timing: RunTiming,
    metadata: RunMetadata,
    keep_alive_interval: Duration,
}

impl RunLifecycleCommand {
    #[must_use]
    pub(crate) const fn new(labels: RunLabels, timing: RunTiming, metadata: RunMetadata) -> Self {
        Self {
            labels,
            timing,
            metadata,
            keep_alive_interval: KEEP_ALIVE_INTERVAL,
        }
    }
}

fn transition(run_id: &str, from: RunState, to: RunState) {
    debug!(
        test_run_id = run_id,
        from = from.as_str(),
        to = to.as_str(),
        "Run state transition"
    );
}

/// Drives one run from init to its single terminal report.
///
/// The interrupt receiver must be subscribed before this is called so an
/// interrupt that lands while the init call is in flight is not lost.
///
/// # Errors
///
/// Returns an error when the init call fails (no further calls are made) or
/// when the keep-alive task cannot be joined.
pub(crate) async fn execute<TPort>(
    command: RunLifecycleCommand,
    port: &Arc<TPort>,
    mut shutdown_rx: ShutdownReceiver,
) -> AppResult<RunOutcome>
where
    TPort: RunServicePort + 'static,
{
    let RunLifecycleCommand {
        labels,
        timing,
        metadata,
        keep_alive_interval,
    } = command;

    debug!(state = RunState::Initializing.as_str(), "Initializing run");
    let test_run_id = match port.start_run(&labels).await {
        Ok(id) => id,
        Err(err) => {
            error!("Failed to initialize run: {}", err);
            return Err(AppError::client(err));
        }
    };
    info!(test_run_id = %test_run_id, "Run initialized");
    println!("Test run initialized successfully! TestRunID: {}", test_run_id);

    let session = RunSession::start(test_run_id, timing, metadata);
    let event = session.event(&labels);
    let started = Instant::now();
    let deadline = started.checked_add(timing.total_duration());
    debug!(
        test_run_id = %session.test_run_id,
        started_at = %session.started_at,
        planned_minutes = session.planned_duration_minutes,
        "Run session created"
    );

    if let Err(err) = port.report_event(&event).await {
        warn!("Failed to send start event: {}", err);
    }
    transition(
        &session.test_run_id,
        RunState::Initializing,
        RunState::Running,
    );

    let cancel = CancellationToken::new();
    let keep_alive = spawn_keep_alive(KeepAliveTask {
        port: Arc::clone(port),
        event: event.clone(),
        started,
        deadline,
        interval: keep_alive_interval,
        cancel: cancel.clone(),
    });

    let termination = tokio::select! {
        biased;
        () = wait_for_interrupt(&mut shutdown_rx) => RunTermination::Aborted,
        () = sleep_until_deadline(deadline) => RunTermination::Completed,
    };

    cancel.cancel();
    let keep_alives_sent = keep_alive.await?;

    let (terminal_report_failed, terminal_detail) = match termination {
        RunTermination::Completed => {
            transition(
                &session.test_run_id,
                RunState::Running,
                RunState::Completing,
            );
            match port.report_event(&event.completion()).await {
                Ok(()) => (false, None),
                Err(err) => {
                    error!("Failed to send completion event: {}", err);
                    (true, err.response_body().map(str::to_owned))
                }
            }
        }
        RunTermination::Aborted => {
            info!("Interrupt received, aborting run");
            transition(&session.test_run_id, RunState::Running, RunState::Aborting);
            match port
                .send_annotation(&AnnotationEvent::manual_abort(&labels))
                .await
            {
                Ok(message) => (false, Some(message)),
                Err(err) => {
                    error!("Failed to send abort event: {}", err);
                    (true, err.response_body().map(str::to_owned))
                }
            }
        }
    };

    let from = match termination {
        RunTermination::Completed => RunState::Completing,
        RunTermination::Aborted => RunState::Aborting,
    };
    transition(&session.test_run_id, from, RunState::Terminated);

    Ok(RunOutcome {
        test_run_id: session.test_run_id,
        termination,
        keep_alives_sent,
        terminal_report_failed,
        terminal_detail,
    })
}

struct KeepAliveTask<TPort> {
    port: Arc<TPort>,
    event: RunEvent,
    started: Instant,
    deadline: Option<Instant>,
    interval: Duration,
    cancel: CancellationToken,
}

/// Reports `event` every `interval` after `started`, skipping any tick at or
/// past the deadline. Returns how many keep-alives were issued.
fn spawn_keep_alive<TPort>(task: KeepAliveTask<TPort>) -> JoinHandle<u64>
where
    TPort: RunServicePort + 'static,
{
    let KeepAliveTask {
        port,
        event,
        started,
        deadline,
        interval,
        cancel,
    } = task;

    tokio::spawn(async move {
        let mut sent: u64 = 0;
        if interval.is_zero() {
            return sent;
        }
        let mut next_tick = started.checked_add(interval);
        while let Some(tick_at) =
            next_tick.filter(|at| deadline.is_none_or(|limit| *at < limit))
        {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = sleep_until(tick_at) => {}
            }

            sent = sent.saturating_add(1);
            match port.report_event(&event).await {
                Ok(()) => info!(test_run_id = %event.test_run_id, "Keep-alive sent"),
                Err(err) => warn!("Failed to send keep-alive: {}", err),
            }
            next_tick = tick_at.checked_add(interval);
        }
        sent
    })
}

async fn wait_for_interrupt(shutdown_rx: &mut ShutdownReceiver) {
    match shutdown_rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending::<()>().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
