//! Run-level domain types shared by the CLI, the coordinator and the client.
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Deep link category used when the operator does not provide one.
pub const DEFAULT_DEEP_LINK_TYPE: &str = "link";

const ABORT_TITLE: &str = "Test aborted";
const ABORT_DESCRIPTION: &str = "Manually aborted";
const ABORT_TAGS: [&str; 2] = ["aborted", "manual"];
const SECONDS_PER_MINUTE: u64 = 60;

/// A `(placeholder, value)` substitution attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub placeholder: String,
    pub value: String,
}

/// A named URL attached to a run for cross-referencing dashboards or builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLink {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub plugin_name: String,
}

/// Static labels that identify what is being tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLabels {
    pub system_under_test: String,
    pub environment: String,
    pub workload: String,
}

/// Optional metadata reported with every run event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunMetadata {
    pub version: Option<String>,
    pub ci_build_results_url: Option<String>,
    pub ramp_up_secs: Option<u64>,
    pub duration_secs: Option<u64>,
    pub annotation: Option<String>,
    pub tags: Vec<String>,
    pub variables: Vec<Variable>,
    pub deep_links: Vec<DeepLink>,
}

/// Start, keep-alive or completion message for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEvent {
    pub test_run_id: String,
    pub labels: RunLabels,
    pub metadata: RunMetadata,
    pub completed: bool,
}

impl RunEvent {
    #[must_use]
    pub const fn in_progress(test_run_id: String, labels: RunLabels, metadata: RunMetadata) -> Self {
        Self {
            test_run_id,
            labels,
            metadata,
            completed: false,
        }
    }

    /// Returns the terminal variant of this event.
    #[must_use]
    pub fn completion(&self) -> Self {
        Self {
            completed: true,
            ..self.clone()
        }
    }
}

/// Ad-hoc event posted when a run is interrupted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationEvent {
    pub system_under_test: String,
    pub test_environment: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AnnotationEvent {
    #[must_use]
    pub fn manual_abort(labels: &RunLabels) -> Self {
        Self {
            system_under_test: labels.system_under_test.clone(),
            test_environment: labels.environment.clone(),
            title: ABORT_TITLE.to_owned(),
            description: ABORT_DESCRIPTION.to_owned(),
            tags: ABORT_TAGS.iter().map(|tag| (*tag).to_owned()).collect(),
        }
    }
}

/// Planned ramp-up and constant-load phases, in whole minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTiming {
    pub ramp_up_minutes: u64,
    pub constant_load_minutes: u64,
}

impl RunTiming {
    #[must_use]
    pub const fn total_minutes(self) -> u64 {
        self.ramp_up_minutes
            .saturating_add(self.constant_load_minutes)
    }

    #[must_use]
    pub const fn total_duration(self) -> Duration {
        Duration::from_secs(minutes_to_secs(self.total_minutes()))
    }

    #[must_use]
    pub const fn ramp_up_secs(self) -> u64 {
        minutes_to_secs(self.ramp_up_minutes)
    }

    #[must_use]
    pub const fn constant_load_secs(self) -> u64 {
        minutes_to_secs(self.constant_load_minutes)
    }
}

const fn minutes_to_secs(minutes: u64) -> u64 {
    minutes.saturating_mul(SECONDS_PER_MINUTE)
}

/// In-memory state of an active run. Owned by the coordinator only.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub test_run_id: String,
    pub started_at: DateTime<Utc>,
    pub planned_duration_minutes: u64,
    pub metadata: RunMetadata,
}

impl RunSession {
    #[must_use]
    pub fn start(test_run_id: String, timing: RunTiming, metadata: RunMetadata) -> Self {
        Self {
            test_run_id,
            started_at: Utc::now(),
            planned_duration_minutes: timing.total_minutes(),
            metadata,
        }
    }

    #[must_use]
    pub fn event(&self, labels: &RunLabels) -> RunEvent {
        RunEvent::in_progress(
            self.test_run_id.clone(),
            labels.clone(),
            self.metadata.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Running,
    Completing,
    Aborting,
    Terminated,
}

impl RunState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunState::Initializing => "initializing",
            RunState::Running => "running",
            RunState::Completing => "completing",
            RunState::Aborting => "aborting",
            RunState::Terminated => "terminated",
        }
    }
}

/// How a run left the `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTermination {
    Completed,
    Aborted,
}

/// Result of one coordinator run. `terminal_detail` holds the service's
/// confirmation, or the response body when the terminal report failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub test_run_id: String,
    pub termination: RunTermination,
    pub keep_alives_sent: u64,
    pub terminal_report_failed: bool,
    pub terminal_detail: Option<String>,
}
