use serde::{Deserialize, Serialize};

use crate::domain::run::{DeepLink, RunEvent, RunLabels, Variable};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InitRequest<'event> {
    system_under_test: &'event str,
    test_environment: &'event str,
    workload: &'event str,
}

impl<'event> From<&'event RunLabels> for InitRequest<'event> {
    fn from(labels: &'event RunLabels) -> Self {
        Self {
            system_under_test: &labels.system_under_test,
            test_environment: &labels.environment,
            workload: &labels.workload,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InitResponse {
    #[serde(default)]
    pub(super) test_run_id: Option<String>,
}

/// Body of `POST /api/test`. Durations travel as strings of seconds.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TestEventPayload<'event> {
    test_run_id: &'event str,
    workload: &'event str,
    test_environment: &'event str,
    system_under_test: &'event str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'event str>,
    #[serde(rename = "CIBuildResultsUrl", skip_serializing_if = "Option::is_none")]
    ci_build_results_url: Option<&'event str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ramp_up: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<&'event str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tags: &'event [String],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    variables: &'event [Variable],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    deep_links: &'event [DeepLink],
}

impl<'event> From<&'event RunEvent> for TestEventPayload<'event> {
    fn from(event: &'event RunEvent) -> Self {
        let metadata = &event.metadata;
        Self {
            test_run_id: &event.test_run_id,
            workload: &event.labels.workload,
            test_environment: &event.labels.environment,
            system_under_test: &event.labels.system_under_test,
            version: metadata.version.as_deref(),
            ci_build_results_url: metadata.ci_build_results_url.as_deref(),
            ramp_up: metadata.ramp_up_secs.map(|secs| secs.to_string()),
            duration: metadata.duration_secs.map(|secs| secs.to_string()),
            completed: event.completed,
            annotations: metadata.annotation.as_deref(),
            tags: &metadata.tags,
            variables: &metadata.variables,
            deep_links: &metadata.deep_links,
        }
    }
}
