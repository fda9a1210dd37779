use async_trait::async_trait;

use crate::application::run_lifecycle::RunServicePort;
use crate::client::PerfanaClient;
use crate::domain::run::{AnnotationEvent, RunEvent, RunLabels};
use crate::error::ClientError;

#[async_trait]
impl RunServicePort for PerfanaClient {
    async fn start_run(&self, labels: &RunLabels) -> Result<String, ClientError> {
        PerfanaClient::start_run(self, labels).await
    }

    async fn report_event(&self, event: &RunEvent) -> Result<(), ClientError> {
        PerfanaClient::report_event(self, event).await
    }

    async fn send_annotation(&self, event: &AnnotationEvent) -> Result<String, ClientError> {
        PerfanaClient::send_annotation(self, event).await
    }
}
