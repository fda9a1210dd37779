//! HTTP client for the Perfana run API.
mod payload;
mod tls;


use std::time::Duration;

use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::types::Configuration;
use crate::domain::run::{AnnotationEvent, RunEvent, RunLabels};
use crate::error::ClientError;

use payload::{InitRequest, InitResponse, TestEventPayload};
use tls::apply_mtls;

/// Upper bound for every call, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const INIT_PATH: &str = "/api/init";
const TEST_PATH: &str = "/api/test";
const EVENTS_PATH: &str = "/api/events";
const EVENT_SENT_MESSAGE: &str = "Event sent successfully.";
const JSON_CONTENT_TYPE: &str = "application/json";
const USER_AGENT: &str = concat!("perfana-cli/", env!("CARGO_PKG_VERSION"));

/// Stateless-per-call client. One instance owns the connection pool for
/// the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PerfanaClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl PerfanaClient {
    /// Builds a client from the profile.
    ///
    /// # Errors
    ///
    /// Returns `MissingBaseUrl`/`InvalidBaseUrl` for a bad `baseUrl`,
    /// `TlsKey` for an unreadable private key, and `TlsSetup` when mTLS is
    /// enabled but the cert/key pair cannot be loaded or does not match.
    pub fn new(config: &Configuration) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim();
        if base_url.is_empty() {
            return Err(ClientError::MissingBaseUrl);
        }
        Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            source: err,
        })?;

        let builder = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT);
        let builder = apply_mtls(builder, &config.mtls)?;
        // OpenSSL only checks that the key matches the certificate here.
        let http = builder.build().map_err(|err| {
            if config.mtls.enabled {
                ClientError::TlsSetup { source: err }
            } else {
                ClientError::BuildClient { source: err }
            }
        })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        })
    }

    /// Creates a run and returns the service-issued `testRunId`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyRunId` when the service answers without an id, `Remote`
    /// for non-2xx responses and `Transport` for network failures.
    pub async fn start_run(&self, labels: &RunLabels) -> Result<String, ClientError> {
        let request = InitRequest::from(labels);
        let (status, body) = self.post_json(INIT_PATH, &request).await?;
        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let response: InitResponse =
            serde_json::from_str(&body).map_err(|err| ClientError::Decode {
                body: body.clone(),
                source: err,
            })?;
        response
            .test_run_id
            .filter(|id| !id.is_empty())
            .ok_or(ClientError::EmptyRunId)
    }

    /// Posts a start, keep-alive or completion event.
    ///
    /// # Errors
    ///
    /// Returns `Remote` for non-2xx responses and `Transport` for network failures.
    pub async fn report_event(&self, event: &RunEvent) -> Result<(), ClientError> {
        let payload = TestEventPayload::from(event);
        let (status, body) = self.post_json(TEST_PATH, &payload).await?;
        debug!(status = status.as_u16(), response = %body, "TestEvent response");
        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Posts an annotation event. Anything but `200 OK` is an error that
    /// carries the raw response body.
    ///
    /// # Errors
    ///
    /// Returns `Remote` for non-200 responses and `Transport` for network failures.
    pub async fn send_annotation(&self, event: &AnnotationEvent) -> Result<String, ClientError> {
        let (status, body) = self.post_json(EVENTS_PATH, event).await?;
        if status != StatusCode::OK {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(EVENT_SENT_MESSAGE.to_owned())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T>(&self, path: &str, payload: &T) -> Result<(StatusCode, String), ClientError>
    where
        T: Serialize + ?Sized,
    {
        let body =
            serde_json::to_string(payload).map_err(|err| ClientError::Encode { source: err })?;
        debug!(path, request = %body, "Perfana request");

        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|err| ClientError::Transport { source: err })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ClientError::Transport { source: err })?;
        Ok((status, text))
    }
}
