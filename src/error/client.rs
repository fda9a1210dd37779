use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("baseUrl is required.")]
    MissingBaseUrl,
    #[error("Invalid baseUrl '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to load client certificate and key: {source}")]
    TlsSetup {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to load client private key: {reason}")]
    TlsKey { reason: &'static str },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to encode request body: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse JSON response '{body}': {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Received empty testRunId in the response.")]
    EmptyRunId,
    #[error("HTTP error ({status}): {body}")]
    Remote { status: u16, body: String },
    #[error("Request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Raw response body returned by the service, when the call got that far.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::Remote { body, .. } | ClientError::Decode { body, .. } => {
                Some(body.as_str())
            }
            ClientError::MissingBaseUrl
            | ClientError::InvalidBaseUrl { .. }
            | ClientError::TlsSetup { .. }
            | ClientError::TlsKey { .. }
            | ClientError::BuildClient { .. }
            | ClientError::Encode { .. }
            | ClientError::EmptyRunId
            | ClientError::Transport { .. } => None,
        }
    }
}
