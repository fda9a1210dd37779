use serde::{Deserialize, Serialize};

use crate::domain::run::RunLabels;
use crate::error::ConfigError;

/// Persisted `perfana.yaml` profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub client_identifier: String,
    #[serde(default)]
    pub system_under_test: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub workload: String,
    #[serde(default)]
    pub mtls: MtlsConfig,
}

/// Client certificate settings. Cert and key hold PEM text, not paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtlsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub client_cert: String,
    #[serde(default)]
    pub client_key: String,
}

impl Configuration {
    #[must_use]
    pub fn labels(&self) -> RunLabels {
        RunLabels {
            system_under_test: self.system_under_test.clone(),
            environment: self.environment.clone(),
            workload: self.workload.clone(),
        }
    }

    /// Rejects a profile that enables mTLS without both PEM blocks.
    ///
    /// # Errors
    ///
    /// Returns `MtlsIncomplete` when mTLS is enabled and the certificate or
    /// key is blank.
    pub fn check_mtls(&self) -> Result<(), ConfigError> {
        let mtls = &self.mtls;
        if mtls.enabled && (mtls.client_cert.trim().is_empty() || mtls.client_key.trim().is_empty())
        {
            return Err(ConfigError::MtlsIncomplete);
        }
        Ok(())
    }
}
