use std::path::{Path, PathBuf};

use crate::args::{
    DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_CLIENT_CERT, DEFAULT_CLIENT_IDENTIFIER,
    DEFAULT_CLIENT_KEY, DEFAULT_ENVIRONMENT, DEFAULT_SYSTEM_UNDER_TEST, DEFAULT_WORKLOAD,
    InitArgs,
};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::{Configuration, MtlsConfig};

/// Builds the profile written by `init`: placeholders overridden by any
/// non-empty flag. mTLS is enabled only when both PEM files are supplied.
///
/// # Errors
///
/// Returns an error when only one of cert/key is given or a PEM file
/// cannot be read.
pub fn build_init_config(args: &InitArgs) -> AppResult<Configuration> {
    let cert_path = non_empty(args.client_cert_path.as_deref());
    let key_path = non_empty(args.client_key_path.as_deref());

    let mtls = match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => MtlsConfig {
            enabled: true,
            client_cert: read_pem(Path::new(cert_path), PemKind::Cert)?,
            client_key: read_pem(Path::new(key_path), PemKind::Key)?,
        },
        (None, None) => MtlsConfig {
            enabled: false,
            client_cert: DEFAULT_CLIENT_CERT.to_owned(),
            client_key: DEFAULT_CLIENT_KEY.to_owned(),
        },
        (Some(_), None) | (None, Some(_)) => {
            return Err(AppError::validation(
                ValidationError::CertKeyPairIncomplete,
            ));
        }
    };

    Ok(Configuration {
        api_key: or_default(args.api_key.as_deref(), DEFAULT_API_KEY),
        base_url: or_default(args.base_url.as_deref(), DEFAULT_BASE_URL),
        client_identifier: or_default(
            args.client_identifier.as_deref(),
            DEFAULT_CLIENT_IDENTIFIER,
        ),
        system_under_test: or_default(
            args.system_under_test.as_deref(),
            DEFAULT_SYSTEM_UNDER_TEST,
        ),
        environment: or_default(args.environment.as_deref(), DEFAULT_ENVIRONMENT),
        workload: or_default(args.workload.as_deref(), DEFAULT_WORKLOAD),
        mtls,
    })
}

#[derive(Debug, Clone, Copy)]
enum PemKind {
    Cert,
    Key,
}

fn read_pem(path: &Path, kind: PemKind) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|err| {
        let path = PathBuf::from(path);
        AppError::config(match kind {
            PemKind::Cert => ConfigError::ReadCert { path, source: err },
            PemKind::Key => ConfigError::ReadKey { path, source: err },
        })
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn or_default(value: Option<&str>, default: &str) -> String {
    non_empty(value).unwrap_or(default).to_owned()
}
