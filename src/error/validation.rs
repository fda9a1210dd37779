use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid ISO 8601 duration format: {value}")]
    InvalidDurationFormat { value: String },
    #[error("Invalid variable format: '{value}'. Expected 'name=value'.")]
    InvalidVariableFormat { value: String },
    #[error("Invalid variable '{value}'. Name must not be empty.")]
    VariableNameEmpty { value: String },
    #[error("Invalid deeplink format: '{value}'. Expected 'name|url' or 'name|url|type'.")]
    InvalidDeepLinkFormat { value: String },
    #[error("Invalid deeplink '{value}'. Name and url must not be empty.")]
    DeepLinkPartEmpty { value: String },
    #[error("Invalid boolean value: '{value}'. Expected 1/0, true/false, yes/no or on/off.")]
    InvalidBoolean { value: String },
    #[error("Both client certificate and private key must be provided for mTLS.")]
    CertKeyPairIncomplete,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
