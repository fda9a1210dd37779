use crate::domain::run::{DEFAULT_DEEP_LINK_TYPE, DeepLink, Variable};
use crate::error::ValidationError;

const ISO_PREFIX: &str = "PT";
const ISO_MINUTES_SUFFIX: char = 'm';

/// Parses a minutes-only ISO 8601 duration such as `PT10m`.
///
/// Hours, seconds, days and signs are not supported.
///
/// # Errors
///
/// Returns `InvalidDurationFormat` when the value is not exactly
/// `PT<digits>m` or the digits do not fit in `u64`.
pub fn parse_iso_minutes(value: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidDurationFormat {
        value: value.to_owned(),
    };
    let digits = value
        .strip_prefix(ISO_PREFIX)
        .and_then(|rest| rest.strip_suffix(ISO_MINUTES_SUFFIX))
        .ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse::<u64>().map_err(|_err| invalid())
}

/// Lenient boolean for flags backed by environment variables such as
/// `NO_COLOR`. An empty value counts as unset.
pub(crate) fn parse_bool_env(s: &str) -> Result<bool, ValidationError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidBoolean {
            value: s.to_owned(),
        }),
    }
}

pub(crate) fn parse_variable(s: &str) -> Result<Variable, ValidationError> {
    let (placeholder, value) =
        s.split_once('=')
            .ok_or_else(|| ValidationError::InvalidVariableFormat {
                value: s.to_owned(),
            })?;
    let placeholder = placeholder.trim();
    if placeholder.is_empty() {
        return Err(ValidationError::VariableNameEmpty {
            value: s.to_owned(),
        });
    }
    Ok(Variable {
        placeholder: placeholder.to_owned(),
        value: value.trim().to_owned(),
    })
}

pub(crate) fn parse_deep_link(s: &str) -> Result<DeepLink, ValidationError> {
    let mut parts = s.splitn(3, '|');
    let name = parts.next().map(str::trim).unwrap_or_default();
    let url = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| ValidationError::InvalidDeepLinkFormat {
            value: s.to_owned(),
        })?;
    let link_type = parts
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_DEEP_LINK_TYPE);
    if name.is_empty() || url.is_empty() {
        return Err(ValidationError::DeepLinkPartEmpty {
            value: s.to_owned(),
        });
    }
    Ok(DeepLink {
        name: name.to_owned(),
        url: url.to_owned(),
        link_type: link_type.to_owned(),
        plugin_name: String::new(),
    })
}

/// Splits a comma-separated tag list, dropping blank entries.
pub fn parse_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
