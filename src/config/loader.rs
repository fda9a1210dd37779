use std::path::{Path, PathBuf};

use crate::args::default_config_path;
use crate::error::{AppError, AppResult, ConfigError};

use super::types::Configuration;

#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o600;

/// Resolves the profile path from an explicit override or the home directory.
///
/// # Errors
///
/// Returns an error when no override is given and the home directory is unknown.
pub fn resolve_config_path(path: Option<&str>) -> AppResult<PathBuf> {
    if let Some(path) = path {
        return Ok(PathBuf::from(path));
    }
    default_config_path().ok_or_else(|| AppError::config(ConfigError::HomeDirUnavailable))
}

/// Loads a profile from disk.
///
/// # Errors
///
/// Returns an error when the file cannot be read or is not valid YAML.
pub fn load_config(path: &Path) -> AppResult<Configuration> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    serde_yaml::from_str(&content).map_err(|err| {
        AppError::config(ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: err,
        })
    })
}

/// Writes a profile to disk, creating the parent directory when needed.
///
/// # Errors
///
/// Returns an error when serialization, directory creation or the write fails.
pub fn save_config(path: &Path, config: &Configuration) -> AppResult<()> {
    let content = serde_yaml::to_string(config)
        .map_err(|err| AppError::config(ConfigError::SerializeYaml { source: err }))?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            AppError::config(ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source: err,
            })
        })?;
    }

    std::fs::write(path, content).map_err(|err| {
        AppError::config(ConfigError::WriteConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;

    restrict_permissions(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(CONFIG_FILE_MODE)).map_err(
        |err| {
            AppError::config(ConfigError::WriteConfig {
                path: path.to_path_buf(),
                source: err,
            })
        },
    )
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AppResult<()> {
    Ok(())
}
