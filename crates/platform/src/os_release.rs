//! Distribution codename lookup from os-release

use std::path::Path;
use upnotify_errors::{Error, PlatformError};

/// Extract the release codename from os-release contents
///
/// `VERSION_CODENAME` wins; `UBUNTU_CODENAME` is used when it is absent or
/// empty. Values may be quoted.
#[must_use]
pub fn parse_codename(contents: &str) -> Option<String> {
    let mut version_codename = None;
    let mut ubuntu_codename = None;

    for line in contents.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "VERSION_CODENAME" => version_codename = Some(value.to_string()),
            "UBUNTU_CODENAME" => ubuntu_codename = Some(value.to_string()),
            _ => {}
        }
    }

    version_codename.or(ubuntu_codename)
}

/// Read and parse the codename from an os-release file
///
/// # Errors
///
/// Returns `PlatformError::OsReleaseUnavailable` if the file cannot be read
/// or names no codename.
pub async fn read_codename(path: &Path) -> Result<String, Error> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PlatformError::OsReleaseUnavailable {
            message: format!("{}: {e}", path.display()),
        })?;

    parse_codename(&contents).ok_or_else(|| {
        PlatformError::OsReleaseUnavailable {
            message: format!("{} names no codename", path.display()),
        }
        .into()
    })
}
