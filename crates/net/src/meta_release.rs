//! Release catalog lookup
//!
//! The catalog is a list of RFC 822 style stanzas:
//!
//! ```text
//! Dist: noble
//! Name: Noble Numbat
//! Version: 24.04 LTS
//! Supported: 1
//! ```

use serde::{Deserialize, Serialize};
use upnotify_errors::Error;

use crate::client::NetClient;

/// Message shown when the target release cannot be named
pub const FALLBACK_RELEASE_TEXT: &str = "A new release is available";

/// One release stanza
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub dist: String,
    pub name: String,
    pub version: String,
    pub supported: bool,
}

impl ReleaseInfo {
    /// e.g. `Ubuntu 24.04 LTS 'Noble Numbat'`
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("Ubuntu {} '{}'", self.version, self.name)
    }

    /// Whether this stanza describes `version` (`24.04` matches `24.04.1 LTS`)
    #[must_use]
    pub fn matches_version(&self, version: &str) -> bool {
        let version = version.trim();
        if version.is_empty() {
            return false;
        }
        let number = self.version.split_whitespace().next().unwrap_or_default();
        number == version
            || self.version == version
            || number
                .strip_prefix(version)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Parse all complete stanzas of a catalog
///
/// Stanzas missing `Dist`, `Name` or `Version` are skipped.
#[must_use]
pub fn parse_meta_release(text: &str) -> Vec<ReleaseInfo> {
    let mut releases = Vec::new();
    let mut dist = None;
    let mut name = None;
    let mut version = None;
    let mut supported = false;

    let mut flush = |dist: &mut Option<String>,
                     name: &mut Option<String>,
                     version: &mut Option<String>,
                     supported: &mut bool| {
        if let (Some(dist), Some(name), Some(version)) = (dist.take(), name.take(), version.take())
        {
            releases.push(ReleaseInfo {
                dist,
                name,
                version,
                supported: *supported,
            });
        }
        *supported = false;
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut dist, &mut name, &mut version, &mut supported);
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "Dist" => dist = Some(value),
            "Name" => name = Some(value),
            "Version" => version = Some(value),
            "Supported" => supported = value == "1",
            _ => {}
        }
    }
    flush(&mut dist, &mut name, &mut version, &mut supported);

    releases
}

/// Client for the release catalog
#[derive(Clone)]
pub struct MetaReleaseClient {
    client: NetClient,
    url: String,
}

impl MetaReleaseClient {
    pub fn new(client: NetClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Find the newest stanza describing `version`
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn lookup(&self, version: &str) -> Result<Option<ReleaseInfo>, Error> {
        let text = self.client.fetch_text(&self.url).await?;
        Ok(parse_meta_release(&text)
            .into_iter()
            .rev()
            .find(|release| release.matches_version(version)))
    }

    /// Human-readable name for the target release, never failing
    ///
    /// Any fetch error or a missing stanza yields [`FALLBACK_RELEASE_TEXT`].
    pub async fn describe_release(&self, version: Option<&str>) -> String {
        let Some(version) = version.filter(|v| !v.trim().is_empty()) else {
            return FALLBACK_RELEASE_TEXT.to_string();
        };

        match self.lookup(version).await {
            Ok(Some(release)) => release.display_name(),
            Ok(None) => {
                tracing::warn!(version, url = %self.url, "release not listed in catalog");
                FALLBACK_RELEASE_TEXT.to_string()
            }
            Err(e) => {
                tracing::warn!(version, url = %self.url, error = %e, "release catalog unavailable");
                FALLBACK_RELEASE_TEXT.to_string()
            }
        }
    }
}
