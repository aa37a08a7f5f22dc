//! Resolution snapshot data model

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use upnotify_errors::Error;

/// One archive a candidate version can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageOrigin {
    /// Distribution family, e.g. `Ubuntu`
    pub origin: String,
    /// Archive pocket, e.g. `noble-security`
    pub archive: String,
}

impl PackageOrigin {
    pub fn new(origin: impl Into<String>, archive: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            archive: archive.into(),
        }
    }
}

/// The version the resolver would install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVersion {
    pub version: String,
    pub origins: Vec<PackageOrigin>,
}

impl CandidateVersion {
    pub fn new(version: impl Into<String>, origins: Vec<PackageOrigin>) -> Self {
        Self {
            version: version.into(),
            origins,
        }
    }
}

/// Resolver decision for one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    #[default]
    Keep,
    Delete,
    Install,
    Upgrade,
}

/// One package as seen by the cache after the simulated upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePackage {
    pub name: String,
    pub current_version: Option<String>,
    pub candidate: Option<CandidateVersion>,
    pub mark: Mark,
}

impl CachePackage {
    /// Package that is not installed and will be
    pub fn marked_install(name: impl Into<String>, candidate: CandidateVersion) -> Self {
        Self {
            name: name.into(),
            current_version: None,
            candidate: Some(candidate),
            mark: Mark::Install,
        }
    }

    /// Installed package moving to `candidate`
    pub fn marked_upgrade(
        name: impl Into<String>,
        current: impl Into<String>,
        candidate: CandidateVersion,
    ) -> Self {
        Self {
            name: name.into(),
            current_version: Some(current.into()),
            candidate: Some(candidate),
            mark: Mark::Upgrade,
        }
    }

    /// Installed package that will be removed
    pub fn marked_delete(name: impl Into<String>, current: Option<String>) -> Self {
        Self {
            name: name.into(),
            current_version: current,
            candidate: None,
            mark: Mark::Delete,
        }
    }

    /// Package the resolver leaves alone
    pub fn unchanged(name: impl Into<String>, current: Option<String>) -> Self {
        Self {
            name: name.into(),
            current_version: current,
            candidate: None,
            mark: Mark::Keep,
        }
    }
}

/// Every package known to the cache, in cache order, with its resolver mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSnapshot {
    packages: Vec<CachePackage>,
}

impl ResolutionSnapshot {
    #[must_use]
    pub fn new(packages: Vec<CachePackage>) -> Self {
        Self { packages }
    }

    pub fn push(&mut self, package: CachePackage) {
        self.packages.push(package);
    }

    #[must_use]
    pub fn packages(&self) -> &[CachePackage] {
        &self.packages
    }

    /// Number of packages carrying any mark other than `Keep`
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.packages
            .iter()
            .filter(|package| package.mark != Mark::Keep)
            .count()
    }
}

/// Anything that can produce a resolution snapshot of a simulated upgrade
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Simulate an upgrade and return the resolver's marks
    ///
    /// `safe` asks for a conservative upgrade that never removes or newly
    /// installs packages.
    async fn snapshot(&self, safe: bool) -> Result<ResolutionSnapshot, Error>;

    /// Codename of the running release, used for pocket matching
    async fn codename(&self) -> Result<String, Error>;
}
