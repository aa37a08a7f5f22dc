//! Classified package change types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The action the resolver decided for one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Install,
    Upgrade,
    Remove,
}

impl ChangeKind {
    /// Group order used when presenting a change set
    pub const PRESENTATION_ORDER: [ChangeKind; 3] =
        [ChangeKind::Remove, ChangeKind::Install, ChangeKind::Upgrade];

    /// Heading shown above the packages of this kind
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Upgrade => "Upgrade",
            Self::Remove => "Remove",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

/// One resolved package action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChange {
    pub name: String,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_version: Option<String>,
    pub is_security: bool,
}

impl PackageChange {
    /// A package that is not installed yet
    pub fn install(name: impl Into<String>, candidate: impl Into<String>, is_security: bool) -> Self {
        Self {
            name: name.into(),
            kind: ChangeKind::Install,
            current_version: None,
            candidate_version: Some(candidate.into()),
            is_security,
        }
    }

    /// An installed package moving to a different candidate version
    pub fn upgrade(
        name: impl Into<String>,
        current: impl Into<String>,
        candidate: impl Into<String>,
        is_security: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ChangeKind::Upgrade,
            current_version: Some(current.into()),
            candidate_version: Some(candidate.into()),
            is_security,
        }
    }

    /// An installed package that will be removed
    pub fn remove(name: impl Into<String>, current: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChangeKind::Remove,
            current_version: current,
            candidate_version: None,
            is_security: false,
        }
    }

    /// Single-line description: `name`, `name  /  new` or `name  /  old  ->  new`
    #[must_use]
    pub fn label(&self) -> String {
        match (self.kind, &self.current_version, &self.candidate_version) {
            (ChangeKind::Upgrade, Some(current), Some(candidate)) => {
                format!("{}  /  {current}  ->  {candidate}", self.name)
            }
            (ChangeKind::Install | ChangeKind::Upgrade, _, Some(candidate)) => {
                format!("{}  /  {candidate}", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

/// Result of one classification pass
///
/// Entries are stored grouped as Remove, Install, Upgrade; within a group the
/// order is the order the cache reported the packages in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<PackageChange>,
    security_count: usize,
}

impl ChangeSet {
    /// Assemble a change set from the three classified groups
    #[must_use]
    pub fn from_groups(
        remove: Vec<PackageChange>,
        install: Vec<PackageChange>,
        upgrade: Vec<PackageChange>,
    ) -> Self {
        let mut changes = remove;
        changes.extend(install);
        changes.extend(upgrade);
        let security_count = changes
            .iter()
            .filter(|change| change.kind != ChangeKind::Remove && change.is_security)
            .count();
        Self {
            changes,
            security_count,
        }
    }

    /// All changes in presentation order
    #[must_use]
    pub fn changes(&self) -> &[PackageChange] {
        &self.changes
    }

    /// Changes of one kind, in cache order
    pub fn group(&self, kind: ChangeKind) -> impl Iterator<Item = &PackageChange> {
        self.changes.iter().filter(move |change| change.kind == kind)
    }

    /// Number of changes of one kind
    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.group(kind).count()
    }

    #[must_use]
    pub fn security_count(&self) -> usize {
        self.security_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
