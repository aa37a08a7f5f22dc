//! Security pocket classification

use std::collections::HashSet;

use crate::snapshot::{CandidateVersion, PackageOrigin};

/// Origin and archive pairs that count as security pockets for one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPockets {
    codename: String,
    pockets: Vec<PackageOrigin>,
}

impl SecurityPockets {
    /// Pocket table for a release codename
    #[must_use]
    pub fn for_codename(codename: &str) -> Self {
        let pockets = vec![
            PackageOrigin::new("Ubuntu", format!("{codename}-security")),
            PackageOrigin::new("UbuntuESM", format!("{codename}-infra-security")),
            PackageOrigin::new("UbuntuESMApps", format!("{codename}-apps-security")),
            PackageOrigin::new("gNewSense", format!("{codename}-security")),
            PackageOrigin::new("Debian", format!("{codename}-updates")),
        ];
        Self {
            codename: codename.to_string(),
            pockets,
        }
    }

    #[must_use]
    pub fn codename(&self) -> &str {
        &self.codename
    }

    #[must_use]
    pub fn contains(&self, origin: &PackageOrigin) -> bool {
        self.pockets.iter().any(|pocket| pocket == origin)
    }
}

/// Decides whether a candidate version comes from a security pocket
#[derive(Debug, Clone)]
pub struct SecurityClassifier {
    pockets: SecurityPockets,
    always_security: HashSet<String>,
}

impl SecurityClassifier {
    #[must_use]
    pub fn new(codename: &str) -> Self {
        Self {
            pockets: SecurityPockets::for_codename(codename),
            always_security: HashSet::new(),
        }
    }

    /// Packages reported as security relevant regardless of their origin
    #[must_use]
    pub fn with_always_security<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_security = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn pockets(&self) -> &SecurityPockets {
        &self.pockets
    }

    /// True iff any origin of `candidate` exactly matches a security pocket
    #[must_use]
    pub fn is_security_upgrade(&self, candidate: &CandidateVersion) -> bool {
        candidate
            .origins
            .iter()
            .any(|origin| self.pockets.contains(origin))
    }

    /// Pocket match or configured override for a named package
    #[must_use]
    pub fn is_security(&self, name: &str, candidate: &CandidateVersion) -> bool {
        self.always_security.contains(name) || self.is_security_upgrade(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debian_updates_pocket_counts() {
        let classifier = SecurityClassifier::new("bookworm");
        let candidate = CandidateVersion::new(
            "1.0",
            vec![PackageOrigin::new("Debian", "bookworm-updates")],
        );
        assert!(classifier.is_security_upgrade(&candidate));
    }

    #[test]
    fn pocket_of_another_release_does_not_count() {
        let classifier = SecurityClassifier::new("noble");
        let candidate =
            CandidateVersion::new("1.0", vec![PackageOrigin::new("Ubuntu", "jammy-security")]);
        assert!(!classifier.is_security_upgrade(&candidate));
    }
}
