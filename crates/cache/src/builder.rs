//! Change set construction from a resolution snapshot

use std::collections::HashSet;

use upnotify_types::{ChangeSet, PackageChange};

use crate::security::SecurityClassifier;
use crate::snapshot::{Mark, ResolutionSnapshot};

/// Partition a snapshot into Remove, Install and Upgrade groups
///
/// Cache order is kept within each group. Unmarked packages, installs that
/// already have a current version, and upgrades whose candidate equals the
/// installed version are skipped. A name is classified the first time it is
/// seen with a usable mark.
#[must_use]
pub fn build_change_set(
    snapshot: &ResolutionSnapshot,
    classifier: &SecurityClassifier,
) -> ChangeSet {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut remove = Vec::new();
    let mut install = Vec::new();
    let mut upgrade = Vec::new();

    for package in snapshot.packages() {
        if seen.contains(package.name.as_str()) {
            continue;
        }

        let change = match (
            package.mark,
            &package.current_version,
            &package.candidate,
        ) {
            (Mark::Delete, current, _) => {
                remove.push(PackageChange::remove(&package.name, current.clone()));
                true
            }
            (Mark::Install, None, Some(candidate)) => {
                let is_security = classifier.is_security(&package.name, candidate);
                install.push(PackageChange::install(
                    &package.name,
                    &candidate.version,
                    is_security,
                ));
                true
            }
            (Mark::Upgrade, Some(current), Some(candidate)) if *current != candidate.version => {
                let is_security = classifier.is_security(&package.name, candidate);
                upgrade.push(PackageChange::upgrade(
                    &package.name,
                    current,
                    &candidate.version,
                    is_security,
                ));
                true
            }
            _ => false,
        };

        if change {
            seen.insert(package.name.as_str());
        }
    }

    let set = ChangeSet::from_groups(remove, install, upgrade);
    tracing::debug!(
        changes = set.len(),
        security = set.security_count(),
        codename = classifier.pockets().codename(),
        "classified change set"
    );
    set
}
