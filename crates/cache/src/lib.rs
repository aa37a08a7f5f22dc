#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package cache access and change classification for upnotify
//!
//! This crate turns the package manager's simulated upgrade into a
//! [`ResolutionSnapshot`], classifies each candidate version against the
//! security pockets of the running release, and partitions the snapshot
//! into a [`ChangeSet`](upnotify_types::ChangeSet).

mod apt;
mod builder;
mod security;
mod snapshot;

pub use apt::{parse_simulation, AptSimulator};
pub use builder::build_change_set;
pub use security::{SecurityClassifier, SecurityPockets};
pub use snapshot::{
    CachePackage, CandidateVersion, Mark, PackageOrigin, ResolutionSnapshot, SnapshotSource,
};
