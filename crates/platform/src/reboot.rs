//! Reboot-required marker probe

use std::path::{Path, PathBuf};

/// Answers whether a previous package operation left the system needing a reboot
pub trait RebootProbe: Send + Sync {
    fn is_reboot_required(&self) -> bool;
}

/// Probe that checks for the existence of a marker file
///
/// The file's content is never read.
#[derive(Debug, Clone)]
pub struct MarkerFileProbe {
    path: PathBuf,
}

impl MarkerFileProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RebootProbe for MarkerFileProbe {
    fn is_reboot_required(&self) -> bool {
        self.path.exists()
    }
}
