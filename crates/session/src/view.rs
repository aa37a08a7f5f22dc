//! Renderable session state

use serde::{Deserialize, Serialize};
use upnotify_events::error_codes;
use upnotify_types::{ChangeSet, Status};

use crate::stage::Stage;

/// One accumulated operation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: i32,
    pub detail: String,
}

impl ErrorEntry {
    pub fn new(code: i32, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    /// `Error 1: Package operation failed: disk full`
    #[must_use]
    pub fn summary_line(&self) -> String {
        let description = error_codes::describe(self.code);
        if self.detail.is_empty() {
            format!("Error {}: {description}", self.code)
        } else {
            format!("Error {}: {description}: {}", self.code, self.detail)
        }
    }
}

/// Operation transcript
///
/// Download progress for the same item rewrites its line instead of
/// appending a new one, as long as nothing else was written in between.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    lines: Vec<String>,
    #[serde(skip)]
    download_key: Option<String>,
}

impl Transcript {
    /// Append a line and forget the current download line
    pub fn push(&mut self, line: impl Into<String>) {
        self.download_key = None;
        self.lines.push(line.into());
    }

    /// Update the line for `key`, or start a new one when `key` differs
    pub fn download_line(&mut self, key: &str, line: String) {
        if self.download_key.as_deref() == Some(key) {
            if let Some(last) = self.lines.last_mut() {
                *last = line;
                return;
            }
        }
        self.lines.push(line);
        self.download_key = Some(key.to_string());
    }

    /// Key of the line download progress currently rewrites
    #[must_use]
    pub fn download_key(&self) -> Option<&str> {
        self.download_key.as_deref()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

/// Everything a reporter needs to draw the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub stage: Stage,
    pub status: Option<Status>,
    pub percent: Option<i32>,
    pub headline: String,
    pub transcript: Transcript,
    pub reboot_required: bool,
    pub errors: Vec<ErrorEntry>,
    pub change_set: Option<ChangeSet>,
    pub release: Option<String>,
    pub allow_apply: bool,
    pub allow_cancel: bool,
}

impl SessionView {
    pub(crate) fn new(reboot_required: bool) -> Self {
        Self {
            stage: Stage::Idle,
            status: None,
            percent: None,
            headline: String::new(),
            transcript: Transcript::default(),
            reboot_required,
            errors: Vec::new(),
            change_set: None,
            release: None,
            allow_apply: false,
            allow_cancel: true,
        }
    }
}
