//! Translation of apt's machine-readable status lines into operation events
//!
//! With `-o APT::Status-Fd=1` apt interleaves lines such as
//!
//! ```text
//! dlstatus:1:9.0565:Retrieving file 1 of 3
//! pmstatus:libc6:20.0000:Preparing libc6 (amd64)
//! pmerror:/var/cache/apt/archives/foo.deb:40.0000:trying to overwrite ...
//! ```
//!
//! with its human-readable `Get:`/`Hit:` lines on stdout and `E:` lines on
//! stderr.

use upnotify_events::{error_codes, OperationEvent};
use upnotify_types::{OperationKind, Status};

/// Stateful line translator for one apt invocation
#[derive(Debug, Clone)]
pub struct StatusFdParser {
    kind: OperationKind,
    status: Option<Status>,
    cancellable: bool,
    errors: usize,
}

impl StatusFdParser {
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            status: None,
            cancellable: false,
            errors: 0,
        }
    }

    /// Whether the current phase may be interrupted
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Number of `ErrorRaised` events produced so far
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Translate one stdout line
    pub fn parse_stdout(&mut self, line: &str) -> Vec<OperationEvent> {
        let line = line.trim_end();
        let mut events = Vec::new();

        if let Some(rest) = line.strip_prefix("dlstatus:") {
            self.enter(Status::Downloading, true, &mut events);
            if let Some((_, percent, message)) = split_status(rest) {
                events.push(OperationEvent::ProgressChanged { percent });
                if let Some((current_items, total_items)) = parse_item_counter(message) {
                    events.push(OperationEvent::ItemProgress {
                        current_items,
                        total_items,
                    });
                }
                events.push(OperationEvent::StatusDetailChanged {
                    detail: message.to_string(),
                });
            }
        } else if let Some(rest) = line.strip_prefix("pmstatus:") {
            self.enter(Status::Committing, false, &mut events);
            if let Some((_, percent, message)) = split_status(rest) {
                events.push(OperationEvent::ProgressChanged { percent });
                events.push(OperationEvent::StatusDetailChanged {
                    detail: message.to_string(),
                });
            }
        } else if let Some(rest) = line.strip_prefix("pmerror:") {
            if let Some((package, _, message)) = split_status(rest) {
                self.push_error(
                    error_codes::PACKAGE_FAILED,
                    format!("{package}: {message}"),
                    &mut events,
                );
            }
        } else if let Some(event) = parse_fetch_line(line) {
            if self.status.is_none() {
                self.enter(Status::Downloading, true, &mut events);
            }
            events.push(event);
        } else if line.starts_with("Reading package lists") {
            if self.status.is_none() {
                self.enter(Status::LoadingCache, false, &mut events);
            }
        } else if line.starts_with("Calculating upgrade") {
            self.enter(Status::Resolving, false, &mut events);
        } else if line.starts_with("Fetched ") {
            events.push(OperationEvent::StatusDetailChanged {
                detail: line.to_string(),
            });
        }

        events
    }

    /// Translate one stderr line
    pub fn parse_stderr(&mut self, line: &str) -> Vec<OperationEvent> {
        let mut events = Vec::new();
        let Some(message) = line.trim_end().strip_prefix("E: ") else {
            if !line.trim().is_empty() {
                tracing::debug!(line, "apt stderr");
            }
            return events;
        };

        let code = if message.contains("Could not get lock") || message.contains("Unable to lock")
        {
            error_codes::PACKAGE_MANAGER_LOCKED
        } else if message.starts_with("Failed to fetch") || message.contains("Some index files") {
            match self.kind {
                OperationKind::UpdateCache => error_codes::CACHE_UPDATE_FAILED,
                _ => error_codes::DOWNLOAD_FAILED,
            }
        } else {
            error_codes::PACKAGE_FAILED
        };
        self.push_error(code, message.to_string(), &mut events);
        events
    }

    fn enter(&mut self, status: Status, cancellable: bool, events: &mut Vec<OperationEvent>) {
        if self.status != Some(status) {
            self.status = Some(status);
            events.push(OperationEvent::StatusChanged { status });
        }
        if self.cancellable != cancellable {
            self.cancellable = cancellable;
            events.push(OperationEvent::CancellableChanged { cancellable });
        }
    }

    fn push_error(&mut self, code: i32, detail: String, events: &mut Vec<OperationEvent>) {
        self.errors += 1;
        events.push(OperationEvent::ErrorRaised { code, detail });
    }
}

// "<subject>:<percent>:<message>"; subject and message may contain colons
fn split_status(rest: &str) -> Option<(&str, i32, &str)> {
    rest.match_indices(':').find_map(|(index, _)| {
        let tail = &rest[index + 1..];
        let (field, message) = tail.split_once(':').unwrap_or((tail, ""));
        let percent = field.trim().parse::<f64>().ok()?;
        #[allow(clippy::cast_possible_truncation)]
        let percent = percent.clamp(0.0, 100.0).round() as i32;
        Some((&rest[..index], percent, message.trim()))
    })
}

// "Retrieving file 3 of 12"
fn parse_item_counter(message: &str) -> Option<(u64, u64)> {
    let rest = message.strip_prefix("Retrieving file ")?;
    let (current, total) = rest.split_once(" of ")?;
    let total = total.split_whitespace().next()?;
    Some((current.trim().parse().ok()?, total.parse().ok()?))
}

// "Get:3 http://archive.ubuntu.com/ubuntu noble-updates/main amd64 libc6 amd64 2.39-0ubuntu8.3 [3,262 kB]"
// "Hit:1 http://archive.ubuntu.com/ubuntu noble InRelease"
fn parse_fetch_line(line: &str) -> Option<OperationEvent> {
    let (verb, rest) = line.split_once(':')?;
    if !matches!(verb, "Get" | "Hit" | "Ign") {
        return None;
    }
    let (_, rest) = rest.split_once(' ')?;
    let (uri, rest) = rest.split_once(' ').unwrap_or((rest, ""));

    let (description, size) = match rest.rfind(" [") {
        Some(pos) if rest.ends_with(']') => {
            (&rest[..pos], parse_size(&rest[pos + 2..rest.len() - 1]))
        }
        _ => (rest, None),
    };
    let total_size = size.unwrap_or(0);
    let current_size = if verb == "Get" { 0 } else { total_size };

    Some(OperationEvent::DownloadProgress {
        uri: uri.to_string(),
        short_desc: description.trim().to_string(),
        total_size,
        current_size,
        message: verb.to_string(),
    })
}

// "3,262 kB", "512 B", "1.2 MB"
fn parse_size(text: &str) -> Option<u64> {
    let (number, unit) = text.trim().split_once(' ')?;
    let number: f64 = number.replace(',', "").parse().ok()?;
    let factor = match unit {
        "B" => 1.0,
        "kB" => 1_000.0,
        "MB" => 1_000_000.0,
        "GB" => 1_000_000_000.0,
        _ => return None,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bytes = (number * factor).round() as u64;
    Some(bytes)
}
