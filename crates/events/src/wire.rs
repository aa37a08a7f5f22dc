//! Line-oriented JSON encoding used between the notifier and the privileged helper
//!
//! Each event is one JSON object on its own line. Runner identifiers are not
//! part of the wire format; the receiving side tags events with its own id.

use crate::OperationEvent;
use upnotify_errors::{Error, OpsError};

/// Encode an event as a single line without the trailing newline
///
/// # Errors
///
/// Returns an error if the event cannot be serialized.
pub fn encode_line(event: &OperationEvent) -> Result<String, Error> {
    serde_json::to_string(event).map_err(|e| {
        OpsError::SerializationError {
            message: e.to_string(),
        }
        .into()
    })
}

/// Decode one line produced by [`encode_line`]
///
/// # Errors
///
/// Returns `OpsError::MalformedEvent` if the line is not a known event.
pub fn decode_line(line: &str) -> Result<OperationEvent, Error> {
    serde_json::from_str(line.trim()).map_err(|_| {
        OpsError::MalformedEvent {
            line: line.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use upnotify_types::ExitState;

    #[test]
    fn finished_event_wire_shape() {
        let line = encode_line(&OperationEvent::Finished {
            exit: ExitState::Failed,
        })
        .unwrap();
        assert_eq!(line, r#"{"type":"finished","exit":"failed"}"#);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_line("Reading package lists...").is_err());
        assert!(decode_line(r#"{"type":"no_such_event"}"#).is_err());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let event = decode_line("  {\"type\":\"progress_changed\",\"percent\":42}\n").unwrap();
        assert_eq!(event, OperationEvent::ProgressChanged { percent: 42 });
    }
}
